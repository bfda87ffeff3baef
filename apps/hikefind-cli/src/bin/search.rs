use std::env;
use std::path::PathBuf;

use hikefind_caption::default_captioner;
use hikefind_core::config::Config;
use hikefind_core::taxonomy::Taxonomy;
use hikefind_embed::default_embedder;
use hikefind_rank::{RankWeights, SketchSearchEngine};
use hikefind_store::load_corpus;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <sketch.png> [top_k]", args[0]);
        std::process::exit(1);
    }
    let sketch_path = PathBuf::from(&args[1]);
    let config = Config::load()?;
    let top_k = args
        .get(2)
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(config.search.top_k);

    println!("hikefind search");
    println!("===============");
    println!("Sketch: {}", sketch_path.display());

    let corpus = load_corpus(&config.data.processed_dir)?;
    println!("Corpus: {} items", corpus.len());

    let engine = SketchSearchEngine::new(
        default_captioner(&config.caption),
        default_embedder(&config.models.clip_dir)?,
        Taxonomy::landscape(),
        corpus,
        config.search.metric,
        RankWeights {
            compositional: config.search.weight_comp,
            aesthetic: config.search.weight_aes,
        },
        top_k,
        config.sketch.min_pixel_count,
    );

    let bytes = std::fs::read(&sketch_path)?;
    let outcome = engine.query_bytes(&bytes)?;

    println!("Detected classes: {}", outcome.detected.join(", "));
    println!("Query phrase: \"{}\"", outcome.caption);
    println!("\nTop {} results:", outcome.candidates.len());
    for (i, candidate) in outcome.candidates.iter().enumerate() {
        println!(
            "  {}. score={:.4}  comp={:.4}  aes={:.4}  id={}",
            i + 1,
            candidate.combined_score,
            candidate.compositional_score,
            candidate.aesthetic_score,
            candidate.id
        );
    }
    Ok(())
}
