use std::{env, path::PathBuf};

use hikefind_core::config::Config;
use hikefind_core::taxonomy::Taxonomy;
use hikefind_embed::default_embedder;
use hikefind_seg::default_segmenter;
use hikefind_store::BatchIndexer;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;

    let args: Vec<String> = env::args().skip(1).collect();
    let mut source_dir = None;
    let mut out_dir = None;
    let mut render_class_maps = true;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--no-class-maps" => render_class_maps = false,
            "--out" | "-o" => {
                if i + 1 < args.len() {
                    out_dir = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                } else {
                    eprintln!("Error: --out requires a directory");
                    std::process::exit(1);
                }
            }
            _ if !args[i].starts_with('-') => source_dir = Some(PathBuf::from(&args[i])),
            other => eprintln!("Ignoring unknown flag: {}", other),
        }
        i += 1;
    }
    let source_dir = source_dir.unwrap_or_else(|| config.data.originals_dir.clone());
    let out_dir = out_dir.unwrap_or_else(|| config.data.processed_dir.clone());

    println!("hikefind indexer");
    println!("================");
    println!("Source directory: {}", source_dir.display());
    println!("Output directory: {}", out_dir.display());
    if !render_class_maps {
        println!("Skipping class-map rendering (--no-class-maps)");
    }

    let segmenter = default_segmenter(&config.models.segformer_dir)?;
    let embedder = default_embedder(&config.models.clip_dir)?;
    let indexer = BatchIndexer::new(
        segmenter.as_ref(),
        embedder.as_ref(),
        Taxonomy::landscape(),
        out_dir,
        render_class_maps,
    );
    let report = indexer.run(&source_dir)?;

    println!("\nIndexed {} images", report.processed);
    if !report.skipped.is_empty() {
        println!("Skipped {} images:", report.skipped.len());
        for (file, error) in &report.skipped {
            println!("  {}: {}", file, error);
        }
    }
    Ok(())
}
