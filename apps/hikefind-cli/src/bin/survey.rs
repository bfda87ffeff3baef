//! Corpus class-frequency survey: run the segmentation oracle over a
//! directory and report how many images each label shows up in. Used to
//! pick which classes deserve a sketch brush.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use hikefind_core::config::Config;
use hikefind_seg::default_segmenter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let config = Config::load()?;
    let source_dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.data.originals_dir.clone());

    println!("hikefind class survey");
    println!("=====================");
    println!("Source directory: {}", source_dir.display());

    let segmenter = default_segmenter(&config.models.segformer_dir)?;
    let label_names: HashMap<u32, &str> = segmenter
        .labels()
        .iter()
        .map(|(id, name)| (*id, name.as_str()))
        .collect();

    let mut detection_counts: HashMap<u32, usize> = HashMap::new();
    let mut processed = 0usize;
    for entry in std::fs::read_dir(&source_dir)? {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg" | "webp"))
            .unwrap_or(false);
        if !is_image {
            continue;
        }
        let image = match image::open(&path) {
            Ok(image) => image.to_rgb8(),
            Err(e) => {
                eprintln!("Error decoding {}: {}. Skipping.", path.display(), e);
                continue;
            }
        };
        let class_map = match segmenter.segment(&image) {
            Ok(map) => map,
            Err(e) => {
                eprintln!("Error segmenting {}: {}. Skipping.", path.display(), e);
                continue;
            }
        };
        // A label counts once per image, however many pixels it covers.
        let unique: std::collections::HashSet<u32> = class_map.ids().iter().copied().collect();
        for id in unique {
            *detection_counts.entry(id).or_insert(0) += 1;
        }
        processed += 1;
    }

    println!("\nCLASS DETECTION FREQUENCY (total images: {})", processed);
    println!("{}", "-".repeat(60));
    let mut ranked: Vec<(u32, usize)> = detection_counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    for (rank, (id, count)) in ranked.iter().enumerate() {
        let name = label_names.get(id).copied().unwrap_or("(unknown)");
        let frequency = if processed > 0 {
            100.0 * *count as f64 / processed as f64
        } else {
            0.0
        };
        println!(
            "{:<4} {:<25} (id {:<3}) {:>5} images  {:>6.2}%",
            rank + 1,
            name,
            id,
            count,
            frequency
        );
    }
    Ok(())
}
