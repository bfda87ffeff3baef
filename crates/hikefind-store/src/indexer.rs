//! Offline batch indexer.
//!
//! For each image in a source directory: segment, rasterize, and persist
//! the mask stack; embed and persist the vector; optionally render the
//! colorized class map. Every image is processed independently — a decode
//! or oracle failure is logged, the image is skipped, and the batch
//! continues.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};

use hikefind_core::taxonomy::Taxonomy;
use hikefind_core::traits::{ImageTextEmbedder, Segmenter};
use hikefind_masks::{from_class_map, render_class_map};

use crate::artifacts::{self, IndexManifest};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

pub struct BatchIndexer<'a> {
    segmenter: &'a dyn Segmenter,
    embedder: &'a dyn ImageTextEmbedder,
    taxonomy: Taxonomy,
    class_ids: Vec<HashSet<u32>>,
    out_dir: PathBuf,
    render_class_maps: bool,
}

/// Outcome of one batch run; `processed` excludes skipped images.
#[derive(Debug)]
pub struct IndexReport {
    pub processed: usize,
    pub skipped: Vec<(String, String)>,
}

impl<'a> BatchIndexer<'a> {
    pub fn new(
        segmenter: &'a dyn Segmenter,
        embedder: &'a dyn ImageTextEmbedder,
        taxonomy: Taxonomy,
        out_dir: PathBuf,
        render_class_maps: bool,
    ) -> Self {
        let class_ids = taxonomy.map_oracle_labels(segmenter.labels());
        Self { segmenter, embedder, taxonomy, class_ids, out_dir, render_class_maps }
    }

    pub fn run(&self, source_dir: &Path) -> anyhow::Result<IndexReport> {
        let files = list_image_files(source_dir);
        if files.is_empty() {
            println!("No images found under {}.", source_dir.display());
            return Ok(IndexReport { processed: 0, skipped: Vec::new() });
        }
        std::fs::create_dir_all(&self.out_dir)?;

        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} images {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let mut processed = 0usize;
        let mut skipped = Vec::new();
        for file in &files {
            let id = file
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            pb.set_message(id.clone());
            match self.index_one(file, &id) {
                Ok(()) => processed += 1,
                Err(e) => {
                    tracing::warn!(file = %file.display(), error = %e, "skipping image");
                    skipped.push((file.display().to_string(), e.to_string()));
                }
            }
            pb.inc(1);
        }
        pb.finish_with_message("done");

        IndexManifest::new(processed, self.taxonomy.num_channels(), self.embedder.dim())
            .save(&self.out_dir)?;
        Ok(IndexReport { processed, skipped })
    }

    fn index_one(&self, file: &Path, id: &str) -> anyhow::Result<()> {
        let image = image::open(file)
            .map_err(|e| hikefind_core::error::Error::InvalidImage(e.to_string()))?
            .to_rgb8();
        let class_map = self.segmenter.segment(&image)?;
        let stack = from_class_map(&class_map, &self.class_ids);
        artifacts::save_mask_stack(&self.out_dir, id, &stack)?;

        let embedding = self.embedder.embed_image(&image)?;
        artifacts::save_vector(&self.out_dir, id, &embedding)?;

        if self.render_class_maps {
            let rendered = render_class_map(&class_map, &self.taxonomy, &self.class_ids);
            artifacts::save_class_map(&self.out_dir, id, &rendered)?;
        }
        Ok(())
    }
}

fn list_image_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}
