//! Load every indexed item into memory.

use std::path::Path;

use hikefind_core::types::CorpusItem;

use crate::artifacts::{self, MASKS_SUFFIX};

/// Scan the processed directory for mask-stack artifacts and pair each one
/// with its embedding vector. Items missing their vector file are skipped
/// with a warning; the result is sorted by id so scans are deterministic.
pub fn load_corpus(processed_dir: &Path) -> anyhow::Result<Vec<CorpusItem>> {
    let mut items = Vec::new();
    for entry in walkdir::WalkDir::new(processed_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let name = entry.file_name().to_string_lossy().to_string();
        let Some(id) = name.strip_suffix(MASKS_SUFFIX) else {
            continue;
        };
        let mask_stack = artifacts::load_mask_stack(processed_dir, id)?;
        let embedding = match artifacts::load_vector(processed_dir, id) {
            Ok(vector) => vector,
            Err(e) => {
                tracing::warn!(id, error = %e, "skipping item without embedding vector");
                continue;
            }
        };
        items.push(CorpusItem { id: id.to_string(), mask_stack, embedding });
    }
    items.sort_by(|a, b| a.id.cmp(&b.id));
    tracing::info!(items = items.len(), "corpus loaded");
    Ok(items)
}
