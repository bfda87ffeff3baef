//! Per-item artifact files.
//!
//! Layout under the processed directory:
//!   `<id>.masks.bin`     bincode-encoded mask stack
//!   `<id>.vector.json`   embedding vector
//!   `<id>.classmap.png`  optional colorized class map
//!   `manifest.json`      batch metadata

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use image::RgbImage;
use serde::{Deserialize, Serialize};

use hikefind_core::error::{Error, Result};
use hikefind_core::types::MaskStack;

pub const MASKS_SUFFIX: &str = ".masks.bin";
pub const VECTOR_SUFFIX: &str = ".vector.json";
pub const CLASS_MAP_SUFFIX: &str = ".classmap.png";
pub const MANIFEST_FILE: &str = "manifest.json";

pub fn masks_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{id}{MASKS_SUFFIX}"))
}

pub fn vector_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{id}{VECTOR_SUFFIX}"))
}

pub fn class_map_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{id}{CLASS_MAP_SUFFIX}"))
}

pub fn save_mask_stack(dir: &Path, id: &str, stack: &MaskStack) -> Result<()> {
    let file = File::create(masks_path(dir, id))?;
    bincode::serialize_into(BufWriter::new(file), stack)
        .map_err(|e| Error::Encode(e.to_string()))
}

pub fn load_mask_stack(dir: &Path, id: &str) -> Result<MaskStack> {
    let path = masks_path(dir, id);
    if !path.exists() {
        return Err(Error::MissingArtifact { id: id.to_string(), kind: "mask stack" });
    }
    let file = File::open(path)?;
    bincode::deserialize_from(BufReader::new(file)).map_err(|e| Error::Encode(e.to_string()))
}

pub fn save_vector(dir: &Path, id: &str, vector: &[f32]) -> Result<()> {
    let file = File::create(vector_path(dir, id))?;
    serde_json::to_writer(BufWriter::new(file), vector)?;
    Ok(())
}

pub fn load_vector(dir: &Path, id: &str) -> Result<Vec<f32>> {
    let path = vector_path(dir, id);
    if !path.exists() {
        return Err(Error::MissingArtifact { id: id.to_string(), kind: "embedding vector" });
    }
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

pub fn save_class_map(dir: &Path, id: &str, rendered: &RgbImage) -> Result<()> {
    rendered
        .save(class_map_path(dir, id))
        .map_err(|e| Error::Encode(e.to_string()))
}

/// Metadata written once per indexing batch.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexManifest {
    pub version: String,
    pub created_at: String,
    pub items: usize,
    pub channels: usize,
    pub embedding_dim: usize,
}

impl IndexManifest {
    pub fn new(items: usize, channels: usize, embedding_dim: usize) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            items,
            channels,
            embedding_dim,
        }
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        let file = File::create(dir.join(MANIFEST_FILE))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn load(dir: &Path) -> Result<Self> {
        let file = File::open(dir.join(MANIFEST_FILE))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}
