//! Configuration loader.
//!
//! Merges `config.toml` with `APP_*` environment variables (sections split
//! on `__`, e.g. `APP_SEARCH__TOP_K=10`) into one typed object that is
//! passed explicitly into the indexer and the search engine.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::OverlapMetric;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub sketch: SketchConfig,
    #[serde(default)]
    pub models: ModelConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub caption: CaptionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Source photographs, one file per corpus item.
    pub originals_dir: PathBuf,
    /// Output directory for per-item artifacts.
    pub processed_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            originals_dir: PathBuf::from("data/original"),
            processed_dir: PathBuf::from("data/processed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub weight_comp: f32,
    pub weight_aes: f32,
    pub top_k: usize,
    pub metric: OverlapMetric,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { weight_comp: 0.7, weight_aes: 0.3, top_k: 5, metric: OverlapMetric::Iou }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SketchConfig {
    /// A class is "detected" in a sketch only above this many exact-color
    /// pixels.
    pub min_pixel_count: u32,
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self { min_pixel_count: 100 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub clip_dir: PathBuf,
    pub segformer_dir: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            clip_dir: PathBuf::from("models/clip-vit-base-patch32"),
            segformer_dir: PathBuf::from("models/segformer-b0-ade-512"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 5000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionConfig {
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the API key; the key itself never
    /// lives in config files.
    pub api_key_env: String,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash-lite".to_string(),
            api_key_env: "GOOGLE_API_KEY".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config: Config = Figment::new()
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("APP_").split("__"))
            .extract()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.search.weight_comp, 0.7);
        assert_eq!(config.search.weight_aes, 0.3);
        assert_eq!(config.search.top_k, 5);
        assert_eq!(config.search.metric, OverlapMetric::Iou);
        assert_eq!(config.sketch.min_pixel_count, 100);
    }
}
