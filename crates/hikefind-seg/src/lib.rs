//! hikefind-seg
//!
//! Segmentation oracle adapters: a candle SegFormer checkpoint for real
//! inference and a deterministic fake for tests and model-free development.

use std::path::Path;

use image::RgbImage;

use hikefind_core::error::{Error, Result};
use hikefind_core::traits::Segmenter;
use hikefind_core::types::ClassIdMap;

mod device;
mod segformer;

pub use segformer::CandleSegformer;

/// Build the configured segmenter. Set `APP_USE_FAKE_MODELS=1` to get the
/// deterministic fake instead of loading checkpoint weights.
pub fn default_segmenter(model_dir: &Path) -> anyhow::Result<Box<dyn Segmenter>> {
    let use_fake = std::env::var("APP_USE_FAKE_MODELS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if use_fake {
        tracing::info!("using FakeSegmenter");
        return Ok(Box::new(FakeSegmenter::new()));
    }
    Ok(Box::new(CandleSegformer::new(model_dir)?))
}

/// Deterministic stand-in segmenter: a horizon split with sky above and
/// earth below.
pub struct FakeSegmenter {
    labels: Vec<(u32, String)>,
}

impl FakeSegmenter {
    pub fn new() -> Self {
        let labels = [
            (2u32, "sky"),
            (4, "tree"),
            (9, "grass"),
            (13, "earth"),
            (16, "mountain"),
            (21, "water"),
            (34, "rock"),
            (52, "path"),
            (66, "flower"),
        ]
        .into_iter()
        .map(|(id, name)| (id, name.to_string()))
        .collect();
        Self { labels }
    }
}

impl Default for FakeSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Segmenter for FakeSegmenter {
    fn segment(&self, image: &RgbImage) -> Result<ClassIdMap> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::InvalidImage("zero-area image".to_string()));
        }
        let horizon = height / 3;
        let mut ids = Vec::with_capacity((width as usize) * (height as usize));
        for y in 0..height {
            let id = if y < horizon { 2 } else { 13 };
            ids.extend(std::iter::repeat(id).take(width as usize));
        }
        ClassIdMap::new(width, height, ids)
    }

    fn labels(&self) -> &[(u32, String)] {
        &self.labels
    }
}
