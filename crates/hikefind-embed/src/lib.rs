//! hikefind-embed
//!
//! Image/text embedding oracle adapters: CLIP via candle for real
//! inference, and a deterministic hashing fake for tests and model-free
//! development. Both towers return unit-normalized vectors in one shared
//! space.

use std::hash::{Hash, Hasher};
use std::path::Path;

use image::RgbImage;
use twox_hash::XxHash64;

use hikefind_core::error::{Error, Result};
use hikefind_core::traits::ImageTextEmbedder;

mod clip;
mod device;

pub use clip::CandleClip;

pub const FAKE_EMBEDDING_DIM: usize = 512;

/// Build the configured embedder. Set `APP_USE_FAKE_MODELS=1` to get the
/// deterministic fake instead of loading checkpoint weights.
pub fn default_embedder(model_dir: &Path) -> anyhow::Result<Box<dyn ImageTextEmbedder>> {
    let use_fake = std::env::var("APP_USE_FAKE_MODELS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if use_fake {
        tracing::info!("using FakeClipEmbedder");
        return Ok(Box::new(FakeClipEmbedder::new(FAKE_EMBEDDING_DIM)));
    }
    Ok(Box::new(CandleClip::new(model_dir)?))
}

pub(crate) fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
    for x in v.iter_mut() {
        *x /= norm;
    }
}

/// Deterministic embedder projecting hashed tokens (text) or coarse pixel
/// buckets (image) into a fixed-dimension unit vector.
pub struct FakeClipEmbedder {
    dim: usize,
}

impl FakeClipEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn bump(&self, v: &mut [f32], key: impl Hash, weight: f32) {
        let mut hasher = XxHash64::with_seed(0);
        key.hash(&mut hasher);
        let h = hasher.finish();
        let idx = (h as usize) % self.dim;
        let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
        v[idx] += val + weight;
    }
}

impl ImageTextEmbedder for FakeClipEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed_image(&self, image: &RgbImage) -> Result<Vec<f32>> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::InvalidImage("zero-area image".to_string()));
        }
        // 8x8 grid of quantized colors stands in for visual content.
        let mut v = vec![0f32; self.dim];
        for gy in 0..8u32 {
            for gx in 0..8u32 {
                let x = (gx * width / 8).min(width - 1);
                let y = (gy * height / 8).min(height - 1);
                let p = image.get_pixel(x, y);
                let bucket = (gx, gy, p[0] / 32, p[1] / 32, p[2] / 32);
                self.bump(&mut v, bucket, 0.01);
            }
        }
        l2_normalize(&mut v);
        Ok(v)
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            self.bump(&mut v, token, (i as f32 % 3.0) * 0.01);
        }
        l2_normalize(&mut v);
        Ok(v)
    }
}
