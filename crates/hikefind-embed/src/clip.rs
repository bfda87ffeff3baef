//! CLIP image/text towers via candle.
//!
//! Loads a ViT-B/32 checkpoint directory (HF layout: tokenizer.json plus
//! model.safetensors or pytorch_model.bin). Outputs from both towers are
//! unit-normalized so downstream cosine similarity is a plain dot product.

use std::path::Path;

use anyhow::{anyhow, Context};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::clip::{ClipConfig, ClipModel};
use image::{imageops::FilterType, RgbImage};
use tokenizers::Tokenizer;

use hikefind_core::error::{Error, Result};
use hikefind_core::traits::ImageTextEmbedder;

use crate::device::select_device;
use crate::l2_normalize;

// Published CLIP preprocessing constants.
const MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];
const STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_11];

pub struct CandleClip {
    model: ClipModel,
    tokenizer: Tokenizer,
    config: ClipConfig,
    device: Device,
}

impl CandleClip {
    pub fn new(model_dir: &Path) -> anyhow::Result<Self> {
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), "loading CLIP checkpoint");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;

        let config = ClipConfig::vit_base_patch32();
        let vb = load_weights(model_dir, &device)?;
        let model = ClipModel::new(vb, &config)?;
        tracing::info!(dim = config.text_config.projection_dim, "CLIP ready");
        Ok(Self { model, tokenizer, config, device })
    }

    fn image_tensor(&self, image: &RgbImage) -> anyhow::Result<Tensor> {
        let side = self.config.image_size;
        let resized = image::DynamicImage::ImageRgb8(image.clone())
            .resize_exact(side as u32, side as u32, FilterType::Triangle)
            .to_rgb8();
        let mut data = vec![0f32; 3 * side * side];
        for (y, row) in resized.rows().enumerate() {
            for (x, pixel) in row.enumerate() {
                for c in 0..3 {
                    data[c * side * side + y * side + x] =
                        (pixel[c] as f32 / 255.0 - MEAN[c]) / STD[c];
                }
            }
        }
        Ok(Tensor::from_vec(data, (1, 3, side, side), &self.device)?)
    }

    fn token_tensor(&self, text: &str) -> anyhow::Result<Tensor> {
        let enc = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("tokenization failed: {}", e))?;
        let mut ids = enc.get_ids().to_vec();
        let max_len = self.config.text_config.max_position_embeddings;
        if ids.len() > max_len {
            ids.truncate(max_len);
        }
        let len = ids.len();
        Ok(Tensor::from_vec(ids, (1, len), &self.device)?)
    }
}

impl ImageTextEmbedder for CandleClip {
    fn dim(&self) -> usize {
        self.config.text_config.projection_dim
    }

    fn embed_image(&self, image: &RgbImage) -> Result<Vec<f32>> {
        if image.width() == 0 || image.height() == 0 {
            return Err(Error::InvalidImage("zero-area image".to_string()));
        }
        let run = || -> anyhow::Result<Vec<f32>> {
            let pixels = self.image_tensor(image)?;
            let features = self.model.get_image_features(&pixels)?;
            Ok(features.squeeze(0)?.to_dtype(DType::F32)?.to_vec1::<f32>()?)
        };
        let mut v = run().map_err(|e| Error::Embedding(e.to_string()))?;
        l2_normalize(&mut v);
        Ok(v)
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let run = || -> anyhow::Result<Vec<f32>> {
            let ids = self.token_tensor(text)?;
            let features = self.model.get_text_features(&ids)?;
            Ok(features.squeeze(0)?.to_dtype(DType::F32)?.to_vec1::<f32>()?)
        };
        let mut v = run().map_err(|e| Error::Embedding(e.to_string()))?;
        l2_normalize(&mut v);
        Ok(v)
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> anyhow::Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        // Safety: the file is mmapped read-only and outlives the builder.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], DType::F32, device)? };
        return Ok(vb);
    }
    let pickle = model_dir.join("pytorch_model.bin");
    if pickle.exists() {
        let weights = candle_core::pickle::read_all(&pickle)
            .with_context(|| format!("reading {}", pickle.display()))?;
        let weights_map: std::collections::HashMap<String, Tensor> =
            weights.into_iter().collect();
        return Ok(VarBuilder::from_tensors(weights_map, DType::F32, device));
    }
    Err(anyhow!(
        "no model.safetensors or pytorch_model.bin under {}",
        model_dir.display()
    ))
}
