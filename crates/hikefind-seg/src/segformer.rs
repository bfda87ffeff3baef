//! SegFormer semantic segmentation via candle.
//!
//! Loads an ADE20K-finetuned checkpoint directory (HF layout: config.json
//! plus model.safetensors or pytorch_model.bin) and produces a per-pixel
//! label-id map at the source image's dimensions.

use std::path::Path;

use anyhow::{anyhow, Context};
use candle_core::{DType, Device, Module, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::segformer;
use image::{imageops::FilterType, RgbImage};

use hikefind_core::error::{Error, Result};
use hikefind_core::traits::Segmenter;
use hikefind_core::types::ClassIdMap;

use crate::device::select_device;

// SegFormer checkpoints are trained on ImageNet-normalized 512px inputs.
const INPUT_SIZE: u32 = 512;
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

pub struct CandleSegformer {
    model: segformer::SemanticSegmentationModel,
    device: Device,
    labels: Vec<(u32, String)>,
}

impl CandleSegformer {
    pub fn new(model_dir: &Path) -> anyhow::Result<Self> {
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), "loading SegFormer checkpoint");

        let config_path = model_dir.join("config.json");
        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("reading {}", config_path.display()))?;
        let config: segformer::Config = serde_json::from_str(&config_str)?;
        let labels = parse_id2label(&config_str)?;

        let vb = load_weights(model_dir, &device)?;
        let model = segformer::SemanticSegmentationModel::new(&config, labels.len(), vb)?;
        tracing::info!(num_labels = labels.len(), "SegFormer ready");
        Ok(Self { model, device, labels })
    }
}

impl Segmenter for CandleSegformer {
    fn segment(&self, image: &RgbImage) -> Result<ClassIdMap> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::InvalidImage("zero-area image".to_string()));
        }
        let low_res = self
            .forward(image)
            .map_err(|e| Error::Segmentation(e.to_string()))?;
        Ok(upsample_nearest(&low_res, width, height))
    }

    fn labels(&self) -> &[(u32, String)] {
        &self.labels
    }
}

impl CandleSegformer {
    /// Run the model and argmax the class logits; the result is at the
    /// model's reduced output resolution, not the source resolution.
    fn forward(&self, image: &RgbImage) -> anyhow::Result<Vec<Vec<u32>>> {
        let resized = image::DynamicImage::ImageRgb8(image.clone()).resize_exact(
            INPUT_SIZE,
            INPUT_SIZE,
            FilterType::Lanczos3,
        );
        let resized = resized.to_rgb8();
        let side = INPUT_SIZE as usize;
        let mut data = vec![0f32; 3 * side * side];
        for (y, row) in resized.rows().enumerate() {
            for (x, pixel) in row.enumerate() {
                for c in 0..3 {
                    data[c * side * side + y * side + x] =
                        (pixel[c] as f32 / 255.0 - MEAN[c]) / STD[c];
                }
            }
        }
        let input = Tensor::from_vec(data, (1, 3, side, side), &self.device)?;
        let logits = self.model.forward(&input)?;
        // (1, num_labels, h, w) -> per-pixel argmax over the label axis
        let map = logits.argmax(1)?.squeeze(0)?.to_dtype(DType::U32)?;
        Ok(map.to_vec2::<u32>()?)
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
        let weights = candle_core::pickle::read_all(&pickle)?;
        let weights_map: std::collections::HashMap<String, Tensor> =
            weights.into_iter().collect();
        return Ok(VarBuilder::from_tensors(weights_map, DType::F32, device));
    }
    Err(anyhow!(
        "no model.safetensors or pytorch_model.bin under {}",
        model_dir.display()
    ))
}

/// Pull the checkpoint's `id2label` table out of config.json.
fn parse_id2label(config_str: &str) -> anyhow::Result<Vec<(u32, String)>> {
    let value: serde_json::Value = serde_json::from_str(config_str)?;
    let table = value
        .get("id2label")
        .and_then(|v| v.as_object())
        .ok_or_else(|| anyhow!("config.json has no id2label table"))?;
    let mut labels = Vec::with_capacity(table.len());
    for (id, name) in table {
        let id: u32 = id.parse().with_context(|| format!("bad label id {id:?}"))?;
        let name = name
            .as_str()
            .ok_or_else(|| anyhow!("label name for id {id} is not a string"))?;
        labels.push((id, name.to_string()));
    }
    labels.sort_by_key(|(id, _)| *id);
    Ok(labels)
}

/// Nearest-neighbor upsample of the low-resolution argmax map back to the
/// source dimensions.
fn upsample_nearest(map: &[Vec<u32>], width: u32, height: u32) -> ClassIdMap {
    let src_h = map.len();
    let src_w = map.first().map(Vec::len).unwrap_or(0);
    let mut ids = Vec::with_capacity((width as usize) * (height as usize));
    for y in 0..height as usize {
        let src_y = (((y as f32 + 0.5) * src_h as f32 / height as f32) as usize).min(src_h - 1);
        for x in 0..width as usize {
            let src_x = (((x as f32 + 0.5) * src_w as f32 / width as f32) as usize).min(src_w - 1);
            ids.push(map[src_y][src_x]);
        }
    }
    // Dimensions are consistent by construction.
    ClassIdMap::new(width, height, ids).unwrap_or_else(|_| {
        unreachable!("upsampled map matches requested dimensions")
    })
}
