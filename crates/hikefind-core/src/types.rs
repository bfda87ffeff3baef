//! Domain types shared by the rasterizer, scorers, store, and server.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Per-pixel oracle label ids for one image, row-major, dimensions equal to
/// the source image's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassIdMap {
    width: u32,
    height: u32,
    ids: Vec<u32>,
}

impl ClassIdMap {
    pub fn new(width: u32, height: u32, ids: Vec<u32>) -> Result<Self> {
        if ids.len() != (width as usize) * (height as usize) {
            return Err(Error::InvalidImage(format!(
                "class map has {} ids for {}x{} pixels",
                ids.len(),
                width,
                height
            )));
        }
        Ok(Self { width, height, ids })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn get(&self, x: u32, y: u32) -> u32 {
        self.ids[(y as usize) * (self.width as usize) + (x as usize)]
    }
}

/// Ordered set of per-class binary occupancy grids over one image.
///
/// Channels follow the fixed taxonomy order and all share one set of
/// dimensions; values are 0 or 1. Stacks being compared may differ in
/// dimensions and are reconciled by nearest-neighbor resize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskStack {
    width: u32,
    height: u32,
    channels: Vec<Vec<u8>>,
}

impl MaskStack {
    pub fn zeros(num_channels: usize, width: u32, height: u32) -> Self {
        let plane = (width as usize) * (height as usize);
        Self { width, height, channels: vec![vec![0u8; plane]; num_channels] }
    }

    pub fn from_channels(width: u32, height: u32, channels: Vec<Vec<u8>>) -> Result<Self> {
        let plane = (width as usize) * (height as usize);
        if channels.iter().any(|c| c.len() != plane) {
            return Err(Error::InvalidImage(format!(
                "mask channel size does not match {}x{} grid",
                width, height
            )));
        }
        Ok(Self { width, height, channels })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dims(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn channel(&self, i: usize) -> &[u8] {
        &self.channels[i]
    }

    pub fn channel_mut(&mut self, i: usize) -> &mut [u8] {
        &mut self.channels[i]
    }

    /// Count of set pixels in one channel.
    pub fn channel_area(&self, i: usize) -> u64 {
        self.channels[i].iter().map(|&v| u64::from(v)).sum()
    }
}

/// One indexed corpus image: identifier, compositional signature, and
/// aesthetic signature. Read-only after the indexer writes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusItem {
    pub id: String,
    pub mask_stack: MaskStack,
    pub embedding: Vec<f32>,
}

/// Per-query scoring result for one corpus item.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    pub id: String,
    /// Mean per-channel overlap, in [0, 1].
    pub compositional_score: f32,
    /// Cosine similarity, in [-1, 1].
    pub aesthetic_score: f32,
    pub combined_score: f32,
}

/// Set-overlap metric for the compositional scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapMetric {
    Iou,
    Dice,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_map_rejects_wrong_length() {
        assert!(ClassIdMap::new(3, 2, vec![0; 5]).is_err());
        let map = ClassIdMap::new(3, 2, vec![7; 6]).expect("map");
        assert_eq!(map.get(2, 1), 7);
    }

    #[test]
    fn mask_stack_channels_share_dimensions() {
        let stack = MaskStack::zeros(3, 4, 2);
        assert_eq!(stack.num_channels(), 3);
        assert_eq!(stack.dims(), (4, 2));
        assert!(MaskStack::from_channels(2, 2, vec![vec![0; 4], vec![0; 3]]).is_err());
    }
}
