//! Mask rasterizer: two entry points sharing one output shape.
//!
//! `from_class_map` turns the segmentation oracle's per-pixel label ids
//! into one binary channel per scored taxonomy class. `from_color_sketch`
//! does the same for a hand-drawn sketch by exact palette-color equality —
//! anti-aliased or re-encoded sketches silently produce empty masks, so
//! callers must supply exact palette colors.

use std::collections::HashSet;

use image::RgbImage;

use hikefind_core::error::{Error, Result};
use hikefind_core::taxonomy::Taxonomy;
use hikefind_core::types::{ClassIdMap, MaskStack};

/// Decode an uploaded sketch into RGB, rejecting undecodable or zero-area
/// input as `InvalidImage`.
pub fn decode_sketch(bytes: &[u8]) -> Result<RgbImage> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| Error::InvalidImage(e.to_string()))?
        .to_rgb8();
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::InvalidImage("zero-area image".to_string()));
    }
    Ok(image)
}

/// Rasterize an oracle class-id map into a mask stack.
///
/// `class_ids[i]` is the set of oracle label ids belonging to scored
/// channel `i` (see [`Taxonomy::map_oracle_labels`]). Ids claimed by no
/// channel are left out of every scored mask.
pub fn from_class_map(map: &ClassIdMap, class_ids: &[HashSet<u32>]) -> MaskStack {
    let mut stack = MaskStack::zeros(class_ids.len(), map.width(), map.height());
    for (channel, ids) in class_ids.iter().enumerate() {
        if ids.is_empty() {
            continue;
        }
        let plane = stack.channel_mut(channel);
        for (i, id) in map.ids().iter().enumerate() {
            if ids.contains(id) {
                plane[i] = 1;
            }
        }
    }
    stack
}

/// Rasterize a color-coded sketch into a mask stack, reporting which
/// classes were detected.
///
/// A pixel belongs to a channel iff its RGB exactly equals that class's
/// display color; a class is detected iff its pixel count strictly exceeds
/// `min_pixel_count`.
pub fn from_color_sketch(
    image: &RgbImage,
    taxonomy: &Taxonomy,
    min_pixel_count: u32,
) -> Result<(MaskStack, Vec<&'static str>)> {
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::InvalidImage("zero-area sketch".to_string()));
    }
    let mut stack = MaskStack::zeros(taxonomy.num_channels(), image.width(), image.height());
    let mut detected = Vec::new();
    for (channel, class) in taxonomy.scored().iter().enumerate() {
        let mut count = 0u32;
        let plane = stack.channel_mut(channel);
        for (i, pixel) in image.pixels().enumerate() {
            if pixel.0 == class.display_color {
                plane[i] = 1;
                count += 1;
            }
        }
        if count > min_pixel_count {
            detected.push(class.name);
        }
    }
    tracing::debug!(classes = ?detected, "sketch rasterized");
    Ok((stack, detected))
}
