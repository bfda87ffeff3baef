//! Compositional scorer: mean per-channel set overlap between two mask
//! stacks.

use hikefind_core::error::{Error, Result};
use hikefind_core::types::{MaskStack, OverlapMetric};

/// Resize a stack's grids to the given dimensions with nearest-neighbor
/// sampling. Nearest-neighbor is the only acceptable policy here: any
/// averaging filter would produce non-binary values.
pub fn resize_nearest(stack: &MaskStack, width: u32, height: u32) -> MaskStack {
    if stack.dims() == (width, height) {
        return stack.clone();
    }
    let (sw, sh) = (stack.width() as f32, stack.height() as f32);
    let sx = sw / width as f32;
    let sy = sh / height as f32;
    let mut out = MaskStack::zeros(stack.num_channels(), width, height);
    for channel in 0..stack.num_channels() {
        let src = stack.channel(channel);
        let dst = out.channel_mut(channel);
        for y in 0..height as usize {
            let src_y = (((y as f32 + 0.5) * sy) as usize).min(stack.height() as usize - 1);
            for x in 0..width as usize {
                let src_x = (((x as f32 + 0.5) * sx) as usize).min(stack.width() as usize - 1);
                dst[y * width as usize + x] = src[src_y * stack.width() as usize + src_x];
            }
        }
    }
    out
}

/// Mean per-channel overlap between two stacks, in [0, 1].
///
/// `b` is resized to `a`'s dimensions first. Per channel, an empty/empty
/// pair scores 1.0 (perfect agreement by convention). The unweighted mean
/// gives every class equal say regardless of pixel area, so a small class
/// counts as much as a dominant one.
pub fn mean_channel_overlap(a: &MaskStack, b: &MaskStack, metric: OverlapMetric) -> Result<f32> {
    if a.num_channels() != b.num_channels() {
        return Err(Error::ChannelMismatch { left: a.num_channels(), right: b.num_channels() });
    }
    if a.num_channels() == 0 {
        return Ok(0.0);
    }
    let b = resize_nearest(b, a.width(), a.height());
    let mut total = 0.0f64;
    for channel in 0..a.num_channels() {
        total += channel_overlap(a.channel(channel), b.channel(channel), metric);
    }
    Ok((total / a.num_channels() as f64) as f32)
}

fn channel_overlap(a: &[u8], b: &[u8], metric: OverlapMetric) -> f64 {
    let mut intersection = 0u64;
    let mut area_a = 0u64;
    let mut area_b = 0u64;
    for (&va, &vb) in a.iter().zip(b.iter()) {
        intersection += u64::from(va & vb);
        area_a += u64::from(va);
        area_b += u64::from(vb);
    }
    match metric {
        OverlapMetric::Iou => {
            let union = area_a + area_b - intersection;
            if union == 0 {
                1.0
            } else {
                intersection as f64 / union as f64
            }
        }
        OverlapMetric::Dice => {
            let sum = area_a + area_b;
            if sum == 0 {
                1.0
            } else {
                2.0 * intersection as f64 / sum as f64
            }
        }
    }
}
