//! hikefind-masks
//!
//! The compositional half of the scoring core: rasterizing class-id maps
//! and color-coded sketches into binary mask stacks, and comparing stacks
//! with a per-channel set-overlap metric.

pub mod overlap;
pub mod rasterize;
pub mod visualize;

pub use overlap::{mean_channel_overlap, resize_nearest};
pub use rasterize::{decode_sketch, from_class_map, from_color_sketch};
pub use visualize::render_class_map;
