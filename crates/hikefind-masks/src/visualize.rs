//! Debug visualization: colorize a class-id map with the taxonomy palette.

use std::collections::HashSet;

use image::RgbImage;

use hikefind_core::taxonomy::Taxonomy;
use hikefind_core::types::ClassIdMap;

/// Render a class-id map as an RGB image, painting each pixel with the
/// display color of the scored class claiming its label id, or the
/// catch-all color for unclaimed ids.
pub fn render_class_map(
    map: &ClassIdMap,
    taxonomy: &Taxonomy,
    class_ids: &[HashSet<u32>],
) -> RgbImage {
    let catch_all = taxonomy.catch_all_color();
    let mut out = RgbImage::new(map.width(), map.height());
    for (i, pixel) in out.pixels_mut().enumerate() {
        let id = map.ids()[i];
        let color = class_ids
            .iter()
            .position(|ids| ids.contains(&id))
            .map(|channel| taxonomy.scored()[channel].display_color)
            .unwrap_or(catch_all);
        pixel.0 = color;
    }
    out
}
