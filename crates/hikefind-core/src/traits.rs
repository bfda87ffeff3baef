//! Oracle seams. The scoring core only ever sees these traits; any model
//! or service exposing the same contract is substitutable.

use image::RgbImage;

use crate::error::Result;
use crate::types::ClassIdMap;

/// Semantic-segmentation oracle: image in, per-pixel label ids out, plus
/// the static id→name table used to build the taxonomy's synonym mapping.
pub trait Segmenter: Send + Sync {
    fn segment(&self, image: &RgbImage) -> Result<ClassIdMap>;
    fn labels(&self) -> &[(u32, String)];
}

/// Image/text embedding oracle. Both towers must produce vectors in the
/// same space or the cross-modal cosine comparison is meaningless.
pub trait ImageTextEmbedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_image(&self, image: &RgbImage) -> Result<Vec<f32>>;
    fn embed_text(&self, text: &str) -> Result<Vec<f32>>;
}

/// Text-generation oracle turning a sketch plus its detected classes into a
/// short search phrase. Failures are degradable: callers substitute
/// [`crate::FALLBACK_QUERY_PHRASE`] instead of failing the query.
pub trait SketchCaptioner: Send + Sync {
    fn describe(&self, sketch: &RgbImage, detected: &[&str]) -> Result<String>;
}
