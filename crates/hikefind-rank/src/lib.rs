//! hikefind-rank
//!
//! The aesthetic scorer, the weighted ranking engine, and the query-side
//! facade composing rasterizer + captioner + embedder over the in-memory
//! corpus. The matching loop is an exhaustive linear scan with no index
//! structure; that is acceptable at hundreds to low thousands of items and
//! a known limitation beyond that.

use image::RgbImage;

use hikefind_core::error::{Error, Result};
use hikefind_core::taxonomy::Taxonomy;
use hikefind_core::traits::{ImageTextEmbedder, SketchCaptioner};
use hikefind_core::types::{CorpusItem, MaskStack, OverlapMetric, ScoredCandidate};
use hikefind_core::FALLBACK_QUERY_PHRASE;
use hikefind_masks::{decode_sketch, from_color_sketch, mean_channel_overlap};

/// Cosine similarity between two embedding vectors, in [-1, 1].
///
/// Rejects zero-norm input distinctly so callers can tell "no data" from a
/// service failure.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    assert_eq!(a.len(), b.len(), "embedding dimensions must match");
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(Error::DegenerateVector);
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    Ok(dot / (norm_a * norm_b))
}

/// Fixed score weights; defaults favor composition over appearance.
#[derive(Debug, Clone, Copy)]
pub struct RankWeights {
    pub compositional: f32,
    pub aesthetic: f32,
}

impl Default for RankWeights {
    fn default() -> Self {
        Self { compositional: 0.7, aesthetic: 0.3 }
    }
}

/// Score every corpus item against the query pair and return the top-k.
///
/// The sort is stable and descending on the combined score, so ties keep
/// their original corpus order; the result length is `min(top_k, corpus)`.
pub fn rank(
    query_mask: &MaskStack,
    query_vector: &[f32],
    corpus: &[CorpusItem],
    metric: OverlapMetric,
    weights: RankWeights,
    top_k: usize,
) -> Result<Vec<ScoredCandidate>> {
    let mut scored = Vec::with_capacity(corpus.len());
    for item in corpus {
        let compositional = mean_channel_overlap(query_mask, &item.mask_stack, metric)?;
        let aesthetic = cosine_similarity(query_vector, &item.embedding)?;
        scored.push(ScoredCandidate {
            id: item.id.clone(),
            compositional_score: compositional,
            aesthetic_score: aesthetic,
            combined_score: weights.compositional * compositional + weights.aesthetic * aesthetic,
        });
    }
    scored.sort_by(|a, b| {
        b.combined_score
            .partial_cmp(&a.combined_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(top_k);
    Ok(scored)
}

/// Everything a query produces besides the ranking itself.
#[derive(Debug)]
pub struct QueryOutcome {
    pub candidates: Vec<ScoredCandidate>,
    pub caption: String,
    pub detected: Vec<&'static str>,
}

/// Query-side engine: owns the oracles and the read-only corpus.
pub struct SketchSearchEngine {
    captioner: Box<dyn SketchCaptioner>,
    embedder: Box<dyn ImageTextEmbedder>,
    taxonomy: Taxonomy,
    corpus: Vec<CorpusItem>,
    metric: OverlapMetric,
    weights: RankWeights,
    top_k: usize,
    min_pixel_count: u32,
}

impl SketchSearchEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        captioner: Box<dyn SketchCaptioner>,
        embedder: Box<dyn ImageTextEmbedder>,
        taxonomy: Taxonomy,
        corpus: Vec<CorpusItem>,
        metric: OverlapMetric,
        weights: RankWeights,
        top_k: usize,
        min_pixel_count: u32,
    ) -> Self {
        Self { captioner, embedder, taxonomy, corpus, metric, weights, top_k, min_pixel_count }
    }

    pub fn corpus_len(&self) -> usize {
        self.corpus.len()
    }

    /// Run the full query path on an undecoded sketch upload.
    pub fn query_bytes(&self, bytes: &[u8]) -> Result<QueryOutcome> {
        let sketch = decode_sketch(bytes)?;
        self.query_image(&sketch)
    }

    /// Rasterize the sketch, derive a text query (degrading to the
    /// fallback phrase on caption failure), embed it, and rank the corpus.
    pub fn query_image(&self, sketch: &RgbImage) -> Result<QueryOutcome> {
        let (query_mask, detected) =
            from_color_sketch(sketch, &self.taxonomy, self.min_pixel_count)?;

        let caption = match self.captioner.describe(sketch, &detected) {
            Ok(caption) => caption,
            Err(e) => {
                tracing::warn!(error = %e, "caption oracle failed, using fallback phrase");
                FALLBACK_QUERY_PHRASE.to_string()
            }
        };

        let query_vector = self.embedder.embed_text(&caption)?;
        let candidates = rank(
            &query_mask,
            &query_vector,
            &self.corpus,
            self.metric,
            self.weights,
            self.top_k,
        )?;
        tracing::info!(results = candidates.len(), caption = %caption, "query complete");
        Ok(QueryOutcome { candidates, caption, detected })
    }
}
