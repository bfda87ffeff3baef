use image::{Rgb, RgbImage};

use hikefind_core::error::{Error, Result};
use hikefind_core::taxonomy::Taxonomy;
use hikefind_core::traits::{ImageTextEmbedder, SketchCaptioner};
use hikefind_core::types::{CorpusItem, MaskStack, OverlapMetric};
use hikefind_core::FALLBACK_QUERY_PHRASE;
use hikefind_rank::{RankWeights, SketchSearchEngine};

struct EchoCaptioner;

impl SketchCaptioner for EchoCaptioner {
    fn describe(&self, _sketch: &RgbImage, detected: &[&str]) -> Result<String> {
        Ok(format!("sketch of {}", detected.join(" and ")))
    }
}

struct FailingCaptioner;

impl SketchCaptioner for FailingCaptioner {
    fn describe(&self, _sketch: &RgbImage, _detected: &[&str]) -> Result<String> {
        Err(Error::Caption("service unreachable".to_string()))
    }
}

/// Embeds any text as a constant unit vector so ranking is exercised
/// without caring about the phrase.
struct ConstantEmbedder;

impl ImageTextEmbedder for ConstantEmbedder {
    fn dim(&self) -> usize {
        2
    }

    fn embed_image(&self, _image: &RgbImage) -> Result<Vec<f32>> {
        Ok(vec![1.0, 0.0])
    }

    fn embed_text(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0, 0.0])
    }
}

fn sky_sketch(taxonomy: &Taxonomy) -> RgbImage {
    let sky = taxonomy.scored()[0].display_color;
    let mut image = RgbImage::from_pixel(20, 20, Rgb([0, 0, 0]));
    for y in 0..10 {
        for x in 0..20 {
            image.put_pixel(x, y, Rgb(sky));
        }
    }
    image
}

fn sky_item(taxonomy: &Taxonomy, id: &str) -> CorpusItem {
    let mut stack = MaskStack::zeros(taxonomy.num_channels(), 20, 20);
    for y in 0..10usize {
        for x in 0..20usize {
            stack.channel_mut(0)[y * 20 + x] = 1;
        }
    }
    CorpusItem { id: id.to_string(), mask_stack: stack, embedding: vec![1.0, 0.0] }
}

fn engine(
    captioner: Box<dyn SketchCaptioner>,
    corpus: Vec<CorpusItem>,
    top_k: usize,
) -> SketchSearchEngine {
    SketchSearchEngine::new(
        captioner,
        Box::new(ConstantEmbedder),
        Taxonomy::landscape(),
        corpus,
        OverlapMetric::Iou,
        RankWeights::default(),
        top_k,
        100,
    )
}

#[test]
fn full_query_path_ranks_the_matching_item_first() {
    let taxonomy = Taxonomy::landscape();
    let corpus = vec![sky_item(&taxonomy, "match")];
    let engine = engine(Box::new(EchoCaptioner), corpus, 5);
    let outcome = engine.query_image(&sky_sketch(&taxonomy)).expect("query");
    assert_eq!(outcome.detected, vec!["SKY"]);
    assert_eq!(outcome.caption, "sketch of SKY");
    assert_eq!(outcome.candidates.len(), 1);
    // Sky channel matches exactly and the other channels are empty/empty.
    assert!((outcome.candidates[0].compositional_score - 1.0).abs() < 1e-6);
}

#[test]
fn caption_failure_degrades_to_the_fallback_phrase() {
    let taxonomy = Taxonomy::landscape();
    let corpus = vec![sky_item(&taxonomy, "match")];
    let engine = engine(Box::new(FailingCaptioner), corpus, 5);
    let outcome = engine.query_image(&sky_sketch(&taxonomy)).expect("query");
    assert_eq!(outcome.caption, FALLBACK_QUERY_PHRASE);
    assert_eq!(outcome.candidates.len(), 1);
}

#[test]
fn invalid_sketch_bytes_fail_the_whole_query() {
    let engine = engine(Box::new(EchoCaptioner), Vec::new(), 5);
    let err = engine.query_bytes(b"garbage").expect_err("must fail");
    assert!(matches!(err, Error::InvalidImage(_)));
}

#[test]
fn query_against_empty_corpus_returns_no_candidates() {
    let taxonomy = Taxonomy::landscape();
    let engine = engine(Box::new(EchoCaptioner), Vec::new(), 5);
    let outcome = engine.query_image(&sky_sketch(&taxonomy)).expect("query");
    assert!(outcome.candidates.is_empty());
}
