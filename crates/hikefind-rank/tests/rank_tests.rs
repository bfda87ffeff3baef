use hikefind_core::types::{CorpusItem, MaskStack, OverlapMetric};
use hikefind_rank::{cosine_similarity, rank, RankWeights};

fn item(id: &str, mask_plane: Vec<u8>, embedding: Vec<f32>) -> CorpusItem {
    CorpusItem {
        id: id.to_string(),
        mask_stack: MaskStack::from_channels(2, 2, vec![mask_plane]).expect("stack"),
        embedding,
    }
}

#[test]
fn cosine_is_scale_invariant() {
    let v = vec![0.5, -1.0, 2.0];
    let scaled: Vec<f32> = v.iter().map(|x| x * 7.5).collect();
    assert!((cosine_similarity(&v, &v).expect("cos") - 1.0).abs() < 1e-6);
    assert!((cosine_similarity(&v, &scaled).expect("cos") - 1.0).abs() < 1e-6);
}

#[test]
fn cosine_rejects_zero_norm_vectors() {
    let v = vec![1.0, 2.0];
    let zero = vec![0.0, 0.0];
    assert!(matches!(
        cosine_similarity(&v, &zero),
        Err(hikefind_core::error::Error::DegenerateVector)
    ));
    assert!(cosine_similarity(&zero, &v).is_err());
}

#[test]
fn cosine_of_opposite_vectors_is_minus_one() {
    let v = vec![1.0, -2.0, 3.0];
    let neg: Vec<f32> = v.iter().map(|x| -x).collect();
    assert!((cosine_similarity(&v, &neg).expect("cos") + 1.0).abs() < 1e-6);
}

#[test]
fn ranking_orders_by_combined_score() {
    let query_mask = MaskStack::from_channels(2, 2, vec![vec![1, 1, 0, 0]]).expect("stack");
    let query_vec = vec![1.0, 0.0];
    let corpus = vec![
        // Perfect mask match, orthogonal embedding.
        item("composed", vec![1, 1, 0, 0], vec![0.0, 1.0]),
        // Disjoint mask, identical embedding.
        item("pretty", vec![0, 0, 1, 1], vec![1.0, 0.0]),
    ];
    let results = rank(
        &query_mask,
        &query_vec,
        &corpus,
        OverlapMetric::Iou,
        RankWeights::default(),
        5,
    )
    .expect("rank");
    // 0.7 * 1.0 beats 0.3 * 1.0 under the default weights.
    assert_eq!(results[0].id, "composed");
    assert!((results[0].combined_score - 0.7).abs() < 1e-6);
    assert!((results[1].combined_score - 0.3).abs() < 1e-6);
}

#[test]
fn ranking_is_deterministic_and_ties_keep_corpus_order() {
    let query_mask = MaskStack::from_channels(2, 2, vec![vec![1, 0, 0, 0]]).expect("stack");
    let query_vec = vec![1.0, 1.0];
    // Identical items tie exactly; the stable sort must keep input order.
    let corpus = vec![
        item("first", vec![1, 0, 0, 0], vec![1.0, 1.0]),
        item("second", vec![1, 0, 0, 0], vec![1.0, 1.0]),
        item("third", vec![1, 0, 0, 0], vec![1.0, 1.0]),
    ];
    for _ in 0..3 {
        let results = rank(
            &query_mask,
            &query_vec,
            &corpus,
            OverlapMetric::Iou,
            RankWeights::default(),
            10,
        )
        .expect("rank");
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }
}

#[test]
fn top_k_larger_than_corpus_returns_whole_corpus() {
    let query_mask = MaskStack::from_channels(2, 2, vec![vec![1, 0, 0, 0]]).expect("stack");
    let corpus = vec![item("only", vec![1, 0, 0, 0], vec![0.5, 0.5])];
    let results = rank(
        &query_mask,
        &[1.0, 0.0],
        &corpus,
        OverlapMetric::Iou,
        RankWeights::default(),
        100,
    )
    .expect("rank");
    assert_eq!(results.len(), 1);
}

#[test]
fn top_k_truncates_longer_result_lists() {
    let query_mask = MaskStack::from_channels(2, 2, vec![vec![1, 0, 0, 0]]).expect("stack");
    let corpus: Vec<CorpusItem> = (0..8)
        .map(|i| item(&format!("item{i}"), vec![1, 0, 0, 0], vec![1.0, i as f32]))
        .collect();
    let results = rank(
        &query_mask,
        &[1.0, 0.0],
        &corpus,
        OverlapMetric::Iou,
        RankWeights::default(),
        3,
    )
    .expect("rank");
    assert_eq!(results.len(), 3);
    // item0's embedding aligns best with the query vector.
    assert_eq!(results[0].id, "item0");
}

#[test]
fn raising_comp_weight_never_demotes_a_compositionally_dominant_item() {
    let query_mask = MaskStack::from_channels(2, 2, vec![vec![1, 1, 0, 0]]).expect("stack");
    let query_vec = vec![1.0, 0.0];
    // Same aesthetic score, strictly better composition for "dominant".
    let corpus = vec![
        item("weaker", vec![0, 1, 1, 0], vec![1.0, 0.0]),
        item("dominant", vec![1, 1, 0, 0], vec![1.0, 0.0]),
    ];
    for comp_weight in [0.1f32, 0.5, 0.7, 0.9] {
        let results = rank(
            &query_mask,
            &query_vec,
            &corpus,
            OverlapMetric::Iou,
            RankWeights { compositional: comp_weight, aesthetic: 0.3 },
            10,
        )
        .expect("rank");
        assert_eq!(results[0].id, "dominant", "weight_comp={comp_weight}");
    }
}

#[test]
fn sparse_sketch_scores_one_against_matching_sparse_item() {
    // Only one channel is populated on either side; every other channel is
    // empty/empty and scores 1.0 by convention, so the mean is 1.0.
    let channels = 9;
    let mut query = MaskStack::zeros(channels, 2, 2);
    query.channel_mut(0).copy_from_slice(&[1, 1, 1, 1]);
    let mut stored = MaskStack::zeros(channels, 2, 2);
    stored.channel_mut(0).copy_from_slice(&[1, 1, 1, 1]);
    let corpus = vec![CorpusItem {
        id: "skyful".to_string(),
        mask_stack: stored,
        embedding: vec![1.0, 0.0],
    }];
    let results = rank(
        &query,
        &[1.0, 0.0],
        &corpus,
        OverlapMetric::Iou,
        RankWeights::default(),
        5,
    )
    .expect("rank");
    assert!((results[0].compositional_score - 1.0).abs() < 1e-6);
    assert!((results[0].combined_score - 1.0).abs() < 1e-6);
}
