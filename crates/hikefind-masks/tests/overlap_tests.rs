use hikefind_core::types::{MaskStack, OverlapMetric};
use hikefind_masks::{mean_channel_overlap, resize_nearest};

fn stack_from(width: u32, height: u32, planes: Vec<Vec<u8>>) -> MaskStack {
    MaskStack::from_channels(width, height, planes).expect("stack")
}

#[test]
fn iou_is_symmetric_and_one_on_self() {
    let a = stack_from(2, 2, vec![vec![1, 1, 0, 0], vec![0, 0, 1, 0]]);
    let b = stack_from(2, 2, vec![vec![1, 0, 0, 0], vec![0, 1, 1, 0]]);
    let ab = mean_channel_overlap(&a, &b, OverlapMetric::Iou).expect("ab");
    let ba = mean_channel_overlap(&b, &a, OverlapMetric::Iou).expect("ba");
    assert!((ab - ba).abs() < 1e-6);
    let aa = mean_channel_overlap(&a, &a, OverlapMetric::Iou).expect("aa");
    assert!((aa - 1.0).abs() < 1e-6);
}

#[test]
fn empty_channels_score_one_under_both_metrics() {
    let a = MaskStack::zeros(3, 4, 4);
    let b = MaskStack::zeros(3, 4, 4);
    for metric in [OverlapMetric::Iou, OverlapMetric::Dice] {
        let score = mean_channel_overlap(&a, &b, metric).expect("score");
        assert!((score - 1.0).abs() < 1e-6, "{metric:?} gave {score}");
    }
}

#[test]
fn disjoint_channels_score_zero() {
    // Non-empty, completely disjoint single channel.
    let a = stack_from(2, 2, vec![vec![1, 1, 0, 0]]);
    let b = stack_from(2, 2, vec![vec![0, 0, 1, 1]]);
    let iou = mean_channel_overlap(&a, &b, OverlapMetric::Iou).expect("iou");
    assert_eq!(iou, 0.0);
    let dice = mean_channel_overlap(&a, &b, OverlapMetric::Dice).expect("dice");
    assert_eq!(dice, 0.0);
}

#[test]
fn known_iou_and_dice_values() {
    // intersection 1, union 3 -> IOU 1/3; areas 2+2 -> DICE 2/4.
    let a = stack_from(2, 2, vec![vec![1, 1, 0, 0]]);
    let b = stack_from(2, 2, vec![vec![0, 1, 1, 0]]);
    let iou = mean_channel_overlap(&a, &b, OverlapMetric::Iou).expect("iou");
    assert!((iou - 1.0 / 3.0).abs() < 1e-6);
    let dice = mean_channel_overlap(&a, &b, OverlapMetric::Dice).expect("dice");
    assert!((dice - 0.5).abs() < 1e-6);
}

#[test]
fn mean_averages_over_all_channels() {
    // Channel 0 matches perfectly, channel 1 is disjoint -> mean 0.5.
    let a = stack_from(2, 1, vec![vec![1, 0], vec![1, 0]]);
    let b = stack_from(2, 1, vec![vec![1, 0], vec![0, 1]]);
    let score = mean_channel_overlap(&a, &b, OverlapMetric::Iou).expect("score");
    assert!((score - 0.5).abs() < 1e-6);
}

#[test]
fn resize_to_own_dimensions_is_identity() {
    let stack = stack_from(3, 2, vec![vec![1, 0, 1, 0, 1, 0]]);
    let resized = resize_nearest(&stack, 3, 2);
    assert_eq!(resized, stack);
}

#[test]
fn resize_preserves_binary_values() {
    let stack = stack_from(2, 2, vec![vec![1, 0, 0, 1]]);
    let up = resize_nearest(&stack, 7, 5);
    assert_eq!(up.dims(), (7, 5));
    assert!(up.channel(0).iter().all(|&v| v <= 1));
    // Upscale then compare against the original: nearest-neighbor keeps
    // every quadrant's value.
    let score = mean_channel_overlap(&stack, &up, OverlapMetric::Iou).expect("score");
    assert!((score - 1.0).abs() < 1e-6);
}

#[test]
fn differing_dimensions_are_reconciled_to_the_left_stack() {
    let a = stack_from(4, 4, vec![{
        // left half set
        let mut plane = vec![0u8; 16];
        for y in 0..4 {
            plane[y * 4] = 1;
            plane[y * 4 + 1] = 1;
        }
        plane
    }]);
    let b = stack_from(2, 2, vec![vec![1, 0, 1, 0]]);
    let score = mean_channel_overlap(&a, &b, OverlapMetric::Iou).expect("score");
    assert!((score - 1.0).abs() < 1e-6);
}

#[test]
fn channel_count_mismatch_is_an_error() {
    let a = MaskStack::zeros(2, 2, 2);
    let b = MaskStack::zeros(3, 2, 2);
    assert!(mean_channel_overlap(&a, &b, OverlapMetric::Iou).is_err());
}
