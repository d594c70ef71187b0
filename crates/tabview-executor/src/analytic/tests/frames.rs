use tabview_ast::{FrameBound, WindowFrame};

use crate::analytic::frame::{calculate_frame, frames};

#[test]
fn test_whole_partition_without_order() {
    assert_eq!(frames(3, false, None), vec![0..3, 0..3, 0..3]);
}

#[test]
fn test_default_frame_with_order() {
    assert_eq!(frames(3, true, None), vec![0..1, 0..2, 0..3]);
}

#[test]
fn test_unbounded_both_ways() {
    let frame = WindowFrame::between(FrameBound::UnboundedPreceding, FrameBound::UnboundedFollowing);
    assert_eq!(frames(2, true, Some(&frame)), vec![0..2, 0..2]);
}

#[test]
fn test_sliding_frame_is_clamped() {
    let frame = WindowFrame::between(FrameBound::Preceding(1), FrameBound::Following(1));
    assert_eq!(frames(4, true, Some(&frame)), vec![0..2, 0..3, 1..4, 2..4]);
}

#[test]
fn test_start_only_runs_to_current_row() {
    let frame = WindowFrame { start: FrameBound::Preceding(2), end: None };
    assert_eq!(calculate_frame(5, 3, &frame), 1..4);
    assert_eq!(calculate_frame(5, 0, &frame), 0..1);
}

#[test]
fn test_inverted_frame_is_empty() {
    let frame = WindowFrame::between(FrameBound::Following(1), FrameBound::Preceding(1));
    assert!(calculate_frame(5, 2, &frame).is_empty());

    let frame = WindowFrame::between(FrameBound::Following(2), FrameBound::Following(4));
    assert!(calculate_frame(3, 1, &frame).is_empty());
}
