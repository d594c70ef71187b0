//! Window frame calculation
//!
//! Frames are ranges of positions within a partition, `start..end`. Bounds
//! outside the partition are clamped; a frame whose start lies past its end
//! is empty.

use std::ops::Range;

use tabview_ast::{FrameBound, WindowFrame};

/// One frame per partition row.
///
/// Without ORDER BY every row sees the whole partition. With ORDER BY and no
/// explicit frame a row sees everything up to and including itself.
pub fn frames(len: usize, ordered: bool, frame: Option<&WindowFrame>) -> Vec<Range<usize>> {
    match (ordered, frame) {
        (false, _) => vec![0..len; len],
        (true, None) => (0..len).map(|i| 0..i + 1).collect(),
        (true, Some(frame)) if is_whole_partition(frame) => vec![0..len; len],
        (true, Some(frame)) => (0..len).map(|i| calculate_frame(len, i, frame)).collect(),
    }
}

fn is_whole_partition(frame: &WindowFrame) -> bool {
    frame.start == FrameBound::UnboundedPreceding && frame.end == Some(FrameBound::UnboundedFollowing)
}

/// Frame of the row at `current` in a partition of `len` rows.
pub fn calculate_frame(len: usize, current: usize, frame: &WindowFrame) -> Range<usize> {
    let end_bound = frame.end.unwrap_or(FrameBound::CurrentRow);
    let start = boundary(frame.start, current, len, true);
    let end = boundary(end_bound, current, len, false);
    start..end.max(start)
}

/// Position of `bound`, clamped to `0..=len`. End positions are exclusive.
fn boundary(bound: FrameBound, current: usize, len: usize, is_start: bool) -> usize {
    let inclusive_end = usize::from(!is_start);
    let pos = match bound {
        FrameBound::UnboundedPreceding => 0,
        FrameBound::UnboundedFollowing => len,
        FrameBound::CurrentRow => current + inclusive_end,
        FrameBound::Preceding(n) => match current.checked_sub(n) {
            Some(pos) => pos + inclusive_end,
            None => 0,
        },
        FrameBound::Following(n) => current.saturating_add(n).saturating_add(inclusive_end),
    };
    pos.min(len)
}
