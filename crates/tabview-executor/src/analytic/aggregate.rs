//! Aggregate functions over window frames
//!
//! Consecutive rows with the same frame share one result, so a frame
//! covering the whole partition is reduced once.

use std::ops::Range;

use tabview_types::Value;

use crate::{
    config::ExecutorConfig,
    errors::Result,
    functions::{distinct_values, AggregateFunction, UserDefinedFunction},
};

/// Built-in aggregate `function` of `values` over each frame.
pub fn aggregate_frames(
    function: AggregateFunction,
    values: &[Value],
    frames: &[Range<usize>],
    distinct: bool,
    separator: &str,
    config: &ExecutorConfig,
) -> Result<Vec<Value>> {
    reduce_frames(values, frames, distinct, config, |list| Ok(function.apply(list, separator, config)))
}

/// User-defined aggregate over each frame. `rest` holds the remaining
/// arguments evaluated for each row.
pub fn user_aggregate_frames(
    function: &UserDefinedFunction,
    values: &[Value],
    rest: &[Vec<Value>],
    frames: &[Range<usize>],
    distinct: bool,
    config: &ExecutorConfig,
) -> Result<Vec<Value>> {
    if let Some(first) = rest.first().filter(|first| rest.iter().all(|args| args == *first)) {
        return reduce_frames(values, frames, distinct, config, |list| function.call_aggregate(list, first));
    }
    frames
        .iter()
        .zip(rest)
        .map(|(frame, args)| {
            let list = frame_values(values, frame.clone(), distinct, config);
            function.call_aggregate(&list, args)
        })
        .collect()
}

fn reduce_frames<F>(
    values: &[Value],
    frames: &[Range<usize>],
    distinct: bool,
    config: &ExecutorConfig,
    reduce: F,
) -> Result<Vec<Value>>
where
    F: Fn(&[Value]) -> Result<Value>,
{
    let mut result: Vec<Value> = Vec::with_capacity(frames.len());
    let mut previous: Option<&Range<usize>> = None;
    for frame in frames {
        let value = match (previous, result.last()) {
            (Some(prev), Some(last)) if prev == frame => last.clone(),
            _ => reduce(&frame_values(values, frame.clone(), distinct, config))?,
        };
        result.push(value);
        previous = Some(frame);
    }
    Ok(result)
}

fn frame_values(values: &[Value], frame: Range<usize>, distinct: bool, config: &ExecutorConfig) -> Vec<Value> {
    let list = values[frame].to_vec();
    if distinct {
        distinct_values(list, config)
    } else {
        list
    }
}
