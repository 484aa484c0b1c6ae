//! Time-segment extraction and interval merging.
//!
//! A stay is a maximal run of same-location events whose spread stays within
//! a gap tolerance. [`time_segments`] cuts a sorted timestamp sequence into
//! such runs; [`merge_intervals`] unions two stay sequences, which is how
//! the discovery engine detects that two locations cover the same place.

use chrono::{Duration, NaiveDateTime};

use crate::error::{AnalysisError, Result};
use crate::TimeInterval;

/// Extract maximal stay intervals from a sorted timestamp sequence.
///
/// The scan keeps an anchor at the first event of the current run: event `i`
/// extends the run while `times[i] - times[anchor] <= tolerance`, otherwise
/// the run closes as `(times[anchor], times[high])` and a new run starts at
/// `i`. Comparing against the anchor rather than the previous element means
/// a slow within-tolerance drift across many events stays one run, while a
/// single large jump always splits. The final run always closes, even when
/// it holds a single event (a zero-duration interval).
///
/// Equal timestamps never split a run. Output order is chronological.
///
/// # Errors
///
/// [`AnalysisError::InvalidInput`] on an empty sequence,
/// [`AnalysisError::InvalidArgument`] on a negative tolerance.
pub fn time_segments(times: &[NaiveDateTime], tolerance: Duration) -> Result<Vec<TimeInterval>> {
    if times.is_empty() {
        return Err(AnalysisError::invalid_input(
            "cannot segment an empty event sequence",
        ));
    }
    if tolerance < Duration::zero() {
        return Err(AnalysisError::invalid_argument("tolerance", tolerance));
    }

    let mut intervals = Vec::new();
    let mut low = 0;
    let mut high = 0;
    for i in 0..times.len() {
        if times[i] - times[low] > tolerance {
            intervals.push(TimeInterval::new(times[low], times[high]));
            low = i;
        }
        high = i;
    }
    intervals.push(TimeInterval::new(times[low], times[high]));

    Ok(intervals)
}

/// Union two sorted, non-overlapping stay sequences into one.
///
/// Classic two-pointer merge by `start`: the candidate with the earlier
/// unconsumed start is taken next; if its start falls within or touches the
/// last emitted interval's end, the two coalesce (the end extends to the
/// later of the two), otherwise it is appended. Once one input is
/// exhausted the other drains through the same coalescing append, so the
/// output is always sorted and pairwise non-overlapping.
///
/// The operation is symmetric, associative, and idempotent on self-merge.
/// Callers detect that the inputs overlap somewhere by observing
/// `merged.len() < a.len() + b.len()`.
pub fn merge_intervals(a: &[TimeInterval], b: &[TimeInterval]) -> Vec<TimeInterval> {
    let mut merged: Vec<TimeInterval> = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);

    while i < a.len() || j < b.len() {
        let take_a = j >= b.len() || (i < a.len() && a[i].start <= b[j].start);
        let next = if take_a {
            i += 1;
            a[i - 1]
        } else {
            j += 1;
            b[j - 1]
        };

        match merged.last_mut() {
            Some(last) if next.start <= last.end => {
                if next.end > last.end {
                    last.end = next.end;
                }
            }
            _ => merged.push(next),
        }
    }

    merged
}
