//! Priority-driven residential-area discovery.
//!
//! Greedy single pass over location groups ranked by traffic: the busiest
//! group is segmented into stays, and either absorbed into the first
//! existing candidate area whose stay set overlaps it or promoted to a new
//! area. Groups too quiet to ever reach a one-hour stay terminate the scan
//! early, since every remaining group is at most as busy.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use chrono::Duration;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::segments::merge_intervals;
use crate::{EventLog, TimeInterval};

/// Minimum total dwell (seconds) for a group to qualify as residential.
const QUALIFYING_STAY_SECS: i64 = 3600;

/// Map from location tag to discovered area id. A tag absent from the map
/// is unassigned (area id 0).
pub type AreaAssignment = HashMap<String, u32>;

/// One discovered candidate residential area.
///
/// `segments` is kept sorted and pairwise non-overlapping at all times;
/// only [`merge_intervals`] ever updates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateArea {
    /// Positive id, assigned sequentially in discovery order.
    pub id: u32,
    /// Union of the stay intervals of every absorbed location group.
    pub segments: Vec<TimeInterval>,
}

/// Output of one discovery run.
#[derive(Debug, Clone)]
pub struct DiscoveryResult {
    pub assignment: AreaAssignment,
    pub areas: Vec<CandidateArea>,
}

/// Discover candidate residential areas across all location groups.
///
/// `interval` is both the gap tolerance for segment extraction and the
/// granularity of the dwell estimate (`stay_time = segment_count *
/// interval`). The scan order is a max-priority queue on connection count;
/// equal counts pop the lexicographically smaller tag first, so runs are
/// deterministic for a fixed input.
///
/// Per popped group:
/// 1. Terminate discovery when the count cannot reach a one-hour stay even
///    with every connection in its own segment (`count < ceil(3600 /
///    interval)`); remaining counts are no larger.
/// 2. Discard the group when its dwell estimate is at most one hour.
/// 3. Otherwise merge its stays into the first existing area whose merge
///    result is strictly shorter than the concatenation (genuine overlap),
///    or create a new area.
///
/// This greedy absorb-into-first-overlap rule is order-sensitive: areas
/// discovered in a different order could cluster differently. The traffic
/// ranking plus the tag tie-break pins the order down.
///
/// # Errors
///
/// [`AnalysisError::InvalidArgument`] when `interval <= 0`, before any
/// processing begins.
pub fn discover_areas(log: &EventLog, interval: Duration) -> Result<DiscoveryResult> {
    let interval_secs = interval.num_seconds();
    if interval_secs <= 0 {
        return Err(AnalysisError::invalid_argument("interval", interval));
    }
    // ceil(3600 / interval): fewer connections than this cannot span an hour
    let min_connections = (QUALIFYING_STAY_SECS + interval_secs - 1) / interval_secs;

    let mut queue: BinaryHeap<(usize, Reverse<&str>)> = log
        .groups()
        .iter()
        .map(|g| (g.connection_count(), Reverse(g.tag())))
        .collect();

    let mut assignment = AreaAssignment::new();
    let mut areas: Vec<Vec<TimeInterval>> = Vec::new();

    while let Some((count, Reverse(tag))) = queue.pop() {
        if (count as i64) < min_connections {
            debug!(
                "stopping discovery at {tag}: {count} connections cannot reach a 1h stay"
            );
            break;
        }

        let stays = log.time_segments(tag, interval)?;
        let stay_secs = stays.len() as i64 * interval_secs;
        if stay_secs <= QUALIFYING_STAY_SECS {
            debug!("discarding {tag}: estimated dwell {stay_secs}s");
            continue;
        }

        let mut absorbed = None;
        for (idx, area) in areas.iter_mut().enumerate() {
            let merged = merge_intervals(&stays, area);
            if merged.len() < stays.len() + area.len() {
                *area = merged;
                absorbed = Some(idx as u32 + 1);
                break;
            }
        }

        let id = absorbed.unwrap_or_else(|| {
            areas.push(stays);
            areas.len() as u32
        });
        debug!("assigning {tag} ({count} connections, ~{stay_secs}s dwell) to area {id}");
        assignment.insert(tag.to_string(), id);
    }

    let areas = areas
        .into_iter()
        .enumerate()
        .map(|(i, segments)| CandidateArea {
            id: i as u32 + 1,
            segments,
        })
        .collect();

    Ok(DiscoveryResult { assignment, areas })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Event;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 3, 2)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    /// `count` events for `tag`, one every `step_secs`, starting at `start`.
    fn burst(tag: &str, start: NaiveDateTime, count: i64, step_secs: i64) -> Vec<Event> {
        (0..count)
            .map(|i| {
                Event::new(
                    start + Duration::seconds(i * step_secs),
                    121.51,
                    25.04,
                    tag,
                )
            })
            .collect()
    }

    #[test]
    fn test_invalid_interval_rejected() {
        let log = EventLog::from_events(burst("CELL_1", at(0, 0, 0), 3, 60)).unwrap();
        assert!(matches!(
            discover_areas(&log, Duration::zero()),
            Err(AnalysisError::InvalidArgument { .. })
        ));
        assert!(matches!(
            discover_areas(&log, Duration::seconds(-5)),
            Err(AnalysisError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_no_repeated_traffic_yields_no_areas() {
        let events = vec![
            Event::new(at(8, 0, 0), 121.51, 25.04, "CELL_1"),
            Event::new(at(8, 5, 0), 121.52, 25.05, "CELL_2"),
            Event::new(at(8, 10, 0), 121.53, 25.06, "CELL_3"),
        ];
        let log = EventLog::from_events(events).unwrap();
        let result = discover_areas(&log, Duration::seconds(1)).unwrap();
        assert!(result.areas.is_empty());
        assert!(result.assignment.is_empty());
    }

    #[test]
    fn test_short_stay_discarded() {
        // 3 segments * 900s = 2700s dwell estimate, under the 1h bar; the
        // count bar ceil(3600/900) = 4 is met, so the group is popped and
        // then discarded rather than terminating the scan.
        let mut events = burst("CELL_1", at(8, 0, 0), 2, 60);
        events.extend(burst("CELL_1", at(10, 0, 0), 2, 60));
        events.extend(burst("CELL_1", at(12, 0, 0), 2, 60));
        let log = EventLog::from_events(events).unwrap();

        let result = discover_areas(&log, Duration::seconds(900)).unwrap();
        assert!(result.areas.is_empty());
    }

    #[test]
    fn test_qualifying_group_creates_area() {
        // 30 isolated events, each its own segment: 30 * 180s = 5400s dwell
        let log = EventLog::from_events(burst("CELL_1", at(0, 0, 0), 30, 600)).unwrap();
        let result = discover_areas(&log, Duration::seconds(180)).unwrap();

        assert_eq!(result.areas.len(), 1);
        assert_eq!(result.areas[0].id, 1);
        assert_eq!(result.assignment.get("CELL_1"), Some(&1));
    }

    #[test]
    fn test_overlapping_groups_share_an_area() {
        // Two cells serving the same spot log the same connection times, so
        // their stay sets overlap and the second absorbs into the first's
        // area.
        let mut events = burst("CELL_1", at(0, 0, 0), 30, 600);
        events.extend(burst("CELL_2", at(0, 0, 0), 25, 600));
        let log = EventLog::from_events(events).unwrap();

        let result = discover_areas(&log, Duration::seconds(180)).unwrap();
        assert_eq!(result.areas.len(), 1);
        assert_eq!(result.assignment.get("CELL_1"), Some(&1));
        assert_eq!(result.assignment.get("CELL_2"), Some(&1));
    }

    #[test]
    fn test_disjoint_groups_get_distinct_areas() {
        // Day residence and night residence never overlap in time
        let mut events = burst("CELL_1", at(0, 0, 0), 30, 600); // 00:00-04:50
        events.extend(burst("CELL_2", at(12, 0, 0), 25, 600)); // 12:00-16:00
        let log = EventLog::from_events(events).unwrap();

        let result = discover_areas(&log, Duration::seconds(180)).unwrap();
        assert_eq!(result.areas.len(), 2);
        // CELL_1 is busier, so it is popped first and takes area 1
        assert_eq!(result.assignment.get("CELL_1"), Some(&1));
        assert_eq!(result.assignment.get("CELL_2"), Some(&2));

        // No tag maps to two ids, and each area's segments stay disjoint
        for area in &result.areas {
            for pair in area.segments.windows(2) {
                assert!(pair[0].end < pair[1].start);
            }
        }
    }

    #[test]
    fn test_equal_traffic_tie_breaks_lexicographically() {
        let mut events = burst("CELL_B", at(0, 0, 0), 25, 600);
        events.extend(burst("CELL_A", at(12, 0, 0), 25, 600));
        let log = EventLog::from_events(events).unwrap();

        let result = discover_areas(&log, Duration::seconds(180)).unwrap();
        assert_eq!(result.assignment.get("CELL_A"), Some(&1));
        assert_eq!(result.assignment.get("CELL_B"), Some(&2));
    }

    #[test]
    fn test_low_traffic_terminates_scan() {
        // interval 180 → need ceil(3600/180) = 20 connections to qualify
        let log = EventLog::from_events(burst("CELL_1", at(0, 0, 0), 19, 600)).unwrap();
        let result = discover_areas(&log, Duration::seconds(180)).unwrap();
        assert!(result.areas.is_empty());
    }
}
