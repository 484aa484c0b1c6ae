//! Speed/dwell-based trajectory segmentation.
//!
//! A second stay-detection strategy, independent of the tag-based discovery
//! engine: walk the full chronological event sequence, compute the implied
//! point-to-point speed, and cut a new segment whenever the speed exceeds a
//! human-movement limit. A segment is a stay only if the user dwelt in it
//! long enough.

use chrono::NaiveDateTime;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::geo_utils::haversine_distance;
use crate::Event;

/// Tuning for [`segment_by_speed`].
#[derive(Debug, Clone)]
pub struct SpeedConfig {
    /// Speed above which the user is considered moving, in m/s.
    /// Default: 12.5 m/s (45 km/h, an upper bound on urban human transit).
    pub speed_limit: f64,

    /// Correction factor applied to the great-circle distance, which
    /// understates the actual path length. Default: 1.1.
    pub distance_upscale: f64,

    /// Minimum dwell for a candidate segment to count as a stay, in
    /// seconds. Default: 600.
    pub min_dwell_secs: i64,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            speed_limit: 12.5,
            distance_upscale: 1.1,
            min_dwell_secs: 600,
        }
    }
}

/// An inclusive index range `[low, high]` over the event sequence marking
/// one detected stay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayRange {
    pub low: usize,
    pub high: usize,
}

/// One point of the implied-speed time series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedSample {
    pub time: NaiveDateTime,
    pub speed_kmh: f64,
}

/// Detect stays directly from consecutive-point movement.
///
/// Scans events in order, computing the upscaled great-circle distance over
/// the elapsed time between neighbours. A speed above the limit closes the
/// candidate stay `[low, i-1]`, which is emitted only when its dwell
/// duration exceeds `min_dwell_secs`; the scan then restarts at `i`. Pairs
/// with zero distance or zero elapsed time are treated as no movement. The
/// final open range is flushed under the same duration test.
///
/// # Errors
///
/// [`AnalysisError::InvalidInput`] on an empty sequence.
/// [`AnalysisError::TimeOrderingViolation`] when adjacent events are
/// chronologically inverted; the sort precondition was broken upstream, so
/// the scan must not continue.
pub fn segment_by_speed(events: &[Event], config: &SpeedConfig) -> Result<Vec<StayRange>> {
    if events.is_empty() {
        return Err(AnalysisError::invalid_input(
            "cannot segment an empty event sequence",
        ));
    }

    let mut ranges = Vec::new();
    let mut low = 0;

    for i in 1..events.len() {
        let (prev, curr) = (&events[i - 1], &events[i]);
        let shift = haversine_distance(prev.latitude, prev.longitude, curr.latitude, curr.longitude);
        let elapsed = (curr.timestamp - prev.timestamp).num_seconds();
        if elapsed < 0 {
            return Err(AnalysisError::TimeOrderingViolation {
                index: i,
                elapsed_secs: elapsed,
            });
        }
        if shift == 0.0 || elapsed == 0 {
            continue;
        }

        let speed = shift * config.distance_upscale / elapsed as f64;
        if speed > config.speed_limit {
            let dwell = (events[i - 1].timestamp - events[low].timestamp).num_seconds();
            if dwell > config.min_dwell_secs {
                debug!("stay [{low}, {}] dwelt {dwell}s", i - 1);
                ranges.push(StayRange { low, high: i - 1 });
            }
            low = i;
        }
    }

    let last = events.len() - 1;
    let dwell = (events[last].timestamp - events[low].timestamp).num_seconds();
    if dwell > config.min_dwell_secs {
        ranges.push(StayRange { low, high: last });
    }

    Ok(ranges)
}

/// Compute the time-ordered implied-speed table for plotting, in km/h.
///
/// Zero elapsed time yields no sample; inverted timestamps fail the run as
/// in [`segment_by_speed`].
pub fn speed_series(events: &[Event]) -> Result<Vec<SpeedSample>> {
    let mut samples = Vec::new();
    for i in 1..events.len() {
        let (prev, curr) = (&events[i - 1], &events[i]);
        let shift = haversine_distance(prev.latitude, prev.longitude, curr.latitude, curr.longitude);
        let elapsed = (curr.timestamp - prev.timestamp).num_seconds();
        if elapsed < 0 {
            return Err(AnalysisError::TimeOrderingViolation {
                index: i,
                elapsed_secs: elapsed,
            });
        }
        if elapsed == 0 {
            continue;
        }

        samples.push(SpeedSample {
            time: curr.timestamp,
            speed_kmh: 3.6 * shift / elapsed as f64,
        });
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 3, 2)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn ev(t: NaiveDateTime, lon: f64, lat: f64) -> Event {
        Event::new(t, lon, lat, "CELL_1")
    }

    #[test]
    fn test_below_limit_stream_is_one_stay() {
        // Barely drifting for 20 minutes: one stay covering everything
        let events: Vec<Event> = (0..21)
            .map(|i| {
                ev(
                    at(8, 0, 0) + Duration::seconds(i * 60),
                    121.5170 + i as f64 * 1e-6,
                    25.0478,
                )
            })
            .collect();

        let ranges = segment_by_speed(&events, &SpeedConfig::default()).unwrap();
        assert_eq!(ranges, vec![StayRange { low: 0, high: 20 }]);
    }

    #[test]
    fn test_short_dwell_yields_no_stay() {
        // Same stream but only 5 minutes long: under the 600s dwell bar
        let events: Vec<Event> = (0..6)
            .map(|i| {
                ev(
                    at(8, 0, 0) + Duration::seconds(i * 60),
                    121.5170 + i as f64 * 1e-6,
                    25.0478,
                )
            })
            .collect();

        let ranges = segment_by_speed(&events, &SpeedConfig::default()).unwrap();
        assert!(ranges.is_empty());
    }

    #[test]
    fn test_fast_jump_splits_stays() {
        // 15 min near one spot, a fast ~20km jump, 15 min near another
        let mut events: Vec<Event> = (0..16)
            .map(|i| ev(at(8, 0, 0) + Duration::seconds(i * 60), 121.5170, 25.0478))
            .collect();
        events.extend((0..16).map(|i| {
            ev(
                at(8, 20, 0) + Duration::seconds(i * 60),
                121.3170,
                25.0478,
            )
        }));

        let ranges = segment_by_speed(&events, &SpeedConfig::default()).unwrap();
        assert_eq!(
            ranges,
            vec![
                StayRange { low: 0, high: 15 },
                StayRange { low: 16, high: 31 },
            ]
        );
    }

    #[test]
    fn test_zero_distance_and_zero_elapsed_skipped() {
        // Duplicate position and duplicate timestamp must not cut segments
        let events = vec![
            ev(at(8, 0, 0), 121.5170, 25.0478),
            ev(at(8, 0, 0), 121.5170, 25.0478), // duplicate timestamp
            ev(at(8, 10, 0), 121.5170, 25.0478), // same place
            ev(at(8, 20, 0), 121.5170, 25.0478),
        ];

        let ranges = segment_by_speed(&events, &SpeedConfig::default()).unwrap();
        assert_eq!(ranges, vec![StayRange { low: 0, high: 3 }]);
    }

    #[test]
    fn test_inverted_timestamps_are_fatal() {
        let events = vec![
            ev(at(8, 10, 0), 121.5170, 25.0478),
            ev(at(8, 0, 0), 121.5171, 25.0478),
        ];
        let result = segment_by_speed(&events, &SpeedConfig::default());
        assert!(matches!(
            result,
            Err(AnalysisError::TimeOrderingViolation { index: 1, .. })
        ));
    }

    #[test]
    fn test_empty_input_rejected() {
        let result = segment_by_speed(&[], &SpeedConfig::default());
        assert!(matches!(result, Err(AnalysisError::InvalidInput { .. })));
    }

    #[test]
    fn test_speed_series_units_and_skips() {
        // 1 km in 60s is 60 km/h; the duplicate-timestamp pair emits nothing
        let events = vec![
            ev(at(8, 0, 0), 121.5170, 25.0478),
            ev(at(8, 0, 0), 121.5170, 25.0478),
            ev(at(8, 1, 0), 121.5170 + 1.0 / 111.32 / 25.0478f64.to_radians().cos(), 25.0478),
        ];

        let samples = speed_series(&events).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].time, at(8, 1, 0));
        assert!((samples[0].speed_kmh - 60.0).abs() < 1.0);
    }
}
