//! # Residence Finder
//!
//! Residential-area inference from geotagged connection logs.
//!
//! This library takes a time-ordered log of connection events, each tagged
//! with a discrete location identifier (e.g. a serving cell), and infers the
//! small number of areas where the user plausibly resides. It provides:
//!
//! - Event aggregation by location tag with traffic ranking
//! - Gap-tolerant time-segment extraction of contiguous stays
//! - Priority-driven area discovery that merges overlapping stay intervals
//! - An independent speed/dwell trajectory segmentation
//! - Midpoint estimation per area (spherical center of gravity or
//!   arithmetic average) with distance-distribution summaries
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{Duration, NaiveDate};
//! use residence_finder::{Event, EventLog};
//!
//! let day = NaiveDate::from_ymd_opt(2020, 3, 2).unwrap();
//! let events: Vec<Event> = (0..40)
//!     .map(|i| {
//!         let at = day.and_hms_opt(8, 0, 0).unwrap() + Duration::seconds(i * 240);
//!         Event::new(at, 121.5170, 25.0478, "CELL_133")
//!     })
//!     .collect();
//!
//! let mut log = EventLog::from_events(events).unwrap();
//! let result = log.discover_areas(Duration::seconds(180)).unwrap();
//! log.apply_assignment(&result.assignment);
//!
//! assert_eq!(result.areas.len(), 1);
//! assert!(log.events().iter().all(|e| e.area_id == 1));
//! ```

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{AnalysisError, Result};

// Great-circle distance and spherical vector math
pub mod geo_utils;

// Time-segment extraction and interval merging
pub mod segments;
pub use segments::{merge_intervals, time_segments};

// Priority-driven residential-area discovery
pub mod discovery;
pub use discovery::{discover_areas, AreaAssignment, CandidateArea, DiscoveryResult};

// Speed/dwell-based trajectory segmentation
pub mod speed;
pub use speed::{segment_by_speed, speed_series, SpeedConfig, SpeedSample, StayRange};

// Per-area midpoint estimation and distance distributions
pub mod midpoint;
pub use midpoint::{
    distance_cdf, distance_summary, estimate_midpoint, CdfBucket, DistanceSummary, Midpoint,
    MidpointMethod,
};

// File adapters (CSV ingestion, CSV/GeoJSON emission)
pub mod export;
pub mod ingest;

// ============================================================================
// Core Types
// ============================================================================

/// A single geotagged connection event.
///
/// Immutable except for `area_id`, which defaults to 0 ("unassigned") and is
/// set exactly once by [`EventLog::apply_assignment`] after discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Local calendar time of the connection, second resolution.
    pub timestamp: NaiveDateTime,
    /// Longitude in degrees (WGS84).
    pub longitude: f64,
    /// Latitude in degrees (WGS84).
    pub latitude: f64,
    /// Discrete location identifier, e.g. a serving-cell id.
    pub tag: String,
    /// Discovered residential-area id; 0 means unassigned.
    pub area_id: u32,
}

impl Event {
    /// Create a new, unassigned event.
    pub fn new(timestamp: NaiveDateTime, longitude: f64, latitude: f64, tag: &str) -> Self {
        Self {
            timestamp,
            longitude,
            latitude,
            tag: tag.to_string(),
            area_id: 0,
        }
    }

    /// Check that the coordinates are finite and within WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// A contiguous stay interval with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeInterval {
    /// Create an interval. Callers must supply `start <= end`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        debug_assert!(start <= end, "interval start must not exceed end");
        Self { start, end }
    }

    /// Covered duration; zero for a single-event interval.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// All events sharing one location tag, in timestamp order.
///
/// Holds indices into the owning [`EventLog`]'s event arena rather than
/// event copies; the algorithms are array-scan-oriented and never remove
/// from the middle.
#[derive(Debug, Clone)]
pub struct LocationGroup {
    tag: String,
    indices: Vec<usize>,
}

impl LocationGroup {
    /// The location tag shared by every member event.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Number of logged connections; the traffic-ranking key and a lower
    /// bound proxy for total possible dwell time.
    pub fn connection_count(&self) -> usize {
        self.indices.len()
    }

    /// Indices into the owning log's event arena, in timestamp order.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }
}

/// The event arena for one analysis run.
///
/// Owns the full chronologically sorted event sequence plus its grouping by
/// location tag. All engine entry points ([`discover_areas`],
/// [`segment_by_speed`], [`estimate_midpoint`]) consume this structure or
/// its event slice; nothing is shared across runs.
#[derive(Debug, Clone)]
pub struct EventLog {
    events: Vec<Event>,
    groups: Vec<LocationGroup>,
    tag_index: HashMap<String, usize>,
}

impl EventLog {
    /// Build a log from parsed events.
    ///
    /// Events are stably sorted by timestamp (duplicates keep their input
    /// order) and grouped by tag in first-seen order. Segmentation depends
    /// on this sort as a precondition, so it happens once here rather than
    /// as a side effect of every extraction call.
    ///
    /// Fails with [`AnalysisError::InvalidInput`] on an empty sequence.
    pub fn from_events(mut events: Vec<Event>) -> Result<Self> {
        if events.is_empty() {
            return Err(AnalysisError::invalid_input("empty event sequence"));
        }

        events.sort_by_key(|e| e.timestamp);

        let mut groups: Vec<LocationGroup> = Vec::new();
        let mut tag_index: HashMap<String, usize> = HashMap::new();
        for (i, event) in events.iter().enumerate() {
            match tag_index.get(&event.tag) {
                Some(&g) => groups[g].indices.push(i),
                None => {
                    tag_index.insert(event.tag.clone(), groups.len());
                    groups.push(LocationGroup {
                        tag: event.tag.clone(),
                        indices: vec![i],
                    });
                }
            }
        }

        Ok(Self {
            events,
            groups,
            tag_index,
        })
    }

    /// The full event sequence in timestamp order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// All location groups in first-seen order.
    pub fn groups(&self) -> &[LocationGroup] {
        &self.groups
    }

    /// Look up the group for a tag, failing with
    /// [`AnalysisError::UnknownTag`] if no event carries it.
    pub fn group(&self, tag: &str) -> Result<&LocationGroup> {
        self.tag_index
            .get(tag)
            .map(|&g| &self.groups[g])
            .ok_or_else(|| AnalysisError::UnknownTag { tag: tag.to_string() })
    }

    /// Number of connections logged for a tag.
    pub fn connection_count(&self, tag: &str) -> Result<usize> {
        Ok(self.group(tag)?.connection_count())
    }

    /// Extract the gap-tolerant stay intervals for one tag.
    pub fn time_segments(&self, tag: &str, tolerance: Duration) -> Result<Vec<TimeInterval>> {
        let group = self.group(tag)?;
        let times: Vec<NaiveDateTime> = group
            .indices
            .iter()
            .map(|&i| self.events[i].timestamp)
            .collect();
        segments::time_segments(&times, tolerance)
    }

    /// Run residential-area discovery over all groups.
    pub fn discover_areas(&self, interval: Duration) -> Result<DiscoveryResult> {
        discovery::discover_areas(self, interval)
    }

    /// Retag every event with its discovered area id.
    ///
    /// Events whose tag is absent from the assignment keep `area_id` 0.
    pub fn apply_assignment(&mut self, assignment: &AreaAssignment) {
        for event in &mut self.events {
            if let Some(&id) = assignment.get(&event.tag) {
                event.area_id = id;
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
