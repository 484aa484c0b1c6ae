//! Per-area midpoint estimation and distance distributions.
//!
//! Given the events assigned to one area, compute a representative center
//! and summarize how far the members scatter around it. Two estimation
//! methods are provided; a third (center of minimum distance) is handed off
//! to an external calculator via [`crate::export::write_midpoint_handoff`].

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::geo_utils::{from_unit_vector, haversine_distance, to_unit_vector};
use crate::Event;

/// Number of CDF buckets matching the reference plots.
pub const DEFAULT_CDF_SAMPLES: usize = 50;

/// Midpoint estimation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MidpointMethod {
    /// Spherical center of mass via unit-vector averaging. Handles
    /// longitude wraparound correctly; the numerically preferred method.
    Gravity,
    /// Arithmetic mean of latitudes and longitudes. Biased on longitude
    /// near the poles and the antimeridian; acceptable only because
    /// residential areas are geographically small.
    Average,
}

impl MidpointMethod {
    /// Lowercase name used in emitted file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gravity => "gravity",
            Self::Average => "average",
        }
    }
}

/// A representative geographic center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Midpoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Scatter of an area's events around its midpoint, in meters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DistanceSummary {
    pub mean_m: f64,
    pub min_m: f64,
    pub max_m: f64,
}

/// One bucket of the cumulative distance distribution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CdfBucket {
    /// Distance bound in meters.
    pub bound_m: f64,
    /// Percentage of member events within the bound.
    pub cumulative_pct: f64,
}

/// Estimate the representative center of one area.
///
/// # Errors
///
/// [`AnalysisError::EmptyArea`] when no event carries `area_id`.
pub fn estimate_midpoint(
    events: &[Event],
    area_id: u32,
    method: MidpointMethod,
) -> Result<Midpoint> {
    let members = || events.iter().filter(|e| e.area_id == area_id);
    let count = members().count();
    if count == 0 {
        return Err(AnalysisError::EmptyArea { area_id });
    }

    let midpoint = match method {
        MidpointMethod::Gravity => {
            let mut sum = [0.0f64; 3];
            for e in members() {
                let v = to_unit_vector(e.latitude, e.longitude);
                sum[0] += v[0];
                sum[1] += v[1];
                sum[2] += v[2];
            }
            let n = count as f64;
            let (latitude, longitude) =
                from_unit_vector([sum[0] / n, sum[1] / n, sum[2] / n]);
            Midpoint { latitude, longitude }
        }
        MidpointMethod::Average => {
            let (mut sum_lat, mut sum_lon) = (0.0f64, 0.0f64);
            for e in members() {
                sum_lat += e.latitude;
                sum_lon += e.longitude;
            }
            let n = count as f64;
            Midpoint {
                latitude: sum_lat / n,
                longitude: sum_lon / n,
            }
        }
    };

    info!(
        "area {area_id} midpoint ({}): {:.7}, {:.7}",
        method.as_str(),
        midpoint.latitude,
        midpoint.longitude
    );
    Ok(midpoint)
}

/// Mean, minimum, and maximum great-circle distance from each member event
/// to the center.
pub fn distance_summary(events: &[Event], area_id: u32, center: Midpoint) -> Result<DistanceSummary> {
    let mut count = 0u32;
    let (mut sum, mut min, mut max) = (0.0f64, f64::INFINITY, 0.0f64);
    for e in events.iter().filter(|e| e.area_id == area_id) {
        let d = haversine_distance(center.latitude, center.longitude, e.latitude, e.longitude);
        count += 1;
        sum += d;
        min = min.min(d);
        max = max.max(d);
    }
    if count == 0 {
        return Err(AnalysisError::EmptyArea { area_id });
    }

    Ok(DistanceSummary {
        mean_m: sum / count as f64,
        min_m: min,
        max_m: max,
    })
}

/// Cumulative distance distribution for plotting.
///
/// Emits `samples` evenly spaced bounds from zero to the observed maximum
/// distance, each with the percentage of member events at or within it.
/// The final bucket always reads 100%.
pub fn distance_cdf(
    events: &[Event],
    area_id: u32,
    center: Midpoint,
    samples: usize,
) -> Result<Vec<CdfBucket>> {
    if samples == 0 {
        return Err(AnalysisError::invalid_argument("samples", samples));
    }

    let distances: Vec<f64> = events
        .iter()
        .filter(|e| e.area_id == area_id)
        .map(|e| haversine_distance(center.latitude, center.longitude, e.latitude, e.longitude))
        .collect();
    if distances.is_empty() {
        return Err(AnalysisError::EmptyArea { area_id });
    }

    let max = distances.iter().cloned().fold(0.0f64, f64::max);
    let total = distances.len() as f64;
    let buckets = (1..=samples)
        .map(|j| {
            // j/samples reaches exactly 1.0 on the last bucket, so the final
            // bound equals the observed maximum and always reads 100%
            let bound = max * (j as f64 / samples as f64);
            let within = distances.iter().filter(|d| **d <= bound).count() as f64;
            CdfBucket {
                bound_m: bound,
                cumulative_pct: 100.0 * within / total,
            }
        })
        .collect();

    Ok(buckets)
}
