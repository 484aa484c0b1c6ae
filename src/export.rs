//! Emission adapter.
//!
//! Writes the flat output files the plotting and map-overlay tooling
//! consumes. The engine never serializes anything itself; every writer
//! here takes already-computed in-memory results.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;
use serde_json::json;

use crate::error::Result;
use crate::midpoint::CdfBucket;
use crate::speed::{SpeedSample, StayRange};
use crate::{AnalysisError, Event};

/// Write the `time,area_id` table for the area-vs-time plot.
pub fn write_area_timeline_csv(path: &Path, events: &[Event]) -> Result<()> {
    let mut w = csv::Writer::from_path(path)?;
    w.write_record(["time", "area_id"])?;
    for e in events {
        w.write_record([
            e.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            e.area_id.to_string(),
        ])?;
    }
    w.flush()?;
    info!("wrote {} timeline rows to {}", events.len(), path.display());
    Ok(())
}

/// Write the `time,speed_kmh` table for the speed-vs-time plot.
pub fn write_speed_series_csv(path: &Path, samples: &[SpeedSample]) -> Result<()> {
    let mut w = csv::Writer::from_path(path)?;
    w.write_record(["time", "speed_kmh"])?;
    for s in samples {
        w.write_record([
            s.time.format("%Y-%m-%d %H:%M:%S").to_string(),
            format!("{:.4}", s.speed_kmh),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Write the `bound_m,cumulative_pct` table for one area's CDF plot.
pub fn write_distance_cdf_csv(path: &Path, buckets: &[CdfBucket]) -> Result<()> {
    let mut w = csv::Writer::from_path(path)?;
    w.write_record(["bound_m", "cumulative_pct"])?;
    for b in buckets {
        w.write_record([format!("{:.2}", b.bound_m), format!("{:.2}", b.cumulative_pct)])?;
    }
    w.flush()?;
    Ok(())
}

/// Write a GeoJSON `MultiPoint` of one detected stay range for map overlay.
pub fn write_stay_geojson(path: &Path, events: &[Event], range: StayRange) -> Result<()> {
    let coords: Vec<_> = events[range.low..=range.high]
        .iter()
        .map(|e| json!([e.longitude, e.latitude]))
        .collect();
    write_multipoint(path, coords)
}

/// Write a GeoJSON `MultiPoint` of every event assigned to one area.
pub fn write_area_geojson(path: &Path, events: &[Event], area_id: u32) -> Result<()> {
    let coords: Vec<_> = events
        .iter()
        .filter(|e| e.area_id == area_id)
        .map(|e| json!([e.longitude, e.latitude]))
        .collect();
    if coords.is_empty() {
        return Err(AnalysisError::EmptyArea { area_id });
    }
    write_multipoint(path, coords)
}

fn write_multipoint(path: &Path, coords: Vec<serde_json::Value>) -> Result<()> {
    let geometry = json!({
        "type": "MultiPoint",
        "coordinates": coords,
    });
    let mut f = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut f, &geometry)
        .map_err(|e| AnalysisError::invalid_input(format!("geojson encoding: {e}")))?;
    f.flush()?;
    Ok(())
}

/// Emit per-area latitude/longitude list files for the external
/// center-of-minimum-distance calculator.
///
/// Produces `area-<id>-lat.txt` and `area-<id>-lon.txt` in `dir` for each
/// area id from 1 to `area_count`, one coordinate per line.
pub fn write_midpoint_handoff(dir: &Path, events: &[Event], area_count: u32) -> Result<()> {
    for id in 1..=area_count {
        let mut lat = BufWriter::new(File::create(dir.join(format!("area-{id}-lat.txt")))?);
        let mut lon = BufWriter::new(File::create(dir.join(format!("area-{id}-lon.txt")))?);
        for e in events.iter().filter(|e| e.area_id == id) {
            writeln!(lat, "{}", e.latitude)?;
            writeln!(lon, "{}", e.longitude)?;
        }
        lat.flush()?;
        lon.flush()?;
    }
    info!("wrote midpoint handoff files for {area_count} areas to {}", dir.display());
    Ok(())
}

/// File name for one speed-method stay, carrying its time span.
pub fn speed_stay_filename(id: usize, events: &[Event], range: StayRange) -> String {
    format!(
        "map-by-speed-{id}-{}-to-{}.json",
        events[range.low].timestamp.format("%H%M%S"),
        events[range.high].timestamp.format("%H%M%S"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_events() -> Vec<Event> {
        let day = NaiveDate::from_ymd_opt(2020, 3, 2).unwrap();
        let mut events = vec![
            Event::new(day.and_hms_opt(8, 0, 0).unwrap(), 121.5170, 25.0478, "CELL_1"),
            Event::new(day.and_hms_opt(8, 10, 0).unwrap(), 121.5171, 25.0479, "CELL_1"),
        ];
        events[0].area_id = 1;
        events[1].area_id = 1;
        events
    }

    #[test]
    fn test_stay_geojson_shape() {
        let events = sample_events();
        let path = std::env::temp_dir().join("residence_finder_stay.json");
        write_stay_geojson(&path, &events, StayRange { low: 0, high: 1 }).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["type"], "MultiPoint");
        assert_eq!(value["coordinates"].as_array().unwrap().len(), 2);
        assert_eq!(value["coordinates"][0][0], 121.5170);
    }

    #[test]
    fn test_area_geojson_empty_area_rejected() {
        let events = sample_events();
        let path = std::env::temp_dir().join("residence_finder_area.json");
        assert!(matches!(
            write_area_geojson(&path, &events, 9),
            Err(AnalysisError::EmptyArea { area_id: 9 })
        ));
    }

    #[test]
    fn test_speed_stay_filename() {
        let events = sample_events();
        let name = speed_stay_filename(1, &events, StayRange { low: 0, high: 1 });
        assert_eq!(name, "map-by-speed-1-080000-to-081000.json");
    }
}
