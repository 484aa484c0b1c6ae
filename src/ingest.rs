//! CSV ingestion adapter.
//!
//! Reads `time,lon,lat,tag` rows into [`Event`]s. The header row is
//! skipped; timestamps use the log format `%Y-%m-%d %H:%M:%S`. Only type
//! coercion is validated here; ordering and grouping happen in
//! [`crate::EventLog::from_events`].

use std::path::Path;

use chrono::NaiveDateTime;
use log::info;

use crate::error::{AnalysisError, Result};
use crate::Event;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Read a connection log from a CSV file.
pub fn read_events_csv(path: &Path) -> Result<Vec<Event>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| AnalysisError::invalid_input(format!("{}: {e}", path.display())))?;

    let mut events = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let line = i + 2; // header is line 1
        let record =
            record.map_err(|e| AnalysisError::invalid_input(format!("line {line}: {e}")))?;
        events.push(parse_record(&record, line)?);
    }

    info!("read {} events from {}", events.len(), path.display());
    Ok(events)
}

fn parse_record(record: &csv::StringRecord, line: usize) -> Result<Event> {
    let field = |idx: usize| {
        record
            .get(idx)
            .ok_or_else(|| AnalysisError::invalid_input(format!("line {line}: missing field {idx}")))
    };

    let timestamp = NaiveDateTime::parse_from_str(field(0)?, TIME_FORMAT)
        .map_err(|e| AnalysisError::invalid_input(format!("line {line}: bad timestamp: {e}")))?;
    let longitude: f64 = field(1)?
        .parse()
        .map_err(|e| AnalysisError::invalid_input(format!("line {line}: bad longitude: {e}")))?;
    let latitude: f64 = field(2)?
        .parse()
        .map_err(|e| AnalysisError::invalid_input(format!("line {line}: bad latitude: {e}")))?;

    Ok(Event::new(timestamp, longitude, latitude, field(3)?))
}
