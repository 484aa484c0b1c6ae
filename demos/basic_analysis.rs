//! Basic example of inferring residential areas from a synthetic log.
//!
//! Run with: cargo run --example basic_analysis

use chrono::{Duration, NaiveDate};
use residence_finder::{
    discover_areas, estimate_midpoint, segment_by_speed, Event, EventLog, MidpointMethod,
    SpeedConfig,
};

fn main() {
    // Simulate one day: nights at a home cell, afternoons at a work cell
    // (Taipei area), with scattered transit connections in between.
    let day = NaiveDate::from_ymd_opt(2020, 3, 2).unwrap();
    let mut events = Vec::new();

    // Home: 00:00-07:00, one connection every 10 minutes
    for i in 0..42 {
        let at = day.and_hms_opt(0, 0, 0).unwrap() + Duration::minutes(i * 10);
        events.push(Event::new(at, 121.5170, 25.0478, "CELL_HOME"));
    }

    // Work: 13:00-18:00, one connection every 10 minutes
    for i in 0..30 {
        let at = day.and_hms_opt(13, 0, 0).unwrap() + Duration::minutes(i * 10);
        events.push(Event::new(at, 121.2992, 25.0510, "CELL_WORK"));
    }

    // Transit: two one-off connections with a fast highway hop between them
    for (i, lon) in [121.45, 121.30].iter().enumerate() {
        let at = day.and_hms_opt(12, 0, 0).unwrap() + Duration::minutes(i as i64 * 10);
        events.push(Event::new(at, *lon, 25.05, &format!("CELL_T{i}")));
    }

    let mut log = EventLog::from_events(events).unwrap();

    println!("Residential Area Inference Example\n");

    // Top-K-cell discovery with a 3-minute gap tolerance
    let result = discover_areas(&log, Duration::seconds(180)).unwrap();
    log.apply_assignment(&result.assignment);

    println!("1. Discovered {} candidate areas:", result.areas.len());
    for area in &result.areas {
        let center = estimate_midpoint(log.events(), area.id, MidpointMethod::Gravity).unwrap();
        println!(
            "   Area {}: {} stay segments, center {:.4}, {:.4}",
            area.id,
            area.segments.len(),
            center.latitude,
            center.longitude
        );
    }

    // Independent speed-based stay detection
    let stays = segment_by_speed(log.events(), &SpeedConfig::default()).unwrap();
    println!("\n2. Stays detected by movement speed: {}", stays.len());
    for (i, stay) in stays.iter().enumerate() {
        let first = &log.events()[stay.low];
        let last = &log.events()[stay.high];
        println!(
            "   Stay {}: {} to {} ({} events)",
            i + 1,
            first.timestamp.format("%H:%M:%S"),
            last.timestamp.format("%H:%M:%S"),
            stay.high - stay.low + 1
        );
    }
}
