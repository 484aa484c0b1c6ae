//! residence-finder CLI - One-shot batch analysis of a connection log
//!
//! Usage:
//!   residence-finder areas <data.csv> [--interval <secs>] [--output <dir>]
//!   residence-finder speed <data.csv> [--output <dir>]
//!
//! `areas` runs the top-K-cell discovery and emits the area timeline,
//! per-area midpoints with distance CDFs, and the handoff files for the
//! external center-of-minimum-distance calculator. `speed` runs the
//! movement-based segmentation and emits per-stay map overlays plus the
//! implied-speed series.

use std::fs;
use std::path::PathBuf;

use chrono::Duration;
use clap::{Parser, Subcommand};
use log::{error, info};

use residence_finder::{
    discover_areas, estimate_midpoint, export, ingest, midpoint, segment_by_speed, speed_series,
    EventLog, MidpointMethod, SpeedConfig,
};

#[derive(Parser)]
#[command(name = "residence-finder")]
#[command(about = "Residential-area inference from geotagged connection logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover residential areas from the busiest location tags
    Areas {
        /// CSV connection log (time,lon,lat,tag)
        data: PathBuf,

        /// Gap tolerance and dwell granularity in seconds
        #[arg(short, long, default_value = "180")]
        interval: i64,

        /// Output directory for emitted files
        #[arg(short, long, default_value = "out")]
        output: PathBuf,

        /// Number of buckets in each distance CDF
        #[arg(long, default_value_t = midpoint::DEFAULT_CDF_SAMPLES)]
        cdf_samples: usize,
    },

    /// Detect stays from consecutive-point movement speed
    Speed {
        /// CSV connection log (time,lon,lat,tag)
        data: PathBuf,

        /// Output directory for emitted files
        #[arg(short, long, default_value = "out")]
        output: PathBuf,

        /// Speed limit in m/s above which the user counts as moving
        #[arg(long, default_value_t = 12.5)]
        speed_limit: f64,

        /// Correction factor for great-circle vs. actual path length
        #[arg(long, default_value_t = 1.1)]
        upscale: f64,

        /// Minimum stay duration in seconds
        #[arg(long, default_value_t = 600)]
        min_dwell: i64,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Areas {
            data,
            interval,
            output,
            cdf_samples,
        } => run_areas(&data, interval, &output, cdf_samples),
        Commands::Speed {
            data,
            output,
            speed_limit,
            upscale,
            min_dwell,
        } => run_speed(&data, &output, speed_limit, upscale, min_dwell),
    };

    if let Err(e) = outcome {
        error!("analysis aborted: {e}");
        std::process::exit(1);
    }
}

fn run_areas(
    data: &PathBuf,
    interval: i64,
    output: &PathBuf,
    cdf_samples: usize,
) -> residence_finder::Result<()> {
    fs::create_dir_all(output)?;

    let events = ingest::read_events_csv(data)?;
    let mut log = EventLog::from_events(events)?;

    let result = discover_areas(&log, Duration::seconds(interval))?;
    log.apply_assignment(&result.assignment);
    info!(
        "discovered {} candidate areas across {} tags",
        result.areas.len(),
        result.assignment.len()
    );

    export::write_area_timeline_csv(&output.join("time-vs-area.csv"), log.events())?;

    for area in &result.areas {
        export::write_area_geojson(
            &output.join(format!("area-{}.json", area.id)),
            log.events(),
            area.id,
        )?;

        for method in [MidpointMethod::Gravity, MidpointMethod::Average] {
            let center = estimate_midpoint(log.events(), area.id, method)?;
            let summary = midpoint::distance_summary(log.events(), area.id, center)?;
            info!(
                "area {} ({}): center {:.7},{:.7} scatter mean {:.1}m min {:.1}m max {:.1}m",
                area.id,
                method.as_str(),
                center.latitude,
                center.longitude,
                summary.mean_m,
                summary.min_m,
                summary.max_m
            );

            let cdf = midpoint::distance_cdf(log.events(), area.id, center, cdf_samples)?;
            export::write_distance_cdf_csv(
                &output.join(format!("{}-area-{}.csv", method.as_str(), area.id)),
                &cdf,
            )?;
        }
    }

    export::write_midpoint_handoff(output, log.events(), result.areas.len() as u32)?;
    Ok(())
}

fn run_speed(
    data: &PathBuf,
    output: &PathBuf,
    speed_limit: f64,
    upscale: f64,
    min_dwell: i64,
) -> residence_finder::Result<()> {
    fs::create_dir_all(output)?;

    let events = ingest::read_events_csv(data)?;
    let log = EventLog::from_events(events)?;

    let config = SpeedConfig {
        speed_limit,
        distance_upscale: upscale,
        min_dwell_secs: min_dwell,
    };
    let stays = segment_by_speed(log.events(), &config)?;
    info!("detected {} stays by movement speed", stays.len());

    for (i, range) in stays.iter().enumerate() {
        let name = export::speed_stay_filename(i + 1, log.events(), *range);
        export::write_stay_geojson(&output.join(name), log.events(), *range)?;
    }

    let samples = speed_series(log.events())?;
    export::write_speed_series_csv(&output.join("time-vs-speed.csv"), &samples)?;
    Ok(())
}
