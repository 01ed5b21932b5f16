// Crate-level lints
#![allow(clippy::cast_possible_truncation)] // f64->f32 telemetry amounts, i32->u32 canvas sizes
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

//! Glucose LED matrix renderer.
//!
//! Reads CGM telemetry (glucose entries, treatments, insulin on board) from
//! JSON files, renders it with the `glucose-matrix-common` engine and writes
//! the result for the display uploader:
//!
//! ```text
//! entries.json ─┐
//! treatments ───┼─► telemetry ─► WorkingSet ─► Renderer ─► pixels.json / grid.json
//! iob.json ─────┘                    ▲                    ─► output_image.png | frame-N.png + animation.json
//!                  refresh state ────┘ (IOB history)      ─► preview.png (--preview)
//! ```
//!
//! When the newest sample is older than `max_data_age_minutes` and
//! `--stale-image` is given, that image is copied to `output_image.png` in
//! place of a render, so the panel shows a "no data" screen.
//!
//! Fetching from the Nightscout API and pushing the image to the panel are
//! left to the surrounding scripts; this binary is one render per invocation.
//!
//! # Verbosity
//!
//! `-d/--debug` selects the log level (0=warn, 1=info, 2=debug, 3=trace).
//! `RUST_LOG` overrides it.

mod config;
mod output;
mod state;
mod telemetry;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use glucose_matrix_common::Renderer;
use log::{info, warn};

use config::{AppConfig, OutputType};
use state::RefreshState;

/// Render CGM telemetry onto an LED matrix image
#[derive(Parser, Debug)]
#[command(name = "glucose-matrix")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Glucose entries JSON (array, newest first)
    #[arg(long, value_name = "FILE")]
    entries: PathBuf,

    /// Treatments JSON (array)
    #[arg(long, value_name = "FILE")]
    treatments: Option<PathBuf>,

    /// Insulin-on-board JSON ({"iob": {"iob": x}})
    #[arg(long, value_name = "FILE")]
    iob: Option<PathBuf>,

    /// Configuration JSON
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Refresh state file (last entry id, IOB history)
    #[arg(long, value_name = "FILE")]
    state: Option<PathBuf>,

    /// Output directory
    #[arg(short = 'o', long, value_name = "DIR", default_value = "temp")]
    output: PathBuf,

    /// Render time instead of the wall clock (RFC 3339)
    #[arg(long, value_name = "TIME")]
    now: Option<DateTime<Utc>>,

    /// Also write a scaled side-by-side preview image
    #[arg(long)]
    preview: bool,

    /// Image shown instead of a render when the glucose data is stale
    #[arg(long, value_name = "FILE")]
    stale_image: Option<PathBuf>,

    /// Exit without rendering if the newest entry was already rendered
    #[arg(long)]
    skip_unchanged: bool,

    /// Debug verbosity level (0=warn, 1=info, 2=debug, 3=trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value = "0")]
    debug: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // Allow RUST_LOG to override CLI setting
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    run(&cli)
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn create_output_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create output directory {}", dir.display()))
}

fn run(cli: &Cli) -> Result<()> {
    let app_config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::default(),
    };
    let now = cli.now.unwrap_or_else(Utc::now);
    let renderer = Renderer::new(app_config.render_config(now)?).context("Invalid render configuration")?;
    let matrix_size = renderer.config().matrix_size;

    // ==========================================================================
    // Telemetry
    // ==========================================================================

    let entries = telemetry::parse_entries(&read_file(&cli.entries)?)
        .with_context(|| format!("Failed to parse entries from {}", cli.entries.display()))?;

    if let Some(newest) = entries.newest_timestamp()
        && telemetry::is_stale(newest, now, app_config.max_data_age_minutes)
    {
        warn!("Glucose data is stale: newest sample is {} old", telemetry::format_age(now - newest));
        if let Some(stale_image) = &cli.stale_image {
            create_output_dir(&cli.output)?;
            output::write_stale_image(&cli.output, stale_image)?;
            return Ok(());
        }
    }

    let mut refresh_state = cli.state.as_deref().map(RefreshState::load).unwrap_or_default();
    if cli.skip_unchanged && refresh_state.is_unchanged(entries.newest_id.as_deref()) {
        info!("Newest entry {:?} already rendered, nothing to do", entries.newest_id);
        return Ok(());
    }

    let treatments = match &cli.treatments {
        Some(path) => telemetry::parse_treatments(&read_file(path)?)
            .with_context(|| format!("Failed to parse treatments from {}", path.display()))?,
        None => Vec::new(),
    };

    if let Some(path) = &cli.iob {
        let iob = telemetry::parse_iob(&read_file(path)?)
            .with_context(|| format!("Failed to parse IOB from {}", path.display()))?;
        refresh_state.push_iob(iob, matrix_size);
    }

    // ==========================================================================
    // Render
    // ==========================================================================

    let set = renderer.working_set(entries.samples, treatments, refresh_state.iob_values());
    let still = renderer.render(&set, now).context("Render failed")?;

    create_output_dir(&cli.output)?;
    output::write_pixel_dumps(&cli.output, &still.canvas)?;

    match app_config.output_type {
        OutputType::Image => {
            output::write_image(&cli.output, &still.canvas)?;
        }
        OutputType::Gif => {
            let animated = renderer.render_animation(&set, now).context("Animation render failed")?;
            output::write_animation(&cli.output, &animated.animation)?;
        }
    }

    if cli.preview {
        output::write_preview(&cli.output, &still.canvas)?;
    }

    let summary = &still.summary;
    info!(
        "Rendered {} ({:+}, {}) at brightness {:.2}: {} cells lit",
        summary.label,
        summary.delta,
        summary.trend.map_or("no trend", |t| t.name()),
        summary.brightness,
        still.canvas.painted_count()
    );

    // ==========================================================================
    // Refresh State
    // ==========================================================================

    if let Some(path) = &cli.state {
        refresh_state.last_entry_id = entries.newest_id;
        refresh_state.save(path)?;
    }

    Ok(())
}
