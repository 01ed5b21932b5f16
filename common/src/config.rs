//! Render configuration.
//!
//! [`RenderConfig`] carries every user-tunable input of a render: grid size,
//! the glucose display range, alert boundaries, night brightness and the
//! display timezone offset. It deserializes with defaults for every field so
//! partial config files work, and accepts the legacy key names written by the
//! old browser configurator (`"low bondary glucose"`, `"high bondary glucose"`).
//!
//! Fixed layout constants that never change at runtime are defined here as
//! well, next to the values they constrain.

use alloc::format;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::error::RenderError;

// =============================================================================
// Layout Constants
// =============================================================================

/// Default LED matrix edge length in pixels.
pub const DEFAULT_MATRIX_SIZE: usize = 32;

/// Smallest supported matrix. Below this the readout band swallows the plot.
pub const MIN_MATRIX_SIZE: usize = 16;

/// Largest supported matrix.
pub const MAX_MATRIX_SIZE: usize = 128;

/// Extra samples kept past the visible edge for overlay lookups.
pub const SAMPLE_MARGIN: usize = 3;

/// Minutes covered by one column of the plot.
pub const MINUTES_PER_COLUMN: i64 = 5;

/// Every configured glucose value (range and boundaries) lies in `0..=GLUCOSE_LIMIT` mg/dL.
pub const GLUCOSE_LIMIT: i32 = 1000;

// =============================================================================
// Default Values
// =============================================================================

/// Lower edge of the display clamp range (mg/dL).
pub const DEFAULT_MIN_GLUCOSE: i32 = 60;

/// Upper edge of the display clamp range (mg/dL).
pub const DEFAULT_MAX_GLUCOSE: i32 = 180;

/// Default low alert boundary (mg/dL).
pub const DEFAULT_LOW_BOUNDARY: i32 = 70;

/// Default high alert boundary (mg/dL).
pub const DEFAULT_HIGH_BOUNDARY: i32 = 180;

/// Default brightness scale during the night window.
pub const DEFAULT_NIGHT_BRIGHTNESS: f32 = 0.3;

/// Default display timezone: fixed UTC-3.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = -180;

const _: () = assert!(DEFAULT_MIN_GLUCOSE < DEFAULT_MAX_GLUCOSE);
const _: () = assert!(DEFAULT_LOW_BOUNDARY < DEFAULT_HIGH_BOUNDARY);
const _: () = assert!(MIN_MATRIX_SIZE <= DEFAULT_MATRIX_SIZE && DEFAULT_MATRIX_SIZE <= MAX_MATRIX_SIZE);

// =============================================================================
// Trace Layout
// =============================================================================

/// How samples are placed horizontally on the glucose trace.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceLayout {
    /// One column per sample, newest at the right edge.
    #[default]
    SampleIndex,
    /// One column per 5-minute slot of sample age; samples sharing a slot are averaged.
    ElapsedTime,
}

// =============================================================================
// Render Configuration
// =============================================================================

/// All user-tunable render inputs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Edge length of the square LED matrix.
    #[serde(alias = "matrix size")]
    pub matrix_size: usize,

    /// Glucose values below this are drawn on the bottom row.
    pub min_glucose: i32,

    /// Glucose values above this are drawn on the top plot row.
    pub max_glucose: i32,

    /// Low alert boundary.
    #[serde(alias = "low bondary glucose")]
    pub low_boundary: i32,

    /// High alert boundary.
    #[serde(alias = "high bondary glucose")]
    pub high_boundary: i32,

    /// Brightness scale applied between 21:00 and 06:00 local time.
    pub night_brightness: f32,

    /// Offset of the display timezone from UTC, in minutes.
    pub utc_offset_minutes: i32,

    /// Horizontal placement of trace samples.
    pub trace_layout: TraceLayout,

    /// Insulin units drawn per bolus bar pixel.
    pub bolus_units_per_pixel: f32,

    /// Carbohydrate grams drawn per carbs bar pixel.
    pub carb_grams_per_pixel: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            matrix_size: DEFAULT_MATRIX_SIZE,
            min_glucose: DEFAULT_MIN_GLUCOSE,
            max_glucose: DEFAULT_MAX_GLUCOSE,
            low_boundary: DEFAULT_LOW_BOUNDARY,
            high_boundary: DEFAULT_HIGH_BOUNDARY,
            night_brightness: DEFAULT_NIGHT_BRIGHTNESS,
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
            trace_layout: TraceLayout::default(),
            bolus_units_per_pixel: 1.0,
            carb_grams_per_pixel: 1.0,
        }
    }
}

impl RenderConfig {
    /// Check that the configuration describes a drawable layout.
    pub fn validate(&self) -> Result<(), RenderError> {
        if !(MIN_MATRIX_SIZE..=MAX_MATRIX_SIZE).contains(&self.matrix_size) {
            return Err(RenderError::InvalidConfig(format!(
                "matrix_size {} outside {MIN_MATRIX_SIZE}..={MAX_MATRIX_SIZE}",
                self.matrix_size
            )));
        }
        for (name, value) in [
            ("min_glucose", self.min_glucose),
            ("max_glucose", self.max_glucose),
            ("low_boundary", self.low_boundary),
            ("high_boundary", self.high_boundary),
        ] {
            if !(0..=GLUCOSE_LIMIT).contains(&value) {
                return Err(RenderError::InvalidConfig(format!("{name} {value} outside 0..={GLUCOSE_LIMIT}")));
            }
        }
        if self.min_glucose >= self.max_glucose {
            return Err(RenderError::InvalidConfig(format!(
                "min_glucose {} must be below max_glucose {}",
                self.min_glucose, self.max_glucose
            )));
        }
        if self.low_boundary >= self.high_boundary {
            return Err(RenderError::InvalidConfig(format!(
                "low_boundary {} must be below high_boundary {}",
                self.low_boundary, self.high_boundary
            )));
        }
        if !(0.0..=1.0).contains(&self.night_brightness) {
            return Err(RenderError::InvalidConfig(format!(
                "night_brightness {} outside 0.0..=1.0",
                self.night_brightness
            )));
        }
        if self.bolus_units_per_pixel <= 0.0 || self.carb_grams_per_pixel <= 0.0 {
            return Err(RenderError::InvalidConfig(format!(
                "bar scales must be positive (bolus {}, carbs {})",
                self.bolus_units_per_pixel, self.carb_grams_per_pixel
            )));
        }
        self.display_offset()?;
        Ok(())
    }

    /// Display timezone as a fixed offset.
    pub fn display_offset(&self) -> Result<FixedOffset, RenderError> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            RenderError::InvalidConfig(format!("utc_offset_minutes {} out of range", self.utc_offset_minutes))
        })
    }

    /// Number of samples kept in the working set.
    #[inline]
    pub const fn sample_capacity(&self) -> usize { self.matrix_size + SAMPLE_MARGIN }
}

// =============================================================================
// Unit Tests
// =============================================================================
