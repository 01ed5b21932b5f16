//! Coordinate mapping.
//!
//! The single source of truth for where things land on the grid. Every overlay
//! goes through [`CoordinateMapper`]; nothing else computes rows or columns
//! from glucose values or timestamps.
//!
//! ```text
//!  col 0                                   col N-1
//!   ┌──────────────────────────────────────────┐ row 0
//!   │            readout band (rows 0..5)       │
//!   ├──────────────────────────────────────────┤ row 5  ← max glucose
//!   │  oldest sample ...          newest sample │
//!   │                                           │
//!   └──────────────────────────────────────────┘ row N-1 ← min glucose
//! ```

use chrono::{DateTime, Utc};

use crate::config::MINUTES_PER_COLUMN;

/// Rows reserved above the plot for the numeric readout.
pub const READOUT_BAND_ROWS: i32 = 5;

/// Rows excluded from the plot height (readout band plus the bottom row).
const PLOT_ROW_MARGIN: i32 = READOUT_BAND_ROWS + 1;

/// Maps glucose values, sample indices and timestamps onto grid coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoordinateMapper {
    matrix_size: i32,
    min_glucose: i32,
    max_glucose: i32,
}

impl CoordinateMapper {
    /// `min_glucose` must be below `max_glucose`; config validation enforces it.
    pub const fn new(matrix_size: usize, min_glucose: i32, max_glucose: i32) -> Self {
        Self { matrix_size: matrix_size as i32, min_glucose, max_glucose }
    }

    #[inline]
    pub const fn matrix_size(&self) -> i32 { self.matrix_size }

    /// Row of a glucose value. Higher glucose maps to a lower row number.
    pub fn glucose_to_row(&self, value: i32) -> i32 {
        let clamped = value.clamp(self.min_glucose, self.max_glucose);
        let normalized = (clamped - self.min_glucose) as f32 / (self.max_glucose - self.min_glucose) as f32;
        let plot_height = (self.matrix_size - PLOT_ROW_MARGIN) as f32;
        ((1.0 - normalized) * plot_height) as i32 + READOUT_BAND_ROWS
    }

    /// Column of the sample at `index` (0 = newest). `None` once off the left edge.
    pub fn sample_index_to_column(&self, index: usize) -> Option<i32> {
        let index = i32::try_from(index).ok()?;
        (index < self.matrix_size).then(|| self.matrix_size - 1 - index)
    }

    /// Column of a timestamp by its age in whole 5-minute slots.
    ///
    /// Future timestamps and timestamps older than the grid have no column.
    pub fn elapsed_to_column(&self, now: DateTime<Utc>, timestamp: DateTime<Utc>) -> Option<i32> {
        let slot = self.elapsed_slot(now, timestamp)?;
        self.sample_index_to_column(slot)
    }

    /// Age of `timestamp` in whole slots, `None` if it lies in the future.
    pub fn elapsed_slot(&self, now: DateTime<Utc>, timestamp: DateTime<Utc>) -> Option<usize> {
        let age = (now - timestamp).num_seconds();
        if age < 0 {
            return None;
        }
        usize::try_from(age.div_euclid(MINUTES_PER_COLUMN * 60)).ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
