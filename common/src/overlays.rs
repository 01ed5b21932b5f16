//! Overlay builders.
//!
//! Every builder here draws on top of the readout and writes only into vacant
//! cells, so the order in which [`crate::render`] calls them decides every
//! collision:
//!
//! 1. Sample trace
//! 2. Boundary lines
//! 3. Treatment bars (bolus, then carbs; newest first within each)
//! 4. Exercise markers
//! 5. Insulin-on-board bars
//! 6. Hour gridlines
//!
//! Bars hang from the high-boundary line: they start [`BAR_OFFSET`] rows below
//! it and grow toward the bottom edge.

use alloc::vec;
use alloc::vec::Vec;

use chrono::{DateTime, Utc};
use embedded_graphics::pixelcolor::Rgb888;
#[cfg(not(test))]
use micromath::F32Ext;

use crate::canvas::{BarStyle, Canvas};
use crate::color::{blend_fraction, correct, ColorModel};
use crate::colors::{BLUE, ORANGE, PURPLE, WHITE};
use crate::config::{RenderConfig, TraceLayout};
use crate::mapper::CoordinateMapper;
use crate::model::{GlucoseSample, SampleKind, TreatmentEvent, TreatmentKind};
use crate::thresholds::IOB_FRACTION_MIN;

// =============================================================================
// Layout Constants
// =============================================================================

/// Rows between the high-boundary line and the top of a hanging bar.
pub const BAR_OFFSET: i32 = 2;

/// Width of the left and right segments of a boundary line.
pub const BORDER_WIDTH: i32 = 3;

/// Columns per hour of samples.
pub const COLUMNS_PER_HOUR: i32 = 12;

/// Height of an hour gridline.
pub const GRIDLINE_HEIGHT: i32 = 18;

// =============================================================================
// Overlay Colors
// =============================================================================

/// Boundary line color.
pub fn boundary_color() -> Rgb888 { correct(WHITE, 0.1) }

/// Hour gridline color.
pub fn gridline_color() -> Rgb888 { correct(WHITE, 0.02) }

/// Bolus bar color.
pub fn bolus_color() -> Rgb888 { correct(BLUE, 0.3) }

/// Carbs bar color.
pub fn carbs_color() -> Rgb888 { correct(ORANGE, 0.2) }

/// Exercise marker color.
pub fn exercise_color() -> Rgb888 { correct(PURPLE, 0.5) }

/// Insulin-on-board bar color.
pub fn iob_color() -> Rgb888 { correct(BLUE, 0.05) }

// =============================================================================
// Sample Trace
// =============================================================================

/// One pixel per sample (or per 5-minute slot in [`TraceLayout::ElapsedTime`]).
///
/// Samples are newest first, so an older sample never replaces a newer one.
pub fn draw_sample_trace(
    canvas: &mut Canvas,
    mapper: &CoordinateMapper,
    colors: &ColorModel,
    samples: &[GlucoseSample],
    layout: TraceLayout,
    now: DateTime<Utc>,
) {
    match layout {
        TraceLayout::SampleIndex => {
            for (index, sample) in samples.iter().enumerate() {
                let Some(x) = mapper.sample_index_to_column(index) else { break };
                let y = mapper.glucose_to_row(sample.value);
                canvas.paint_if_vacant(x, y, colors.sample_color(sample.value, sample.kind));
            }
        }
        TraceLayout::ElapsedTime => {
            for (slot, bucket) in slot_buckets(mapper, samples, now).iter().enumerate() {
                let Some((value, kind)) = bucket.average() else { continue };
                let Some(x) = mapper.sample_index_to_column(slot) else { break };
                canvas.paint_if_vacant(x, mapper.glucose_to_row(value), colors.sample_color(value, kind));
            }
        }
    }
}

/// Samples sharing one 5-minute slot.
#[derive(Clone, Copy, Debug, Default)]
struct SlotBucket {
    sum: i64,
    count: i64,
    meters: i64,
}

impl SlotBucket {
    /// Truncated mean and the kind used to color it. Meter only if every
    /// sample in the slot is a meter reading.
    fn average(&self) -> Option<(i32, SampleKind)> {
        if self.count == 0 {
            return None;
        }
        let kind = if self.meters == self.count { SampleKind::Meter } else { SampleKind::Sensor };
        Some(((self.sum / self.count) as i32, kind))
    }
}

fn slot_buckets(mapper: &CoordinateMapper, samples: &[GlucoseSample], now: DateTime<Utc>) -> Vec<SlotBucket> {
    let columns = mapper.matrix_size() as usize;
    let mut buckets = vec![SlotBucket::default(); columns];
    for sample in samples {
        let Some(slot) = mapper.elapsed_slot(now, sample.timestamp) else { continue };
        let Some(bucket) = buckets.get_mut(slot) else { continue };
        bucket.sum += i64::from(sample.value);
        bucket.count += 1;
        if sample.kind == SampleKind::Meter {
            bucket.meters += 1;
        }
    }
    buckets
}

// =============================================================================
// Boundary Lines
// =============================================================================

/// Dim guides at the low and high boundary rows, left and right borders only.
pub fn draw_boundary_lines(canvas: &mut Canvas, mapper: &CoordinateMapper, low_boundary: i32, high_boundary: i32) {
    let color = boundary_color();
    let size = canvas.matrix_size();
    for boundary in [low_boundary, high_boundary] {
        let y = mapper.glucose_to_row(boundary);
        canvas.horizontal_run(y, 0, BORDER_WIDTH, color);
        canvas.horizontal_run(y, size - BORDER_WIDTH, size, color);
    }
}

// =============================================================================
// Treatments
// =============================================================================

/// Column of a point treatment: the column of the sample nearest in time.
///
/// Events outside the samples' time span have no column. On equal distance the
/// newer sample wins.
pub fn treatment_column(mapper: &CoordinateMapper, samples: &[GlucoseSample], event: &TreatmentEvent) -> Option<i32> {
    let (oldest, newest) = (samples.last()?.timestamp, samples.first()?.timestamp);
    if event.timestamp < oldest || event.timestamp > newest {
        return None;
    }
    let (index, _) = samples
        .iter()
        .enumerate()
        .min_by_key(|(_, s)| (event.timestamp - s.timestamp).num_milliseconds().unsigned_abs())?;
    mapper.sample_index_to_column(index)
}

/// Bolus and carbs bars hanging below the high-boundary line.
pub fn draw_treatment_bars(
    canvas: &mut Canvas,
    mapper: &CoordinateMapper,
    config: &RenderConfig,
    samples: &[GlucoseSample],
    treatments: &[TreatmentEvent],
) {
    let start_y = mapper.glucose_to_row(config.high_boundary) + BAR_OFFSET;
    let passes = [
        (TreatmentKind::Bolus, bolus_color(), config.bolus_units_per_pixel),
        (TreatmentKind::Carbs, carbs_color(), config.carb_grams_per_pixel),
    ];

    for (kind, color, per_pixel) in passes {
        for event in treatments.iter().filter(|t| t.kind == kind) {
            let Some(x) = treatment_column(mapper, samples, event) else {
                log::debug!("treatment {} outside the sample window, skipped", event.id);
                continue;
            };
            let height = (event.amount / per_pixel).floor() as i32;
            canvas.vertical_bar(x, start_y, height, color, BarStyle::TICKED);
        }
    }
}

/// Columns of every sample covered by an exercise interval, ascending and unique.
pub fn exercise_columns(mapper: &CoordinateMapper, samples: &[GlucoseSample], treatments: &[TreatmentEvent]) -> Vec<i32> {
    let mut columns: Vec<i32> = treatments
        .iter()
        .filter(|t| t.kind == TreatmentKind::Exercise)
        .flat_map(|exercise| {
            samples
                .iter()
                .enumerate()
                .filter(move |(_, s)| exercise.covers(s.timestamp))
                .filter_map(|(index, _)| mapper.sample_index_to_column(index))
        })
        .collect();
    columns.sort_unstable();
    columns.dedup();
    columns
}

/// Exercise markers in the gap row just below each boundary line.
pub fn draw_exercise_markers(
    canvas: &mut Canvas,
    mapper: &CoordinateMapper,
    columns: &[i32],
    low_boundary: i32,
    high_boundary: i32,
) {
    let color = exercise_color();
    let rows = [mapper.glucose_to_row(high_boundary) + 1, mapper.glucose_to_row(low_boundary) + 1];
    for &x in columns {
        for y in rows {
            canvas.paint_if_vacant(x, y, color);
        }
    }
}

// =============================================================================
// Insulin On Board
// =============================================================================

/// One blinking bar per IOB history entry, newest at the right edge.
///
/// The integer part is the solid height; a fractional remainder above
/// [`IOB_FRACTION_MIN`] adds one blended pixel at the bar's foot.
pub fn draw_iob_bars(canvas: &mut Canvas, mapper: &CoordinateMapper, iob_history: &[f32], high_boundary: i32) {
    let color = iob_color();
    let start_y = mapper.glucose_to_row(high_boundary) + BAR_OFFSET;
    for (index, &iob) in iob_history.iter().enumerate() {
        let Some(x) = mapper.sample_index_to_column(index) else { break };
        if !iob.is_finite() || iob <= 0.0 {
            continue;
        }
        let whole = iob.trunc();
        let fraction = iob - whole;
        let height = whole as i32;
        canvas.vertical_bar(x, start_y, height, color, BarStyle::BLINKING);
        if fraction > IOB_FRACTION_MIN {
            canvas.paint_if_vacant(x, start_y + height, blend_fraction(color, fraction));
        }
    }
}

// =============================================================================
// Hour Gridlines
// =============================================================================

/// Faint blinking verticals one and two hours back.
pub fn draw_hour_gridlines(canvas: &mut Canvas, mapper: &CoordinateMapper, high_boundary: i32) {
    let color = gridline_color();
    let start_y = mapper.glucose_to_row(high_boundary) + BAR_OFFSET;
    let newest = canvas.matrix_size() - 1;
    for hours in 1..=2 {
        let x = newest - COLUMNS_PER_HOUR * hours;
        canvas.vertical_bar(x, start_y, GRIDLINE_HEIGHT, color, BarStyle::BLINKING);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
