//! Color constants for the glucose matrix.
//!
//! # Rgb888 Color Format
//!
//! The LED matrix is driven with 8 bits per channel, so the whole engine works
//! in `Rgb888`. Values are tuned for the panel rather than for a monitor: the
//! "white" is warm and the green is deliberately dim because the green dies
//! of typical RGB LED panels are much brighter than the red and blue ones.
//!
//! # LED Channel Correction
//!
//! Every faded color goes through a per-channel correction factor (see
//! [`crate::color::correct`]). Red and green use the static factors below.
//! Blue uses a drive-dependent factor: 1.0 at full drive, sliding toward
//! [`BLUE_CORRECTION`] only as drive approaches zero. Dimmed colors therefore
//! keep noticeably more blue than a static factor would leave.

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};

// =============================================================================
// Standard Colors
// =============================================================================

/// Pure black (0, 0, 0). Unlit LED.
pub const BLACK: Rgb888 = Rgb888::BLACK;

// =============================================================================
// Glucose Band Colors
// =============================================================================

/// Extreme readings (far below/above the boundaries) and "LOW"/"HIGH" text.
pub const RED: Rgb888 = Rgb888::new(255, 20, 10);

/// In-range readings.
pub const GREEN: Rgb888 = Rgb888::new(70, 167, 10);

/// Caution readings: on a boundary or within the margin beyond it.
pub const YELLOW: Rgb888 = Rgb888::new(244, 170, 0);

// =============================================================================
// Overlay Colors
// =============================================================================

/// Warm white. Readout digits, meter readings, guide lines and timer ticks.
pub const WHITE: Rgb888 = Rgb888::new(230, 170, 80);

/// Insulin: bolus bars and the insulin-on-board bar.
pub const BLUE: Rgb888 = Rgb888::new(25, 150, 125);

/// Carbohydrate bars.
pub const ORANGE: Rgb888 = Rgb888::new(245, 70, 0);

/// Exercise markers.
pub const PURPLE: Rgb888 = Rgb888::new(250, 0, 105);

// =============================================================================
// Semantic Aliases
// =============================================================================

/// Color of a value strictly between the boundaries.
pub const IN_RANGE: Rgb888 = GREEN;

/// Color of a value on a boundary or within the caution margin.
pub const CAUTION: Rgb888 = YELLOW;

/// End color of the out-of-range gradient.
pub const EXTREME: Rgb888 = RED;

/// Fixed color of fingerstick meter readings.
pub const REFERENCE: Rgb888 = WHITE;

// =============================================================================
// LED Channel Correction Factors
// =============================================================================

/// Static red channel correction.
pub const RED_CORRECTION: f32 = 1.0;

/// Static green channel correction.
pub const GREEN_CORRECTION: f32 = 0.9;

/// Blue channel correction at zero drive.
pub const BLUE_CORRECTION: f32 = 0.7;

/// Exponent of the blue correction curve. Higher = correction confined to lower drive.
pub const LOW_BRIGHTNESS_CORRECTION: i32 = 5;

const _: () = assert!(RED_CORRECTION > 0.0 && RED_CORRECTION <= 1.0);
const _: () = assert!(GREEN_CORRECTION > 0.0 && GREEN_CORRECTION <= 1.0);
const _: () = assert!(BLUE_CORRECTION > 0.0 && BLUE_CORRECTION <= 1.0);
