//! Color model.
//!
//! Maps glucose values to colors and implements the three ways a color is
//! scaled down on the panel:
//!
//! - [`correct`]: fading with per-channel LED correction (rounded). Used for
//!   overlay base colors and the night brightness pass.
//! - [`dim`]: plain multiplication rounded up. Used for bar ticks and blinking rows.
//! - [`blend_fraction`]: linear blend from black (truncated). Used for the
//!   fractional insulin-on-board pixel.
//!
//! # Color Bands
//!
//! | Value                                   | Color                       |
//! |-----------------------------------------|-----------------------------|
//! | meter reading                           | reference white             |
//! | strictly inside `(low, high)`           | in-range green              |
//! | on a boundary or within 10 beyond it    | caution yellow              |
//! | further beyond the boundary             | caution → extreme gradient  |

use chrono::{DateTime, FixedOffset, Timelike, Utc};
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
#[cfg(not(test))]
use micromath::F32Ext;

use crate::colors::{
    self, BLUE_CORRECTION, CAUTION, EXTREME, GREEN_CORRECTION, IN_RANGE, LOW_BRIGHTNESS_CORRECTION, RED_CORRECTION,
    REFERENCE,
};
use crate::model::SampleKind;
use crate::thresholds::{CAUTION_MARGIN, NIGHT_END_HOUR, NIGHT_START_HOUR};

// =============================================================================
// Glucose Bands
// =============================================================================

/// Classification of a glucose value against the alert boundaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Band {
    /// More than the caution margin below the low boundary.
    BelowRange,
    /// On a boundary or within the caution margin beyond it.
    Caution,
    /// Strictly between the boundaries.
    InRange,
    /// More than the caution margin above the high boundary.
    AboveRange,
}

/// Glucose color rules for one render.
///
/// `min_sample`/`max_sample` are the extremes of the working set and anchor the
/// far end of the out-of-range gradients.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorModel {
    pub low_boundary: i32,
    pub high_boundary: i32,
    pub min_sample: i32,
    pub max_sample: i32,
}

impl ColorModel {
    pub const fn band(&self, value: i32) -> Band {
        if value < self.low_boundary - CAUTION_MARGIN {
            Band::BelowRange
        } else if value > self.high_boundary + CAUTION_MARGIN {
            Band::AboveRange
        } else if value <= self.low_boundary || value >= self.high_boundary {
            Band::Caution
        } else {
            Band::InRange
        }
    }

    /// Color of a sample on the trace.
    pub fn sample_color(&self, value: i32, kind: SampleKind) -> Rgb888 {
        if kind == SampleKind::Meter {
            return REFERENCE;
        }
        match self.band(value) {
            Band::InRange => IN_RANGE,
            Band::Caution => CAUTION,
            Band::BelowRange => {
                let threshold = self.low_boundary - CAUTION_MARGIN;
                gradient(EXTREME, CAUTION, value, self.min_sample, threshold)
            }
            Band::AboveRange => {
                let threshold = self.high_boundary + CAUTION_MARGIN;
                gradient(CAUTION, EXTREME, value, threshold, self.max_sample)
            }
        }
    }
}

/// Interpolate from `from` at `start` to `to` at `end`.
///
/// A degenerate span has no gradient to walk, so it yields [`EXTREME`].
fn gradient(from: Rgb888, to: Rgb888, value: i32, start: i32, end: i32) -> Rgb888 {
    if end <= start {
        return EXTREME;
    }
    let t = (i64::from(value) - i64::from(start)) as f32 / (i64::from(end) - i64::from(start)) as f32;
    lerp(from, to, t)
}

// =============================================================================
// Color Arithmetic
// =============================================================================

/// Linear interpolation, `t` clamped to `[0, 1]`, channels truncated.
pub fn lerp(from: Rgb888, to: Rgb888, t: f32) -> Rgb888 {
    let t = t.clamp(0.0, 1.0);
    let channel = |a: u8, b: u8| -> u8 {
        let v = f32::from(a) + t * (f32::from(b) - f32::from(a));
        v.clamp(0.0, 255.0) as u8
    };
    Rgb888::new(channel(from.r(), to.r()), channel(from.g(), to.g()), channel(from.b(), to.b()))
}

/// Blue correction at drive level `percentile`.
///
/// 1.0 at full drive, falling toward [`BLUE_CORRECTION`] only as drive nears
/// zero, so blue is not cut by the static factor at moderate levels.
pub fn blue_correction(percentile: f32) -> f32 {
    1.0 - (1.0 - BLUE_CORRECTION) * (1.0 - percentile).powi(LOW_BRIGHTNESS_CORRECTION)
}

/// Fade `color` to `percentile` with LED channel correction.
pub fn correct(color: Rgb888, percentile: f32) -> Rgb888 {
    let channel = |c: u8, factor: f32| -> u8 { (f32::from(c) * percentile * factor).round().clamp(0.0, 255.0) as u8 };
    Rgb888::new(
        channel(color.r(), RED_CORRECTION),
        channel(color.g(), GREEN_CORRECTION),
        channel(color.b(), blue_correction(percentile)),
    )
}

/// Scale every channel by `factor`, rounding up.
pub fn dim(color: Rgb888, factor: f32) -> Rgb888 {
    let channel = |c: u8| -> u8 { (f32::from(c) * factor).ceil().clamp(0.0, 255.0) as u8 };
    Rgb888::new(channel(color.r()), channel(color.g()), channel(color.b()))
}

/// Blend from black toward `color` by `fraction`.
#[inline]
pub fn blend_fraction(color: Rgb888, fraction: f32) -> Rgb888 { lerp(colors::BLACK, color, fraction) }

// =============================================================================
// Brightness
// =============================================================================

/// True if `hour` falls in the night window (21:00 inclusive to 06:00 exclusive).
#[inline]
pub const fn is_night_hour(hour: u32) -> bool { hour >= NIGHT_START_HOUR || hour < NIGHT_END_HOUR }

/// Global brightness scalar at `now` in the display timezone.
pub fn brightness_at(now: DateTime<Utc>, offset: FixedOffset, night_brightness: f32) -> f32 {
    if is_night_hour(now.with_timezone(&offset).hour()) { night_brightness } else { 1.0 }
}

/// Apply the brightness scalar to one color. 1.0 is the identity.
pub fn apply_brightness(color: Rgb888, brightness: f32) -> Rgb888 {
    if brightness >= 1.0 { color } else { correct(color, brightness) }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::{BLUE, WHITE};
    use chrono::TimeZone;

    fn model() -> ColorModel { ColorModel { low_boundary: 70, high_boundary: 180, min_sample: 30, max_sample: 300 } }

    #[test]
    fn test_boundary_is_caution() {
        let m = model();
        assert_eq!(m.sample_color(70, SampleKind::Sensor), CAUTION, "Low boundary itself is caution");
        assert_eq!(m.sample_color(180, SampleKind::Sensor), CAUTION, "High boundary itself is caution");
    }

    #[test]
    fn test_in_range_is_green() {
        let m = model();
        assert_eq!(m.sample_color(71, SampleKind::Sensor), IN_RANGE);
        assert_eq!(m.sample_color(179, SampleKind::Sensor), IN_RANGE);
    }

    #[test]
    fn test_margin_edges() {
        let m = model();
        assert_eq!(m.band(60), Band::Caution, "Exactly at the margin is still caution");
        assert_eq!(m.band(59), Band::BelowRange);
        assert_eq!(m.band(190), Band::Caution);
        assert_eq!(m.band(191), Band::AboveRange);
    }

    #[test]
    fn test_low_gradient_differs_from_near_boundary() {
        let m = model();
        let near = m.sample_color(69, SampleKind::Sensor);
        let far = m.sample_color(30, SampleKind::Sensor);
        assert_eq!(near, CAUTION);
        assert_eq!(far, EXTREME, "The working-set minimum takes the extreme color");
        assert_ne!(near, far);
    }

    #[test]
    fn test_low_gradient_midpoint() {
        let m = model();
        // Span 30..60, value 45 → t = 0.5 from red toward yellow
        assert_eq!(m.sample_color(45, SampleKind::Sensor), Rgb888::new(249, 95, 5));
    }

    #[test]
    fn test_high_gradient_reaches_extreme_at_max() {
        let m = model();
        assert_eq!(m.sample_color(300, SampleKind::Sensor), EXTREME);
        let mid = m.sample_color(245, SampleKind::Sensor);
        assert_ne!(mid, CAUTION);
        assert_ne!(mid, EXTREME);
    }

    #[test]
    fn test_degenerate_span_is_extreme() {
        let m = ColorModel { low_boundary: 70, high_boundary: 180, min_sample: 59, max_sample: 191 };
        assert_eq!(m.sample_color(59, SampleKind::Sensor), EXTREME);
        let m = ColorModel { min_sample: 60, ..m };
        assert_eq!(m.sample_color(50, SampleKind::Sensor), EXTREME, "Span collapses when min is past the value");
    }

    #[test]
    fn test_gradient_spans_full_i32_range() {
        let m = ColorModel { low_boundary: 0, high_boundary: 1000, min_sample: 1, max_sample: i32::MAX };
        assert_eq!(m.sample_color(i32::MAX, SampleKind::Sensor), EXTREME);
        let m = ColorModel { low_boundary: 0, high_boundary: 1000, min_sample: i32::MIN, max_sample: 1 };
        assert_eq!(m.sample_color(i32::MIN, SampleKind::Sensor), EXTREME);
    }

    #[test]
    fn test_meter_is_reference() {
        let m = model();
        assert_eq!(m.sample_color(30, SampleKind::Meter), REFERENCE);
        assert_eq!(m.sample_color(120, SampleKind::Meter), REFERENCE);
    }

    #[test]
    fn test_night_correction_never_brightens() {
        let out = correct(WHITE, 0.3);
        assert!(out.r() <= WHITE.r() && out.g() <= WHITE.g() && out.b() <= WHITE.b());
        assert_eq!(out, Rgb888::new(69, 46, 23));
    }

    #[test]
    fn test_blue_boost_at_low_drive() {
        let corrected = correct(WHITE, 0.1).b();
        let naive = f32::from(WHITE.b()) * 0.1 * BLUE_CORRECTION;
        assert!(f32::from(corrected) > naive, "Corrected blue {corrected} should exceed naive {naive}");
        assert!(blue_correction(0.1) > BLUE_CORRECTION);
        assert!((blue_correction(1.0) - 1.0).abs() < 1e-6);
        assert!((blue_correction(0.0) - BLUE_CORRECTION).abs() < 1e-6);
    }

    #[test]
    fn test_correct_clamps() {
        assert_eq!(correct(Rgb888::new(255, 255, 255), 2.0).r(), 255);
        assert_eq!(correct(BLUE, 0.0), colors::BLACK);
    }

    #[test]
    fn test_dim_rounds_up() {
        assert_eq!(dim(Rgb888::new(1, 11, 0), 0.2), Rgb888::new(1, 3, 0));
        assert_eq!(dim(Rgb888::new(25, 150, 125), 0.5), Rgb888::new(13, 75, 63));
    }

    #[test]
    fn test_blend_fraction_truncates() {
        assert_eq!(blend_fraction(Rgb888::new(25, 150, 125), 0.5), Rgb888::new(12, 75, 62));
        assert_eq!(blend_fraction(Rgb888::new(25, 150, 125), 0.0), colors::BLACK);
    }

    #[test]
    fn test_brightness_identity() {
        assert_eq!(apply_brightness(WHITE, 1.0), WHITE);
    }

    #[test]
    fn test_night_window() {
        let offset = FixedOffset::west_opt(3 * 3600).unwrap();
        // 01:00 UTC is 22:00 at UTC-3
        let night = Utc.with_ymd_and_hms(2024, 5, 1, 1, 0, 0).unwrap();
        assert!((brightness_at(night, offset, 0.3) - 0.3).abs() < f32::EPSILON);
        // 15:00 UTC is 12:00 at UTC-3
        let day = Utc.with_ymd_and_hms(2024, 5, 1, 15, 0, 0).unwrap();
        assert!((brightness_at(day, offset, 0.3) - 1.0).abs() < f32::EPSILON);
        assert!(is_night_hour(21) && is_night_hour(5));
        assert!(!is_night_hour(6) && !is_night_hour(20));
    }
}
