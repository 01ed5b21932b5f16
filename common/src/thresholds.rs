//! Centralized display threshold configuration.
//!
//! User-tunable values (glucose range, alert boundaries, night brightness) live
//! in [`crate::config::RenderConfig`]. Everything here is a fixed property of
//! the display layout or the color rules, so it is a compile-time constant with
//! `const` ordering assertions, and compilation fails if they are reordered.

// =============================================================================
// Color Band Thresholds
// =============================================================================

/// Distance (mg/dL) beyond a boundary that still renders as plain caution.
/// Values further out are drawn with the caution → extreme gradient.
pub const CAUTION_MARGIN: i32 = 10;

// =============================================================================
// Readout Display Limits
// =============================================================================

/// At or below this value the readout shows the literal "LOW".
/// Sensors report 39 for "below measurable range".
pub const LOW_DISPLAY_LIMIT: i32 = 39;

/// At or above this value the readout shows the literal "HIGH".
pub const HIGH_DISPLAY_LIMIT: i32 = 400;

const _: () = assert!(LOW_DISPLAY_LIMIT < HIGH_DISPLAY_LIMIT);

// =============================================================================
// Night Window
// =============================================================================

/// Local hour (inclusive) at which night brightness starts.
pub const NIGHT_START_HOUR: u32 = 21;

/// Local hour (exclusive) at which night brightness ends.
pub const NIGHT_END_HOUR: u32 = 6;

const _: () = assert!(NIGHT_END_HOUR < NIGHT_START_HOUR);
const _: () = assert!(NIGHT_START_HOUR < 24);

// =============================================================================
// Bar Decorations
// =============================================================================

/// Minimum fractional insulin-on-board remainder that earns a blended pixel.
pub const IOB_FRACTION_MIN: f32 = 0.1;

/// Every `BAR_TICK_SPACING`th row of a treatment bar is drawn at half intensity.
pub const BAR_TICK_SPACING: i32 = 5;

/// Intensity of a treatment bar tick row.
pub const BAR_TICK_DIM: f32 = 0.5;

/// Intensity of the faded rows of a blinking bar.
pub const BLINK_DIM: f32 = 0.2;

const _: () = assert!(BAR_TICK_SPACING > 1);

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
#[allow(clippy::assertions_on_constants)] // Intentional validation of threshold ordering
mod tests {
    use super::*;

    #[test]
    fn test_display_limit_ordering() {
        assert!(LOW_DISPLAY_LIMIT < HIGH_DISPLAY_LIMIT);
    }

    #[test]
    fn test_night_window_wraps_midnight() {
        // The window starts in the evening and ends the next morning
        assert!(NIGHT_START_HOUR > NIGHT_END_HOUR);
        assert!(NIGHT_START_HOUR < 24);
    }

    #[test]
    fn test_bar_decoration_intensities_dim() {
        assert!(BAR_TICK_DIM > 0.0 && BAR_TICK_DIM < 1.0, "Ticks must be dimmer than the bar");
        assert!(BLINK_DIM > 0.0 && BLINK_DIM < 1.0, "Blink rows must be dimmer than the bar");
    }

    #[test]
    fn test_caution_margin_positive() {
        assert!(CAUTION_MARGIN > 0);
    }
}
