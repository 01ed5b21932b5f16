//! Timer strip animation.
//!
//! Column 0, rows 0..5 hold a five-tick strip. Frame 0 shows every tick dim;
//! each following frame lights one more tick, top to bottom, so the strip
//! fills over five minutes and the display visibly ages between refreshes.

use alloc::vec::Vec;

use crate::canvas::Canvas;
use crate::color::{apply_brightness, correct};
use crate::colors::WHITE;

/// Number of ticks in the strip.
pub const TIMER_TICKS: i32 = 5;

/// Column holding the strip.
pub const TIMER_COLUMN: i32 = 0;

/// Display time of one frame.
pub const FRAME_DURATION_MS: u32 = 60_000;

/// Drive level of an unlit tick.
const DIM_TICK_LEVEL: f32 = 0.1;

/// A looping sequence of finished canvases.
#[derive(Clone, Debug, PartialEq)]
pub struct Animation {
    pub frames: Vec<Canvas>,
    pub frame_duration_ms: u32,
    pub looping: bool,
}

/// Build the timer frames on top of a composed (not yet brightness corrected)
/// canvas. Every frame gets the brightness pass on its own.
pub fn build_timer_animation(composed: &Canvas, brightness: f32) -> Animation {
    let mut base = composed.clone();
    let dim_tick = correct(WHITE, DIM_TICK_LEVEL);
    for y in 0..TIMER_TICKS {
        base.set_pixel(TIMER_COLUMN, y, dim_tick);
    }

    let mut frames = Vec::with_capacity(TIMER_TICKS as usize + 1);
    frames.push(finish(&base, brightness));
    for lit in 0..TIMER_TICKS {
        base.set_pixel(TIMER_COLUMN, lit, WHITE);
        frames.push(finish(&base, brightness));
    }

    Animation { frames, frame_duration_ms: FRAME_DURATION_MS, looping: true }
}

fn finish(canvas: &Canvas, brightness: f32) -> Canvas {
    let mut frame = canvas.clone();
    frame.map_colors(|c| apply_brightness(c, brightness));
    frame
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_six_frames_looping() {
        let animation = build_timer_animation(&Canvas::new(32), 1.0);
        assert_eq!(animation.frames.len(), 6);
        assert_eq!(animation.frame_duration_ms, 60_000);
        assert!(animation.looping);
    }

    #[test]
    fn test_ticks_fill_top_to_bottom() {
        let animation = build_timer_animation(&Canvas::new(32), 1.0);
        let dim_tick = correct(WHITE, 0.1);
        for (index, frame) in animation.frames.iter().enumerate() {
            for y in 0..TIMER_TICKS {
                let expected = if (y as usize) < index { WHITE } else { dim_tick };
                assert_eq!(frame.get(0, y), Some(expected), "Frame {index} tick {y}");
            }
        }
    }

    #[test]
    fn test_strip_overwrites_readout_cells() {
        let mut composed = Canvas::new(32);
        composed.set_pixel(0, 2, crate::colors::RED);
        let animation = build_timer_animation(&composed, 1.0);
        assert_eq!(animation.frames[0].get(0, 2), Some(correct(WHITE, 0.1)));
    }

    #[test]
    fn test_frames_brightness_corrected() {
        let animation = build_timer_animation(&Canvas::new(32), 0.3);
        let last = animation.frames.last().unwrap();
        assert_eq!(last.get(0, 0), Some(correct(WHITE, 0.3)));
    }

    #[test]
    fn test_composed_canvas_untouched() {
        let composed = Canvas::new(32);
        let _ = build_timer_animation(&composed, 1.0);
        assert_eq!(composed.painted_count(), 0);
    }
}
