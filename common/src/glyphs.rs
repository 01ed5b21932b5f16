//! Bitmap glyphs and the glucose readout.
//!
//! Glyphs are five rows tall. Each row is a bitmask whose most significant
//! used bit is the leftmost column, so `0b101` on a 3-wide glyph lights
//! columns 0 and 2.
//!
//! The readout is one centered block along the top of the canvas:
//!
//! ```text
//!  [value or LOW/HIGH] [trend arrow] [sign] [|delta|]
//! ```
//!
//! Every element is followed by one column of spacing.

use core::fmt::Write;

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use heapless::String;

use crate::canvas::Canvas;
use crate::colors::{EXTREME, REFERENCE};
use crate::model::TrendDirection;
use crate::thresholds::{HIGH_DISPLAY_LIMIT, LOW_DISPLAY_LIMIT};

/// Height of every glyph.
pub const GLYPH_HEIGHT: i32 = 5;

/// Blank columns after each readout element.
pub const GLYPH_SPACING: i32 = 1;

/// Offset of the readout row above the vertical center of the canvas.
const READOUT_LIFT: i32 = 13;

// =============================================================================
// Glyph Definitions
// =============================================================================

/// A fixed 5-row bitmap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Glyph {
    pub width: i32,
    pub rows: [u8; 5],
}

impl Glyph {
    const fn new(width: i32, rows: [u8; 5]) -> Self { Self { width, rows } }

    /// True if the cell at `(col, row)` is lit.
    pub const fn is_on(&self, col: i32, row: i32) -> bool {
        if col < 0 || col >= self.width || row < 0 || row >= GLYPH_HEIGHT {
            return false;
        }
        (self.rows[row as usize] >> (self.width - 1 - col)) & 1 == 1
    }

    /// Points of the lit cells with the glyph's top-left corner at `origin`.
    pub fn points(&self, origin: Point) -> impl Iterator<Item = Point> + '_ {
        (0..GLYPH_HEIGHT).flat_map(move |row| {
            (0..self.width).filter(move |&col| self.is_on(col, row)).map(move |col| origin + Point::new(col, row))
        })
    }
}

const DIGITS: [Glyph; 10] = [
    Glyph::new(3, [0b111, 0b101, 0b101, 0b101, 0b111]),
    Glyph::new(3, [0b010, 0b110, 0b010, 0b010, 0b111]),
    Glyph::new(3, [0b111, 0b001, 0b111, 0b100, 0b111]),
    Glyph::new(3, [0b111, 0b001, 0b111, 0b001, 0b111]),
    Glyph::new(3, [0b101, 0b101, 0b111, 0b001, 0b001]),
    Glyph::new(3, [0b111, 0b100, 0b111, 0b001, 0b111]),
    Glyph::new(3, [0b111, 0b100, 0b111, 0b101, 0b111]),
    Glyph::new(3, [0b111, 0b001, 0b010, 0b010, 0b010]),
    Glyph::new(3, [0b111, 0b101, 0b111, 0b101, 0b111]),
    Glyph::new(3, [0b111, 0b101, 0b111, 0b001, 0b111]),
];

const LETTER_L: Glyph = Glyph::new(3, [0b100, 0b100, 0b100, 0b100, 0b111]);
const LETTER_O: Glyph = Glyph::new(3, [0b111, 0b101, 0b101, 0b101, 0b111]);
const LETTER_W: Glyph = Glyph::new(5, [0b10001, 0b10001, 0b10101, 0b10101, 0b01010]);
const LETTER_H: Glyph = Glyph::new(3, [0b101, 0b101, 0b111, 0b101, 0b101]);
const LETTER_I: Glyph = Glyph::new(3, [0b111, 0b010, 0b010, 0b010, 0b111]);
const LETTER_G: Glyph = Glyph::new(3, [0b111, 0b100, 0b101, 0b101, 0b111]);

/// `+` sign.
pub const PLUS: Glyph = Glyph::new(3, [0b000, 0b010, 0b111, 0b010, 0b000]);

/// `-` sign.
pub const MINUS: Glyph = Glyph::new(3, [0b000, 0b000, 0b111, 0b000, 0b000]);

/// Placeholder for a missing or unknown trend.
pub const BLANK_ARROW: Glyph = Glyph::new(5, [0; 5]);

const ARROW_FLAT: Glyph = Glyph::new(5, [0b00100, 0b00010, 0b11111, 0b00010, 0b00100]);
const ARROW_SINGLE_UP: Glyph = Glyph::new(5, [0b00100, 0b01110, 0b10101, 0b00100, 0b00100]);
const ARROW_SINGLE_DOWN: Glyph = Glyph::new(5, [0b00100, 0b00100, 0b10101, 0b01110, 0b00100]);
const ARROW_45_UP: Glyph = Glyph::new(5, [0b01111, 0b00011, 0b00101, 0b01001, 0b10000]);
const ARROW_45_DOWN: Glyph = Glyph::new(5, [0b10000, 0b01001, 0b00101, 0b00011, 0b01111]);
const ARROW_DOUBLE_UP: Glyph = Glyph::new(7, [0b0010100, 0b0111110, 0b1010101, 0b0010100, 0b0010100]);
const ARROW_DOUBLE_DOWN: Glyph = Glyph::new(7, [0b0010100, 0b0010100, 0b1010101, 0b0111110, 0b0010100]);

/// Glyph for a readout character. Unsupported characters have none.
pub fn char_glyph(c: char) -> Option<Glyph> {
    match c {
        '0'..='9' => Some(DIGITS[(c as u8 - b'0') as usize]),
        'L' => Some(LETTER_L),
        'O' => Some(LETTER_O),
        'W' => Some(LETTER_W),
        'H' => Some(LETTER_H),
        'I' => Some(LETTER_I),
        'G' => Some(LETTER_G),
        '+' => Some(PLUS),
        '-' => Some(MINUS),
        _ => None,
    }
}

/// Arrow glyph for a trend, blank when absent.
pub fn arrow_glyph(trend: Option<TrendDirection>) -> Glyph {
    match trend {
        Some(TrendDirection::DoubleUp) => ARROW_DOUBLE_UP,
        Some(TrendDirection::SingleUp) => ARROW_SINGLE_UP,
        Some(TrendDirection::FortyFiveUp) => ARROW_45_UP,
        Some(TrendDirection::Flat) => ARROW_FLAT,
        Some(TrendDirection::FortyFiveDown) => ARROW_45_DOWN,
        Some(TrendDirection::SingleDown) => ARROW_SINGLE_DOWN,
        Some(TrendDirection::DoubleDown) => ARROW_DOUBLE_DOWN,
        None => BLANK_ARROW,
    }
}

/// Stamp the lit cells of `glyph` at `origin`, overwriting. Off-grid cells are clipped.
pub fn draw_pattern(canvas: &mut Canvas, glyph: &Glyph, origin: Point, color: Rgb888) {
    for point in glyph.points(origin) {
        canvas.set_pixel(point.x, point.y, color);
    }
}

// =============================================================================
// Readout
// =============================================================================

/// Readout label text: the value's digits or a `LOW`/`HIGH` literal.
pub type Label = String<8>;

/// Label for a glucose value and whether it is an out-of-range literal.
pub fn glucose_label(value: i32) -> (Label, bool) {
    let mut label = Label::new();
    let extreme = if value <= LOW_DISPLAY_LIMIT {
        let _ = label.push_str("LOW");
        true
    } else if value >= HIGH_DISPLAY_LIMIT {
        let _ = label.push_str("HIGH");
        true
    } else {
        let _ = write!(label, "{value}");
        false
    };
    (label, extreme)
}

/// Sign glyph of a delta: `-` when negative, `+` otherwise.
pub const fn sign_glyph(delta: i32) -> Glyph { if delta < 0 { MINUS } else { PLUS } }

/// Everything the readout shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Readout {
    pub label: Label,
    pub extreme: bool,
    pub trend: Option<TrendDirection>,
    pub delta: i32,
}

impl Readout {
    pub fn new(value: i32, trend: Option<TrendDirection>, delta: i32) -> Self {
        let (label, extreme) = glucose_label(value);
        Self { label, extreme, trend, delta }
    }

    /// Color of the whole readout block.
    pub const fn color(&self) -> Rgb888 { if self.extreme { EXTREME } else { REFERENCE } }

    /// Absolute delta as digits.
    pub fn delta_digits(&self) -> Label {
        let mut digits = Label::new();
        let _ = write!(digits, "{}", self.delta.unsigned_abs());
        digits
    }

    /// Glyphs in draw order.
    fn glyphs(&self) -> impl Iterator<Item = Glyph> + '_ {
        let label = self.label.chars().filter_map(char_glyph);
        let delta = self.delta_digits();
        let delta_glyphs = delta.chars().filter_map(char_glyph).collect::<heapless::Vec<Glyph, 8>>();
        label
            .chain(core::iter::once(arrow_glyph(self.trend)))
            .chain(core::iter::once(sign_glyph(self.delta)))
            .chain(delta_glyphs)
    }

    /// Total width of the block including per-element spacing.
    pub fn width(&self) -> i32 { self.glyphs().map(|g| g.width + GLYPH_SPACING).sum() }
}

/// Placement of the readout on a canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadoutPlacement {
    pub start_x: i32,
    pub y: i32,
    pub width: i32,
}

impl ReadoutPlacement {
    pub fn compute(readout: &Readout, matrix_size: i32) -> Self {
        let width = readout.width();
        let start_x = (matrix_size - width).div_euclid(2);
        let y = ((matrix_size - GLYPH_HEIGHT).div_euclid(2) - READOUT_LIFT).max(0);
        Self { start_x, y, width }
    }

    /// True if the whole block lies inside `0..matrix_size`.
    pub const fn fits(&self, matrix_size: i32) -> bool { self.start_x >= 0 && self.start_x + self.width <= matrix_size }
}

/// Draw the readout centered on the canvas and return where it went.
pub fn draw_readout(canvas: &mut Canvas, readout: &Readout) -> ReadoutPlacement {
    let placement = ReadoutPlacement::compute(readout, canvas.matrix_size());
    if !placement.fits(canvas.matrix_size()) {
        log::warn!("readout {} px wide does not fit a {} px canvas, clipping", placement.width, canvas.matrix_size());
    }

    let color = readout.color();
    let mut x = placement.start_x;
    for glyph in readout.glyphs() {
        draw_pattern(canvas, &glyph, Point::new(x, placement.y), color);
        x += glyph.width + GLYPH_SPACING;
    }
    placement
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_bit_order() {
        let one = char_glyph('1').unwrap();
        assert!(one.is_on(1, 0), "Top of the 1 stroke is the middle column");
        assert!(!one.is_on(0, 0));
        assert!(one.is_on(0, 4) && one.is_on(2, 4), "Base of the 1 is full width");
        assert!(!one.is_on(3, 0), "Outside the glyph is never lit");
    }

    #[test]
    fn test_all_digits_defined() {
        for c in '0'..='9' {
            let glyph = char_glyph(c).expect("digit glyph");
            assert_eq!(glyph.width, 3);
            assert!(glyph.points(Point::zero()).count() > 0, "Digit {c} has no lit cells");
        }
    }

    #[test]
    fn test_arrow_widths() {
        assert_eq!(arrow_glyph(Some(TrendDirection::Flat)).width, 5);
        assert_eq!(arrow_glyph(Some(TrendDirection::DoubleUp)).width, 7);
        assert_eq!(arrow_glyph(Some(TrendDirection::DoubleDown)).width, 7);
        assert_eq!(arrow_glyph(None), BLANK_ARROW);
        assert_eq!(BLANK_ARROW.points(Point::zero()).count(), 0);
    }

    #[test]
    fn test_glucose_labels() {
        assert_eq!(glucose_label(120), (Label::try_from("120").unwrap(), false));
        assert_eq!(glucose_label(39), (Label::try_from("LOW").unwrap(), true));
        assert_eq!(glucose_label(40), (Label::try_from("40").unwrap(), false));
        assert_eq!(glucose_label(399), (Label::try_from("399").unwrap(), false));
        assert_eq!(glucose_label(400), (Label::try_from("HIGH").unwrap(), true));
    }

    #[test]
    fn test_readout_color() {
        assert_eq!(Readout::new(120, None, 0).color(), REFERENCE);
        assert_eq!(Readout::new(30, None, 0).color(), EXTREME);
        assert_eq!(Readout::new(450, None, 0).color(), EXTREME);
    }

    #[test]
    fn test_sign_glyph() {
        assert_eq!(sign_glyph(-1), MINUS);
        assert_eq!(sign_glyph(0), PLUS, "Zero delta shows a plus");
        assert_eq!(sign_glyph(5), PLUS);
    }

    #[test]
    fn test_readout_width_and_placement() {
        let readout = Readout::new(120, None, -10);
        // "120" 3×4 + blank arrow 6 + sign 4 + "10" 2×4
        assert_eq!(readout.width(), 30);
        let placement = ReadoutPlacement::compute(&readout, 32);
        assert_eq!(placement.start_x, 1);
        assert_eq!(placement.y, 0);
        assert!(placement.fits(32));
    }

    #[test]
    fn test_readout_row_clamped_on_small_canvas() {
        let placement = ReadoutPlacement::compute(&Readout::new(120, None, 0), 16);
        assert_eq!(placement.y, 0, "Row must never go negative");
    }

    #[test]
    fn test_overflowing_readout_is_clipped() {
        let mut canvas = Canvas::new(16);
        let readout = Readout::new(450, Some(TrendDirection::DoubleUp), 123);
        let placement = draw_readout(&mut canvas, &readout);
        assert!(!placement.fits(16));
        assert!(canvas.pixel_list().iter().all(|p| (0..16).contains(&p.x) && (0..16).contains(&p.y)));
    }

    #[test]
    fn test_draw_readout_stays_in_band() {
        let mut canvas = Canvas::new(32);
        draw_readout(&mut canvas, &Readout::new(120, Some(TrendDirection::Flat), -10));
        assert!(canvas.painted_count() > 0);
        assert!(canvas.pixel_list().iter().all(|p| p.y < GLYPH_HEIGHT), "Readout must stay in rows 0..5");
    }
}
