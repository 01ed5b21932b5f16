//! The N×N pixel grid.
//!
//! Cells start vacant (`None`) and the finished grid reports unlit cells as
//! black. Vacancy is tracked separately from color so overlays can implement
//! "first writer wins" with a direct `(x, y)` lookup even when a writer
//! happens to paint black.
//!
//! Two write modes exist:
//! - [`Canvas::set_pixel`] overwrites. Used only by the readout and the
//!   animation strip, which own their cells.
//! - [`Canvas::paint_if_vacant`] writes only into vacant cells. Used by every
//!   overlay so the draw order decides collisions.
//!
//! Both silently drop writes outside the grid.

use alloc::vec;
use alloc::vec::Vec;
use core::convert::Infallible;

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::*;
use serde::Serialize;

use crate::color::dim;
use crate::colors::BLACK;
use crate::thresholds::{BAR_TICK_DIM, BAR_TICK_SPACING, BLINK_DIM};

// =============================================================================
// Pixel Record
// =============================================================================

/// One lit cell of the output list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PixelRecord {
    pub x: i32,
    pub y: i32,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

// =============================================================================
// Bar Style
// =============================================================================

/// Decorations of a vertical bar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BarStyle {
    /// Every fifth row counted from the bar's base is dimmed.
    pub ticks: bool,
    /// Rows with an even index are dimmed.
    pub blink: bool,
}

impl BarStyle {
    pub const PLAIN: Self = Self { ticks: false, blink: false };
    pub const TICKED: Self = Self { ticks: true, blink: false };
    pub const BLINKING: Self = Self { ticks: false, blink: true };

    /// Color of row `y` of a bar based at `start_y`.
    fn row_color(self, color: Rgb888, start_y: i32, y: i32) -> Rgb888 {
        if self.ticks && (y - start_y + 1) % BAR_TICK_SPACING == 0 {
            dim(color, BAR_TICK_DIM)
        } else if self.blink && y % 2 == 0 {
            dim(color, BLINK_DIM)
        } else {
            color
        }
    }
}

// =============================================================================
// Canvas
// =============================================================================

/// Square RGB grid with origin at the top left.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    size: i32,
    cells: Vec<Option<Rgb888>>,
}

impl Canvas {
    /// Create an empty `size`×`size` canvas.
    pub fn new(size: usize) -> Self {
        Self { size: size as i32, cells: vec![None; size * size] }
    }

    /// Edge length in cells.
    #[inline]
    pub const fn matrix_size(&self) -> i32 { self.size }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let on_grid = (0..self.size).contains(&x) && (0..self.size).contains(&y);
        on_grid.then(|| (y * self.size + x) as usize)
    }

    /// Color of a painted cell, `None` if vacant or off the grid.
    pub fn get(&self, x: i32, y: i32) -> Option<Rgb888> { self.index(x, y).and_then(|i| self.cells[i]) }

    /// True if `(x, y)` is on the grid and already painted.
    pub fn is_painted(&self, x: i32, y: i32) -> bool { self.get(x, y).is_some() }

    /// Overwrite a cell. Off-grid writes are dropped.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgb888) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = Some(color);
        }
    }

    /// Paint a cell only if it is vacant. Returns true if the cell was written.
    pub fn paint_if_vacant(&mut self, x: i32, y: i32, color: Rgb888) -> bool {
        match self.index(x, y) {
            Some(i) if self.cells[i].is_none() => {
                self.cells[i] = Some(color);
                true
            }
            _ => false,
        }
    }

    /// Vertical bar of `height` rows hanging down from `start_y`, clipped at
    /// the bottom edge. Writes only into vacant cells.
    pub fn vertical_bar(&mut self, x: i32, start_y: i32, height: i32, color: Rgb888, style: BarStyle) {
        let end_y = start_y.saturating_add(height.max(0)).min(self.size);
        for y in start_y.max(0)..end_y {
            self.paint_if_vacant(x, y, style.row_color(color, start_y, y));
        }
    }

    /// Horizontal run over columns `x_start..x_end` on row `y`. Writes only
    /// into vacant cells.
    pub fn horizontal_run(&mut self, y: i32, x_start: i32, x_end: i32, color: Rgb888) {
        for x in x_start.max(0)..x_end.min(self.size) {
            self.paint_if_vacant(x, y, color);
        }
    }

    /// Apply `f` to every painted cell.
    pub fn map_colors(&mut self, mut f: impl FnMut(Rgb888) -> Rgb888) {
        for cell in self.cells.iter_mut().flatten() {
            *cell = f(*cell);
        }
    }

    /// Number of painted cells.
    pub fn painted_count(&self) -> usize { self.cells.iter().filter(|c| c.is_some()).count() }

    /// Painted cells in row-major order.
    pub fn pixel_list(&self) -> Vec<PixelRecord> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| {
                let color = (*cell)?;
                let i = i as i32;
                Some(PixelRecord { x: i % self.size, y: i / self.size, r: color.r(), g: color.g(), b: color.b() })
            })
            .collect()
    }

    /// Full grid as rows of `[r, g, b]`, vacant cells black.
    pub fn to_grid(&self) -> Vec<Vec<[u8; 3]>> {
        self.cells
            .chunks(self.size as usize)
            .map(|row| {
                row.iter()
                    .map(|cell| {
                        let c = cell.unwrap_or(BLACK);
                        [c.r(), c.g(), c.b()]
                    })
                    .collect()
            })
            .collect()
    }

    /// Iterate every cell as an embedded-graphics pixel, vacant cells black.
    pub fn pixels(&self) -> impl Iterator<Item = Pixel<Rgb888>> + '_ {
        self.cells.iter().enumerate().map(move |(i, cell)| {
            let i = i as i32;
            Pixel(Point::new(i % self.size, i / self.size), cell.unwrap_or(BLACK))
        })
    }
}

// =============================================================================
// embedded-graphics Integration
// =============================================================================

impl OriginDimensions for Canvas {
    fn size(&self) -> Size { Size::new(self.size as u32, self.size as u32) }
}

/// Drawing through embedded-graphics overwrites, like [`Canvas::set_pixel`].
impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            self.set_pixel(coord.x, coord.y, color);
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
