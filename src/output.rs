//! Output writers.
//!
//! Everything lands in one output directory:
//!
//! | File               | Content                                         |
//! |--------------------|-------------------------------------------------|
//! | `pixels.json`      | lit cells as `{x, y, r, g, b}`                  |
//! | `grid.json`        | N rows of N `[r, g, b]` triples                 |
//! | `output_image.png` | still frame at 1 px per LED, or the stale image |
//! | `frame-<i>.png`    | animation frames (gif mode)                     |
//! | `animation.json`   | frame list, per-frame duration, loop flag       |
//! | `preview.png`      | scaled matrix next to a brightened copy         |
//!
//! PNG encoding goes through `embedded-graphics-simulator`: the canvas is
//! drawn onto a [`SimulatorDisplay`] and exported as an output image, which
//! is exactly how the display would look in the simulator window.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{OutputSettingsBuilder, SimulatorDisplay};
use glucose_matrix_common::Canvas;
use glucose_matrix_common::animation::Animation;
use log::info;
use serde::Serialize;

use crate::config::{PREVIEW_BOOST, PREVIEW_SCALE};

pub const PIXELS_FILE: &str = "pixels.json";
pub const GRID_FILE: &str = "grid.json";
pub const IMAGE_FILE: &str = "output_image.png";
pub const ANIMATION_FILE: &str = "animation.json";
pub const PREVIEW_FILE: &str = "preview.png";

/// Animation manifest handed to the GIF encoder.
#[derive(Debug, Serialize)]
struct AnimationManifest {
    frames: Vec<String>,
    frame_duration_ms: u32,
    /// `0` loops forever, as GIF encoders expect.
    loop_count: u32,
    looping: bool,
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string(value)?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

/// Write `pixels.json` and `grid.json`.
pub fn write_pixel_dumps(dir: &Path, canvas: &Canvas) -> Result<()> {
    write_json(&dir.join(PIXELS_FILE), &canvas.pixel_list())?;
    write_json(&dir.join(GRID_FILE), &canvas.to_grid())?;
    Ok(())
}

/// Draw a canvas onto a simulator display at `offset`.
fn blit(display: &mut SimulatorDisplay<Rgb888>, canvas: &Canvas, offset: Point, map: impl Fn(Rgb888) -> Rgb888) {
    display.draw_iter(canvas.pixels().map(|Pixel(p, c)| Pixel(p + offset, map(c)))).ok();
}

/// Write one canvas as a PNG at 1 px per LED.
pub fn write_png(path: &Path, canvas: &Canvas) -> Result<()> {
    let size = canvas.matrix_size() as u32;
    let mut display = SimulatorDisplay::<Rgb888>::new(Size::new(size, size));
    blit(&mut display, canvas, Point::zero(), |c| c);
    let settings = OutputSettingsBuilder::new().scale(1).build();
    display
        .to_rgb_output_image(&settings)
        .save_png(path)
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Write the still frame.
pub fn write_image(dir: &Path, canvas: &Canvas) -> Result<PathBuf> {
    let path = dir.join(IMAGE_FILE);
    write_png(&path, canvas)?;
    info!("Wrote {}", path.display());
    Ok(path)
}

/// Put the stale-data image in place of the still frame.
pub fn write_stale_image(dir: &Path, source: &Path) -> Result<PathBuf> {
    let path = dir.join(IMAGE_FILE);
    std::fs::copy(source, &path)
        .with_context(|| format!("Failed to copy stale image {} to {}", source.display(), path.display()))?;
    info!("Wrote stale-data image {}", path.display());
    Ok(path)
}

/// Write every animation frame and the manifest.
pub fn write_animation(dir: &Path, animation: &Animation) -> Result<PathBuf> {
    let mut frames = Vec::with_capacity(animation.frames.len());
    for (index, frame) in animation.frames.iter().enumerate() {
        let name = format!("frame-{index}.png");
        write_png(&dir.join(&name), frame)?;
        frames.push(name);
    }
    let manifest = AnimationManifest {
        frames,
        frame_duration_ms: animation.frame_duration_ms,
        loop_count: 0,
        looping: animation.looping,
    };
    let path = dir.join(ANIMATION_FILE);
    write_json(&path, &manifest)?;
    info!("Wrote {} frames and {}", animation.frames.len(), path.display());
    Ok(path)
}

/// Boost every channel for the preview's brightened half.
fn brighten(color: Rgb888) -> Rgb888 {
    Rgb888::new(
        color.r().saturating_add(PREVIEW_BOOST),
        color.g().saturating_add(PREVIEW_BOOST),
        color.b().saturating_add(PREVIEW_BOOST),
    )
}

/// Write the side-by-side preview: the matrix as-is on the left and brightened
/// on the right, scaled up for a monitor.
pub fn write_preview(dir: &Path, canvas: &Canvas) -> Result<PathBuf> {
    let size = canvas.matrix_size();
    let mut display = SimulatorDisplay::<Rgb888>::new(Size::new(2 * size as u32, size as u32));
    blit(&mut display, canvas, Point::zero(), |c| c);
    blit(&mut display, canvas, Point::new(size, 0), brighten);

    let path = dir.join(PREVIEW_FILE);
    let settings = OutputSettingsBuilder::new().scale(PREVIEW_SCALE).build();
    display
        .to_rgb_output_image(&settings)
        .save_png(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(path)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use glucose_matrix_common::animation::build_timer_animation;

    fn sample_canvas() -> Canvas {
        let mut canvas = Canvas::new(16);
        canvas.set_pixel(3, 4, Rgb888::new(230, 170, 80));
        canvas
    }

    #[test]
    fn test_pixel_dumps() {
        let dir = tempfile::tempdir().unwrap();
        write_pixel_dumps(dir.path(), &sample_canvas()).unwrap();

        let pixels: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(PIXELS_FILE)).unwrap()).unwrap();
        assert_eq!(pixels, serde_json::json!([{ "x": 3, "y": 4, "r": 230, "g": 170, "b": 80 }]));

        let grid: Vec<Vec<[u8; 3]>> =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(GRID_FILE)).unwrap()).unwrap();
        assert_eq!(grid.len(), 16);
        assert_eq!(grid[4][3], [230, 170, 80]);
        assert_eq!(grid[0][0], [0, 0, 0]);
    }

    #[test]
    fn test_brighten_saturates() {
        assert_eq!(brighten(Rgb888::new(0, 210, 255)), Rgb888::new(50, 255, 255));
    }

    #[test]
    fn test_write_image_and_preview() {
        let dir = tempfile::tempdir().unwrap();
        let image = write_image(dir.path(), &sample_canvas()).unwrap();
        let preview = write_preview(dir.path(), &sample_canvas()).unwrap();
        assert!(image.exists() && preview.exists());
    }

    #[test]
    fn test_write_stale_image_replaces_still() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("nocgmdata.png");
        std::fs::write(&source, b"no data").unwrap();
        write_image(dir.path(), &sample_canvas()).unwrap();

        let path = write_stale_image(dir.path(), &source).unwrap();
        assert_eq!(path, dir.path().join(IMAGE_FILE));
        assert_eq!(std::fs::read(&path).unwrap(), b"no data");
    }

    #[test]
    fn test_write_stale_image_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        assert!(write_stale_image(dir.path(), &dir.path().join("missing.png")).is_err());
    }

    #[test]
    fn test_write_animation_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let animation = build_timer_animation(&sample_canvas(), 1.0);
        let path = write_animation(dir.path(), &animation).unwrap();

        let manifest: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(manifest["frames"].as_array().map(Vec::len), Some(6));
        assert_eq!(manifest["frame_duration_ms"], 60_000);
        assert_eq!(manifest["loop_count"], 0);
        assert!(dir.path().join("frame-5.png").exists());
    }
}
