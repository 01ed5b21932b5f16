//! Telemetry-to-pixel rendering engine for glucose LED matrix displays.
//!
//! This crate turns a newest-first window of CGM samples and treatment events
//! into a fully composited square RGB grid. It is platform-agnostic and shared
//! between the desktop host and any device-side consumer:
//!
//! - [`model`]: Glucose samples, treatment events and the bounded working set
//! - [`config`]: Render configuration with defaults and validation
//! - [`thresholds`]: Compile-time margins, display limits and the night window
//! - [`mapper`]: Glucose → row, sample index → column, elapsed time → column
//! - [`colors`]: Palette and per-channel LED correction factors
//! - [`color`]: Glucose color bands, gradients, fading and brightness
//! - [`glyphs`]: Bitmap glyphs and the centered glucose readout
//! - [`canvas`]: The N×N grid with collision-aware pixel writes
//! - [`overlays`]: Trace, boundary lines, treatment/IOB bars, exercise markers
//! - [`animation`]: Looping timer-strip frames
//! - [`render`]: The orchestrator producing one finished canvas per refresh
//!
//! # no_std Compatibility
//!
//! The crate is `no_std` + `alloc`. It never reads the clock: the current time
//! is part of every render call, so identical inputs always produce identical
//! pixels.

// Use no_std only when NOT testing (tests need std for the test harness)
#![cfg_attr(not(test), no_std)]
// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

extern crate alloc;

pub mod animation;
pub mod canvas;
pub mod color;
pub mod colors;
pub mod config;
pub mod error;
pub mod glyphs;
pub mod mapper;
pub mod model;
pub mod overlays;
pub mod render;
pub mod thresholds;

// Re-export commonly used items
pub use canvas::{Canvas, PixelRecord};
pub use config::{RenderConfig, TraceLayout};
pub use error::RenderError;
pub use model::{GlucoseSample, SampleKind, TreatmentEvent, TreatmentKind, TrendDirection, WorkingSet};
pub use render::{RenderOutput, Renderer};
