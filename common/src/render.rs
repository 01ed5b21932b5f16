//! Render orchestration.
//!
//! [`Renderer`] sequences the mapper, color model, glyph compositor and
//! overlay builders into one finished canvas per telemetry refresh:
//!
//! ```text
//! WorkingSet ─► readout ─► trace ─► boundaries ─► treatments ─► exercise ─► IOB ─► gridlines
//!                                                                                    │
//!                                             brightness pass ◄── composed canvas ◄──┘
//! ```
//!
//! The composed canvas (before brightness) is also the input of the timer
//! animation, which adds its strip and then corrects every frame itself.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use chrono::{DateTime, FixedOffset, Utc};

use crate::animation::{build_timer_animation, Animation};
use crate::canvas::Canvas;
use crate::color::{apply_brightness, brightness_at, ColorModel};
use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::glyphs::{draw_readout, Readout, ReadoutPlacement};
use crate::mapper::CoordinateMapper;
use crate::model::{GlucoseSample, TreatmentEvent, TrendDirection, WorkingSet};
use crate::overlays;

/// What the readout shows, reported alongside the pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct ReadoutSummary {
    /// Raw anchor value.
    pub value: i32,
    /// Difference between the two newest sensor readings.
    pub delta: i32,
    pub trend: Option<TrendDirection>,
    /// Digits or the `LOW`/`HIGH` literal.
    pub label: String,
    /// True if `label` is an out-of-range literal.
    pub extreme: bool,
    pub placement: ReadoutPlacement,
    /// Global brightness scalar applied to the canvas.
    pub brightness: f32,
}

/// Finished still frame.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderOutput {
    pub canvas: Canvas,
    pub summary: ReadoutSummary,
}

/// Finished animation.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationOutput {
    pub animation: Animation,
    pub summary: ReadoutSummary,
}

/// Stateless renderer bound to one validated configuration.
#[derive(Clone, Debug)]
pub struct Renderer {
    config: RenderConfig,
    mapper: CoordinateMapper,
    offset: FixedOffset,
}

impl Renderer {
    /// Validate `config` and build a renderer for it.
    pub fn new(config: RenderConfig) -> Result<Self, RenderError> {
        config.validate()?;
        let offset = config.display_offset()?;
        let mapper = CoordinateMapper::new(config.matrix_size, config.min_glucose, config.max_glucose);
        Ok(Self { config, mapper, offset })
    }

    #[inline]
    pub const fn config(&self) -> &RenderConfig { &self.config }

    #[inline]
    pub const fn mapper(&self) -> &CoordinateMapper { &self.mapper }

    /// Build a working set sized for this renderer's matrix.
    pub fn working_set(
        &self,
        samples: Vec<GlucoseSample>,
        treatments: Vec<TreatmentEvent>,
        iob_history: Vec<f32>,
    ) -> WorkingSet {
        WorkingSet::new(samples, treatments, iob_history, self.config.sample_capacity())
    }

    /// Render one still frame.
    pub fn render(&self, set: &WorkingSet, now: DateTime<Utc>) -> Result<RenderOutput, RenderError> {
        let (mut canvas, summary) = self.compose(set, now)?;
        let brightness = summary.brightness;
        canvas.map_colors(|c| apply_brightness(c, brightness));
        Ok(RenderOutput { canvas, summary })
    }

    /// Render the looping timer animation.
    pub fn render_animation(&self, set: &WorkingSet, now: DateTime<Utc>) -> Result<AnimationOutput, RenderError> {
        let (canvas, summary) = self.compose(set, now)?;
        let animation = build_timer_animation(&canvas, summary.brightness);
        Ok(AnimationOutput { animation, summary })
    }

    /// Draw every layer without the brightness pass.
    fn compose(&self, set: &WorkingSet, now: DateTime<Utc>) -> Result<(Canvas, ReadoutSummary), RenderError> {
        let anchor = set.anchor().ok_or(RenderError::EmptyDataset)?;
        if anchor.value <= 0 {
            return Err(RenderError::MalformedAnchor { reason: alloc::format!("non-positive value {}", anchor.value) });
        }

        let config = &self.config;
        let samples = set.samples();
        let (min_sample, max_sample) = (set.min_value().unwrap_or(anchor.value), set.max_value().unwrap_or(anchor.value));
        let colors = ColorModel {
            low_boundary: config.low_boundary,
            high_boundary: config.high_boundary,
            min_sample,
            max_sample,
        };

        let mut canvas = Canvas::new(config.matrix_size);

        let readout = Readout::new(anchor.value, anchor.trend, set.delta());
        let placement = draw_readout(&mut canvas, &readout);

        overlays::draw_sample_trace(&mut canvas, &self.mapper, &colors, samples, config.trace_layout, now);
        overlays::draw_boundary_lines(&mut canvas, &self.mapper, config.low_boundary, config.high_boundary);
        overlays::draw_treatment_bars(&mut canvas, &self.mapper, config, samples, set.treatments());
        let exercise = overlays::exercise_columns(&self.mapper, samples, set.treatments());
        overlays::draw_exercise_markers(&mut canvas, &self.mapper, &exercise, config.low_boundary, config.high_boundary);
        overlays::draw_iob_bars(&mut canvas, &self.mapper, set.iob_history(), config.high_boundary);
        overlays::draw_hour_gridlines(&mut canvas, &self.mapper, config.high_boundary);

        let brightness = brightness_at(now, self.offset, config.night_brightness);
        log::debug!(
            "composed {} samples, {} treatments, {} cells lit, readout '{}' delta {}, brightness {}",
            samples.len(),
            set.treatments().len(),
            canvas.painted_count(),
            readout.label,
            readout.delta,
            brightness
        );

        let summary = ReadoutSummary {
            value: anchor.value,
            delta: readout.delta,
            trend: readout.trend,
            label: readout.label.as_str().to_string(),
            extreme: readout.extreme,
            placement,
            brightness,
        };
        Ok((canvas, summary))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
