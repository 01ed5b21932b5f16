//! Application configuration.
//!
//! [`AppConfig`] is the JSON file read at startup. It embeds the engine's
//! [`RenderConfig`] at the top level (flattened, so one flat object configures
//! everything) and adds host-only settings: an IANA timezone, the output type
//! and the stale-data threshold.
//!
//! ```json
//! {
//!   "low bondary glucose": 70,
//!   "high bondary glucose": 180,
//!   "night_brightness": 0.3,
//!   "timezone": "America/Recife",
//!   "output type": "gif"
//! }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use glucose_matrix_common::RenderConfig;
use log::{debug, info};
use serde::{Deserialize, Serialize};

// =============================================================================
// Defaults
// =============================================================================

/// Newest sample older than this triggers a stale-data warning.
pub const DEFAULT_MAX_DATA_AGE_MINUTES: i64 = 20;

/// Scale factor of the preview image.
pub const PREVIEW_SCALE: u32 = 10;

/// Per-channel boost of the brightened preview half.
pub const PREVIEW_BOOST: u8 = 50;

// =============================================================================
// Output Type
// =============================================================================

/// What the host writes besides the pixel dumps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    /// A single still frame.
    #[default]
    Image,
    /// Timer animation frames plus a manifest.
    Gif,
}

// =============================================================================
// App Configuration
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(flatten)]
    pub render: RenderConfig,

    /// IANA timezone name. Overrides `utc_offset_minutes` when set.
    pub timezone: Option<String>,

    #[serde(alias = "output type")]
    pub output_type: OutputType,

    pub max_data_age_minutes: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            render: RenderConfig::default(),
            timezone: None,
            output_type: OutputType::default(),
            max_data_age_minutes: DEFAULT_MAX_DATA_AGE_MINUTES,
        }
    }
}

impl AppConfig {
    /// Load from a JSON file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        info!("Loading configuration from {}", path.display());
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self =
            serde_json::from_str(&content).with_context(|| format!("Failed to parse config {}", path.display()))?;
        debug!("Configuration loaded: {config:?}");
        Ok(config)
    }

    /// Engine configuration for a render at `now`.
    ///
    /// A named timezone is resolved to its UTC offset at `now`, so daylight
    /// saving changes are picked up per render.
    pub fn render_config(&self, now: DateTime<Utc>) -> Result<RenderConfig> {
        let mut render = self.render.clone();
        if let Some(name) = &self.timezone {
            let tz: Tz = name.parse().map_err(|e| anyhow::anyhow!("Unknown timezone '{name}': {e}"))?;
            let offset = tz.offset_from_utc_datetime(&now.naive_utc()).fix();
            render.utc_offset_minutes = offset.local_minus_utc() / 60;
            debug!("Timezone {name} resolved to UTC{:+} minutes", render.utc_offset_minutes);
        }
        Ok(render)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
