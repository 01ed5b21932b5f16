//! Render errors.
//!
//! Only conditions that make a whole render meaningless are errors. Glyphs
//! running off the grid are clipped and unknown trend directions fall back to a
//! blank glyph; neither aborts the pass.

use alloc::string::String;

/// Reasons a render pass is refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    /// The working set holds no glucose samples at all.
    #[error("no glucose samples to render")]
    EmptyDataset,

    /// The newest sample cannot anchor the readout.
    #[error("malformed anchor sample: {reason}")]
    MalformedAnchor {
        /// What is wrong with the anchor.
        reason: String,
    },

    /// The configuration cannot produce a usable layout.
    #[error("invalid render configuration: {0}")]
    InvalidConfig(String),
}
