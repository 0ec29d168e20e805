//! Errors raised before a run reaches the network.
//!
//! [`NormalizeError`] covers failures while turning node inputs into a
//! backend request. [`FieldError`] is the per-field outcome of form
//! validation; it never leaves the input form.
//!
//! # Examples
//!
//! ```
//! use modelrun::domain::error::NormalizeError;
//!
//! let err = NormalizeError::UpscaleTooLarge {
//!     width: 3000,
//!     height: 3000,
//!     scale: 8,
//!     budget: 25_300_000,
//!     suggested_scale: Some(2),
//! };
//! assert!(err.to_string().contains("Try 2x upscaling instead"));
//! ```

use thiserror::Error;

/// Errors that abort normalization of a run's inputs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizeError {
    /// The input image could not be fetched or decoded to read its size.
    #[error("Cannot read input image")]
    UnreadableImage {
        /// URL of the image that failed to load.
        url: String,
        /// Underlying failure, kept for logging.
        reason: String,
    },

    /// Upscaling would exceed the backend's pixel budget.
    #[error("{}", upscale_message(.width, .height, .scale, .budget, .suggested_scale))]
    UpscaleTooLarge {
        width: u32,
        height: u32,
        /// Requested scale factor.
        scale: u32,
        /// Maximum pixel count the backend accepts.
        budget: u64,
        /// Largest scale in the supported set that fits, if any.
        suggested_scale: Option<u32>,
    },

    /// Registering an image for a visual id failed.
    #[error("failed to register image for segmentation: {0}")]
    VisualIdRegistration(String),

    /// The inpainting mask could not be loaded and inverted.
    #[error("Cannot prepare inpainting mask")]
    MaskNegation { url: String, reason: String },

    /// A rule required an input that was not provided.
    #[error("missing required input '{field}' for {model}")]
    MissingInput { field: String, model: String },
}

/// Why a form field blocks submission.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    /// No value, or empty text.
    #[error("This field is required")]
    Required,

    /// No uploaded file or URL behind a media input.
    #[error("Please upload a file")]
    MissingFile,

    /// A LoRA input without a selected uploaded file.
    #[error("Please select a LoRA")]
    MissingLora,
}

fn upscale_message(
    width: &u32,
    height: &u32,
    scale: &u32,
    budget: &u64,
    suggested_scale: &Option<u32>,
) -> String {
    let (w, h, s) = (u64::from(*width), u64::from(*height), u64::from(*scale));
    let suggestion = match suggested_scale {
        Some(scale) => format!("Try {scale}x upscaling instead."),
        None => "The image is too large to upscale.".to_string(),
    };
    format!(
        "Image too large for {s}x upscaling. Your {w}×{h} image would become {}×{} pixels ({} total), but the maximum allowed is {} pixels. {suggestion}",
        group_thousands(w * s),
        group_thousands(h * s),
        group_thousands(w * h * s),
        group_thousands(*budget),
    )
}

/// Format an integer with comma thousands separators.
#[must_use]
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
