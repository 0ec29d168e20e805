//! Upscale limits.

use crate::domain::error::NormalizeError;

/// Pixel budget of the Magnific upscaler.
pub const DEFAULT_PIXEL_BUDGET: u64 = 25_300_000;

/// Scale factors offered by the Magnific upscaler.
pub const MAGNIFIC_SCALES: [u32; 3] = [2, 4, 8];

/// Largest output frame accepted by the video upscaler.
const MAX_VIDEO_WIDTH: f64 = 3840.0;
const MAX_VIDEO_HEIGHT: f64 = 2160.0;
const MAX_VIDEO_FACTOR: f64 = 4.0;

/// Parse a Magnific scale label. Anything other than `8x` or `4x` is 2x.
#[must_use]
pub fn parse_scale_label(label: Option<&str>) -> u32 {
    match label {
        Some("8x") => 8,
        Some("4x") => 4,
        _ => 2,
    }
}

/// Largest supported scale whose result stays within the budget.
///
/// The budget is compared against `pixels * scale`, matching how the
/// backend meters upscaling jobs.
#[must_use]
pub fn max_allowed_scale(pixels: u64, budget: u64) -> Option<u32> {
    MAGNIFIC_SCALES
        .into_iter()
        .filter(|&scale| pixels * u64::from(scale) <= budget)
        .max()
}

/// Reject a scale factor that would push the image past the pixel budget.
pub fn check_scale_factor(
    width: u32,
    height: u32,
    scale: u32,
    budget: u64,
) -> Result<(), NormalizeError> {
    let pixels = u64::from(width) * u64::from(height);
    if pixels * u64::from(scale) > budget {
        return Err(NormalizeError::UpscaleTooLarge {
            width,
            height,
            scale,
            budget,
            suggested_scale: max_allowed_scale(pixels, budget),
        });
    }
    Ok(())
}

/// Highest upscale factor that keeps a video within 4K UHD, capped at 4.
#[must_use]
pub fn max_video_upscale_factor(width: u32, height: u32) -> f64 {
    let width_factor = MAX_VIDEO_WIDTH / f64::from(width);
    let height_factor = MAX_VIDEO_HEIGHT / f64::from(height);
    MAX_VIDEO_FACTOR.min(width_factor.min(height_factor))
}
