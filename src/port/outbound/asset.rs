//! Asset port used by normalization side steps.

use async_trait::async_trait;

use crate::error::Result;

/// Access to uploaded assets.
#[async_trait]
pub trait AssetService: Send + Sync {
    /// Load the image at `url` and return its `(width, height)`.
    async fn image_dimensions(&self, url: &str) -> Result<(u32, u32)>;

    /// Register an image for segmentation-style models and return its visual id.
    async fn register_visual(&self, url: &str) -> Result<String>;

    /// Invert the colours of the mask at `url`, keeping alpha, and return the
    /// result as a PNG data URL.
    async fn negate_mask(&self, url: &str) -> Result<String>;
}
