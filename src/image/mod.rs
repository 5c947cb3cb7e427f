//! Image preparation for inference requests
//!
//! Loads an image from disk, shrinks it into the configured bounding box,
//! and re-encodes it as a base64 JPEG the inference endpoint accepts.

pub mod mock;
pub mod processor;

pub use mock::MockImageProcessor;
pub use processor::ImageProcessor;

use crate::models::EncodedImage;
use crate::Result;
use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait ImageService: Send + Sync {
    async fn prepare(&self, path: &Path) -> Result<EncodedImage>;
}
