//! Inference endpoint integration
//!
//! Sends one prepared image plus a prompt to a vision model's generate
//! endpoint and normalizes whatever comes back into a [`NormalizedResult`].

pub mod client;
pub mod mock;
pub mod normalize;
pub mod types;

pub use client::InferenceClient;
pub use mock::MockInferenceClient;
pub use normalize::normalize;
pub use types::{GenerateRequest, RawResponse};

use crate::models::{ErrorRecord, NormalizedResult};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Normalized result of one request plus the time spent on the wire.
///
/// `elapsed` is `None` when the request never left the process (the image
/// could not be prepared).
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceReply {
    pub result: NormalizedResult,
    pub elapsed: Option<Duration>,
}

impl InferenceReply {
    pub fn new(result: NormalizedResult, elapsed: Option<Duration>) -> Self {
        Self { result, elapsed }
    }

    pub fn failed(record: ErrorRecord) -> Self {
        Self {
            result: NormalizedResult::Error(record),
            elapsed: None,
        }
    }
}

#[async_trait]
pub trait InferenceService: Send + Sync {
    async fn send_request(&self, prompt: &str, image_path: &Path, stream: bool) -> InferenceReply;

    /// Non-streaming request, the common case.
    async fn send(&self, prompt: &str, image_path: &Path) -> InferenceReply {
        self.send_request(prompt, image_path, false).await
    }
}
