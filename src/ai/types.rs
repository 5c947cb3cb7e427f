//! Wire payloads for the `/api/generate` endpoint.

use serde::{Deserialize, Serialize};

/// Output format marker asking the endpoint for a JSON reply.
pub const OUTPUT_FORMAT: &str = "json";

/// Request body for a single image-plus-prompt generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub format: String,
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
}

/// Status and body text as read off the wire, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}
