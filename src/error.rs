//! Error handling and custom error types
//!
//! Request-level failures travel as data ([`crate::models::ErrorRecord`]);
//! this enum covers configuration faults, interpretation failures, and the
//! bridge from a record back into a Rust error when a caller wants `?`.

use crate::models::ErrorRecord;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Could not load image '{}': {detail}", path.display())]
    ImageLoad { path: PathBuf, detail: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Inference failed: {0}")]
    Inference(ErrorRecord),

    #[error("Could not interpret model output: {0}")]
    Interpretation(String),

    #[error("Invariant violation: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, Error>;
