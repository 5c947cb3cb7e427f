//! Vision-model extraction client
//!
//! Sends an image and an instruction to a vision language model's generate
//! endpoint and normalizes the reply into JSON. Ships two interpreters on
//! top: counting objects in a picture and reading line items off a
//! photographed receipt.

pub mod ai;
pub mod app;
pub mod error;
pub mod image;
pub mod models;
pub mod prompts;
pub mod tasks;

pub use error::{Error, Result};
