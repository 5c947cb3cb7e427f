//! Data models and structures
//!
//! Defines the image, result, and ticket types shared by the preparer, the
//! inference client, and the task interpreters, plus the runtime
//! configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "llama3.2-vision";
pub const DEFAULT_MAX_SIDE: u32 = 1120;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub const INVALID_JSON_RESPONSE: &str = "invalid JSON response";
pub const INVALID_NESTED_JSON: &str = "invalid JSON nested as text";

/// Bounding box every image must fit in before it is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxDimensions {
    pub max_width: u32,
    pub max_height: u32,
}

impl MaxDimensions {
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
        }
    }

    pub fn fits(&self, width: u32, height: u32) -> bool {
        width <= self.max_width && height <= self.max_height
    }
}

impl Default for MaxDimensions {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIDE, DEFAULT_MAX_SIDE)
    }
}

/// Base64 JPEG ready to embed in a request, with the dimensions of the
/// bitmap it was encoded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub data: String,
    pub width: u32,
    pub height: u32,
}

/// Failure of a single inference request, carried as data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum ErrorRecord {
    ImageLoad { details: String },
    Transport { details: String },
    Http { code: u16, details: String },
    JsonDecode { message: String },
}

impl ErrorRecord {
    pub fn invalid_json() -> Self {
        Self::JsonDecode {
            message: INVALID_JSON_RESPONSE.to_string(),
        }
    }

    pub fn invalid_nested_json() -> Self {
        Self::JsonDecode {
            message: INVALID_NESTED_JSON.to_string(),
        }
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImageLoad { details } => write!(f, "image load error: {}", details),
            Self::Transport { details } => write!(f, "transport error: {}", details),
            Self::Http { code, details } => write!(f, "HTTP {}: {}", code, details),
            Self::JsonDecode { message } => write!(f, "{}", message),
        }
    }
}

/// Outcome of one request: a parsed JSON value or an error record.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedResult {
    Json(Value),
    Error(ErrorRecord),
}

impl NormalizedResult {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn into_result(self) -> Result<Value> {
        match self {
            Self::Json(value) => Ok(value),
            Self::Error(record) => Err(Error::Inference(record)),
        }
    }

    /// JSON view of either branch, used when printing raw results.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Json(value) => value.clone(),
            Self::Error(record) => serde_json::to_value(record).unwrap_or(Value::Null),
        }
    }
}

/// One row of a ticket with its computed line total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: f64,
    pub price_unit: f64,
    #[serde(default)]
    pub price_total: f64,
}

impl LineItem {
    pub fn new(name: String, quantity: f64, price_unit: f64) -> Self {
        Self {
            name,
            quantity,
            price_unit,
            price_total: quantity * price_unit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub items: Vec<LineItem>,
    pub total: f64,
}

impl Ticket {
    pub fn from_items(items: Vec<LineItem>) -> Self {
        let total = items.iter().map(|item| item.price_total).sum();
        Self { items, total }
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.items {
            writeln!(
                f,
                "{:>6} x {:<32} {:>9.2} = {:>9.2}",
                format_quantity(item.quantity),
                item.name,
                item.price_unit,
                item.price_total
            )?;
        }
        write!(f, "{:>54}{:>9.2}", "TOTAL", self.total)
    }
}

fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 {
        format!("{}", quantity as i64)
    } else {
        format!("{:.3}", quantity)
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub model: String,
    pub headers: Vec<(String, String)>,
    pub max_dimensions: MaxDimensions,
    pub timeout: Option<Duration>,
    pub verbose: Option<bool>,
}

impl Config {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            model: DEFAULT_MODEL.to_string(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            max_dimensions: MaxDimensions::default(),
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            verbose: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Adds a header, replacing any existing one with the same name
    /// (compared case-insensitively).
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    pub fn with_max_dimensions(mut self, max_dimensions: MaxDimensions) -> Self {
        self.max_dimensions = max_dimensions;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_verbose(mut self, verbose: Option<bool>) -> Self {
        self.verbose = verbose;
        self
    }

    /// Loads `.env` if present and reads the process environment.
    /// `overrides` is asked first for every key.
    pub fn from_env<F>(overrides: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| overrides(key).or_else(|| std::env::var(key).ok()))
    }

    /// Builds a config from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("INFERENCE_API_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| Error::Config("INFERENCE_API_URL not set".to_string()))?;

        let mut config = Self::new(api_url);

        if let Some(model) = lookup("INFERENCE_MODEL") {
            config.model = model;
        }
        if let Some(width) = lookup("INFERENCE_MAX_WIDTH") {
            config.max_dimensions.max_width = parse_var("INFERENCE_MAX_WIDTH", &width)?;
        }
        if let Some(height) = lookup("INFERENCE_MAX_HEIGHT") {
            config.max_dimensions.max_height = parse_var("INFERENCE_MAX_HEIGHT", &height)?;
        }
        if let Some(secs) = lookup("INFERENCE_TIMEOUT_SECS") {
            config.timeout = timeout_from_secs(parse_var("INFERENCE_TIMEOUT_SECS", &secs)?);
        }
        if let Some(verbose) = lookup("INFERENCE_VERBOSE") {
            config.verbose = Some(parse_var("INFERENCE_VERBOSE", &verbose)?);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(Error::Config("API URL must not be empty".to_string()));
        }
        if self.model.trim().is_empty() {
            return Err(Error::Config("model must not be empty".to_string()));
        }
        if self.max_dimensions.max_width == 0 || self.max_dimensions.max_height == 0 {
            return Err(Error::Config(format!(
                "max dimensions must be positive, got {}x{}",
                self.max_dimensions.max_width, self.max_dimensions.max_height
            )));
        }
        Ok(())
    }
}

/// `0` disables the timeout.
pub fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("{} has invalid value '{}': {}", name, value, e)))
}
