use super::normalize::normalize;
use super::types::{GenerateRequest, RawResponse, OUTPUT_FORMAT};
use super::{InferenceReply, InferenceService};
use crate::image::{ImageProcessor, ImageService};
use crate::models::{Config, EncodedImage, ErrorRecord, NormalizedResult};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::path::Path;
use std::time::{Duration, Instant};

pub struct InferenceClient {
    client: Client,
    api_url: String,
    model: String,
    headers: HeaderMap,
    verbose: Option<bool>,
    images: Box<dyn ImageService>,
}

impl InferenceClient {
    pub fn new(config: &Config) -> Result<Self> {
        Self::new_with_client(config, build_http_client(config.timeout)?)
    }

    pub fn new_with_client(config: &Config, client: Client) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            headers: build_headers(&config.headers)?,
            verbose: config.verbose,
            images: Box::new(ImageProcessor::new(config.max_dimensions)),
        })
    }

    pub fn with_image_service(mut self, images: Box<dyn ImageService>) -> Self {
        self.images = images;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn build_request(
        &self,
        prompt: &str,
        image: EncodedImage,
        stream: bool,
    ) -> GenerateRequest {
        GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream,
            format: OUTPUT_FORMAT.to_string(),
            images: vec![image.data],
            verbose: self.verbose,
        }
    }

    async fn post(
        &self,
        request: &GenerateRequest,
    ) -> std::result::Result<RawResponse, ErrorRecord> {
        let response = self
            .client
            .post(&self.api_url)
            .headers(self.headers.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to {}: {}", self.api_url, e);
                ErrorRecord::Transport {
                    details: e.to_string(),
                }
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            tracing::error!("Failed to read response body from {}: {}", self.api_url, e);
            ErrorRecord::Transport {
                details: e.to_string(),
            }
        })?;

        Ok(RawResponse { status, body })
    }
}

#[async_trait]
impl InferenceService for InferenceClient {
    async fn send_request(&self, prompt: &str, image_path: &Path, stream: bool) -> InferenceReply {
        let image = match self.images.prepare(image_path).await {
            Ok(image) => image,
            Err(e) => {
                tracing::error!("Failed to prepare {}: {}", image_path.display(), e);
                return InferenceReply::failed(ErrorRecord::ImageLoad {
                    details: e.to_string(),
                });
            }
        };

        tracing::info!(
            "Sending {} ({}x{}) to {} with model {}",
            image_path.display(),
            image.width,
            image.height,
            self.api_url,
            self.model
        );
        let request = self.build_request(prompt, image, stream);

        let start = Instant::now();
        let raw = self.post(&request).await;
        let elapsed = start.elapsed();

        let result = match raw {
            Ok(raw) => {
                tracing::debug!(
                    "Received status {} with {} bytes in {:?}",
                    raw.status,
                    raw.body.len(),
                    elapsed
                );
                normalize(&raw)
            }
            Err(record) => NormalizedResult::Error(record),
        };

        InferenceReply::new(result, Some(elapsed))
    }
}

pub fn build_http_client(timeout: Option<Duration>) -> Result<Client> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// Later entries win over earlier ones with the same (case-insensitive) name.
fn build_headers(headers: &[(String, String)]) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::Config(format!("Invalid header name '{}': {}", name, e)))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| Error::Config(format!("Invalid value for header '{}': {}", name, e)))?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}
