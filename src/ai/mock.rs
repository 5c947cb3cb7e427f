use super::{InferenceReply, InferenceService};
use crate::models::NormalizedResult;
use async_trait::async_trait;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub prompt: String,
    pub image_path: PathBuf,
    pub stream: bool,
}

pub struct MockInferenceClient {
    responses: Arc<Mutex<Vec<NormalizedResult>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockInferenceClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_response(self, response: NormalizedResult) -> Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockInferenceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceService for MockInferenceClient {
    async fn send_request(&self, prompt: &str, image_path: &Path, stream: bool) -> InferenceReply {
        let mut requests = self.requests.lock().unwrap();
        requests.push(RecordedRequest {
            prompt: prompt.to_string(),
            image_path: image_path.to_path_buf(),
            stream,
        });

        let responses = self.responses.lock().unwrap();
        let result = if responses.is_empty() {
            // Default mock response
            NormalizedResult::Json(json!({}))
        } else {
            let index = (requests.len() - 1) % responses.len();
            responses[index].clone()
        };

        InferenceReply::new(result, Some(Duration::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorRecord;

    #[tokio::test]
    async fn test_mock_default_response() {
        let client = MockInferenceClient::new();

        let reply = client.send("prompt", Path::new("a.jpg")).await;

        assert_eq!(reply.result, NormalizedResult::Json(json!({})));
        assert_eq!(reply.elapsed, Some(Duration::ZERO));
    }

    #[tokio::test]
    async fn test_mock_custom_responses_cycle() {
        let client = MockInferenceClient::new()
            .with_response(NormalizedResult::Json(json!(1)))
            .with_response(NormalizedResult::Error(ErrorRecord::invalid_json()));

        let first = client.send("p", Path::new("a.jpg")).await;
        assert_eq!(first.result, NormalizedResult::Json(json!(1)));

        let second = client.send("p", Path::new("a.jpg")).await;
        assert!(second.result.is_error());

        // Should cycle back
        let third = client.send("p", Path::new("a.jpg")).await;
        assert_eq!(third.result, NormalizedResult::Json(json!(1)));
    }

    #[tokio::test]
    async fn test_mock_records_requests() {
        let client = MockInferenceClient::new();

        assert_eq!(client.get_call_count(), 0);

        client.send_request("count", Path::new("cats.jpg"), true).await;

        assert_eq!(client.get_call_count(), 1);
        assert_eq!(
            client.requests(),
            vec![RecordedRequest {
                prompt: "count".to_string(),
                image_path: PathBuf::from("cats.jpg"),
                stream: true,
            }]
        );
    }
}
