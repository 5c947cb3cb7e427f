use crate::ai::InferenceService;
use crate::{prompts, Error, Result};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_OBJECT: &str = "cats";

#[derive(Debug, Clone, PartialEq)]
pub struct CountOutcome {
    pub object: String,
    pub count: u64,
    pub elapsed: Option<Duration>,
}

pub async fn count_objects(
    service: &dyn InferenceService,
    image_path: &Path,
    object: &str,
) -> Result<CountOutcome> {
    let prompt = prompts::render(prompts::COUNT, &[("object", object)]);
    let reply = service.send(&prompt, image_path).await;
    let value = reply.result.into_result()?;

    let count = extract_count(&value).ok_or_else(|| {
        Error::Interpretation(format!("expected a count of {}, got {}", object, value))
    })?;
    tracing::info!("Counted {} {} in {}", count, object, image_path.display());

    Ok(CountOutcome {
        object: object.to_string(),
        count,
        elapsed: reply.elapsed,
    })
}

/// Reads a non-negative integer out of whatever shape the model answered
/// with: a number, a number encoded as a string, or an object holding one
/// under `"count"` (or as its only entry).
pub fn extract_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Value::String(text) => serde_json::from_str::<Value>(text.trim())
            .ok()
            .and_then(|inner| extract_count(&inner)),
        Value::Object(map) => map
            .get("count")
            .or_else(|| {
                if map.len() == 1 {
                    map.values().next()
                } else {
                    None
                }
            })
            .and_then(extract_count),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockInferenceClient;
    use crate::models::{ErrorRecord, NormalizedResult};
    use serde_json::json;

    #[test]
    fn test_extract_count_shapes() {
        assert_eq!(extract_count(&json!(5)), Some(5));
        assert_eq!(extract_count(&json!(3.0)), Some(3));
        assert_eq!(extract_count(&json!("4")), Some(4));
        assert_eq!(extract_count(&json!(" 7 ")), Some(7));
        assert_eq!(extract_count(&json!({"count": 2})), Some(2));
        assert_eq!(extract_count(&json!({"cats": "6"})), Some(6));
    }

    #[test]
    fn test_extract_count_rejects_non_counts() {
        assert_eq!(extract_count(&json!(-1)), None);
        assert_eq!(extract_count(&json!(2.5)), None);
        assert_eq!(extract_count(&json!("five")), None);
        assert_eq!(extract_count(&json!({"a": 1, "b": 2})), None);
        assert_eq!(extract_count(&json!([3])), None);
        assert_eq!(extract_count(&Value::Null), None);
    }

    #[tokio::test]
    async fn test_count_objects_renders_prompt() {
        let client =
            MockInferenceClient::new().with_response(NormalizedResult::Json(json!({"count": 5})));

        let outcome = count_objects(&client, Path::new("cat_5.jpg"), "cats")
            .await
            .unwrap();

        assert_eq!(outcome.count, 5);
        assert_eq!(outcome.object, "cats");
        let requests = client.requests();
        assert!(requests[0].prompt.contains("number of cats"));
        assert!(!requests[0].prompt.contains("{{object}}"));
        assert!(!requests[0].stream);
    }

    #[tokio::test]
    async fn test_count_objects_propagates_error_record() {
        let client = MockInferenceClient::new().with_response(NormalizedResult::Error(
            ErrorRecord::Http {
                code: 500,
                details: "boom".to_string(),
            },
        ));

        let err = count_objects(&client, Path::new("a.jpg"), "dogs")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Inference(ErrorRecord::Http { code: 500, .. })));
    }

    #[tokio::test]
    async fn test_count_objects_rejects_unreadable_answer() {
        let client = MockInferenceClient::new()
            .with_response(NormalizedResult::Json(json!({"answer": "many", "sure": false})));

        let err = count_objects(&client, Path::new("a.jpg"), "cats")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Interpretation(_)));
    }
}
