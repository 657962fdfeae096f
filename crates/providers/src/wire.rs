//! JSON bodies exchanged with the prediction API.

use nightjar_core::job::{InferenceJob, JobOutput, JobStatus};
use nightjar_core::prompt::{BudgetedPrompt, ModelParams};
use serde::{Deserialize, Serialize};

/// `POST /models/{owner}/{name}/predictions` body.
#[derive(Debug, Serialize)]
pub struct PredictionRequest<'a> {
    pub input: PredictionInput<'a>,
}

#[derive(Debug, Serialize)]
pub struct PredictionInput<'a> {
    pub prompt: &'a str,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<&'a str>,
}

impl<'a> PredictionRequest<'a> {
    pub fn new(prompt: &'a BudgetedPrompt, params: &'a ModelParams) -> Self {
        Self {
            input: PredictionInput {
                prompt: &prompt.final_text,
                temperature: params.temperature,
                top_p: params.top_p,
                max_tokens: params.max_tokens,
                system_prompt: params.system_prompt.as_deref(),
            },
        }
    }
}

/// Links returned with a prediction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictionUrls {
    #[serde(default)]
    pub get: Option<String>,
    #[serde(default)]
    pub cancel: Option<String>,
}

/// The prediction resource, as returned by both submission and polling.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionResponse {
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub urls: PredictionUrls,
    #[serde(default)]
    pub output: Option<JobOutput>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default)]
    pub logs: Option<String>,
}

impl PredictionResponse {
    pub fn into_job(self) -> InferenceJob {
        let error_message = match self.error {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(text)) => Some(text),
            Some(other) => Some(other.to_string()),
        };
        InferenceJob {
            id: self.id,
            status: self.status,
            output: self.output,
            error_message,
            logs: self.logs,
        }
    }
}

/// Error body of a non-success response.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Pull the `detail` field out of an error body, falling back to the raw text.
pub fn error_detail(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.detail)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_shape() {
        let prompt = BudgetedPrompt::raw("hello", 1);
        let params = ModelParams::default();
        let json = serde_json::to_value(PredictionRequest::new(&prompt, &params)).unwrap();

        assert_eq!(json["input"]["prompt"], "hello");
        assert_eq!(json["input"]["max_tokens"], 400);
        assert!(json["input"].get("system_prompt").is_none());
    }

    #[test]
    fn system_prompt_is_sent_when_set() {
        let prompt = BudgetedPrompt::raw("hello", 1);
        let params = ModelParams {
            system_prompt: Some("Be brief.".into()),
            ..ModelParams::default()
        };
        let json = serde_json::to_value(PredictionRequest::new(&prompt, &params)).unwrap();
        assert_eq!(json["input"]["system_prompt"], "Be brief.");
    }

    #[test]
    fn response_with_null_output_and_error() {
        let body = r#"{
            "id": "p1",
            "status": "starting",
            "urls": {"get": "https://x/p1", "cancel": "https://x/p1/cancel"},
            "output": null,
            "error": null
        }"#;
        let resp: PredictionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.urls.get.as_deref(), Some("https://x/p1"));
        let job = resp.into_job();
        assert!(job.output.is_none());
        assert!(job.error_message.is_none());
    }

    #[test]
    fn structured_error_is_stringified() {
        let body = r#"{"id": "p1", "status": "failed", "error": {"code": 7}}"#;
        let job = serde_json::from_str::<PredictionResponse>(body)
            .unwrap()
            .into_job();
        assert_eq!(job.error_message.as_deref(), Some(r#"{"code":7}"#));
    }

    #[test]
    fn error_detail_extraction() {
        assert_eq!(error_detail(r#"{"detail": "Invalid token."}"#), "Invalid token.");
        assert_eq!(error_detail("Bad Gateway\n"), "Bad Gateway");
    }
}
