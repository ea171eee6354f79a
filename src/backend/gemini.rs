//! Gemini generateContent client
//!
//! Thin REST client for the `generateContent` endpoint. One request per
//! call, no retries; the caller decides what a failure means.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::GenerativeBackend;
use crate::error::{PipelineError, Result};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: Option<i64>,
    message: Option<String>,
}

pub struct GeminiBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiBackend {
    pub fn new(client: reqwest::Client, model: &str, api_key: &str) -> Self {
        Self::with_base_url(client, GEMINI_BASE_URL, model, api_key)
    }

    /// Points the client at a different endpoint; used by tests
    pub fn with_base_url(
        client: reqwest::Client,
        base_url: &str,
        model: &str,
        api_key: &str,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn first_candidate_text(response: GenerateResponse) -> Result<String> {
        if let Some(error) = response.error {
            return Err(PipelineError::Api {
                code: error.code.map(|c| c.to_string()).unwrap_or_else(|| "unknown".to_string()),
                message: error.message.unwrap_or_else(|| "Unknown error".to_string()),
            });
        }

        let text = response
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(PipelineError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        debug!(model = %self.model, prompt_chars = prompt.len(), "Calling generative backend");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            // The error body may still carry a structured message
            if let Ok(GenerateResponse {
                error: Some(error), ..
            }) = serde_json::from_str::<GenerateResponse>(&text)
            {
                return Err(PipelineError::Api {
                    code: error
                        .code
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| status.as_u16().to_string()),
                    message: error.message.unwrap_or_else(|| "Unknown error".to_string()),
                });
            }
            return Err(PipelineError::Api {
                code: status.as_u16().to_string(),
                message: text.chars().take(200).collect(),
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&text)?;
        Self::first_candidate_text(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_candidate_text() {
        let json = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "[\"a\", \"b\"]"}]}}
            ]
        }"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        let text = GeminiBackend::first_candidate_text(response).unwrap();
        assert_eq!(text, "[\"a\", \"b\"]");
    }

    #[test]
    fn joins_multipart_candidates() {
        let json = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "one "}, {"text": "two"}]}}
            ]
        }"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            GeminiBackend::first_candidate_text(response).unwrap(),
            "one two"
        );
    }

    #[test]
    fn structured_error_becomes_api_error() {
        let json = r#"{"error": {"code": 429, "message": "quota exceeded"}}"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        let err = GeminiBackend::first_candidate_text(response).unwrap_err();
        assert!(matches!(err, PipelineError::Api { .. }));
    }

    #[test]
    fn empty_candidates_are_an_empty_response() {
        let json = r#"{"candidates": []}"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        let err = GeminiBackend::first_candidate_text(response).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyResponse));
    }
}
