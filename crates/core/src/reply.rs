//! Gemini-backed reply service.
//!
//! Thin `reqwest` client for the `generateContent` endpoint. All transport
//! and decode failures map into [`ServiceError`]; the turn controller owns
//! the timeout, so no request-level deadline is set here.

use crate::adapters::ReplyService;
use crate::error::ServiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-lite";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: String,
}

/// Reply service backed by the Gemini `generateContent` API.
pub struct GeminiReplyService {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiReplyService {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Points the client at a different endpoint (local proxy, test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ReplyService for GeminiReplyService {
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::BadResponse(format!(
                "reply service returned HTTP {status}"
            )));
        }

        let decoded: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::BadResponse(e.to_string()))?;

        decoded
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ServiceError::BadResponse("no candidate text in response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_candidate_text() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":" Stay calm. "}]}}]}"#;
        let decoded: GenerateResponse = serde_json::from_str(raw).unwrap();
        let text = decoded.candidates[0].content.parts[0].text.trim();
        assert_eq!(text, "Stay calm.");
    }

    #[test]
    fn missing_candidates_decode_to_empty() {
        let decoded: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(decoded.candidates.is_empty());
    }
}
