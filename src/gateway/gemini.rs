use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// `{base}/{model}:generateContent`, without credentials.
pub fn model_endpoint(base_url: &str, model: &str) -> String {
    format!("{}/{model}:generateContent", base_url.trim_end_matches('/'))
}

#[derive(Clone, Debug, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Part {
    pub text: String,
}

impl GenerateContentRequest {
    pub fn from_prompt(prompt: String) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, trimmed. `None` when there is
    /// nothing left after trimming.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let joined: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        let trimmed = joined.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

/// `error.message` from an upstream error body, if it is JSON carrying one.
pub fn upstream_error_message(raw: &str) -> Option<String> {
    let payload: Value = serde_json::from_str(raw).ok()?;
    payload
        .pointer("/error/message")
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

/// Raw upstream HTTP answer, before any interpretation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpstreamReply {
    pub status: u16,
    pub retry_after: Option<String>,
    pub body: String,
}

impl UpstreamReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("built without network support")]
    Unavailable,
}

/// Transport to the model provider.
pub trait Upstream: Send + Sync {
    fn generate_content(
        &self,
        endpoint: &str,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<UpstreamReply, UpstreamError>;
}

pub struct HttpUpstream {
    #[cfg(feature = "network")]
    client: reqwest::blocking::Client,
}

#[cfg(feature = "network")]
impl HttpUpstream {
    pub fn new(timeout: std::time::Duration) -> Result<Self, UpstreamError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[cfg(feature = "network")]
impl Upstream for HttpUpstream {
    fn generate_content(
        &self,
        endpoint: &str,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<UpstreamReply, UpstreamError> {
        let response = self
            .client
            .post(endpoint)
            .query(&[("key", api_key)])
            .json(request)
            .send()
            // reqwest errors can echo the URL, which carries the key.
            .map_err(|e| UpstreamError::Transport(e.without_url().to_string()))?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        let body = response
            .text()
            .map_err(|e| UpstreamError::Transport(e.without_url().to_string()))?;

        Ok(UpstreamReply {
            status,
            retry_after,
            body,
        })
    }
}

#[cfg(not(feature = "network"))]
impl HttpUpstream {
    pub fn new(_timeout: std::time::Duration) -> Result<Self, UpstreamError> {
        Ok(Self {})
    }
}

#[cfg(not(feature = "network"))]
impl Upstream for HttpUpstream {
    fn generate_content(
        &self,
        _endpoint: &str,
        _api_key: &str,
        _request: &GenerateContentRequest,
    ) -> Result<UpstreamReply, UpstreamError> {
        Err(UpstreamError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let req = GenerateContentRequest::from_prompt("hi".to_string());
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({"contents": [{"parts": [{"text": "hi"}]}]}));
    }

    #[test]
    fn test_text_joins_parts_of_first_candidate() {
        let raw = r#"{"candidates": [
            {"content": {"parts": [{"text": "  const a = 1;\n"}, {"text": "const b = 2;\n\n"}]}},
            {"content": {"parts": [{"text": "ignored"}]}}
        ]}"#;
        let resp: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.text().as_deref(), Some("const a = 1;\nconst b = 2;"));
    }

    #[test]
    fn test_text_none_when_blank_or_missing() {
        for raw in [
            r#"{}"#,
            r#"{"candidates": []}"#,
            r#"{"candidates": [{}]}"#,
            r#"{"candidates": [{"content": {"parts": [{}]}}]}"#,
            r#"{"candidates": [{"content": {"parts": [{"text": " \n "}]}}]}"#,
        ] {
            let resp: GenerateContentResponse = serde_json::from_str(raw).unwrap();
            assert_eq!(resp.text(), None, "{raw}");
        }
    }

    #[test]
    fn test_upstream_error_message() {
        let raw = r#"{"error": {"code": 429, "message": "Resource exhausted"}}"#;
        assert_eq!(upstream_error_message(raw).as_deref(), Some("Resource exhausted"));
        assert_eq!(upstream_error_message(r#"{"error": "flat"}"#), None);
        assert_eq!(upstream_error_message("<html>"), None);
    }

    #[test]
    fn test_model_endpoint_trims_slash() {
        assert_eq!(
            model_endpoint("https://x.test/v1beta/models/", "m"),
            "https://x.test/v1beta/models/m:generateContent"
        );
        assert_eq!(
            model_endpoint(DEFAULT_API_BASE_URL, DEFAULT_MODEL),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-3-flash-preview:generateContent"
        );
    }
}
