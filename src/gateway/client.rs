use serde_json::Value;
use tracing::debug;

use crate::gateway::proxy::{EXCERPT_MAX_CHARS, Proxy};
use crate::gateway::{GenerationError, GenerationRequest, SnippetGenerator, truncate_chars};

const GENERIC_FAILURE: &str = "Failed to generate snippet.";

/// Turn a proxy response into generated code or a user-facing error.
///
/// `retry_after` is the response header; a `retryAfter` field in the body
/// wins over it.
pub fn interpret_response(
    status: u16,
    retry_after: Option<&str>,
    body: &str,
) -> Result<String, GenerationError> {
    match serde_json::from_str::<Value>(body) {
        Ok(payload) => interpret_payload(status, retry_after, &payload),
        Err(_) => Err(GenerationError::Malformed {
            status,
            excerpt: truncate_chars(body, EXCERPT_MAX_CHARS),
        }),
    }
}

fn interpret_payload(
    status: u16,
    retry_after: Option<&str>,
    payload: &Value,
) -> Result<String, GenerationError> {
    if !(200..300).contains(&status) {
        let message = payload
            .get("error")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or(GENERIC_FAILURE)
            .to_string();
        let retry_after = payload
            .get("retryAfter")
            .and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .or_else(|| retry_after.map(ToString::to_string));
        return Err(GenerationError::Rejected {
            status,
            message,
            retry_after,
        });
    }

    match payload.get("code").and_then(Value::as_str) {
        Some(code) if !code.trim().is_empty() => Ok(code.trim().to_string()),
        _ => Err(GenerationError::EmptyCode),
    }
}

/// Talks to a running `type2learn serve` (or any compatible endpoint).
pub struct ProxyClient {
    url: String,
    #[cfg(feature = "network")]
    client: reqwest::blocking::Client,
}

#[cfg(feature = "network")]
impl ProxyClient {
    pub fn new(url: &str, timeout: std::time::Duration) -> Result<Self, GenerationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;
        Ok(Self {
            url: url.to_string(),
            client,
        })
    }
}

#[cfg(not(feature = "network"))]
impl ProxyClient {
    pub fn new(url: &str, _timeout: std::time::Duration) -> Result<Self, GenerationError> {
        Ok(Self {
            url: url.to_string(),
        })
    }
}

impl ProxyClient {
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(feature = "network")]
impl SnippetGenerator for ProxyClient {
    fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        debug!(url = %self.url, language = %request.language, topic = %request.topic, "posting to proxy");
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        let body = response
            .text()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        interpret_response(status, retry_after.as_deref(), &body)
    }
}

#[cfg(not(feature = "network"))]
impl SnippetGenerator for ProxyClient {
    fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
        Err(GenerationError::Transport(
            "built without network support".to_string(),
        ))
    }
}

/// Runs the proxy logic in-process, using the local credential. Handy when
/// no separate server is running.
pub struct DirectGenerator {
    proxy: Proxy,
}

impl DirectGenerator {
    pub fn new(proxy: Proxy) -> Self {
        Self { proxy }
    }
}

impl SnippetGenerator for DirectGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        debug!(model = %self.proxy.model(), "generating in-process");
        let response = self
            .proxy
            .generate(request.language.as_str(), &request.topic);
        interpret_payload(
            response.status,
            response.retry_after.as_deref(),
            &response.body,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::gemini::{
        GenerateContentRequest, Upstream, UpstreamError, UpstreamReply,
    };
    use crate::snippet::Language;

    #[test]
    fn test_success_returns_code() {
        let code = interpret_response(200, None, r#"{"code": "let x = 1;", "model": "m"}"#);
        assert_eq!(code, Ok("let x = 1;".to_string()));
    }

    #[test]
    fn test_blank_code_is_empty_code_error() {
        for body in [r#"{"code": ""}"#, r#"{"code": "  \n"}"#, r#"{}"#] {
            assert_eq!(
                interpret_response(200, None, body),
                Err(GenerationError::EmptyCode),
                "{body}"
            );
        }
    }

    #[test]
    fn test_error_field_is_surfaced() {
        let err = interpret_response(400, None, r#"{"error": "Language and topic are required."}"#)
            .unwrap_err();
        assert_eq!(err.to_string(), "Language and topic are required.");
    }

    #[test]
    fn test_missing_error_field_uses_generic_message() {
        let err = interpret_response(500, None, r#"{"detail": "x"}"#).unwrap_err();
        assert_eq!(err.to_string(), "Failed to generate snippet.");
    }

    #[test]
    fn test_retry_after_preserved() {
        let err = interpret_response(
            429,
            Some("9"),
            r#"{"error": "Quota exceeded", "retryAfter": "12"}"#,
        )
        .unwrap_err();
        assert_eq!(err.retry_after(), Some("12"));

        let err = interpret_response(429, Some("9"), r#"{"error": "Quota exceeded"}"#).unwrap_err();
        assert_eq!(err.retry_after(), Some("9"));
        assert_eq!(err.display_message(), "Quota exceeded (retry after 9s)");
    }

    #[test]
    fn test_unparseable_body_quotes_excerpt() {
        let body = format!("<html>{}</html>", "z".repeat(400));
        let err = interpret_response(502, None, &body).unwrap_err();
        match &err {
            GenerationError::Malformed { status, excerpt } => {
                assert_eq!(*status, 502);
                assert_eq!(excerpt.chars().count(), 200);
                assert!(excerpt.starts_with("<html>"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(err.to_string().starts_with("Failed to generate snippet (HTTP 502): <html>"));
    }

    struct Fixed(UpstreamReply);

    impl Upstream for Fixed {
        fn generate_content(
            &self,
            _endpoint: &str,
            _api_key: &str,
            _request: &GenerateContentRequest,
        ) -> Result<UpstreamReply, UpstreamError> {
            Ok(self.0.clone())
        }
    }

    fn direct(reply: UpstreamReply, key: Option<&str>) -> DirectGenerator {
        DirectGenerator::new(Proxy::new(
            key.map(str::to_string),
            "m",
            "https://upstream.test",
            Box::new(Fixed(reply)),
        ))
    }

    #[test]
    fn test_direct_generator_success() {
        let generator = direct(
            UpstreamReply {
                status: 200,
                retry_after: None,
                body: r#"{"candidates":[{"content":{"parts":[{"text":"x = 1"}]}}]}"#.into(),
            },
            Some("k"),
        );
        let req = GenerationRequest::new(Language::Python, "");
        assert_eq!(generator.generate(&req), Ok("x = 1".to_string()));
    }

    #[test]
    fn test_direct_generator_maps_rate_limit() {
        let generator = direct(
            UpstreamReply {
                status: 429,
                retry_after: Some("30".into()),
                body: r#"{"error":{"message":"Resource exhausted"}}"#.into(),
            },
            Some("k"),
        );
        let err = generator
            .generate(&GenerationRequest::new(Language::TypeScript, "generics"))
            .unwrap_err();
        assert_eq!(
            err,
            GenerationError::Rejected {
                status: 429,
                message: "Resource exhausted".into(),
                retry_after: Some("30".into()),
            }
        );
    }

    #[test]
    fn test_direct_generator_without_key() {
        let generator = direct(
            UpstreamReply {
                status: 200,
                retry_after: None,
                body: String::new(),
            },
            None,
        );
        let err = generator
            .generate(&GenerationRequest::new(Language::JavaScript, "x"))
            .unwrap_err();
        assert_eq!(err.to_string(), "GEMINI_API_KEY is not set.");
    }
}
