//! The generate endpoint: validate, call the model once, map the outcome to a
//! JSON response. Stateless; every call is independent.

use serde_json::{Value, json};
use tracing::{info, warn};

use crate::gateway::gemini::{
    GenerateContentRequest, GenerateContentResponse, Upstream, model_endpoint,
    upstream_error_message,
};
use crate::gateway::prompt::build_prompt;
use crate::gateway::truncate_chars;

pub const GENERATE_ROUTE: &str = "/api/generate";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Upstream error bodies are echoed back at most this long.
pub const DETAIL_MAX_CHARS: usize = 2000;
/// Excerpt of an unreadable body quoted in the error message.
pub const EXCERPT_MAX_CHARS: usize = 200;

#[derive(Clone, Debug, PartialEq)]
pub struct ProxyResponse {
    pub status: u16,
    /// Mirrored as a `Retry-After` header.
    pub retry_after: Option<String>,
    pub body: Value,
}

impl ProxyResponse {
    fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            retry_after: None,
            body,
        }
    }

    fn error(status: u16, message: &str) -> Self {
        Self::json(status, json!({ "error": message }))
    }

    pub fn body_string(&self) -> String {
        self.body.to_string()
    }
}

pub struct Proxy {
    api_key: Option<String>,
    model: String,
    endpoint: String,
    upstream: Box<dyn Upstream>,
}

impl Proxy {
    pub fn new(
        api_key: Option<String>,
        model: &str,
        api_base_url: &str,
        upstream: Box<dyn Upstream>,
    ) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.is_empty()),
            model: model.to_string(),
            endpoint: model_endpoint(api_base_url, model),
            upstream,
        }
    }

    /// Read the credential from the environment.
    pub fn from_env(model: &str, api_base_url: &str, upstream: Box<dyn Upstream>) -> Self {
        Self::new(std::env::var(API_KEY_ENV).ok(), model, api_base_url, upstream)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn model_endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    /// Dispatch a raw HTTP request. Only `POST /api/generate` exists.
    pub fn route(&self, method: &str, url: &str, body: &[u8]) -> ProxyResponse {
        let path = url.split('?').next().unwrap_or(url);
        if path != GENERATE_ROUTE {
            return ProxyResponse::error(404, "Not found.");
        }
        if !method.eq_ignore_ascii_case("POST") {
            return ProxyResponse::error(405, "Method not allowed.");
        }
        self.handle(body)
    }

    /// Handle a generate request body.
    pub fn handle(&self, body: &[u8]) -> ProxyResponse {
        if self.api_key.is_none() {
            return missing_key();
        }

        let payload: Value = match serde_json::from_slice(body) {
            Ok(payload) => payload,
            Err(_) => return ProxyResponse::error(400, "Invalid JSON body."),
        };

        let field = |name: &str| {
            payload
                .get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        };
        match (field("language"), field("topic")) {
            (Some(language), Some(topic)) => self.generate(language, topic),
            _ => ProxyResponse::error(400, "Language and topic are required."),
        }
    }

    /// Ask the model for one snippet. Never fails: every outcome is a response.
    pub fn generate(&self, language: &str, topic: &str) -> ProxyResponse {
        let Some(api_key) = self.api_key.as_deref() else {
            return missing_key();
        };
        info!(model = %self.model, %language, %topic, "requesting snippet");

        let request = GenerateContentRequest::from_prompt(build_prompt(language, topic));
        let reply = match self
            .upstream
            .generate_content(&self.endpoint, api_key, &request)
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "upstream unreachable");
                return ProxyResponse::json(
                    502,
                    json!({
                        "error": "Gemini request failed.",
                        "detail": truncate_chars(&e.to_string(), DETAIL_MAX_CHARS),
                        "model": self.model,
                        "modelEndpoint": self.endpoint,
                    }),
                );
            }
        };

        if !reply.is_success() {
            warn!(status = reply.status, retry_after = ?reply.retry_after, "upstream rejected request");
            let message = upstream_error_message(&reply.body)
                .unwrap_or_else(|| "Gemini request failed.".to_string());
            let mut body = json!({
                "error": message,
                "detail": truncate_chars(&reply.body, DETAIL_MAX_CHARS),
                "model": self.model,
                "modelEndpoint": self.endpoint,
            });
            if let Some(retry_after) = &reply.retry_after {
                body["retryAfter"] = json!(retry_after);
            }
            return ProxyResponse {
                status: reply.status,
                retry_after: reply.retry_after,
                body,
            };
        }

        let parsed: GenerateContentResponse = match serde_json::from_str(&reply.body) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "upstream body unreadable");
                let excerpt = truncate_chars(&reply.body, EXCERPT_MAX_CHARS);
                return ProxyResponse::json(
                    502,
                    json!({
                        "error": format!("Gemini returned a malformed response: {excerpt}"),
                        "model": self.model,
                        "modelEndpoint": self.endpoint,
                    }),
                );
            }
        };

        match parsed.text() {
            Some(code) => ProxyResponse::json(
                200,
                json!({
                    "code": code,
                    "model": self.model,
                    "modelEndpoint": self.endpoint,
                }),
            ),
            None => ProxyResponse::error(502, "Gemini returned no code."),
        }
    }
}

fn missing_key() -> ProxyResponse {
    ProxyResponse::error(500, &format!("{API_KEY_ENV} is not set."))
}
