use std::io::Read;

use anyhow::{Context, Result, anyhow};
use serde_json::json;
use tiny_http::{Header, Request, Response, Server};
use tracing::{info, warn};

use crate::gateway::proxy::{Proxy, ProxyResponse};

/// Generate requests are a few dozen bytes; anything near this is abuse.
const MAX_BODY_BYTES: u64 = 64 * 1024;

/// Serve the proxy on `bind` until the process is killed. Requests are handled
/// one at a time.
pub fn serve(bind: &str, proxy: &Proxy) -> Result<()> {
    let server = Server::http(bind).map_err(|e| anyhow!("failed to bind {bind}: {e}"))?;
    info!(%bind, model = %proxy.model(), endpoint = %proxy.model_endpoint(), "proxy listening");
    if !proxy.has_credentials() {
        warn!("GEMINI_API_KEY is not set; every generate request will fail with 500");
    }

    for request in server.incoming_requests() {
        if let Err(e) = handle(request, proxy) {
            warn!(error = %e, "failed to answer request");
        }
    }
    Ok(())
}

fn handle(mut request: Request, proxy: &Proxy) -> Result<()> {
    let method = request.method().as_str().to_string();
    let url = request.url().to_string();

    let mut body = Vec::new();
    request
        .as_reader()
        .take(MAX_BODY_BYTES + 1)
        .read_to_end(&mut body)
        .context("reading request body")?;

    let reply = if body.len() as u64 > MAX_BODY_BYTES {
        ProxyResponse {
            status: 413,
            retry_after: None,
            body: json!({ "error": "Request body too large." }),
        }
    } else {
        proxy.route(&method, &url, &body)
    };
    info!(%method, %url, status = reply.status, "request handled");

    request
        .respond(to_http(&reply)?)
        .context("writing response")
}

fn to_http(reply: &ProxyResponse) -> Result<Response<std::io::Cursor<Vec<u8>>>> {
    let mut response = Response::from_data(reply.body_string().into_bytes())
        .with_status_code(reply.status)
        .with_header(header("Content-Type", "application/json")?);
    if let Some(retry_after) = &reply.retry_after {
        response = response.with_header(header("Retry-After", retry_after)?);
    }
    Ok(response)
}

fn header(name: &str, value: &str) -> Result<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes())
        .map_err(|()| anyhow!("invalid header {name}: {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_http_sets_retry_after() {
        let reply = ProxyResponse {
            status: 429,
            retry_after: Some("5".to_string()),
            body: json!({ "error": "slow down" }),
        };
        let response = to_http(&reply).unwrap();
        assert_eq!(response.status_code().0, 429);
        let headers = response.headers();
        assert!(headers.iter().any(|h| h.field.equiv("Retry-After") && h.value.as_str() == "5"));
        assert!(headers.iter().any(|h| h.field.equiv("Content-Type")));
    }

    #[test]
    fn test_header_rejects_non_ascii() {
        assert!(header("Retry-After", "é").is_err());
    }
}
