//! JSON-RPC 2.0 client over HTTP

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chain::provider::{ProviderError, RpcTransport};
use crate::constants::RPC_TIMEOUT;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: &'a Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// JSON-RPC client bound to one endpoint
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: impl Into<String>) -> Self {
        RpcClient {
            http: create_client(),
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call(&self, method: &str, params: &Value) -> Result<Value, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = RpcRequest { jsonrpc: "2.0", id, method, params };

        let start = Instant::now();
        let resp = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(describe_transport_error)?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ProviderError::Transport(format!("Error reading body: {}", e)))?;
        tracing::debug!(id, method, status = status.as_u16(), time_ms = start.elapsed().as_millis() as u64, "RPC call finished");

        decode_response(&text).map_err(|err| {
            if status.is_success() {
                err
            } else {
                ProviderError::Transport(format!("HTTP {}: {}", status.as_u16(), err))
            }
        })
    }
}

#[async_trait]
impl RpcTransport for RpcClient {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.call(method, &params).await
    }
}

/// Parse a JSON-RPC response body into its result
fn decode_response(body: &str) -> Result<Value, ProviderError> {
    let response: RpcResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::InvalidResponse(format!("{}: {}", e, truncate(body, 120))))?;

    if let Some(error) = response.error {
        return Err(ProviderError::Rpc {
            code: error.code,
            message: error.message,
        });
    }
    Ok(response.result.unwrap_or(Value::Null))
}

fn describe_transport_error(e: reqwest::Error) -> ProviderError {
    let msg = if e.is_timeout() {
        format!("Request timed out ({}s)", RPC_TIMEOUT.as_secs())
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        format!("Request failed: {}", e)
    };
    ProviderError::Transport(msg)
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Create an HTTP client with default configuration
pub fn create_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(RPC_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_envelope() {
        let params = json!(["0xabc", "latest"]);
        let req = RpcRequest { jsonrpc: "2.0", id: 7, method: "eth_getBalance", params: &params };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"jsonrpc": "2.0", "id": 7, "method": "eth_getBalance", "params": ["0xabc", "latest"]})
        );
    }

    #[test]
    fn test_decode_result() {
        let value = decode_response(r#"{"jsonrpc":"2.0","id":1,"result":"0xaa36a7"}"#).unwrap();
        assert_eq!(value, json!("0xaa36a7"));

        let value = decode_response(r#"{"jsonrpc":"2.0","id":1,"result":null}"#).unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn test_decode_error_object() {
        let err = decode_response(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":4001,"message":"User rejected the request."}}"#,
        )
        .unwrap_err();
        assert_eq!(err.code(), Some(4001));
        assert!(err.is_user_rejection());
    }

    #[test]
    fn test_decode_garbage() {
        let err = decode_response("<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }
}
