//! Shared HTTP plumbing for backend clients.

use nucrag_core::{AppError, AppResult};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Build the reqwest client used by every backend.
pub fn build_http_client(timeout: Duration) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Map a transport failure to the error taxonomy.
///
/// Timeouts and connection failures are network errors and may be retried.
pub fn transport_error(backend: &str, error: reqwest::Error) -> AppError {
    if error.is_timeout() || error.is_connect() || error.is_request() {
        AppError::BackendNetwork(format!("{} unreachable: {}", backend, error))
    } else {
        AppError::Backend(format!("{} request failed: {}", backend, error))
    }
}

/// Check the status and decode a JSON body.
pub async fn read_json<T: DeserializeOwned>(
    backend: &str,
    response: reqwest::Response,
) -> AppResult<T> {
    let status = response.status();

    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(AppError::from_status(
            backend,
            status.as_u16(),
            &error_message(&body),
        ));
    }

    let body = response
        .text()
        .await
        .map_err(|e| transport_error(backend, e))?;

    serde_json::from_str(&body).map_err(|e| {
        AppError::Backend(format!("Failed to parse {} response: {}", backend, e))
    })
}

/// Pull a readable message out of an error body.
///
/// Understands `{"error": {"message": ".."}}` and `{"error": ".."}`;
/// anything else is returned trimmed.
pub fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        match value.get("error") {
            Some(serde_json::Value::String(message)) => return message.clone(),
            Some(error) => {
                if let Some(message) = error.get("message").and_then(|m| m.as_str()) {
                    return message.to_string();
                }
            }
            None => {}
        }
    }
    body.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_openai_shape() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert_eq!(error_message(body), "Incorrect API key provided");
    }

    #[test]
    fn test_error_message_flat_shape() {
        assert_eq!(error_message(r#"{"error":"model not found"}"#), "model not found");
    }

    #[test]
    fn test_error_message_plain_text() {
        assert_eq!(error_message("  bad gateway \n"), "bad gateway");
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(Duration::from_secs(5)).is_ok());
    }
}
