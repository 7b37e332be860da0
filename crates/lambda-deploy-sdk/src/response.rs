//! Outgoing gateway response representation

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Body returned whenever the wrapper swallows a failure.
pub const GENERIC_ERROR_BODY: &str = "An Error Occurred";

/// Response in the shape the gateway hands back to clients.
///
/// Field names follow the provider's proxy contract (`statusCode`, not
/// `status_code`). Every constructor starts from the same base header set:
/// JSON content type plus the permissive CORS pair, so browser clients can
/// call published routes directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,

    #[serde(default)]
    pub headers: HashMap<String, String>,

    #[serde(default)]
    pub body: Option<String>,
}

fn base_headers() -> HashMap<String, String> {
    let mut headers = HashMap::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    headers.insert("Access-Control-Allow-Origin".to_string(), "*".to_string());
    headers.insert(
        "Access-Control-Allow-Credentials".to_string(),
        "true".to_string(),
    );
    headers
}

impl ApiResponse {
    /// Create a response with the given status code and the base headers.
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            headers: base_headers(),
            body: None,
        }
    }

    /// Create a 200 response with an already-serialized body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            ..Self::new(200)
        }
    }

    /// Create a JSON response with a custom status code.
    pub fn json<T: Serialize>(status_code: u16, body: T) -> Self {
        Self {
            body: serde_json::to_string(&body).ok(),
            ..Self::new(status_code)
        }
    }

    /// The generic failure response: 500 with an opaque body.
    pub fn internal_error() -> Self {
        Self {
            body: Some(GENERIC_ERROR_BODY.to_string()),
            ..Self::new(500)
        }
    }

    /// Builder pattern: set or replace a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}
