//! Incoming gateway event representation

use crate::error::HandlerError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The gateway's proxy event as a handler sees it.
///
/// Every field is optional on the wire; an event carrying only a `body` key
/// parses fine, which is all the [`crate::respond`] wrapper relies on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiRequest {
    /// HTTP method (GET, POST, ...)
    #[serde(default)]
    pub method: String,

    /// Request path
    #[serde(default)]
    pub path: String,

    /// HTTP headers
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Query parameters
    #[serde(default)]
    pub query: HashMap<String, String>,

    /// Raw request body, if any
    #[serde(default)]
    pub body: Option<String>,
}

impl ApiRequest {
    /// Parse the body as JSON into a typed struct.
    pub fn json<T: for<'de> Deserialize<'de>>(&self) -> Result<T, HandlerError> {
        match &self.body {
            Some(body) => serde_json::from_str(body)
                .map_err(|e| HandlerError::BadRequest(format!("Invalid JSON: {}", e))),
            None => Err(HandlerError::BadRequest("Missing request body".to_string())),
        }
    }

    /// Get a header value (case-insensitive lookup).
    pub fn header(&self, key: &str) -> Option<&String> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }
}
