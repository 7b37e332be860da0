//! Request wrapping for function handlers
//!
//! [`respond`] is the whole request lifecycle as one pure function: parse
//! the raw gateway event, deserialize its body into the handler's typed
//! input, invoke the handler, serialize the output. Any failure along the
//! way - unparseable event, malformed body, handler error, unserializable
//! output - collapses into the single generic 500 response, so a broken
//! request can never leak an internal error shape to the caller.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::HandlerError;
use crate::request::ApiRequest;
use crate::response::ApiResponse;

/// Run `handler` against a raw gateway event and produce the response.
///
/// A missing or empty body invokes the handler with `None`; handlers that
/// require input decide for themselves whether that is an error.
pub fn respond<I, O, F>(raw: &str, handler: F) -> ApiResponse
where
    I: DeserializeOwned,
    O: Serialize,
    F: FnOnce(Option<I>) -> Result<O, HandlerError>,
{
    tracing::debug!("Handling event: {}", raw);
    match invoke(raw, handler) {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("Handler failed: {}", e);
            ApiResponse::internal_error()
        }
    }
}

fn invoke<I, O, F>(raw: &str, handler: F) -> Result<ApiResponse, HandlerError>
where
    I: DeserializeOwned,
    O: Serialize,
    F: FnOnce(Option<I>) -> Result<O, HandlerError>,
{
    let request: ApiRequest = serde_json::from_str(raw)?;

    let input = match request.body.as_deref() {
        Some(body) if !body.is_empty() => Some(serde_json::from_str(body)?),
        _ => {
            tracing::debug!("No body present");
            None
        }
    };

    let output = handler(input)?;
    let body = serde_json::to_string(&output)?;
    Ok(ApiResponse::ok(body))
}
