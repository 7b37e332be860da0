//! lambda-deploy-sdk - Request/response glue for gateway-fronted handlers
//!
//! Handlers behind a published gateway route receive the provider's proxy
//! event and must answer in its response shape. This crate provides those
//! two types plus [`respond`], a pure wrapper that parses the event body,
//! invokes a typed handler, and serializes the result, mapping every
//! failure to one generic error response.

pub mod error;
pub mod handler;
pub mod request;
pub mod response;

pub mod prelude {
    //! Common imports for function handlers
    pub use crate::error::HandlerError;
    pub use crate::handler::respond;
    pub use crate::request::ApiRequest;
    pub use crate::response::ApiResponse;
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{json, Value as JsonValue};
}

// Re-export key types at crate root
pub use error::HandlerError;
pub use handler::respond;
pub use request::ApiRequest;
pub use response::ApiResponse;
