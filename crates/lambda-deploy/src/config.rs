//! Client configuration

use serde::{Deserialize, Serialize};

/// Configuration threaded into every client constructor.
///
/// Credentials and region selection are explicit parameters here, never
/// process-wide environment state, so two pipelines with different profiles
/// can run in the same process without stepping on each other. The values
/// are opaque to this crate; only the remote services validate them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Credential profile identifier, passed through to service
    /// implementations.
    pub profile: Option<String>,

    /// Region used when creating containers and in the gateway endpoint host.
    pub region: String,

    /// Host suffix of assembled endpoint URLs
    /// (`https://{api_id}.{gateway_host}/..`).
    pub gateway_host: String,

    /// Calling principal granted invoke permission on newly created
    /// functions.
    pub gateway_principal: String,
}

impl ClientConfig {
    /// Create a configuration for the given region with the provider's
    /// default gateway host and principal.
    pub fn new(region: impl Into<String>) -> Self {
        let region = region.into();
        Self {
            profile: None,
            gateway_host: format!("execute-api.{}.amazonaws.com", region),
            gateway_principal: "apigateway.amazonaws.com".to_string(),
            region,
        }
    }

    /// Builder pattern: set the credential profile.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Builder pattern: override the endpoint host suffix.
    pub fn with_gateway_host(mut self, host: impl Into<String>) -> Self {
        self.gateway_host = host.into();
        self
    }

    /// Builder pattern: override the invoke-permission principal.
    pub fn with_gateway_principal(mut self, principal: impl Into<String>) -> Self {
        self.gateway_principal = principal.into();
        self
    }
}
