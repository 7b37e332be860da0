//! Function registrar
//!
//! Creates, updates and deletes remote function definitions. The function
//! service is an external collaborator reached through the
//! [`FunctionService`] contract; code always points at an object already
//! staged in the store, never at inline bytes.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::error::Result;
use crate::layer::LayerSpec;
use crate::store::StoredObject;
use crate::ServiceFuture;

/// Runtime tag used when a spec does not name one.
pub const DEFAULT_RUNTIME: &str = "python3.6";

/// Handler entry point used when a spec does not name one.
pub const DEFAULT_HANDLER: &str = "lambda_function.lambda_handler";

/// Statement id under which the gateway invoke permission is granted.
const GATEWAY_STATEMENT_ID: &str = "apigateway";

/// Everything needed to register a function, minus its code reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    pub runtime: String,
    pub handler: String,
    /// Execution role identifier (an IAM role ARN with the original provider).
    pub role: String,
    /// Layer version identifiers attached to the function.
    pub layers: Vec<String>,
    /// Environment variables passed into the function.
    pub env: HashMap<String, String>,
    pub description: String,
}

impl FunctionSpec {
    /// Create a spec with the default runtime and handler.
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            runtime: DEFAULT_RUNTIME.to_string(),
            handler: DEFAULT_HANDLER.to_string(),
            role: role.into(),
            layers: Vec::new(),
            env: HashMap::new(),
            description: String::new(),
        }
    }

    pub fn with_runtime(mut self, runtime: impl Into<String>) -> Self {
        self.runtime = runtime.into();
        self
    }

    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = handler.into();
        self
    }

    pub fn with_layers(mut self, layers: Vec<String>) -> Self {
        self.layers = layers;
        self
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Provider-assigned view of a registered function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    pub name: String,
    /// Unique resource identifier assigned by the provider.
    pub arn: String,
    pub runtime: String,
    pub handler: String,
    pub role: String,
    /// Store object the function's code was registered from.
    pub code: StoredObject,
    pub layers: Vec<String>,
    pub description: String,
}

/// Remote function service contract.
///
/// `create_function` fails with [`crate::DeployError::DuplicateFunction`]
/// when the name is taken; the update and delete operations fail with
/// [`crate::DeployError::FunctionNotFound`] when it is not.
pub trait FunctionService: Send + Sync {
    fn create_function<'a>(
        &'a self,
        spec: &'a FunctionSpec,
        code: &'a StoredObject,
    ) -> ServiceFuture<'a, FunctionDescriptor>;

    fn update_function_code<'a>(
        &'a self,
        name: &'a str,
        code: &'a StoredObject,
    ) -> ServiceFuture<'a, FunctionDescriptor>;

    /// Replace the function's entire layer list.
    fn update_function_layers<'a>(
        &'a self,
        name: &'a str,
        layers: &'a [String],
    ) -> ServiceFuture<'a, FunctionDescriptor>;

    fn delete_function<'a>(&'a self, name: &'a str) -> ServiceFuture<'a, ()>;

    /// Permit `principal` to invoke the function.
    fn grant_invoke<'a>(
        &'a self,
        name: &'a str,
        principal: &'a str,
        statement_id: &'a str,
    ) -> ServiceFuture<'a, ()>;

    /// Register a new version of a layer; repeated publication under the
    /// same name increments the provider-side version.
    fn publish_layer_version<'a>(
        &'a self,
        spec: &'a LayerSpec,
        content: &'a StoredObject,
    ) -> ServiceFuture<'a, String>;
}

/// Client for registering and maintaining remote functions.
pub struct FunctionRegistrar {
    service: Arc<dyn FunctionService>,
    config: ClientConfig,
}

impl FunctionRegistrar {
    pub fn new(service: Arc<dyn FunctionService>, config: ClientConfig) -> Self {
        Self { service, config }
    }

    /// Register a new function from code staged in the store.
    ///
    /// With `grant_gateway_invoke`, additionally grants the configured
    /// gateway principal permission to invoke it. The grant is a separate
    /// remote call: if it fails, the error is surfaced and the already
    /// created function stays in place.
    pub async fn create(
        &self,
        spec: &FunctionSpec,
        code: &StoredObject,
        grant_gateway_invoke: bool,
    ) -> Result<FunctionDescriptor> {
        tracing::info!(
            "Registering function {} from {}/{}",
            spec.name,
            code.container,
            code.key
        );
        let descriptor = self.service.create_function(spec, code).await?;

        if grant_gateway_invoke {
            self.service
                .grant_invoke(&spec.name, &self.config.gateway_principal, GATEWAY_STATEMENT_ID)
                .await?;
        }
        Ok(descriptor)
    }

    /// Point an existing function at new code, optionally replacing its
    /// layer list first.
    ///
    /// The layer replacement and the code swap are separate remote calls; a
    /// failure between them leaves the function with new layers and old
    /// code. Callers must treat the operation as non-atomic.
    pub async fn update(
        &self,
        name: &str,
        code: &StoredObject,
        layers: Option<&[String]>,
    ) -> Result<FunctionDescriptor> {
        if let Some(layers) = layers {
            tracing::info!("Replacing layers of function {}", name);
            self.service.update_function_layers(name, layers).await?;
        }
        tracing::info!("Updating code of function {} to {}/{}", name, code.container, code.key);
        self.service.update_function_code(name, code).await
    }

    /// Remove a function. Deleting an absent function fails with
    /// [`crate::DeployError::FunctionNotFound`]; existence is checked
    /// strictly, not papered over.
    pub async fn delete(&self, name: &str) -> Result<()> {
        tracing::info!("Deleting function {}", name);
        self.service.delete_function(name).await
    }

    /// Publish a new layer version whose content is an object already staged
    /// in the store. Returns the provider-assigned version identifier.
    pub async fn publish_layer(&self, spec: &LayerSpec, content: &StoredObject) -> Result<String> {
        tracing::info!(
            "Publishing layer {} from {}/{}",
            spec.name,
            content.container,
            content.key
        );
        self.service.publish_layer_version(spec, content).await
    }
}

impl std::fmt::Debug for FunctionRegistrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistrar")
            .field("region", &self.config.region)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeployError;
    use crate::memory::MemoryFunctionService;

    fn registrar(service: Arc<MemoryFunctionService>) -> FunctionRegistrar {
        FunctionRegistrar::new(service, ClientConfig::new("eu-west-1"))
    }

    fn code() -> StoredObject {
        StoredObject {
            container: "bucket".to_string(),
            key: "lambda_function.zip".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_records_grant() {
        let service = Arc::new(MemoryFunctionService::new("eu-west-1"));
        let spec = FunctionSpec::new("f1", "arn:aws:iam::1:role/r");

        let descriptor = registrar(service.clone())
            .create(&spec, &code(), true)
            .await
            .unwrap();
        assert!(descriptor.arn.contains("f1"));
        assert_eq!(descriptor.runtime, DEFAULT_RUNTIME);

        let grants = service.grants("f1");
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].principal, "apigateway.amazonaws.com");
        assert_eq!(grants[0].statement_id, "apigateway");
    }

    #[tokio::test]
    async fn test_create_without_grant() {
        let service = Arc::new(MemoryFunctionService::new("eu-west-1"));
        let spec = FunctionSpec::new("f1", "arn:aws:iam::1:role/r");

        registrar(service.clone()).create(&spec, &code(), false).await.unwrap();
        assert!(service.grants("f1").is_empty());
    }

    #[tokio::test]
    async fn test_grant_failure_leaves_function_in_place() {
        struct GrantDenied(Arc<MemoryFunctionService>);

        impl FunctionService for GrantDenied {
            fn create_function<'a>(
                &'a self,
                spec: &'a FunctionSpec,
                code: &'a StoredObject,
            ) -> crate::ServiceFuture<'a, FunctionDescriptor> {
                self.0.create_function(spec, code)
            }
            fn update_function_code<'a>(
                &'a self,
                name: &'a str,
                code: &'a StoredObject,
            ) -> crate::ServiceFuture<'a, FunctionDescriptor> {
                self.0.update_function_code(name, code)
            }
            fn update_function_layers<'a>(
                &'a self,
                name: &'a str,
                layers: &'a [String],
            ) -> crate::ServiceFuture<'a, FunctionDescriptor> {
                self.0.update_function_layers(name, layers)
            }
            fn delete_function<'a>(&'a self, name: &'a str) -> crate::ServiceFuture<'a, ()> {
                self.0.delete_function(name)
            }
            fn grant_invoke<'a>(
                &'a self,
                _name: &'a str,
                _principal: &'a str,
                _statement_id: &'a str,
            ) -> crate::ServiceFuture<'a, ()> {
                Box::pin(async {
                    Err(DeployError::Remote("not authorized to add permissions".to_string()))
                })
            }
            fn publish_layer_version<'a>(
                &'a self,
                spec: &'a LayerSpec,
                content: &'a StoredObject,
            ) -> crate::ServiceFuture<'a, String> {
                self.0.publish_layer_version(spec, content)
            }
        }

        let inner = Arc::new(MemoryFunctionService::new("eu-west-1"));
        let registrar = FunctionRegistrar::new(
            Arc::new(GrantDenied(inner.clone())),
            ClientConfig::new("eu-west-1"),
        );

        let err = registrar
            .create(&FunctionSpec::new("f1", "role"), &code(), true)
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::Remote(_)));
        // The created function is not rolled back.
        assert!(inner.get("f1").is_some());
    }

    #[tokio::test]
    async fn test_duplicate_create_is_surfaced() {
        let service = Arc::new(MemoryFunctionService::new("eu-west-1"));
        let spec = FunctionSpec::new("f1", "arn:aws:iam::1:role/r");
        let registrar = registrar(service);

        registrar.create(&spec, &code(), false).await.unwrap();
        let err = registrar.create(&spec, &code(), false).await.unwrap_err();
        assert!(matches!(err, DeployError::DuplicateFunction(name) if name == "f1"));
    }

    #[tokio::test]
    async fn test_update_replaces_layers_and_code() {
        let service = Arc::new(MemoryFunctionService::new("eu-west-1"));
        let spec = FunctionSpec::new("f1", "arn:aws:iam::1:role/r")
            .with_layers(vec!["arn:layer:old:1".to_string()]);
        let registrar = registrar(service);

        registrar.create(&spec, &code(), false).await.unwrap();

        let new_code = StoredObject {
            container: "bucket".to_string(),
            key: "v2.zip".to_string(),
        };
        let layers = vec!["arn:layer:new:1".to_string()];
        let updated = registrar
            .update("f1", &new_code, Some(&layers))
            .await
            .unwrap();
        assert_eq!(updated.code.key, "v2.zip");
        assert_eq!(updated.layers, layers);
    }

    #[tokio::test]
    async fn test_update_unknown_function() {
        let service = Arc::new(MemoryFunctionService::new("eu-west-1"));
        let err = registrar(service)
            .update("ghost", &code(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::FunctionNotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_is_strict() {
        let service = Arc::new(MemoryFunctionService::new("eu-west-1"));
        let registrar = registrar(service);

        let err = registrar.delete("ghost").await.unwrap_err();
        assert!(matches!(err, DeployError::FunctionNotFound(_)));

        registrar
            .create(&FunctionSpec::new("f1", "role"), &code(), false)
            .await
            .unwrap();
        registrar.delete("f1").await.unwrap();
        let err = registrar.delete("f1").await.unwrap_err();
        assert!(matches!(err, DeployError::FunctionNotFound(_)));
    }
}
