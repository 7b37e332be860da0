//! Deployment orchestrator
//!
//! Composes the archiver, store client, registrar and gateway publisher into
//! one end-to-end operation: archive a source directory, stage the artifact
//! in the store, register the function, and optionally publish a gateway
//! route for it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::archive::archive;
use crate::error::Result;
use crate::function::{FunctionDescriptor, FunctionRegistrar, FunctionSpec};
use crate::gateway::{GatewayPublisher, RouteSpec};
use crate::store::StoreClient;

/// File name the archived function code is staged and stored under.
pub const FUNCTION_ARCHIVE_NAME: &str = "lambda_function.zip";

/// Default path part of a published route.
pub const DEFAULT_PATH_PART: &str = "api";

/// Default stage a published route is deployed at.
pub const DEFAULT_STAGE: &str = "test";

/// Parameters of one deployment run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploySpec {
    /// Function name; also used as the routing API's name.
    pub name: String,
    /// Directory containing the function code and nothing else.
    pub source_dir: PathBuf,
    /// Store container the archived code is staged in; created on demand.
    pub container: String,
    /// Execution role identifier for the function.
    pub role: String,
    pub layers: Vec<String>,
    pub env: HashMap<String, String>,
    pub description: String,
    /// Whether to publish a gateway route after registration.
    pub publish_route: bool,
    pub path_part: String,
    pub stage_name: String,
}

impl DeploySpec {
    pub fn new(
        name: impl Into<String>,
        source_dir: impl Into<PathBuf>,
        container: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source_dir: source_dir.into(),
            container: container.into(),
            role: role.into(),
            layers: Vec::new(),
            env: HashMap::new(),
            description: String::new(),
            publish_route: true,
            path_part: DEFAULT_PATH_PART.to_string(),
            stage_name: DEFAULT_STAGE.to_string(),
        }
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

    /// Builder pattern: skip route publishing.
    pub fn without_route(mut self) -> Self {
        self.publish_route = false;
        self
    }

    pub fn with_route(mut self, path_part: impl Into<String>, stage_name: impl Into<String>) -> Self {
        self.publish_route = true;
        self.path_part = path_part.into();
        self.stage_name = stage_name.into();
        self
    }
}

/// Result of a deployment run.
#[derive(Debug, Clone)]
pub struct DeployOutcome {
    pub function: FunctionDescriptor,
    /// Reachable endpoint URL when a route was published.
    pub endpoint: Option<Url>,
}

/// End-to-end deployment pipeline.
///
/// Each stage completes fully before the next starts and nothing is retried
/// or rolled back: a failure after stage N leaves the side effects of stages
/// 1..N-1 in place (an uploaded artifact is not deleted, a registered
/// function is not removed). Running two deployments for the same function
/// name concurrently is unsafe.
pub struct Deployer {
    store: StoreClient,
    registrar: FunctionRegistrar,
    gateway: GatewayPublisher,
}

impl Deployer {
    pub fn new(store: StoreClient, registrar: FunctionRegistrar, gateway: GatewayPublisher) -> Self {
        Self {
            store,
            registrar,
            gateway,
        }
    }

    /// Archive, upload, register, and (optionally) route a function.
    pub async fn deploy(&self, spec: &DeploySpec) -> Result<DeployOutcome> {
        tracing::info!(
            "Deploying function {} from {}",
            spec.name,
            spec.source_dir.display()
        );

        // Staging directory is released on every exit path, including errors.
        let staging = tempfile::tempdir()?;
        let artifact = archive(
            &spec.source_dir,
            &staging.path().join(FUNCTION_ARCHIVE_NAME),
            false,
        )?;

        let stored = self
            .store
            .upload(&artifact, &spec.container, None, true)
            .await?;
        drop(staging);

        let function_spec = FunctionSpec::new(&spec.name, &spec.role)
            .with_layers(spec.layers.clone())
            .with_env(spec.env.clone())
            .with_description(&spec.description);
        let function = self.registrar.create(&function_spec, &stored, true).await?;

        if !spec.publish_route {
            tracing::info!("Function {} deployed without a route", spec.name);
            return Ok(DeployOutcome {
                function,
                endpoint: None,
            });
        }

        let route = RouteSpec::new(&spec.name, &spec.path_part, &spec.stage_name)
            .with_description(&spec.description);
        let endpoint = self.gateway.publish_route(&function, &route).await?;
        tracing::info!("Function {} reachable at {}", spec.name, endpoint);

        Ok(DeployOutcome {
            function,
            endpoint: Some(endpoint),
        })
    }

    /// Re-archive a source directory and point an existing function at the
    /// new code, optionally replacing its layer list.
    pub async fn redeploy(
        &self,
        name: &str,
        source_dir: &Path,
        container: &str,
        layers: Option<&[String]>,
    ) -> Result<FunctionDescriptor> {
        tracing::info!("Redeploying function {} from {}", name, source_dir.display());

        let staging = tempfile::tempdir()?;
        let artifact = archive(source_dir, &staging.path().join(FUNCTION_ARCHIVE_NAME), true)?;
        let stored = self.store.upload(&artifact, container, None, true).await?;
        drop(staging);

        self.registrar.update(name, &stored, layers).await
    }
}

impl std::fmt::Debug for Deployer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deployer").finish_non_exhaustive()
    }
}
