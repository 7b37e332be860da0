//! Gateway route publisher
//!
//! Provisions a routing API that forwards inbound HTTP calls to a registered
//! function and publishes it at a versioned stage. The gateway itself is an
//! external collaborator reached through the [`GatewayService`] contract.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{DeployError, Result};
use crate::function::FunctionDescriptor;
use crate::ServiceFuture;

/// How the publisher obtains the routing API for a route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiProvisioning {
    /// Create a brand-new API on every call. Repeated publication of the
    /// same route therefore accumulates APIs on the provider side.
    #[default]
    CreateAlways,
    /// Look up an existing API by name first; create only on a miss.
    ReuseByName,
}

/// Route to publish: which API, under which path, at which stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSpec {
    pub api_name: String,
    pub path_part: String,
    pub stage_name: String,
    pub description: String,
}

impl RouteSpec {
    pub fn new(
        api_name: impl Into<String>,
        path_part: impl Into<String>,
        stage_name: impl Into<String>,
    ) -> Self {
        Self {
            api_name: api_name.into(),
            path_part: path_part.into(),
            stage_name: stage_name.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Remote gateway service contract.
pub trait GatewayService: Send + Sync {
    /// Look up an API id by name. Services without lookup support keep the
    /// default, which reports no match.
    fn find_api<'a>(&'a self, _name: &'a str) -> ServiceFuture<'a, Option<String>> {
        Box::pin(async { Ok(None) })
    }

    /// Create a routing API, returning its generated id.
    fn create_api<'a>(&'a self, name: &'a str, description: &'a str) -> ServiceFuture<'a, String>;

    /// Id of the API's root path resource.
    fn root_resource<'a>(&'a self, api_id: &'a str) -> ServiceFuture<'a, String>;

    /// Create a child path resource, returning its id.
    fn create_resource<'a>(
        &'a self,
        api_id: &'a str,
        parent_id: &'a str,
        path_part: &'a str,
    ) -> ServiceFuture<'a, String>;

    /// Accept every HTTP method on the resource, without authorization.
    fn put_proxy_method<'a>(&'a self, api_id: &'a str, resource_id: &'a str)
        -> ServiceFuture<'a, ()>;

    /// Wire the resource to the function with the provider-native proxy
    /// integration.
    fn put_proxy_integration<'a>(
        &'a self,
        api_id: &'a str,
        resource_id: &'a str,
        function_arn: &'a str,
    ) -> ServiceFuture<'a, ()>;

    /// Publish the API at a stage, making it reachable.
    fn create_deployment<'a>(&'a self, api_id: &'a str, stage_name: &'a str)
        -> ServiceFuture<'a, ()>;
}

/// Client for publishing gateway routes.
pub struct GatewayPublisher {
    service: Arc<dyn GatewayService>,
    config: ClientConfig,
    provisioning: ApiProvisioning,
}

impl GatewayPublisher {
    pub fn new(service: Arc<dyn GatewayService>, config: ClientConfig) -> Self {
        Self {
            service,
            config,
            provisioning: ApiProvisioning::default(),
        }
    }

    /// Builder pattern: set the API provisioning policy.
    pub fn with_provisioning(mut self, provisioning: ApiProvisioning) -> Self {
        self.provisioning = provisioning;
        self
    }

    /// Provision a route that forwards inbound HTTP calls to `function` and
    /// publish it, returning the reachable endpoint URL.
    ///
    /// Any failing step fails the whole call with
    /// [`DeployError::GatewayProvision`]; sub-resources created by the steps
    /// that succeeded are not cleaned up.
    pub async fn publish_route(
        &self,
        function: &FunctionDescriptor,
        route: &RouteSpec,
    ) -> Result<Url> {
        self.provision(function, route).await.map_err(|e| match e {
            already @ DeployError::GatewayProvision(_) => already,
            other => DeployError::GatewayProvision(other.to_string()),
        })
    }

    async fn provision(&self, function: &FunctionDescriptor, route: &RouteSpec) -> Result<Url> {
        let api_id = match self.provisioning {
            ApiProvisioning::ReuseByName => match self.service.find_api(&route.api_name).await? {
                Some(id) => {
                    tracing::debug!("Reusing API {} ({})", route.api_name, id);
                    id
                }
                None => {
                    self.service
                        .create_api(&route.api_name, &route.description)
                        .await?
                }
            },
            ApiProvisioning::CreateAlways => {
                self.service
                    .create_api(&route.api_name, &route.description)
                    .await?
            }
        };
        tracing::info!(
            "Publishing route /{}/{} on API {} for function {}",
            route.stage_name,
            route.path_part,
            api_id,
            function.name
        );

        let parent_id = self.service.root_resource(&api_id).await?;
        let resource_id = self
            .service
            .create_resource(&api_id, &parent_id, &route.path_part)
            .await?;
        self.service.put_proxy_method(&api_id, &resource_id).await?;
        self.service
            .put_proxy_integration(&api_id, &resource_id, &function.arn)
            .await?;
        self.service
            .create_deployment(&api_id, &route.stage_name)
            .await?;

        let endpoint = format!(
            "https://{}.{}/{}/{}/",
            api_id, self.config.gateway_host, route.stage_name, route.path_part
        );
        Url::parse(&endpoint).map_err(|e| DeployError::GatewayProvision(e.to_string()))
    }
}

impl std::fmt::Debug for GatewayPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayPublisher")
            .field("provisioning", &self.provisioning)
            .field("gateway_host", &self.config.gateway_host)
            .finish()
    }
}
