//! In-memory implementations of the remote service contracts
//!
//! These back the test suite and local development runs with the provider's
//! observable semantics: missing containers on write, duplicate/absent
//! function errors, generated identifiers, recorded grants and deployments.
//! No network is involved.

use std::collections::HashMap;
use std::sync::Mutex;

use bytes::Bytes;
use uuid::Uuid;

use crate::error::{DeployError, Result};
use crate::function::{FunctionDescriptor, FunctionService, FunctionSpec};
use crate::gateway::GatewayService;
use crate::layer::LayerSpec;
use crate::store::{ObjectStoreService, StoredObject, WriteOutcome};
use crate::ServiceFuture;

fn generated_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(10);
    id
}

// ---------------------------------------------------------------------------
// Object store

#[derive(Default)]
struct StoreState {
    containers: HashMap<String, HashMap<String, Bytes>>,
    regions: HashMap<String, String>,
}

/// Object store holding containers and objects in process memory.
#[derive(Default)]
pub struct MemoryObjectStore {
    state: Mutex<StoreState>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: pre-provision a container.
    pub fn with_container(self, name: impl Into<String>) -> Self {
        self.state
            .lock()
            .unwrap()
            .containers
            .insert(name.into(), HashMap::new());
        self
    }

    pub fn has_container(&self, name: &str) -> bool {
        self.state.lock().unwrap().containers.contains_key(name)
    }

    /// Region a container was created in, if it was created through the
    /// contract rather than pre-provisioned.
    pub fn container_region(&self, name: &str) -> Option<String> {
        self.state.lock().unwrap().regions.get(name).cloned()
    }

    pub fn object(&self, container: &str, key: &str) -> Option<Bytes> {
        self.state
            .lock()
            .unwrap()
            .containers
            .get(container)?
            .get(key)
            .cloned()
    }
}

impl ObjectStoreService for MemoryObjectStore {
    fn write_object<'a>(
        &'a self,
        container: &'a str,
        key: &'a str,
        body: Bytes,
    ) -> ServiceFuture<'a, WriteOutcome> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            match state.containers.get_mut(container) {
                Some(objects) => {
                    objects.insert(key.to_string(), body);
                    Ok(WriteOutcome::Written)
                }
                None => Ok(WriteOutcome::ContainerMissing {
                    reason: format!("no such container: {}", container),
                }),
            }
        })
    }

    fn create_container<'a>(&'a self, name: &'a str, region: &'a str) -> ServiceFuture<'a, ()> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state
                .containers
                .entry(name.to_string())
                .or_insert_with(HashMap::new);
            state.regions.insert(name.to_string(), region.to_string());
            Ok(())
        })
    }

    fn read_object<'a>(
        &'a self,
        container: &'a str,
        key: &'a str,
    ) -> ServiceFuture<'a, Option<Bytes>> {
        Box::pin(async move {
            let state = self.state.lock().unwrap();
            Ok(state
                .containers
                .get(container)
                .and_then(|objects| objects.get(key))
                .cloned())
        })
    }
}

// ---------------------------------------------------------------------------
// Function service

/// Invoke permission recorded by [`MemoryFunctionService::grant_invoke`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub function: String,
    pub principal: String,
    pub statement_id: String,
}

/// Function service holding registered functions in process memory.
pub struct MemoryFunctionService {
    region: String,
    functions: Mutex<HashMap<String, FunctionDescriptor>>,
    grants: Mutex<Vec<Grant>>,
    layer_versions: Mutex<HashMap<String, u32>>,
}

impl MemoryFunctionService {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            functions: Mutex::new(HashMap::new()),
            grants: Mutex::new(Vec::new()),
            layer_versions: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, name: &str) -> Option<FunctionDescriptor> {
        self.functions.lock().unwrap().get(name).cloned()
    }

    pub fn grants(&self, function: &str) -> Vec<Grant> {
        self.grants
            .lock()
            .unwrap()
            .iter()
            .filter(|g| g.function == function)
            .cloned()
            .collect()
    }
}

impl FunctionService for MemoryFunctionService {
    fn create_function<'a>(
        &'a self,
        spec: &'a FunctionSpec,
        code: &'a StoredObject,
    ) -> ServiceFuture<'a, FunctionDescriptor> {
        Box::pin(async move {
            let mut functions = self.functions.lock().unwrap();
            if functions.contains_key(&spec.name) {
                return Err(DeployError::DuplicateFunction(spec.name.clone()));
            }
            let descriptor = FunctionDescriptor {
                name: spec.name.clone(),
                arn: format!(
                    "arn:aws:lambda:{}:000000000000:function:{}",
                    self.region, spec.name
                ),
                runtime: spec.runtime.clone(),
                handler: spec.handler.clone(),
                role: spec.role.clone(),
                code: code.clone(),
                layers: spec.layers.clone(),
                description: spec.description.clone(),
            };
            functions.insert(spec.name.clone(), descriptor.clone());
            Ok(descriptor)
        })
    }

    fn update_function_code<'a>(
        &'a self,
        name: &'a str,
        code: &'a StoredObject,
    ) -> ServiceFuture<'a, FunctionDescriptor> {
        Box::pin(async move {
            let mut functions = self.functions.lock().unwrap();
            let descriptor = functions
                .get_mut(name)
                .ok_or_else(|| DeployError::FunctionNotFound(name.to_string()))?;
            descriptor.code = code.clone();
            Ok(descriptor.clone())
        })
    }

    fn update_function_layers<'a>(
        &'a self,
        name: &'a str,
        layers: &'a [String],
    ) -> ServiceFuture<'a, FunctionDescriptor> {
        Box::pin(async move {
            let mut functions = self.functions.lock().unwrap();
            let descriptor = functions
                .get_mut(name)
                .ok_or_else(|| DeployError::FunctionNotFound(name.to_string()))?;
            descriptor.layers = layers.to_vec();
            Ok(descriptor.clone())
        })
    }

    fn delete_function<'a>(&'a self, name: &'a str) -> ServiceFuture<'a, ()> {
        Box::pin(async move {
            let mut functions = self.functions.lock().unwrap();
            functions
                .remove(name)
                .map(|_| ())
                .ok_or_else(|| DeployError::FunctionNotFound(name.to_string()))
        })
    }

    fn grant_invoke<'a>(
        &'a self,
        name: &'a str,
        principal: &'a str,
        statement_id: &'a str,
    ) -> ServiceFuture<'a, ()> {
        Box::pin(async move {
            if !self.functions.lock().unwrap().contains_key(name) {
                return Err(DeployError::FunctionNotFound(name.to_string()));
            }
            self.grants.lock().unwrap().push(Grant {
                function: name.to_string(),
                principal: principal.to_string(),
                statement_id: statement_id.to_string(),
            });
            Ok(())
        })
    }

    fn publish_layer_version<'a>(
        &'a self,
        spec: &'a LayerSpec,
        _content: &'a StoredObject,
    ) -> ServiceFuture<'a, String> {
        Box::pin(async move {
            let mut versions = self.layer_versions.lock().unwrap();
            let version = versions.entry(spec.name.clone()).or_insert(0);
            *version += 1;
            Ok(format!(
                "arn:aws:lambda:{}:000000000000:layer:{}:{}",
                self.region, spec.name, version
            ))
        })
    }
}

// ---------------------------------------------------------------------------
// Gateway service

struct ResourceRecord {
    id: String,
    parent_id: String,
    path_part: String,
    has_method: bool,
    integration: Option<String>,
}

struct ApiRecord {
    id: String,
    name: String,
    root_id: String,
    resources: Vec<ResourceRecord>,
    deployments: Vec<String>,
}

/// Gateway service holding APIs and their wiring in process memory.
#[derive(Default)]
pub struct MemoryGateway {
    apis: Mutex<Vec<ApiRecord>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of all created APIs, in creation order.
    pub fn api_ids(&self) -> Vec<String> {
        self.apis.lock().unwrap().iter().map(|a| a.id.clone()).collect()
    }

    pub fn deployments(&self, api_id: &str) -> Vec<String> {
        self.apis
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == api_id)
            .map(|a| a.deployments.clone())
            .unwrap_or_default()
    }

    /// Function identifiers integrated on the API's resources.
    pub fn integrations(&self, api_id: &str) -> Vec<String> {
        self.apis
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == api_id)
            .map(|a| {
                a.resources
                    .iter()
                    .filter_map(|r| r.integration.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn with_api<T>(
        &self,
        api_id: &str,
        f: impl FnOnce(&mut ApiRecord) -> Result<T>,
    ) -> Result<T> {
        let mut apis = self.apis.lock().unwrap();
        let api = apis
            .iter_mut()
            .find(|a| a.id == api_id)
            .ok_or_else(|| DeployError::Remote(format!("unknown api: {}", api_id)))?;
        f(api)
    }
}

impl GatewayService for MemoryGateway {
    fn find_api<'a>(&'a self, name: &'a str) -> ServiceFuture<'a, Option<String>> {
        Box::pin(async move {
            Ok(self
                .apis
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.name == name)
                .map(|a| a.id.clone()))
        })
    }

    fn create_api<'a>(&'a self, name: &'a str, _description: &'a str) -> ServiceFuture<'a, String> {
        Box::pin(async move {
            let id = generated_id();
            self.apis.lock().unwrap().push(ApiRecord {
                id: id.clone(),
                name: name.to_string(),
                root_id: generated_id(),
                resources: Vec::new(),
                deployments: Vec::new(),
            });
            Ok(id)
        })
    }

    fn root_resource<'a>(&'a self, api_id: &'a str) -> ServiceFuture<'a, String> {
        Box::pin(async move { self.with_api(api_id, |api| Ok(api.root_id.clone())) })
    }

    fn create_resource<'a>(
        &'a self,
        api_id: &'a str,
        parent_id: &'a str,
        path_part: &'a str,
    ) -> ServiceFuture<'a, String> {
        Box::pin(async move {
            self.with_api(api_id, |api| {
                if let Some(existing) = api
                    .resources
                    .iter()
                    .find(|r| r.parent_id == parent_id && r.path_part == path_part)
                {
                    return Ok(existing.id.clone());
                }
                let id = generated_id();
                api.resources.push(ResourceRecord {
                    id: id.clone(),
                    parent_id: parent_id.to_string(),
                    path_part: path_part.to_string(),
                    has_method: false,
                    integration: None,
                });
                Ok(id)
            })
        })
    }

    fn put_proxy_method<'a>(
        &'a self,
        api_id: &'a str,
        resource_id: &'a str,
    ) -> ServiceFuture<'a, ()> {
        Box::pin(async move {
            self.with_api(api_id, |api| {
                let resource = api
                    .resources
                    .iter_mut()
                    .find(|r| r.id == resource_id)
                    .ok_or_else(|| DeployError::Remote(format!("unknown resource: {}", resource_id)))?;
                resource.has_method = true;
                Ok(())
            })
        })
    }

    fn put_proxy_integration<'a>(
        &'a self,
        api_id: &'a str,
        resource_id: &'a str,
        function_arn: &'a str,
    ) -> ServiceFuture<'a, ()> {
        Box::pin(async move {
            self.with_api(api_id, |api| {
                let resource = api
                    .resources
                    .iter_mut()
                    .find(|r| r.id == resource_id)
                    .ok_or_else(|| DeployError::Remote(format!("unknown resource: {}", resource_id)))?;
                if !resource.has_method {
                    return Err(DeployError::Remote(format!(
                        "resource {} has no method",
                        resource_id
                    )));
                }
                resource.integration = Some(function_arn.to_string());
                Ok(())
            })
        })
    }

    fn create_deployment<'a>(
        &'a self,
        api_id: &'a str,
        stage_name: &'a str,
    ) -> ServiceFuture<'a, ()> {
        Box::pin(async move {
            self.with_api(api_id, |api| {
                api.deployments.push(stage_name.to_string());
                Ok(())
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_write_into_missing_container() {
        let store = MemoryObjectStore::new();
        let outcome = store
            .write_object("nope", "k", Bytes::from_static(b"v"))
            .await
            .unwrap();
        assert!(matches!(outcome, WriteOutcome::ContainerMissing { .. }));

        store.create_container("nope", "eu-west-1").await.unwrap();
        let outcome = store
            .write_object("nope", "k", Bytes::from_static(b"v"))
            .await
            .unwrap();
        assert!(matches!(outcome, WriteOutcome::Written));
        assert_eq!(store.object("nope", "k").unwrap(), Bytes::from_static(b"v"));
    }

    #[tokio::test]
    async fn test_gateway_requires_method_before_integration() {
        let gateway = MemoryGateway::new();
        let api_id = gateway.create_api("a", "").await.unwrap();
        let root = gateway.root_resource(&api_id).await.unwrap();
        let resource = gateway.create_resource(&api_id, &root, "api").await.unwrap();

        let err = gateway
            .put_proxy_integration(&api_id, &resource, "arn")
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::Remote(_)));

        gateway.put_proxy_method(&api_id, &resource).await.unwrap();
        gateway
            .put_proxy_integration(&api_id, &resource, "arn")
            .await
            .unwrap();
        assert_eq!(gateway.integrations(&api_id), vec!["arn".to_string()]);
    }

    #[tokio::test]
    async fn test_grant_on_missing_function() {
        let service = MemoryFunctionService::new("eu-west-1");
        let err = service
            .grant_invoke("ghost", "apigateway.amazonaws.com", "apigateway")
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::FunctionNotFound(_)));
    }
}
