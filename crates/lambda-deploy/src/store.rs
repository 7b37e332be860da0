//! Artifact store client
//!
//! Uploads local artifacts into a remote object store and fetches them back
//! by key. The store itself is an external collaborator reached through the
//! [`ObjectStoreService`] contract; this module adds the key-defaulting and
//! container auto-provisioning behavior on top of it.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::error::{DeployError, Result};
use crate::ServiceFuture;

/// Outcome of a direct object write.
///
/// A missing container is an expected, typed outcome rather than an error,
/// so callers decide explicitly whether to provision and retry.
#[derive(Debug)]
pub enum WriteOutcome {
    /// The object was stored.
    Written,
    /// The target container does not exist; `reason` carries the service's
    /// own description of the failure.
    ContainerMissing { reason: String },
}

/// Remote object store contract.
///
/// Implementations must report a missing container through
/// [`WriteOutcome::ContainerMissing`]; any other write failure is returned
/// as [`DeployError::StoreWrite`] and is never retried by the client.
pub trait ObjectStoreService: Send + Sync {
    /// Store `body` under `container`/`key`.
    fn write_object<'a>(
        &'a self,
        container: &'a str,
        key: &'a str,
        body: Bytes,
    ) -> ServiceFuture<'a, WriteOutcome>;

    /// Create a container in the given storage region.
    fn create_container<'a>(&'a self, name: &'a str, region: &'a str) -> ServiceFuture<'a, ()>;

    /// Fetch an object's full payload, or `None` if the key is absent.
    fn read_object<'a>(&'a self, container: &'a str, key: &'a str)
        -> ServiceFuture<'a, Option<Bytes>>;
}

/// Reference to an object placed in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub container: String,
    pub key: String,
}

/// Client for staging artifacts in the remote store.
pub struct StoreClient {
    service: Arc<dyn ObjectStoreService>,
    config: ClientConfig,
}

impl StoreClient {
    pub fn new(service: Arc<dyn ObjectStoreService>, config: ClientConfig) -> Self {
        Self { service, config }
    }

    /// Upload a local file into `container`.
    ///
    /// The file is read fully into memory. `key` defaults to the file's base
    /// name. If the container is missing and `auto_create_container` is set,
    /// it is created in the configured region and the write is retried
    /// exactly once; otherwise the call fails with
    /// [`DeployError::ContainerNotFound`] carrying the underlying cause.
    pub async fn upload(
        &self,
        local_path: &Path,
        container: &str,
        key: Option<&str>,
        auto_create_container: bool,
    ) -> Result<StoredObject> {
        let key = match key {
            Some(k) => k.to_string(),
            None => local_path
                .file_name()
                .ok_or_else(|| {
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("path has no file name: {}", local_path.display()),
                    )
                })?
                .to_string_lossy()
                .into_owned(),
        };

        let body = Bytes::from(tokio::fs::read(local_path).await?);
        tracing::debug!(
            "Uploading {} ({} bytes) to {}/{}",
            local_path.display(),
            body.len(),
            container,
            key
        );

        match self.service.write_object(container, &key, body.clone()).await? {
            WriteOutcome::Written => {}
            WriteOutcome::ContainerMissing { reason } => {
                if !auto_create_container {
                    return Err(DeployError::ContainerNotFound {
                        container: container.to_string(),
                        reason,
                    });
                }
                tracing::info!(
                    "Container {} missing, creating in {}",
                    container,
                    self.config.region
                );
                self.service
                    .create_container(container, &self.config.region)
                    .await?;
                match self.service.write_object(container, &key, body).await? {
                    WriteOutcome::Written => {}
                    WriteOutcome::ContainerMissing { reason } => {
                        return Err(DeployError::ContainerNotFound {
                            container: container.to_string(),
                            reason,
                        });
                    }
                }
            }
        }

        Ok(StoredObject {
            container: container.to_string(),
            key,
        })
    }

    /// Fetch an object's full payload.
    ///
    /// Fails with [`DeployError::ObjectNotFound`] if the key is absent.
    pub async fn download(&self, container: &str, key: &str) -> Result<Bytes> {
        match self.service.read_object(container, key).await? {
            Some(body) => Ok(body),
            None => Err(DeployError::ObjectNotFound {
                container: container.to_string(),
                key: key.to_string(),
            }),
        }
    }
}

impl std::fmt::Debug for StoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreClient")
            .field("region", &self.config.region)
            .finish()
    }
}
