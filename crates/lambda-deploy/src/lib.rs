//! lambda-deploy - Archive, upload and register serverless functions
//!
//! This crate packages a local directory into a zip artifact, stages it in a
//! remote object store, registers (or updates) a function pointing at the
//! staged code, and optionally publishes a gateway route that makes the
//! function reachable over HTTP.
//!
//! The three remote services involved - object store, function service,
//! gateway - are external collaborators reached through the
//! [`ObjectStoreService`], [`FunctionService`] and [`GatewayService`]
//! contracts. In-memory implementations of all three live in [`memory`] for
//! tests and local development.
//!
//! Every invocation is a stateless, one-shot orchestration run against the
//! remote system of record; nothing is persisted locally.

use std::future::Future;
use std::pin::Pin;

pub mod archive;
pub mod config;
pub mod deploy;
pub mod error;
pub mod function;
pub mod gateway;
pub mod layer;
pub mod memory;
pub mod store;

/// Boxed future returned by the remote-service contract methods.
pub type ServiceFuture<'a, T> =
    Pin<Box<dyn Future<Output = error::Result<T>> + Send + 'a>>;

// Re-export key types at crate root
pub use archive::archive;
pub use config::ClientConfig;
pub use deploy::{DeployOutcome, DeploySpec, Deployer, FUNCTION_ARCHIVE_NAME};
pub use error::{DeployError, Result};
pub use function::{FunctionDescriptor, FunctionRegistrar, FunctionService, FunctionSpec};
pub use gateway::{ApiProvisioning, GatewayPublisher, GatewayService, RouteSpec};
pub use layer::LayerSpec;
pub use store::{ObjectStoreService, StoreClient, StoredObject, WriteOutcome};
