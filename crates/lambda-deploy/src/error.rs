//! Error types for the deployment pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the deployment pipeline.
///
/// Every variant is terminal for the step that produced it: nothing is
/// retried automatically (the single container-create retry in
/// [`crate::store::StoreClient::upload`] is driven by the caller's
/// `auto_create_container` flag, not by error recovery), and no step rolls
/// back the side effects of the steps before it.
#[derive(Error, Debug)]
pub enum DeployError {
    /// The archive destination already exists and overwriting was not requested.
    #[error("destination already exists: {0}")]
    AlreadyExists(PathBuf),

    /// The target container does not exist and auto-creation was not requested.
    #[error("container not found: {container}: {reason}")]
    ContainerNotFound { container: String, reason: String },

    /// Writing an object into the store failed for a reason other than a
    /// missing container.
    #[error("store write failed: {0}")]
    StoreWrite(String),

    /// The requested object key is absent from the container.
    #[error("object not found: {container}/{key}")]
    ObjectNotFound { container: String, key: String },

    /// A function with this name is already registered.
    #[error("function already exists: {0}")]
    DuplicateFunction(String),

    /// No function with this name is registered.
    #[error("function not found: {0}")]
    FunctionNotFound(String),

    /// Some step of route provisioning failed. Sub-resources created by the
    /// steps that succeeded are left in place.
    #[error("gateway provisioning failed: {0}")]
    GatewayProvision(String),

    /// Any other remote-call failure, surfaced as reported by the service.
    #[error("remote call failed: {0}")]
    Remote(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DeployError>;
