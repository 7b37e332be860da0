//! End-to-end pipeline tests over the in-memory services

use std::fs;
use std::io::{Cursor, Read};
use std::sync::Arc;

use lambda_deploy::memory::{MemoryFunctionService, MemoryGateway, MemoryObjectStore};
use lambda_deploy::{
    ClientConfig, DeployError, DeploySpec, Deployer, FunctionRegistrar, FunctionSpec,
    GatewayPublisher, StoreClient, StoredObject, FUNCTION_ARCHIVE_NAME,
};
use zip::ZipArchive;

struct Fixture {
    store: Arc<MemoryObjectStore>,
    functions: Arc<MemoryFunctionService>,
    gateway: Arc<MemoryGateway>,
    deployer: Deployer,
}

fn fixture() -> Fixture {
    let config = ClientConfig::new("eu-west-1").with_profile("prototype");
    let store = Arc::new(MemoryObjectStore::new());
    let functions = Arc::new(MemoryFunctionService::new("eu-west-1"));
    let gateway = Arc::new(MemoryGateway::new());

    let deployer = Deployer::new(
        StoreClient::new(store.clone(), config.clone()),
        FunctionRegistrar::new(functions.clone(), config.clone()),
        GatewayPublisher::new(gateway.clone(), config),
    );
    Fixture {
        store,
        functions,
        gateway,
        deployer,
    }
}

fn source_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("handler.py"),
        b"def lambda_handler(event, context):\n    return {}\n",
    )
    .unwrap();
    dir
}

#[tokio::test]
async fn test_deploy_end_to_end() {
    let fx = fixture();
    let source = source_dir();
    let spec = DeploySpec::new(
        "f1",
        source.path(),
        "bucket1",
        "arn:aws:iam::000000000000:role/lambda-exec",
    );

    let outcome = fx.deployer.deploy(&spec).await.unwrap();

    // The endpoint is assembled from the generated API id, stage and path.
    let api_id = fx.gateway.api_ids()[0].clone();
    let endpoint = outcome.endpoint.unwrap();
    assert_eq!(
        endpoint.as_str(),
        format!("https://{api_id}.execute-api.eu-west-1.amazonaws.com/test/api/")
    );

    // The function's code points at the staged archive in the container.
    assert_eq!(
        outcome.function.code,
        StoredObject {
            container: "bucket1".to_string(),
            key: FUNCTION_ARCHIVE_NAME.to_string(),
        }
    );
    let registered = fx.functions.get("f1").unwrap();
    assert_eq!(registered.code.key, FUNCTION_ARCHIVE_NAME);

    // The gateway principal was granted invoke permission.
    assert_eq!(fx.functions.grants("f1").len(), 1);

    // The route is wired to the function and deployed at the stage.
    assert_eq!(fx.gateway.integrations(&api_id), vec![registered.arn]);
    assert_eq!(fx.gateway.deployments(&api_id), vec!["test".to_string()]);

    // The stored artifact extracts back to the source contents.
    let stored = fx.store.object("bucket1", FUNCTION_ARCHIVE_NAME).unwrap();
    let mut unzipped = ZipArchive::new(Cursor::new(stored.to_vec())).unwrap();
    let mut body = String::new();
    unzipped
        .by_name("handler.py")
        .unwrap()
        .read_to_string(&mut body)
        .unwrap();
    assert_eq!(body, "def lambda_handler(event, context):\n    return {}\n");
}

#[tokio::test]
async fn test_deploy_without_route() {
    let fx = fixture();
    let source = source_dir();
    let spec = DeploySpec::new("f1", source.path(), "bucket1", "role").without_route();

    let outcome = fx.deployer.deploy(&spec).await.unwrap();
    assert!(outcome.endpoint.is_none());
    assert!(fx.gateway.api_ids().is_empty());
}

#[tokio::test]
async fn test_duplicate_function_halts_before_routing() {
    let fx = fixture();
    let source = source_dir();

    // Occupy the name through the registrar directly.
    let registrar = FunctionRegistrar::new(fx.functions.clone(), ClientConfig::new("eu-west-1"));
    registrar
        .create(
            &FunctionSpec::new("f1", "role"),
            &StoredObject {
                container: "bucket1".to_string(),
                key: "old.zip".to_string(),
            },
            false,
        )
        .await
        .unwrap();

    let spec = DeploySpec::new("f1", source.path(), "bucket1", "role");
    let err = fx.deployer.deploy(&spec).await.unwrap_err();
    assert!(matches!(err, DeployError::DuplicateFunction(name) if name == "f1"));

    // Route publishing was never attempted; the upload from the earlier
    // stage is left in place (no rollback).
    assert!(fx.gateway.api_ids().is_empty());
    assert!(fx.store.object("bucket1", FUNCTION_ARCHIVE_NAME).is_some());
}

#[tokio::test]
async fn test_redeploy_updates_code_and_layers() {
    let fx = fixture();
    let source = source_dir();
    let spec = DeploySpec::new("f1", source.path(), "bucket1", "role").without_route();
    fx.deployer.deploy(&spec).await.unwrap();

    fs::write(
        source.path().join("handler.py"),
        b"def lambda_handler(event, context):\n    return {\"v\": 2}\n",
    )
    .unwrap();
    let layers = vec!["arn:aws:lambda:eu-west-1:000000000000:layer:deps:1".to_string()];

    let updated = fx
        .deployer
        .redeploy("f1", source.path(), "bucket1", Some(&layers))
        .await
        .unwrap();
    assert_eq!(updated.layers, layers);

    let stored = fx.store.object("bucket1", FUNCTION_ARCHIVE_NAME).unwrap();
    let mut unzipped = ZipArchive::new(Cursor::new(stored.to_vec())).unwrap();
    let mut body = String::new();
    unzipped
        .by_name("handler.py")
        .unwrap()
        .read_to_string(&mut body)
        .unwrap();
    assert!(body.contains("{\"v\": 2}"));
}

#[tokio::test]
async fn test_redeploy_unknown_function() {
    let fx = fixture();
    let source = source_dir();

    let err = fx
        .deployer
        .redeploy("ghost", source.path(), "bucket1", None)
        .await
        .unwrap_err();
    assert!(matches!(err, DeployError::FunctionNotFound(_)));
}
