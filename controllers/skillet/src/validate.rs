//! Cluster config validation
//!
//! Rules run in a fixed order and the first violation is returned. Structural
//! checks on each application come before its image lookup, so a malformed
//! application never triggers a query against the image store.

use crate::cancel::guarded;
use crate::error::LifecycleError;
use crate::naming::validate_name;
use cluster_clients::ImageStore;
use cluster_config::{Application, ClusterConfig};
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Read and parse a cluster config file
pub fn load_config(path: &Path) -> Result<ClusterConfig, LifecycleError> {
    ClusterConfig::from_path(path).map_err(LifecycleError::ConfigParse)
}

fn check_name(subject: &'static str, value: &str) -> Result<(), LifecycleError> {
    validate_name(value).map_err(|reason| LifecycleError::InvalidName {
        subject,
        value: value.to_string(),
        reason,
    })
}

/// Checks that need no I/O, for the cluster-level fields
fn validate_cluster_fields(config: &ClusterConfig) -> Result<(), LifecycleError> {
    if config.name.is_empty() {
        return Err(LifecycleError::failed_precondition("a cluster name must be specified"));
    }
    check_name("cluster name", &config.name)?;

    if config.nodes.control_plane < 1 {
        return Err(LifecycleError::failed_precondition(
            "the number of control plane nodes must be greater than 0",
        ));
    }
    if config.nodes.worker < 0 {
        return Err(LifecycleError::failed_precondition(
            "the number of worker nodes cannot be negative",
        ));
    }
    Ok(())
}

/// Checks that need no I/O, for one application
fn validate_application_fields(app: &Application) -> Result<(), LifecycleError> {
    if app.name.is_empty() {
        return Err(LifecycleError::failed_precondition("application name must not be empty"));
    }
    check_name("application name", &app.name)?;

    if app.namespace.is_empty() {
        return Err(LifecycleError::failed_precondition(format!(
            "namespace of application {} must not be empty",
            app.name
        )));
    }
    check_name("application namespace", &app.namespace)?;

    if app.replicas < 1 {
        return Err(LifecycleError::failed_precondition(format!(
            "replicas of application {} must be at least 1",
            app.name
        )));
    }
    if app.image.is_empty() {
        return Err(LifecycleError::failed_precondition(format!(
            "image of application {} must not be empty",
            app.name
        )));
    }
    Ok(())
}

/// Fail with `ImageNotFound` unless `app.image` is in the local image store
pub async fn check_image(
    images: &dyn ImageStore,
    app: &Application,
    cancel: &CancellationToken,
) -> Result<(), LifecycleError> {
    let operation = format!("inspecting image {}", app.image);
    match guarded(cancel, &operation, images.image_exists(&app.image)).await? {
        Ok(true) => Ok(()),
        Ok(false) => Err(LifecycleError::ImageNotFound {
            application: app.name.clone(),
            image: app.image.clone(),
            source: None,
        }),
        Err(e) => Err(LifecycleError::ImageNotFound {
            application: app.name.clone(),
            image: app.image.clone(),
            source: Some(e),
        }),
    }
}

/// Validate a parsed config, returning the first violation
pub async fn validate_config(
    config: &ClusterConfig,
    images: &dyn ImageStore,
    cancel: &CancellationToken,
) -> Result<(), LifecycleError> {
    validate_cluster_fields(config)?;
    for app in &config.applications {
        validate_application_fields(app)?;
        check_image(images, app, cancel).await?;
    }
    info!("Cluster configuration for {} is valid", config.name);
    Ok(())
}
