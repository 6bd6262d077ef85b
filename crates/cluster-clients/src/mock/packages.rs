//! Package installer and image store for MockCluster
//!
//! Charts always locate to `/mock-charts/<name>.tgz` and load with the file
//! stem as the declared chart name.

use super::{MockCall, MockCluster, MockOperation};
use crate::client_traits::{ImageStore, PackageInstaller};
use crate::error::ClientError;
use crate::helm::ChartPackage;
use cluster_config::HelmChart;
use std::path::{Path, PathBuf};

#[async_trait::async_trait]
impl PackageInstaller for MockCluster {
    async fn locate(&self, chart: &HelmChart, _base_dir: &Path) -> Result<PathBuf, ClientError> {
        self.record(
            MockOperation::LocateChart,
            MockCall::LocateChart {
                name: chart.name.clone(),
            },
        )?;
        Ok(PathBuf::from(format!("/mock-charts/{}.tgz", chart.name)))
    }

    async fn load(&self, archive: &Path) -> Result<ChartPackage, ClientError> {
        self.record(
            MockOperation::LoadChart,
            MockCall::LoadChart {
                path: archive.to_path_buf(),
            },
        )?;
        let name = archive
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(ChartPackage {
            path: archive.to_path_buf(),
            name,
            version: "0.0.0".to_string(),
        })
    }

    async fn install(
        &self,
        _package: &ChartPackage,
        release: &str,
        namespace: &str,
        create_namespace: bool,
        kube_context: &str,
    ) -> Result<(), ClientError> {
        self.record(
            MockOperation::InstallChart,
            MockCall::InstallChart {
                release: release.to_string(),
                namespace: namespace.to_string(),
                create_namespace,
                context: kube_context.to_string(),
            },
        )?;
        let mut state = self.lock();
        if state.releases.contains_key(release) {
            return Err(ClientError::AlreadyExists(format!("release {}", release)));
        }
        if create_namespace {
            state.namespaces.insert(namespace.to_string());
        } else if !state.namespaces.contains(namespace) {
            return Err(ClientError::NotFound(format!("namespace {}", namespace)));
        }
        state
            .releases
            .insert(release.to_string(), namespace.to_string());
        Ok(())
    }
}

#[async_trait::async_trait]
impl ImageStore for MockCluster {
    async fn image_exists(&self, image: &str) -> Result<bool, ClientError> {
        self.record(
            MockOperation::InspectImage,
            MockCall::InspectImage {
                image: image.to_string(),
            },
        )?;
        Ok(self.lock().images.contains(image))
    }
}
