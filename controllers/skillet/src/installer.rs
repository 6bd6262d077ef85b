//! Default resource installation
//!
//! Installs the charts of the default resource manifest into a freshly
//! created cluster. Charts are installed in manifest order with no existence
//! check; the first failure aborts the rest.

use crate::cancel::guarded;
use crate::error::LifecycleError;
use cluster_clients::PackageInstaller;
use cluster_config::{DefaultResources, HelmChart};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct DefaultResourceInstaller {
    installer: Arc<dyn PackageInstaller>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for DefaultResourceInstaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultResourceInstaller").finish_non_exhaustive()
    }
}

impl DefaultResourceInstaller {
    pub fn new(installer: Arc<dyn PackageInstaller>, cancel: CancellationToken) -> Self {
        Self { installer, cancel }
    }

    /// Install every chart listed in `manifest` into the cluster behind `kube_context`
    ///
    /// Returns the number of charts installed.
    pub async fn install_all(&self, manifest: &Path, kube_context: &str) -> Result<usize, LifecycleError> {
        info!("Parsing default resources from {}", manifest.display());
        let resources = DefaultResources::from_path(manifest).map_err(|e| LifecycleError::Manifest {
            path: manifest.to_path_buf(),
            source: e,
        })?;
        let base_dir = manifest.parent().unwrap_or_else(|| Path::new("."));

        for chart in &resources.helm_charts {
            self.install_chart(chart, base_dir, kube_context).await?;
        }

        info!("Successfully installed {} chart(s)", resources.helm_charts.len());
        Ok(resources.helm_charts.len())
    }

    async fn install_chart(
        &self,
        chart: &HelmChart,
        base_dir: &Path,
        kube_context: &str,
    ) -> Result<(), LifecycleError> {
        let install_error = |operation: &'static str| {
            let chart = chart.name.clone();
            move |source| LifecycleError::Install {
                chart,
                operation,
                source,
            }
        };

        info!("Locating chart {}", chart.name);
        let archive = guarded(
            &self.cancel,
            &format!("locating chart {}", chart.name),
            self.installer.locate(chart, base_dir),
        )
        .await?
        .map_err(install_error("locating"))?;

        info!("Loading chart {}", chart.name);
        let package = guarded(
            &self.cancel,
            &format!("loading chart {}", chart.name),
            self.installer.load(&archive),
        )
        .await?
        .map_err(install_error("loading"))?;

        info!("Installing chart {} into namespace {}", chart.name, chart.namespace);
        guarded(
            &self.cancel,
            &format!("installing chart {}", chart.name),
            self.installer
                .install(&package, &chart.name, &chart.namespace, true, kube_context),
        )
        .await?
        .map_err(install_error("installing"))?;

        info!("Successfully installed chart {}", chart.name);
        Ok(())
    }
}
