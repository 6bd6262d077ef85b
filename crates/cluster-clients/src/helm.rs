//! Helm package installer binding
//!
//! A chart archive already next to the manifest is used as is. Otherwise a
//! direct archive URL is fetched over HTTP into a local cache, and a
//! repository URL is resolved with `helm pull --repo`. Both land in the cache
//! through a staging file renamed into place, so an interrupted fetch never
//! leaves a partial archive behind. Archives are inspected with
//! `helm show chart` and installed with `helm install`.

use crate::client_traits::PackageInstaller;
use crate::command;
use crate::error::ClientError;
use cluster_config::HelmChart;
use reqwest::Client;
use serde::Deserialize;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// A chart resolved to a local archive and inspected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartPackage {
    pub path: PathBuf,
    /// Name declared in `Chart.yaml`
    pub name: String,
    pub version: String,
}

/// Subset of `Chart.yaml`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMetadata {
    name: String,
    #[serde(default)]
    version: String,
}

/// Installs charts with the `helm` CLI
#[derive(Debug, Clone)]
pub struct HelmInstaller {
    binary: String,
    cache_dir: PathBuf,
    kubeconfig: Vec<PathBuf>,
    driver: Option<String>,
    http: Client,
}

impl HelmInstaller {
    /// Create an installer caching downloaded archives in `cache_dir`
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(Duration::from_secs(120)).build()?;
        Ok(Self {
            binary: "helm".to_string(),
            cache_dir: cache_dir.into(),
            kubeconfig: Vec::new(),
            driver: None,
            http,
        })
    }

    /// kubeconfig files for installs, merged in order like `KUBECONFIG`
    #[must_use]
    pub fn with_kubeconfig(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.kubeconfig = paths.into_iter().collect();
        self
    }

    /// Helm storage driver (`HELM_DRIVER`), e.g. `secret` or `configmap`
    #[must_use]
    pub fn with_driver(mut self, driver: Option<String>) -> Self {
        self.driver = driver.filter(|d| !d.is_empty());
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        if let Some(driver) = &self.driver {
            cmd.env("HELM_DRIVER", driver);
        }
        cmd
    }

    async fn download(&self, url: &str) -> Result<PathBuf, ClientError> {
        let file_name = url
            .rsplit('/')
            .next()
            .filter(|f| !f.is_empty())
            .ok_or_else(|| ClientError::NotFound(format!("no archive name in {}", url)))?;
        let dest = self.cache_dir.join(file_name);
        if tokio::fs::try_exists(&dest).await? {
            debug!("Using cached chart archive {}", dest.display());
            return Ok(dest);
        }

        info!("Downloading chart archive {}", url);
        let bytes = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        tokio::fs::create_dir_all(&self.cache_dir).await?;
        let mut staged = tempfile::Builder::new()
            .prefix(".download-")
            .tempfile_in(&self.cache_dir)?;
        staged.write_all(&bytes)?;
        staged.persist(&dest).map_err(|e| ClientError::Io(e.error))?;
        Ok(dest)
    }

    async fn pull(&self, chart: &HelmChart, repo: &str) -> Result<PathBuf, ClientError> {
        let version = chart.version();
        if let Some(version) = version {
            let cached = self.cache_dir.join(format!("{}-{}.tgz", chart.name, version));
            if tokio::fs::try_exists(&cached).await? {
                debug!("Using cached chart archive {}", cached.display());
                return Ok(cached);
            }
        }

        tokio::fs::create_dir_all(&self.cache_dir).await?;
        let staging = tempfile::Builder::new()
            .prefix(".pull-")
            .tempdir_in(&self.cache_dir)?;

        info!(
            "Pulling chart {} {} from {}",
            chart.name,
            version.unwrap_or("(latest)"),
            repo
        );
        let mut cmd = self.command();
        cmd.args(["pull", chart.name.as_str(), "--repo", repo, "--destination"])
            .arg(staging.path());
        if let Some(version) = version {
            cmd.args(["--version", version]);
        }
        command::run(cmd).await?;

        let archive = pulled_archive(staging.path()).await?;
        let dest = self.cache_dir.join(&archive);
        tokio::fs::rename(staging.path().join(&archive), &dest).await?;
        Ok(dest)
    }
}

/// File name of the archive `helm pull` left in `dir`
async fn pulled_archive(dir: &Path) -> Result<OsString, ClientError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.path().extension().is_some_and(|ext| ext == "tgz") {
            return Ok(entry.file_name());
        }
    }
    Err(ClientError::NotFound(format!(
        "helm pull left no chart archive in {}",
        dir.display()
    )))
}

#[async_trait::async_trait]
impl PackageInstaller for HelmInstaller {
    async fn locate(&self, chart: &HelmChart, base_dir: &Path) -> Result<PathBuf, ClientError> {
        if let Some(tgz) = chart.tgz.as_deref() {
            let local = base_dir.join(tgz);
            if tokio::fs::try_exists(&local).await? {
                debug!("Using local chart archive {}", local.display());
                return Ok(local);
            }
        }
        if let Some(url) = chart.archive_url() {
            return self.download(url).await;
        }
        if let Some(repo) = chart.repository() {
            return self.pull(chart, repo).await;
        }
        match chart.tgz.as_deref() {
            Some(tgz) => Err(ClientError::NotFound(format!(
                "chart archive {}",
                base_dir.join(tgz).display()
            ))),
            None => Err(ClientError::NotFound(format!(
                "chart {} has neither url nor tgz",
                chart.name
            ))),
        }
    }

    async fn load(&self, archive: &Path) -> Result<ChartPackage, ClientError> {
        let mut cmd = self.command();
        cmd.args(["show", "chart"]).arg(archive);
        let output = command::run(cmd).await?;
        let metadata: ChartMetadata = serde_yaml::from_str(&output)?;
        Ok(ChartPackage {
            path: archive.to_path_buf(),
            name: metadata.name,
            version: metadata.version,
        })
    }

    async fn install(
        &self,
        package: &ChartPackage,
        release: &str,
        namespace: &str,
        create_namespace: bool,
        kube_context: &str,
    ) -> Result<(), ClientError> {
        let mut cmd = self.command();
        cmd.args(["install", release])
            .arg(&package.path)
            .args(["--namespace", namespace, "--kube-context", kube_context]);
        if create_namespace {
            cmd.arg("--create-namespace");
        }
        if !self.kubeconfig.is_empty() {
            let joined = std::env::join_paths(&self.kubeconfig)
                .map_err(|e| ClientError::command(&self.binary, e.to_string()))?;
            cmd.env("KUBECONFIG", joined);
        }
        info!(
            "Installing chart {} {} as release {} into {}",
            package.name, package.version, release, namespace
        );
        command::run(cmd).await?;
        Ok(())
    }
}
