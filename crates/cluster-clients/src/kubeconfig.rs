//! kubeconfig-backed context registry

use crate::client_traits::ContextRegistry;
use crate::error::ClientError;
use kube::config::Kubeconfig;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::debug;

/// Lists the contexts of one or more kubeconfig files
///
/// Several files are merged the way `KUBECONFIG=a:b` is: entries from earlier
/// files win, and missing files are skipped.
#[derive(Debug, Clone)]
pub struct KubeconfigContexts {
    paths: Vec<PathBuf>,
}

impl KubeconfigContexts {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            paths: vec![path.into()],
        }
    }

    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

/// Merge every existing file in `paths`, `None` if none exist
pub(crate) async fn read_merged(paths: &[PathBuf]) -> Result<Option<Kubeconfig>, ClientError> {
    let mut merged: Option<Kubeconfig> = None;
    for path in paths {
        if !tokio::fs::try_exists(path).await? {
            debug!("kubeconfig {} does not exist, skipping", path.display());
            continue;
        }
        let next = Kubeconfig::read_from(path)?;
        merged = Some(match merged {
            Some(merged) => merged.merge(next)?,
            None => next,
        });
    }
    Ok(merged)
}

#[async_trait::async_trait]
impl ContextRegistry for KubeconfigContexts {
    async fn list_contexts(&self) -> Result<BTreeSet<String>, ClientError> {
        // No kubeconfig yet means no clusters have been registered
        let Some(kubeconfig) = read_merged(&self.paths).await? else {
            return Ok(BTreeSet::new());
        };
        Ok(kubeconfig.contexts.into_iter().map(|c| c.name).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
clusters:
  - name: kind-demo
    cluster:
      server: https://127.0.0.1:6443
contexts:
  - name: kind-demo
    context:
      cluster: kind-demo
      user: kind-demo
  - name: prod
    context:
      cluster: kind-demo
      user: kind-demo
current-context: kind-demo
users:
  - name: kind-demo
    user:
      token: abc
"#;

    #[tokio::test]
    async fn test_lists_context_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        std::fs::write(&path, KUBECONFIG).unwrap();

        let contexts = KubeconfigContexts::new(&path).list_contexts().await.unwrap();
        assert_eq!(
            contexts.into_iter().collect::<Vec<_>>(),
            vec!["kind-demo".to_string(), "prod".to_string()]
        );
    }

    #[tokio::test]
    async fn test_missing_file_has_no_contexts() {
        let dir = tempfile::tempdir().unwrap();
        let registry = KubeconfigContexts::new(dir.path().join("absent"));
        assert!(registry.list_contexts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        std::fs::write(&path, "contexts: [[[").unwrap();
        assert!(KubeconfigContexts::new(&path).list_contexts().await.is_err());
    }

    #[tokio::test]
    async fn test_contexts_merged_across_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first");
        let second = dir.path().join("second");
        std::fs::write(
            &first,
            "apiVersion: v1\nkind: Config\ncontexts:\n  - name: other\n    context:\n      cluster: other\n",
        )
        .unwrap();
        std::fs::write(&second, KUBECONFIG).unwrap();

        let registry = KubeconfigContexts::from_paths(vec![
            first,
            dir.path().join("absent"),
            second,
        ]);
        let contexts = registry.list_contexts().await.unwrap();
        assert!(contexts.contains("kind-demo"));
        assert!(contexts.contains("other"));
        assert_eq!(contexts.len(), 3);
    }
}
