//! A [`Fetcher`] that treats `source` as a local directory path.
//!
//! Grounded on the `RepositoryType::Path` branch the teacher's
//! `RepositoryManager::get_package` stubbed out ("path repositories need
//! local filesystem access") — here it is a real, working resolver instead
//! of a `debug!` no-op, since local paths are the simplest case the
//! resolution core needs to drive end to end.

use crate::error::{RepositoryError, Result};
use crate::fetcher::{FetchOutcome, Fetcher};
use gitsu_core::Manifest;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

/// Resolves `source` strings that name a directory on disk.
///
/// `target` is accepted but not interpreted: a local path has exactly one
/// revision, so any requested target is considered satisfied by whatever
/// is on disk right now.
#[derive(Debug, Clone)]
pub struct FilesystemFetcher {
    /// Directory all relative `source` values are resolved against.
    root: PathBuf,
}

impl FilesystemFetcher {
    /// Resolve relative sources against `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve_source(&self, source: &str) -> PathBuf {
        let path = Path::new(source);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    async fn read_manifest(dir: &Path) -> Result<Manifest> {
        let manifest_path = dir.join("gitsu.json");
        let content =
            tokio::fs::read_to_string(&manifest_path)
                .await
                .map_err(|inner| RepositoryError::Io {
                    source: manifest_path.display().to_string(),
                    inner,
                })?;
        gitsu_core::from_json(&content).map_err(|e| RepositoryError::InvalidManifest {
            path: manifest_path,
            message: e.to_string(),
        })
    }
}

impl Fetcher for FilesystemFetcher {
    fn name(&self) -> &'static str {
        "filesystem"
    }

    fn can_handle(&self, source: &str) -> bool {
        !source.contains("://") && !source.starts_with("git@")
    }

    fn fetch<'a>(
        &'a self,
        source: &'a str,
        _target: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<FetchOutcome>> + Send + 'a>> {
        Box::pin(async move {
            let dir = self.resolve_source(source);
            if !dir.is_dir() {
                return Err(RepositoryError::NotFound {
                    endpoint: source.to_string(),
                });
            }
            let pkg_meta = Self::read_manifest(&dir).await.unwrap_or_default();
            Ok(FetchOutcome {
                canonical_dir: dir,
                pkg_meta,
                is_targetable: false,
                release: None,
            })
        })
    }

    fn versions<'a>(
        &'a self,
        _source: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + 'a>> {
        Box::pin(async move { Ok(Vec::new()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetches_a_directory_with_a_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("gitsu.json"),
            r#"{"name":"widget","version":"1.0.0"}"#,
        )
        .unwrap();

        let fetcher = FilesystemFetcher::new(dir.path());
        let outcome = fetcher.fetch(".", "*").await.unwrap();
        assert_eq!(outcome.pkg_meta.name.as_deref(), Some("widget"));
    }

    #[tokio::test]
    async fn missing_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FilesystemFetcher::new(dir.path());
        let err = fetcher.fetch("does-not-exist", "*").await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn directory_without_manifest_still_fetches() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("bare")).unwrap();
        let fetcher = FilesystemFetcher::new(dir.path());
        let outcome = fetcher.fetch("bare", "*").await.unwrap();
        assert_eq!(outcome.pkg_meta.name, None);
    }

    #[test]
    fn can_handle_rejects_urls() {
        let fetcher = FilesystemFetcher::new(".");
        assert!(!fetcher.can_handle("https://example.com/repo.git"));
        assert!(!fetcher.can_handle("git@example.com:repo.git"));
        assert!(fetcher.can_handle("../sibling-package"));
    }
}
