// ABOUTME: Store configuration: the root directory every table lives under.
// ABOUTME: Built explicitly or from CARDB_* environment variables, then used to open a RowStore.

use std::path::PathBuf;
use std::sync::Arc;

use cardb_core::StoreLayout;
use thiserror::Error;

use crate::error::StoreError;
use crate::fs::LocalFs;
use crate::rows::RowStore;
use crate::tables::TableManager;

/// Errors that can occur while loading configuration or opening the store.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("CARDB_ROOT must be an absolute path: {0}")]
    RelativeRoot(String),

    #[error("store root does not exist and CARDB_CREATE_ROOT is off: {0}")]
    MissingRoot(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Immutable store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    root: PathBuf,
    create_root: bool,
}

impl StoreConfig {
    /// Configuration for an explicit root. The root is created on open.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let root = root.into();
        if !root.is_absolute() {
            return Err(ConfigError::RelativeRoot(root.display().to_string()));
        }
        Ok(Self {
            root,
            create_root: true,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - CARDB_ROOT: store root directory (default: ~/.cardb)
    /// - CARDB_CREATE_ROOT: create the root if missing (default: true)
    pub fn from_env() -> Result<Self, ConfigError> {
        let root = std::env::var("CARDB_ROOT")
            .ok()
            .filter(|r| !r.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::var("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("/tmp"))
                    .join(".cardb")
            });

        let create_root = std::env::var("CARDB_CREATE_ROOT")
            .map(|v| v == "true" || v == "1" || v == "yes")
            .unwrap_or(true);

        Ok(Self::new(root)?.with_create_root(create_root))
    }

    pub fn with_create_root(mut self, create_root: bool) -> Self {
        self.create_root = create_root;
        self
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    pub fn create_root(&self) -> bool {
        self.create_root
    }

    /// Open a RowStore over the local filesystem at the configured root.
    pub async fn open(&self) -> Result<RowStore, ConfigError> {
        let tables = TableManager::new(StoreLayout::new(&self.root), Arc::new(LocalFs::new()));

        if self.create_root {
            tables.init().await?;
        } else if !tokio::fs::try_exists(&self.root)
            .await
            .map_err(|e| StoreError::io(&self.root, e))?
        {
            return Err(ConfigError::MissingRoot(self.root.display().to_string()));
        }

        tracing::info!("opened store at {}", self.root.display());
        Ok(RowStore::new(tables))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn config_loads_from_env() {
        // SAFETY: test-only code; the only test in this crate touching CARDB_* vars
        unsafe {
            std::env::remove_var("CARDB_ROOT");
            std::env::remove_var("CARDB_CREATE_ROOT");
        }

        let config = StoreConfig::from_env().unwrap();
        assert!(config.root().to_string_lossy().contains(".cardb"));
        assert!(config.create_root());

        // SAFETY: see above
        unsafe {
            std::env::set_var("CARDB_ROOT", "relative/store");
        }
        let result = StoreConfig::from_env();

        // SAFETY: see above
        unsafe {
            std::env::set_var("CARDB_ROOT", "/srv/cardb");
            std::env::set_var("CARDB_CREATE_ROOT", "no");
        }
        let explicit = StoreConfig::from_env();

        // Clean up before asserting
        // SAFETY: see above
        unsafe {
            std::env::remove_var("CARDB_ROOT");
            std::env::remove_var("CARDB_CREATE_ROOT");
        }

        let err = result.unwrap_err();
        assert!(
            err.to_string().contains("absolute"),
            "error should mention absolute path: {}",
            err
        );

        let explicit = explicit.unwrap();
        assert_eq!(explicit.root(), std::path::Path::new("/srv/cardb"));
        assert!(!explicit.create_root());
    }

    #[tokio::test]
    async fn open_creates_root_when_allowed() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("store");

        let store = StoreConfig::new(&root).unwrap().open().await.unwrap();

        assert!(root.is_dir());
        assert!(store.tables().list_tables().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn open_refuses_missing_root_without_create() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("absent");

        let result = StoreConfig::new(&root)
            .unwrap()
            .with_create_root(false)
            .open()
            .await;

        assert!(matches!(result, Err(ConfigError::MissingRoot(_))));
        assert!(!root.exists());
    }
}
