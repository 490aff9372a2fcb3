// ABOUTME: Table manager: tables are directories directly beneath the store root.
// ABOUTME: Creates, lists, checks, and deletes tables; row operations use it to validate preconditions.

use std::collections::BTreeSet;
use std::io;
use std::sync::Arc;

use cardb_core::{StoreLayout, TableName};

use crate::error::{StoreError, StoreResult};
use crate::fs::HostFs;

/// Manages the set of tables under a store root.
#[derive(Clone)]
pub struct TableManager {
    layout: StoreLayout,
    fs: Arc<dyn HostFs>,
}

impl TableManager {
    pub fn new(layout: StoreLayout, fs: Arc<dyn HostFs>) -> Self {
        Self { layout, fs }
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    pub(crate) fn fs(&self) -> &dyn HostFs {
        self.fs.as_ref()
    }

    /// Create the store root (and missing parents) if it does not exist.
    pub async fn init(&self) -> StoreResult<()> {
        let root = self.layout.root();
        self.fs
            .create_dir_all(root)
            .await
            .map_err(|e| StoreError::io(root, e))?;
        tracing::info!("store root ready at {}", root.display());
        Ok(())
    }

    /// Return the names of all tables. Non-directories and directories whose
    /// names are not valid table names are skipped.
    pub async fn list_tables(&self) -> StoreResult<BTreeSet<TableName>> {
        let root = self.layout.root();
        let entries = self
            .fs
            .list_entries(root)
            .await
            .map_err(|e| StoreError::io(root, e))?;

        let mut tables = BTreeSet::new();
        for entry in entries {
            if !entry.is_dir {
                continue;
            }
            match TableName::new(entry.name.as_str()) {
                Ok(table) => {
                    tables.insert(table);
                }
                Err(_) => {
                    tracing::warn!("skipping non-table directory in store root: {}", entry.name);
                }
            }
        }
        Ok(tables)
    }

    /// Create a table. Fails with `TableExists` if it is already present.
    pub async fn create_table(&self, name: &str) -> StoreResult<TableName> {
        let table = TableName::new(name)?;
        let dir = self.layout.table_dir(&table);

        match self.fs.create_dir(&dir).await {
            Ok(()) => {
                tracing::info!("created table {}", table);
                Ok(table)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(StoreError::TableExists { table })
            }
            Err(e) => Err(StoreError::io(&dir, e)),
        }
    }

    pub async fn table_exists(&self, name: &str) -> StoreResult<bool> {
        let table = TableName::new(name)?;
        self.exists(&table).await
    }

    /// Remove a table and every row in it.
    pub async fn delete_table(&self, name: &str) -> StoreResult<()> {
        let table = self.require_table(name).await?;
        let dir = self.layout.table_dir(&table);

        match self.fs.remove_dir_all(&dir).await {
            Ok(()) => {
                tracing::info!("deleted table {}", table);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::TableNotFound { table })
            }
            Err(e) => Err(StoreError::io(&dir, e)),
        }
    }

    /// Validate `name` and confirm the table exists.
    pub(crate) async fn require_table(&self, name: &str) -> StoreResult<TableName> {
        let table = TableName::new(name)?;
        if self.exists(&table).await? {
            Ok(table)
        } else {
            Err(StoreError::TableNotFound { table })
        }
    }

    async fn exists(&self, table: &TableName) -> StoreResult<bool> {
        let dir = self.layout.table_dir(table);
        self.fs
            .is_dir(&dir)
            .await
            .map_err(|e| StoreError::io(&dir, e))
    }
}
