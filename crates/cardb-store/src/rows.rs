// ABOUTME: Row store: insert, read, shallow-merge update, delete, scan, and filter over table rows.
// ABOUTME: Each row is one JSON file; every operation performs at most one durable mutation.

use std::io;

use cardb_core::{IntoRowId, Row, RowId, StoreLayout, TableName, codec};
use serde_json::Value;

use crate::error::{StoreError, StoreResult};
use crate::tables::TableManager;

/// Row-level operations over the tables of a TableManager.
///
/// There is no locking between operations. Two concurrent `update` calls on
/// the same row race (last writer wins and one merge may be lost).
#[derive(Clone)]
pub struct RowStore {
    tables: TableManager,
}

impl RowStore {
    pub fn new(tables: TableManager) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &TableManager {
        &self.tables
    }

    /// Insert a new row. Fails with `DuplicateRow` if the id is taken; the
    /// existing row is left untouched.
    pub async fn insert(&self, table: &str, id: impl IntoRowId, data: Row) -> StoreResult<()> {
        let id = id.into_row_id()?;
        let table = self.tables.require_table(table).await?;
        let path = self.tables.layout().row_file(&table, &id);

        let text = codec::encode(&data).map_err(|source| StoreError::Encode {
            table: table.clone(),
            id: id.clone(),
            source,
        })?;

        match self.tables.fs().write_new(&path, text.as_bytes()).await {
            Ok(()) => {
                tracing::debug!("inserted row {}/{}", table, id);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(StoreError::DuplicateRow { table, id })
            }
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    /// Read a single row.
    pub async fn get_row(&self, table: &str, id: impl IntoRowId) -> StoreResult<Row> {
        let id = id.into_row_id()?;
        let table = self.tables.require_table(table).await?;
        self.load(&table, &id).await
    }

    /// Read every row in the table, ordered by row file name.
    pub async fn get_all(&self, table: &str) -> StoreResult<Vec<Row>> {
        let table = self.tables.require_table(table).await?;
        let ids = self.scan_ids(&table).await?;

        let mut rows = Vec::with_capacity(ids.len());
        for id in &ids {
            match self.load(&table, id).await {
                Ok(row) => rows.push(row),
                // Deleted between listing and reading.
                Err(StoreError::RowNotFound { .. }) => {
                    tracing::debug!("row {}/{} vanished during scan", table, id);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(rows)
    }

    /// Shallow-merge `partial` into an existing row and persist the result.
    /// Returns the merged row.
    pub async fn update(&self, table: &str, id: impl IntoRowId, partial: Row) -> StoreResult<Row> {
        let id = id.into_row_id()?;
        let table = self.tables.require_table(table).await?;

        let mut row = self.load(&table, &id).await?;
        row.merge(partial);

        let text = codec::encode(&row).map_err(|source| StoreError::Encode {
            table: table.clone(),
            id: id.clone(),
            source,
        })?;

        let layout = self.tables.layout();
        let path = layout.row_file(&table, &id);
        let staging = layout.row_staging_file(&table, &id);
        self.tables
            .fs()
            .write_replace(&path, &staging, text.as_bytes())
            .await
            .map_err(|e| StoreError::io(&path, e))?;

        tracing::debug!("updated row {}/{}", table, id);
        Ok(row)
    }

    /// Delete a row. Deleting an absent row fails with `RowNotFound`.
    pub async fn delete_row(&self, table: &str, id: impl IntoRowId) -> StoreResult<()> {
        let id = id.into_row_id()?;
        let table = self.tables.require_table(table).await?;
        let path = self.tables.layout().row_file(&table, &id);

        match self.tables.fs().remove_file(&path).await {
            Ok(()) => {
                tracing::debug!("deleted row {}/{}", table, id);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::RowNotFound { table, id })
            }
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    /// Rows whose `key` field is exactly `value`, in `get_all` order. Rows
    /// without `key` are excluded.
    pub async fn filter(&self, table: &str, key: &str, value: &Value) -> StoreResult<Vec<Row>> {
        let rows = self.get_all(table).await?;
        Ok(rows.into_iter().filter(|row| row.matches(key, value)).collect())
    }

    pub async fn row_exists(&self, table: &str, id: impl IntoRowId) -> StoreResult<bool> {
        let id = id.into_row_id()?;
        let table = self.tables.require_table(table).await?;
        let path = self.tables.layout().row_file(&table, &id);
        self.tables
            .fs()
            .exists(&path)
            .await
            .map_err(|e| StoreError::io(&path, e))
    }

    /// Ids of every row in the table, in scan order.
    pub async fn list_row_ids(&self, table: &str) -> StoreResult<Vec<RowId>> {
        let table = self.tables.require_table(table).await?;
        self.scan_ids(&table).await
    }

    async fn scan_ids(&self, table: &TableName) -> StoreResult<Vec<RowId>> {
        let dir = self.tables.layout().table_dir(table);
        let entries = self
            .tables
            .fs()
            .list_entries(&dir)
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => StoreError::TableNotFound {
                    table: table.clone(),
                },
                _ => StoreError::io(&dir, e),
            })?;

        let mut files: Vec<(String, RowId)> = entries
            .into_iter()
            .filter(|entry| !entry.is_dir)
            .filter_map(|entry| {
                let id = StoreLayout::row_id_from_file_name(&entry.name)?;
                Some((entry.name, id))
            })
            .collect();
        files.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(files.into_iter().map(|(_, id)| id).collect())
    }

    async fn load(&self, table: &TableName, id: &RowId) -> StoreResult<Row> {
        let path = self.tables.layout().row_file(table, id);
        let bytes = match self.tables.fs().read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::RowNotFound {
                    table: table.clone(),
                    id: id.clone(),
                });
            }
            Err(e) => return Err(StoreError::io(&path, e)),
        };

        codec::decode_slice(&bytes).map_err(|source| StoreError::Decode {
            table: table.clone(),
            id: id.clone(),
            source,
        })
    }
}
