// ABOUTME: Error taxonomy for table and row operations.
// ABOUTME: Every StoreError maps to an ErrorKind so callers can branch without parsing messages.

use std::path::Path;

use cardb_core::{CodecError, PathError, RowId, TableName};
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Coarse classification of a StoreError.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    Decode,
    InvalidIdentifier,
    Io,
}

/// Errors that can occur during table or row operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("table not found: {table}")]
    TableNotFound { table: TableName },

    #[error("row not found: {table}/{id}")]
    RowNotFound { table: TableName, id: RowId },

    #[error("table already exists: {table}")]
    TableExists { table: TableName },

    #[error("duplicate row id: {table}/{id}")]
    DuplicateRow { table: TableName, id: RowId },

    #[error("failed to decode row {table}/{id}: {source}")]
    Decode {
        table: TableName,
        id: RowId,
        source: CodecError,
    },

    #[error("failed to encode row {table}/{id}: {source}")]
    Encode {
        table: TableName,
        id: RowId,
        source: CodecError,
    },

    #[error(transparent)]
    InvalidIdentifier(#[from] PathError),

    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::TableNotFound { .. } | StoreError::RowNotFound { .. } => {
                ErrorKind::NotFound
            }
            StoreError::TableExists { .. } | StoreError::DuplicateRow { .. } => {
                ErrorKind::AlreadyExists
            }
            StoreError::Decode { .. } | StoreError::Encode { .. } => ErrorKind::Decode,
            StoreError::InvalidIdentifier(_) => ErrorKind::InvalidIdentifier,
            StoreError::Io { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_group_table_and_row_variants() {
        let table = TableName::new("posts").unwrap();
        let id = RowId::from(1u64);

        let not_found = StoreError::RowNotFound {
            table: table.clone(),
            id: id.clone(),
        };
        assert_eq!(not_found.kind(), ErrorKind::NotFound);
        assert_eq!(not_found.to_string(), "row not found: posts/1");

        let dup = StoreError::DuplicateRow { table, id };
        assert_eq!(dup.kind(), ErrorKind::AlreadyExists);

        let invalid: StoreError = TableName::new("../x").unwrap_err().into();
        assert_eq!(invalid.kind(), ErrorKind::InvalidIdentifier);

        let io = StoreError::io(
            Path::new("/srv/cardb"),
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert_eq!(io.kind(), ErrorKind::Io);
        assert!(io.to_string().contains("/srv/cardb"));
    }
}
