// ABOUTME: Validated table/row identifiers and the deterministic on-disk layout of a store.
// ABOUTME: Pure path arithmetic only; nothing in this module touches the filesystem.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// File extension of a persisted row.
pub const ROW_EXTENSION: &str = "json";

/// Extension of the staging file used while atomically replacing a row.
pub const ROW_STAGING_EXTENSION: &str = "json.tmp";

const MAX_FILE_NAME_LEN: usize = 255;

/// Longest table name: the whole directory component.
pub const MAX_TABLE_NAME_LEN: usize = MAX_FILE_NAME_LEN;

/// Longest row id: `<id>.json.tmp` must still fit in one file name.
pub const MAX_ROW_ID_LEN: usize = MAX_FILE_NAME_LEN - ROW_STAGING_EXTENSION.len() - 1;

/// Which kind of identifier failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Table,
    Row,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierKind::Table => write!(f, "table name"),
            IdentifierKind::Row => write!(f, "row id"),
        }
    }
}

/// Errors produced while validating identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("invalid {kind} {name:?}: {reason}")]
    InvalidIdentifier {
        kind: IdentifierKind,
        name: String,
        reason: &'static str,
    },
}

fn validate(kind: IdentifierKind, name: &str) -> Result<(), PathError> {
    let (max_len, too_long) = match kind {
        IdentifierKind::Table => (MAX_TABLE_NAME_LEN, "must be at most 255 bytes"),
        IdentifierKind::Row => (MAX_ROW_ID_LEN, "must be at most 246 bytes"),
    };

    let reason = if name.is_empty() {
        Some("must not be empty")
    } else if name == "." || name == ".." {
        Some("must not be a relative directory reference")
    } else if name.contains(['/', '\\']) {
        Some("must not contain path separators")
    } else if name.contains('\0') {
        Some("must not contain NUL bytes")
    } else if name.len() > max_len {
        Some(too_long)
    } else if kind == IdentifierKind::Table && name.starts_with('.') {
        Some("must not start with '.'")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(PathError::InvalidIdentifier {
            kind,
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// A table name that is safe to use as a single directory component.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableName(String);

impl TableName {
    pub fn new(name: impl Into<String>) -> Result<Self, PathError> {
        let name = name.into();
        validate(IdentifierKind::Table, &name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TableName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for TableName {
    type Error = PathError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A row identifier, unique within its table. Integers are rendered in decimal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(String);

impl RowId {
    pub fn new(id: impl Into<String>) -> Result<Self, PathError> {
        let id = id.into();
        validate(IdentifierKind::Row, &id)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RowId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

macro_rules! row_id_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for RowId {
                fn from(value: $t) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

row_id_from_int!(i32, i64, u32, u64, usize);

/// Anything a row operation accepts as an id: strings are validated,
/// integers always succeed.
pub trait IntoRowId {
    fn into_row_id(self) -> Result<RowId, PathError>;
}

impl IntoRowId for RowId {
    fn into_row_id(self) -> Result<RowId, PathError> {
        Ok(self)
    }
}

impl IntoRowId for &RowId {
    fn into_row_id(self) -> Result<RowId, PathError> {
        Ok(self.clone())
    }
}

impl IntoRowId for &str {
    fn into_row_id(self) -> Result<RowId, PathError> {
        RowId::new(self)
    }
}

impl IntoRowId for String {
    fn into_row_id(self) -> Result<RowId, PathError> {
        RowId::new(self)
    }
}

impl IntoRowId for &String {
    fn into_row_id(self) -> Result<RowId, PathError> {
        RowId::new(self.as_str())
    }
}

macro_rules! into_row_id_int {
    ($($t:ty),*) => {
        $(
            impl IntoRowId for $t {
                fn into_row_id(self) -> Result<RowId, PathError> {
                    Ok(RowId::from(self))
                }
            }
        )*
    };
}

into_row_id_int!(i32, i64, u32, u64, usize);

/// Maps table names and row ids onto paths beneath a single store root.
///
/// Layout:
/// - `<root>/<table>/` is a table
/// - `<root>/<table>/<id>.json` is a row
/// - `<root>/<table>/<id>.json.tmp` is the staging file of an in-flight update
#[derive(Debug, Clone)]
pub struct StoreLayout {
    root: PathBuf,
}

impl StoreLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn table_dir(&self, table: &TableName) -> PathBuf {
        self.root.join(table.as_str())
    }

    pub fn row_file(&self, table: &TableName, id: &RowId) -> PathBuf {
        self.table_dir(table)
            .join(format!("{}.{}", id.as_str(), ROW_EXTENSION))
    }

    pub fn row_staging_file(&self, table: &TableName, id: &RowId) -> PathBuf {
        self.table_dir(table)
            .join(format!("{}.{}", id.as_str(), ROW_STAGING_EXTENSION))
    }

    /// Recover the row id from a file name inside a table directory.
    /// Returns None for files that are not rows (staging files, strays).
    pub fn row_id_from_file_name(name: &str) -> Option<RowId> {
        let stem = name.strip_suffix(ROW_EXTENSION)?.strip_suffix('.')?;
        RowId::new(stem).ok()
    }
}
