// ABOUTME: Core types for cardb: identifiers, on-disk layout, the Row document, and its codec.
// ABOUTME: Everything here is pure; filesystem access lives in cardb-store.

pub mod codec;
pub mod paths;
pub mod row;

pub use codec::{CodecError, decode, decode_slice, encode};
pub use paths::{
    IdentifierKind, IntoRowId, MAX_ROW_ID_LEN, MAX_TABLE_NAME_LEN, PathError, RowId, StoreLayout,
    TableName,
};
pub use row::{NotAnObject, Row};
