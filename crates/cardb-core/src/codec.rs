// ABOUTME: Row codec translating between Row values and their persisted JSON text.
// ABOUTME: Decoding rejects malformed JSON and well-formed JSON that is not an object.

use serde_json::Value;
use thiserror::Error;

use crate::row::Row;

/// Errors that can occur while encoding or decoding a row.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed row json: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("row json must be an object, found {found}")]
    NotAnObject { found: &'static str },

    #[error("failed to encode row: {0}")]
    Encode(#[source] serde_json::Error),
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Encode a row as pretty-printed JSON with a trailing newline.
pub fn encode(row: &Row) -> Result<String, CodecError> {
    let mut text = serde_json::to_string_pretty(row).map_err(CodecError::Encode)?;
    text.push('\n');
    Ok(text)
}

/// Decode persisted JSON text into a row.
pub fn decode(text: &str) -> Result<Row, CodecError> {
    decode_slice(text.as_bytes())
}

/// Decode raw file bytes into a row. Bytes that are not UTF-8 JSON are
/// reported as malformed.
pub fn decode_slice(bytes: &[u8]) -> Result<Row, CodecError> {
    let value: Value = serde_json::from_slice(bytes).map_err(CodecError::Malformed)?;
    Row::try_from(value).map_err(|rejected| CodecError::NotAnObject {
        found: json_type_name(&rejected.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_preserves_every_value_kind() {
        let original = Row::try_from(json!({
            "title": "mauris sit amet",
            "views": 12,
            "ratio": 0.5,
            "published": true,
            "editor": null,
            "tags": ["a", "b"],
            "meta": {"nested": {"deep": 1}}
        }))
        .unwrap();

        let text = encode(&original).unwrap();
        assert!(text.ends_with('\n'));
        assert_eq!(decode(&text).unwrap(), original);
    }

    #[test]
    fn decode_keeps_field_order_from_text() {
        let row = decode(r#"{"z": 1, "a": 2, "m": 3}"#).unwrap();
        let keys: Vec<&str> = row.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn decode_rejects_malformed_text() {
        let err = decode(r#"{"title": "unterminated"#).unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }

    #[test]
    fn decode_rejects_non_object_json() {
        for (text, found) in [("[1, 2]", "array"), ("\"row\"", "string"), ("42", "number"), ("null", "null")] {
            match decode(text) {
                Err(CodecError::NotAnObject { found: actual }) => assert_eq!(actual, found),
                other => panic!("expected NotAnObject for {}, got {:?}", text, other),
            }
        }
    }

    #[test]
    fn decode_slice_rejects_invalid_utf8() {
        let err = decode_slice(&[0xff, 0xfe, b'{']).unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));

        let err = decode_slice(b"{\"title\": \"\xff\"}").unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }

    #[test]
    fn decode_rejects_empty_file() {
        assert!(matches!(decode(""), Err(CodecError::Malformed(_))));
    }

    #[test]
    fn empty_row_round_trips() {
        let text = encode(&Row::new()).unwrap();
        assert!(decode(&text).unwrap().is_empty());
    }
}
