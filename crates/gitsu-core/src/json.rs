//! JSON (de)serialization helpers built on `sonic-rs`.

use crate::{Error, Result};
use serde::{Serialize, de::DeserializeOwned};

/// Deserialize a JSON string.
///
/// # Errors
/// Returns an error if the JSON is malformed or does not match `T`.
pub fn from_json<T: DeserializeOwned>(s: &str) -> Result<T> {
    sonic_rs::from_str(s).map_err(|e: sonic_rs::Error| Error::from(e))
}

/// Deserialize JSON bytes.
///
/// # Errors
/// Returns an error if the JSON is malformed or does not match `T`.
pub fn from_json_slice<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    sonic_rs::from_slice(bytes).map_err(|e: sonic_rs::Error| Error::from(e))
}

/// Serialize to compact JSON.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    sonic_rs::to_string(value).map_err(|e: sonic_rs::Error| Error::from(e))
}

/// Serialize to pretty-printed JSON, as written to `gitsu.json` annotations.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    sonic_rs::to_string_pretty(value).map_err(|e: sonic_rs::Error| Error::from(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
    struct Sample {
        name: String,
        value: i32,
    }

    #[test]
    fn round_trips_through_compact_json() {
        let orig = Sample {
            name: "test".into(),
            value: 42,
        };
        let json = to_json(&orig).expect("serialization should succeed");
        let parsed: Sample = from_json(&json).expect("deserialization should succeed");
        assert_eq!(orig, parsed);
    }

    #[test]
    fn pretty_json_is_multiline() {
        let val = Sample {
            name: "x".into(),
            value: 1,
        };
        let pretty = to_json_pretty(&val).expect("pretty printing should succeed");
        assert!(pretty.contains('\n'));
    }

    #[test]
    fn from_json_slice_matches_from_json() {
        let json = r#"{"name":"test","value":42}"#;
        let parsed: Sample = from_json_slice(json.as_bytes()).expect("should parse from bytes");
        assert_eq!(parsed.name, "test");
        assert_eq!(parsed.value, 42);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let result: Result<Sample> = from_json("{invalid json}");
        assert!(result.is_err());
    }

    #[test]
    fn missing_required_field_is_an_error() {
        let result: Result<Sample> = from_json(r#"{"name": "test"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn unicode_roundtrips() {
        let data = Sample {
            name: "测试 🎉 émojis".to_string(),
            value: 42,
        };
        let json = to_json(&data).expect("should serialize unicode");
        let parsed: Sample = from_json(&json).expect("should deserialize unicode");
        assert_eq!(data, parsed);
    }

    #[test]
    fn empty_object_parses_to_empty_map() {
        let parsed: HashMap<String, String> = from_json("{}").expect("should parse empty object");
        assert!(parsed.is_empty());
    }
}
