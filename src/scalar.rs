//! Scalar Type Table
//!
//! Fixed mapping between schema scalar names, the Rust types generated for
//! them, and the host types that map back onto them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A schema scalar type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScalarType {
    Number,
    Integer,
    String,
    Boolean,
    DateOnly,
    TimeOnly,
    DatetimeOnly,
    Datetime,
    File,
    Nil,
    Any,
}

/// A host type's position in the scalar table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostScalar {
    pub scalar: ScalarType,
    /// Width refinement, e.g. `int32` vs `int64`
    pub format: Option<&'static str>,
}

const SCHEMA_NAMES: &[(ScalarType, &str)] = &[
    (ScalarType::Number, "number"),
    (ScalarType::Integer, "integer"),
    (ScalarType::String, "string"),
    (ScalarType::Boolean, "boolean"),
    (ScalarType::DateOnly, "date-only"),
    (ScalarType::TimeOnly, "time-only"),
    (ScalarType::DatetimeOnly, "datetime-only"),
    (ScalarType::Datetime, "datetime"),
    (ScalarType::File, "file"),
    (ScalarType::Nil, "nil"),
    (ScalarType::Any, "any"),
];

const HOST_TYPES: &[(&str, ScalarType, Option<&str>)] = &[
    ("i8", ScalarType::Integer, Some("int8")),
    ("i16", ScalarType::Integer, Some("int16")),
    ("i32", ScalarType::Integer, Some("int32")),
    ("i64", ScalarType::Integer, Some("int64")),
    ("isize", ScalarType::Integer, Some("int64")),
    ("f32", ScalarType::Number, Some("float")),
    ("f64", ScalarType::Number, Some("double")),
    ("bool", ScalarType::Boolean, None),
    ("String", ScalarType::String, None),
    ("str", ScalarType::String, None),
    ("&str", ScalarType::String, None),
    ("char", ScalarType::String, None),
    ("NaiveDate", ScalarType::DateOnly, None),
    ("chrono::NaiveDate", ScalarType::DateOnly, None),
    ("NaiveTime", ScalarType::TimeOnly, None),
    ("chrono::NaiveTime", ScalarType::TimeOnly, None),
    ("NaiveDateTime", ScalarType::DatetimeOnly, None),
    ("chrono::NaiveDateTime", ScalarType::DatetimeOnly, None),
    ("DateTime<Utc>", ScalarType::Datetime, None),
    ("chrono::DateTime<chrono::Utc>", ScalarType::Datetime, None),
    ("Vec<u8>", ScalarType::File, None),
    ("bytes::Bytes", ScalarType::File, None),
    ("()", ScalarType::Nil, None),
    ("serde_json::Value", ScalarType::Any, None),
];

impl ScalarType {
    /// Name of this scalar in the schema language
    pub fn schema_name(self) -> &'static str {
        SCHEMA_NAMES
            .iter()
            .find(|(scalar, _)| *scalar == self)
            .map(|(_, name)| *name)
            .unwrap_or("any")
    }

    /// Look up a scalar by its schema name
    pub fn from_schema_name(name: &str) -> Option<Self> {
        SCHEMA_NAMES
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(scalar, _)| *scalar)
    }

    /// Is `name` one of the built-in scalar names?
    pub fn is_scalar_name(name: &str) -> bool {
        Self::from_schema_name(name).is_some()
    }

    /// Rust type generated for this scalar, refined by `format`
    pub fn rust_type(self, format: Option<&str>) -> &'static str {
        match (self, format) {
            (ScalarType::Integer, Some("int8")) => "i8",
            (ScalarType::Integer, Some("int16")) => "i16",
            (ScalarType::Integer, Some("int32" | "int")) => "i32",
            (ScalarType::Integer, _) => "i64",
            (ScalarType::Number, Some("float")) => "f32",
            (ScalarType::Number, Some("int8")) => "i8",
            (ScalarType::Number, Some("int16")) => "i16",
            (ScalarType::Number, Some("int32" | "int")) => "i32",
            (ScalarType::Number, Some("int64" | "long")) => "i64",
            (ScalarType::Number, _) => "f64",
            (ScalarType::String, _) => "String",
            (ScalarType::Boolean, _) => "bool",
            (ScalarType::DateOnly, _) => "chrono::NaiveDate",
            (ScalarType::TimeOnly, _) => "chrono::NaiveTime",
            (ScalarType::DatetimeOnly, _) => "chrono::NaiveDateTime",
            (ScalarType::Datetime, _) => "chrono::DateTime<chrono::Utc>",
            (ScalarType::File, _) => "Vec<u8>",
            (ScalarType::Nil, _) => "()",
            (ScalarType::Any, _) => "serde_json::Value",
        }
    }

    /// Map a host (Rust) type name onto the scalar table
    pub fn from_host_type(host: &str) -> Option<HostScalar> {
        let host = host.trim();
        HOST_TYPES
            .iter()
            .find(|(name, _, _)| *name == host)
            .map(|(_, scalar, format)| HostScalar {
                scalar: *scalar,
                format: *format,
            })
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.schema_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_names() {
        assert_eq!(ScalarType::from_schema_name("date-only"), Some(ScalarType::DateOnly));
        assert_eq!(ScalarType::Datetime.schema_name(), "datetime");
        assert!(ScalarType::is_scalar_name("nil"));
        assert!(!ScalarType::is_scalar_name("Person"));
    }

    #[test]
    fn test_rust_type_formats() {
        assert_eq!(ScalarType::Integer.rust_type(None), "i64");
        assert_eq!(ScalarType::Integer.rust_type(Some("int32")), "i32");
        assert_eq!(ScalarType::Integer.rust_type(Some("int8")), "i8");
        assert_eq!(ScalarType::Number.rust_type(Some("float")), "f32");
        assert_eq!(ScalarType::Number.rust_type(None), "f64");
        assert_eq!(ScalarType::File.rust_type(None), "Vec<u8>");
    }

    #[test]
    fn test_host_types() {
        let int = ScalarType::from_host_type("i32").unwrap();
        assert_eq!(int.scalar, ScalarType::Integer);
        assert_eq!(int.format, Some("int32"));

        let long = ScalarType::from_host_type("i64").unwrap();
        assert_eq!(long.format, Some("int64"));

        let text = ScalarType::from_host_type(" String ").unwrap();
        assert_eq!(text.scalar, ScalarType::String);
        assert_eq!(text.format, None);

        assert_eq!(
            ScalarType::from_host_type("chrono::NaiveDate").map(|h| h.scalar),
            Some(ScalarType::DateOnly)
        );
        assert!(ScalarType::from_host_type("HashMap<String, i32>").is_none());
    }
}
