//! Host → schema direction
//!
//! Maps a Rust struct description onto a schema object declaration using
//! the scalar table. Names and properties pass through an [`Adjuster`].

use crate::codegen::naming;
use crate::scalar::ScalarType;
use crate::schema::{Property, TypeDeclaration};

/// A host struct field: name plus its Rust type as written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostField {
    pub name: String,
    pub host_type: String,
}

/// A host struct to describe as a schema type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostStruct {
    pub name: String,
    pub fields: Vec<HostField>,
}

impl HostStruct {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, host_type: impl Into<String>) -> Self {
        self.fields.push(HostField {
            name: name.into(),
            host_type: host_type.into(),
        });
        self
    }
}

/// Customizes the schema produced for a host struct
pub trait Adjuster {
    fn adjust_type_name(&self, _host: &HostStruct, name: String) -> String {
        name
    }

    /// A property whose type is a scalar
    fn adjust_scalar_property(&self, _host: &HostStruct, property: Property) -> Property {
        property
    }

    /// A property referencing another named type
    fn adjust_composed_property(&self, _host: &HostStruct, property: Property) -> Property {
        property
    }
}

/// Leaves everything as is
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAdjustment;

impl Adjuster for NoAdjustment {}

/// Renames the type to its first argument
#[derive(Debug, Clone, Default)]
pub struct ChangeTypeName {
    arguments: Vec<String>,
}

impl ChangeTypeName {
    pub fn new(arguments: Vec<String>) -> Self {
        Self { arguments }
    }
}

impl Adjuster for ChangeTypeName {
    fn adjust_type_name(&self, _host: &HostStruct, name: String) -> String {
        self.arguments.first().cloned().unwrap_or(name)
    }
}

enum FieldType {
    Scalar { expr: String, format: Option<&'static str> },
    Composed(String),
}

/// Describe `host` as a schema object type.
///
/// `Option<T>` fields become non-required; `Vec<T>` fields become arrays.
/// Fields of any other generic type are skipped.
pub fn host_to_schema(host: &HostStruct, adjuster: &dyn Adjuster) -> TypeDeclaration {
    let name = adjuster.adjust_type_name(host, host.name.clone());

    let mut properties = Vec::new();
    for field in &host.fields {
        let (host_type, required) = match unwrap_generic(&field.host_type, "Option") {
            Some(inner) => (inner, false),
            None => (field.host_type.trim(), true),
        };
        let Some(field_type) = classify(host_type) else {
            tracing::debug!(field = %field.name, host_type = %field.host_type, "Skipping unmapped field");
            continue;
        };

        let mut property = match &field_type {
            FieldType::Scalar { expr, .. } | FieldType::Composed(expr) => Property::new(&field.name, expr),
        };
        property.required = required;

        let property = match field_type {
            FieldType::Scalar { format, .. } => {
                property.format = format.map(String::from);
                adjuster.adjust_scalar_property(host, property)
            }
            FieldType::Composed(_) => adjuster.adjust_composed_property(host, property),
        };
        properties.push(property);
    }

    TypeDeclaration::object(name, properties)
}

fn classify(host_type: &str) -> Option<FieldType> {
    // Vec<u8> is a file, not an array
    if let Some(host) = ScalarType::from_host_type(host_type) {
        return Some(FieldType::Scalar {
            expr: host.scalar.schema_name().to_string(),
            format: host.format,
        });
    }
    if let Some(inner) = unwrap_generic(host_type, "Vec") {
        return Some(match classify(inner)? {
            FieldType::Scalar { expr, format } => FieldType::Scalar {
                expr: format!("{expr}[]"),
                format,
            },
            FieldType::Composed(expr) => FieldType::Composed(format!("{expr}[]")),
        });
    }
    if naming::is_type_ident(host_type) {
        return Some(FieldType::Composed(host_type.to_string()));
    }
    None
}

/// `Wrapper<Inner>` → `Inner`
fn unwrap_generic<'a>(host_type: &'a str, wrapper: &str) -> Option<&'a str> {
    host_type
        .trim()
        .strip_prefix(wrapper)?
        .trim_start()
        .strip_prefix('<')?
        .strip_suffix('>')
        .map(str::trim)
}
