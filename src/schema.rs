//! Schema type declarations
//!
//! The in-memory form of a named type from a schema document, as handed over
//! by the schema parser. Consumed read-only by the generation context.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::scalar::ScalarType;

/// Capability category of a declaration
///
/// Selects both the construction routine and the plugin interface that
/// applies to a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeCategory {
    Object,
    Array,
    Union,
    Enumeration,
    Reference,
}

impl TypeCategory {
    pub const ALL: [TypeCategory; 5] = [
        TypeCategory::Object,
        TypeCategory::Array,
        TypeCategory::Union,
        TypeCategory::Enumeration,
        TypeCategory::Reference,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeCategory::Object => "object",
            TypeCategory::Array => "array",
            TypeCategory::Union => "union",
            TypeCategory::Enumeration => "enumeration",
            TypeCategory::Reference => "reference",
        }
    }
}

impl fmt::Display for TypeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A plugin directive: identifier plus ordered string arguments
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PluginDef {
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<String>,
}

impl PluginDef {
    pub fn new(name: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// A directive without arguments
    pub fn bare(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }
}

/// Per-type annotations understood by the generator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotations {
    /// Overrides the generated type name
    #[serde(default)]
    pub class_name: Option<String>,

    /// Overrides the generated implementation struct name
    #[serde(default)]
    pub implementation_class_name: Option<String>,

    /// Keep required scalars unwrapped instead of boxing them into `Option`
    #[serde(default)]
    pub use_primitive: bool,

    /// Generate the trait only, without an implementation struct
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,

    /// User-declared plugins, in declaration order
    #[serde(default)]
    pub plugins: Vec<PluginDef>,
}

fn default_true() -> bool {
    true
}

/// A property of an object type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,

    /// Type expression: scalar name, named type, or `T[]`
    #[serde(rename = "type")]
    pub type_expr: String,

    #[serde(default = "default_true")]
    pub required: bool,

    /// Scalar width refinement (`int32`, `double`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Plugins applying to this property's type reference only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<PluginDef>,
}

impl Property {
    pub fn new(name: impl Into<String>, type_expr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_expr: type_expr.into(),
            required: true,
            format: None,
            description: None,
            plugins: Vec::new(),
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Parsed type expression
    pub fn expr(&self) -> TypeExpr {
        TypeExpr::parse(&self.type_expr, self.format.as_deref())
    }
}

/// Shape of a declaration, one variant per category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeShape {
    Object {
        #[serde(default)]
        properties: Vec<Property>,
        /// Property naming the concrete subtype in polymorphic payloads
        #[serde(default)]
        discriminator: Option<String>,
        #[serde(default, rename = "discriminatorValue")]
        discriminator_value: Option<String>,
        #[serde(default, rename = "additionalProperties")]
        additional_properties: bool,
    },
    Array {
        items: String,
    },
    Union {
        members: Vec<String>,
    },
    Enumeration {
        values: Vec<String>,
    },
    Reference {
        target: String,
        #[serde(default)]
        format: Option<String>,
    },
}

/// A named schema type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDeclaration {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Declared parent type names (multiple inheritance permitted)
    #[serde(default)]
    pub parents: Vec<String>,

    #[serde(flatten)]
    pub shape: TypeShape,

    #[serde(default)]
    pub annotations: Annotations,
}

impl TypeDeclaration {
    pub fn new(name: impl Into<String>, shape: TypeShape) -> Self {
        Self {
            name: name.into(),
            description: None,
            parents: Vec::new(),
            shape,
            annotations: Annotations::default(),
        }
    }

    /// An object type with the given properties
    pub fn object(name: impl Into<String>, properties: Vec<Property>) -> Self {
        Self::new(
            name,
            TypeShape::Object {
                properties,
                discriminator: None,
                discriminator_value: None,
                additional_properties: false,
            },
        )
    }

    pub fn with_parents(mut self, parents: &[&str]) -> Self {
        self.parents = parents.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }

    /// Category, determined by inspecting the shape
    pub fn category(&self) -> TypeCategory {
        match self.shape {
            TypeShape::Object { .. } => TypeCategory::Object,
            TypeShape::Array { .. } => TypeCategory::Array,
            TypeShape::Union { .. } => TypeCategory::Union,
            TypeShape::Enumeration { .. } => TypeCategory::Enumeration,
            TypeShape::Reference { .. } => TypeCategory::Reference,
        }
    }

    /// Own properties (empty for non-object shapes)
    pub fn properties(&self) -> &[Property] {
        match &self.shape {
            TypeShape::Object { properties, .. } => properties,
            _ => &[],
        }
    }
}

/// Parsed type expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Scalar {
        scalar: ScalarType,
        format: Option<String>,
    },
    Named(String),
    Array(Box<TypeExpr>),
}

impl TypeExpr {
    /// Parse `string`, `Person`, `Person[]`, `integer[][]`, ...
    ///
    /// `format` refines the innermost scalar.
    pub fn parse(expr: &str, format: Option<&str>) -> Self {
        let expr = expr.trim();
        if let Some(inner) = expr.strip_suffix("[]") {
            return TypeExpr::Array(Box::new(Self::parse(inner, format)));
        }
        match ScalarType::from_schema_name(expr) {
            Some(scalar) => TypeExpr::Scalar {
                scalar,
                format: format.map(String::from),
            },
            None => TypeExpr::Named(expr.to_string()),
        }
    }

    /// Named types referenced anywhere in this expression
    pub fn named_types(&self) -> Vec<&str> {
        match self {
            TypeExpr::Scalar { .. } => Vec::new(),
            TypeExpr::Named(name) => vec![name.as_str()],
            TypeExpr::Array(inner) => inner.named_types(),
        }
    }
}
