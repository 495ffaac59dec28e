//! Code Generation
//!
//! The generated artifact model and the results cached by the generation
//! context.
//!
//! Architecture:
//! - TypeSpec: language-level description of one generated type
//! - CreationResult: the cached outcome of generating one schema type name
//! - Renderer (`rust`): turns a TypeSpec into Rust source
//!
//! Builders decide *what* to generate; the renderer decides *how* it reads.

pub mod naming;
pub mod rust;

use std::fmt;
use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock, Weak};

use crate::schema::TypeCategory;

// =============================================================================
// Type References
// =============================================================================

/// A Rust type expression as it appears in generated code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeName {
    /// Built-in or library type from the scalar table (`String`, `i32`, ...)
    Scalar(String),
    /// A generated type
    Named(String),
    /// Trait object for an abstract object type
    Dyn(String),
    Vec(Box<TypeName>),
    Option(Box<TypeName>),
    Boxed(Box<TypeName>),
}

impl TypeName {
    pub fn scalar(name: impl Into<String>) -> Self {
        TypeName::Scalar(name.into())
    }

    pub fn named(name: impl Into<String>) -> Self {
        TypeName::Named(name.into())
    }

    /// Is the innermost type a scalar (looking through `Option`/`Box`)?
    pub fn is_scalar(&self) -> bool {
        match self {
            TypeName::Scalar(_) => true,
            TypeName::Option(inner) | TypeName::Boxed(inner) => inner.is_scalar(),
            _ => false,
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, TypeName::Option(_))
    }

    /// Wrap in `Option`, unless already nullable
    pub fn nullable(self) -> Self {
        if self.is_nullable() {
            self
        } else {
            TypeName::Option(Box::new(self))
        }
    }

    /// Wrap in `Box`, unless already boxed or a trait object
    pub fn boxed(self) -> Self {
        match self {
            TypeName::Boxed(_) | TypeName::Dyn(_) => self,
            other => TypeName::Boxed(Box::new(other)),
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeName::Scalar(name) | TypeName::Named(name) => f.write_str(name),
            TypeName::Dyn(name) => write!(f, "Box<dyn {}>", name),
            TypeName::Vec(inner) => write!(f, "Vec<{}>", inner),
            TypeName::Option(inner) => write!(f, "Option<{}>", inner),
            TypeName::Boxed(inner) => write!(f, "Box<{}>", inner),
        }
    }
}

// =============================================================================
// Type Specs
// =============================================================================

/// A generated struct field
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Rust identifier (already escaped)
    pub name: String,
    /// Name on the wire
    pub wire_name: String,
    pub ty: TypeName,
    /// The generated type this field refers to, if any
    pub target: Option<Weak<CreationResult>>,
    pub flatten: bool,
    pub doc: Option<String>,
}

impl FieldSpec {
    /// The referenced result, while its context is alive
    pub fn referenced(&self) -> Option<Arc<CreationResult>> {
        self.target.as_ref().and_then(Weak::upgrade)
    }
}

/// Accessors an implementation struct provides for one ancestor trait
#[derive(Debug, Clone)]
pub struct InheritedFields {
    pub trait_name: String,
    pub fields: Vec<FieldSpec>,
}

/// Tagged enum over the implementation structs of a type and its subtypes
#[derive(Debug, Clone)]
pub struct VariantsSpec {
    pub name: String,
    pub tag: String,
    pub members: Vec<VariantMember>,
}

#[derive(Debug, Clone)]
pub struct VariantMember {
    pub variant: String,
    /// Discriminator value selecting this variant
    pub value: String,
    pub implementation: String,
}

/// Object type: a trait plus, unless abstract, an implementation struct
#[derive(Debug, Clone)]
pub struct ObjectSpec {
    pub name: String,
    pub implementation: Option<String>,
    pub supertraits: Vec<String>,
    pub fields: Vec<FieldSpec>,
    pub inherited: Vec<InheritedFields>,
    pub variants: Option<VariantsSpec>,
    pub derives: Vec<String>,
    pub attributes: Vec<String>,
    pub doc: Option<String>,
}

impl ObjectSpec {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.wire_name == name)
    }

    /// Fields stored in the implementation struct: ancestors first, a field
    /// redeclared further down keeping its position but taking the newer
    /// definition
    pub fn storage_fields(&self) -> Vec<&FieldSpec> {
        let mut storage: Vec<&FieldSpec> = Vec::new();
        let all = self
            .inherited
            .iter()
            .flat_map(|group| group.fields.iter())
            .chain(self.fields.iter());
        for field in all {
            match storage.iter().position(|f| f.name == field.name) {
                Some(i) => storage[i] = field,
                None => storage.push(field),
            }
        }
        storage
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumConstant {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct EnumSpec {
    pub name: String,
    pub constants: Vec<EnumConstant>,
    pub derives: Vec<String>,
    pub doc: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UnionMember {
    pub variant: String,
    pub ty: TypeName,
    pub target: Option<Weak<CreationResult>>,
}

impl UnionMember {
    pub fn referenced(&self) -> Option<Arc<CreationResult>> {
        self.target.as_ref().and_then(Weak::upgrade)
    }
}

#[derive(Debug, Clone)]
pub struct UnionSpec {
    pub name: String,
    pub members: Vec<UnionMember>,
    pub derives: Vec<String>,
    pub doc: Option<String>,
}

/// `pub type Name = Target;`
#[derive(Debug, Clone)]
pub struct AliasSpec {
    pub name: String,
    pub target: TypeName,
    pub doc: Option<String>,
}

#[derive(Debug, Clone)]
pub enum TypeSpec {
    Object(ObjectSpec),
    Enumeration(EnumSpec),
    Union(UnionSpec),
    Alias(AliasSpec),
}

impl TypeSpec {
    pub fn name(&self) -> &str {
        match self {
            TypeSpec::Object(spec) => &spec.name,
            TypeSpec::Enumeration(spec) => &spec.name,
            TypeSpec::Union(spec) => &spec.name,
            TypeSpec::Alias(spec) => &spec.name,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectSpec> {
        match self {
            TypeSpec::Object(spec) => Some(spec),
            _ => None,
        }
    }
}

// =============================================================================
// Creation Result
// =============================================================================

/// Outcome of generating one schema type name.
///
/// Created as a placeholder carrying only its names, then finished exactly
/// once with its [`TypeSpec`]. Other artifacts may hold it (through `Arc`)
/// before it is finished; identity never changes.
pub struct CreationResult {
    schema_name: String,
    category: TypeCategory,
    type_name: String,
    implementation_name: Option<String>,
    spec: OnceLock<TypeSpec>,
}

impl CreationResult {
    pub fn new(
        schema_name: impl Into<String>,
        category: TypeCategory,
        type_name: impl Into<String>,
        implementation_name: Option<String>,
    ) -> Arc<Self> {
        Arc::new(Self {
            schema_name: schema_name.into(),
            category,
            type_name: type_name.into(),
            implementation_name,
            spec: OnceLock::new(),
        })
    }

    /// Set the finished spec. Returns false if it was already set.
    pub fn finish(&self, spec: TypeSpec) -> bool {
        self.spec.set(spec).is_ok()
    }

    pub fn is_finished(&self) -> bool {
        self.spec.get().is_some()
    }

    pub fn spec(&self) -> Option<&TypeSpec> {
        self.spec.get()
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    pub fn category(&self) -> TypeCategory {
        self.category
    }

    /// Primary generated name (trait, enum or alias)
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Concrete struct of an object type; `None` for abstract objects and
    /// other categories
    pub fn implementation_name(&self) -> Option<&str> {
        self.implementation_name.as_deref()
    }

    /// How other generated code refers to this type
    pub fn reference_type(&self) -> TypeName {
        match (self.category, &self.implementation_name) {
            (TypeCategory::Object, Some(implementation)) => TypeName::named(implementation.clone()),
            (TypeCategory::Object, None) => TypeName::Dyn(self.type_name.clone()),
            _ => TypeName::named(self.type_name.clone()),
        }
    }

    /// Module (file stem) this artifact is written to
    pub fn module_name(&self) -> String {
        naming::to_snake_case(&self.type_name)
    }

    /// Item names and the module this artifact occupies, e.g.
    /// `type Pet` or `module pet`
    pub fn claims(&self) -> BTreeSet<String> {
        let mut claims = BTreeSet::from([
            format!("module {}", self.module_name()),
            format!("type {}", self.type_name),
        ]);
        if let Some(implementation) = &self.implementation_name {
            claims.insert(format!("type {implementation}"));
        }
        if let Some(variants) = self.spec().and_then(TypeSpec::as_object).and_then(|o| o.variants.as_ref()) {
            claims.insert(format!("type {}", variants.name));
        }
        claims
    }

    /// Rust source, or `None` while unfinished
    pub fn render(&self) -> Option<String> {
        self.spec.get().map(rust::render)
    }
}

impl fmt::Debug for CreationResult {
    // Specs may point back at this result; print names only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreationResult")
            .field("schema_name", &self.schema_name)
            .field("category", &self.category)
            .field("type_name", &self.type_name)
            .field("implementation_name", &self.implementation_name)
            .field("finished", &self.is_finished())
            .finish()
    }
}
