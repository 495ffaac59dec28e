//! Customization Plugins
//!
//! One capability trait per type category. Every method has a pass-through
//! default, so a plugin overrides only the adjustments it makes.
//!
//! Plugins are looked up by string identifier in a [`PluginRegistry`]; a
//! factory returns [`PluginInstance`]s, and a lookup keeps the instances of
//! the requested category. All instances applying to one declaration are
//! folded into a single [`Composite`].

pub mod builtin;
pub mod composite;
pub mod registry;

pub use composite::Composite;
pub use registry::{PluginFactory, PluginRegistry};

use std::sync::Arc;

use crate::codegen::{
    AliasSpec, EnumConstant, EnumSpec, FieldSpec, ObjectSpec, TypeName, UnionMember, UnionSpec,
};
use crate::context::GenerationContext;
use crate::schema::{Property, TypeCategory, TypeDeclaration};

/// Which generated name a `class_name` call is deciding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    /// The primary name: trait, enum or alias
    Declaration,
    /// The implementation struct of an object type
    Implementation,
}

pub trait ObjectTypeHandlerPlugin: Send + Sync {
    fn class_name(
        &self,
        _ctx: &GenerationContext,
        _decl: &TypeDeclaration,
        current: String,
        _kind: NameKind,
    ) -> String {
        current
    }

    fn type_built(&self, _ctx: &GenerationContext, _decl: &TypeDeclaration, spec: ObjectSpec) -> ObjectSpec {
        spec
    }

    /// Returning `None` drops the field
    fn field_built(
        &self,
        _ctx: &GenerationContext,
        _decl: &TypeDeclaration,
        _property: &Property,
        field: FieldSpec,
    ) -> Option<FieldSpec> {
        Some(field)
    }
}

pub trait ArrayTypeHandlerPlugin: Send + Sync {
    fn class_name(
        &self,
        _ctx: &GenerationContext,
        _decl: &TypeDeclaration,
        current: String,
        _kind: NameKind,
    ) -> String {
        current
    }

    fn type_built(&self, _ctx: &GenerationContext, _decl: &TypeDeclaration, spec: AliasSpec) -> AliasSpec {
        spec
    }
}

pub trait UnionTypeHandlerPlugin: Send + Sync {
    fn class_name(
        &self,
        _ctx: &GenerationContext,
        _decl: &TypeDeclaration,
        current: String,
        _kind: NameKind,
    ) -> String {
        current
    }

    fn type_built(&self, _ctx: &GenerationContext, _decl: &TypeDeclaration, spec: UnionSpec) -> UnionSpec {
        spec
    }

    fn member_built(
        &self,
        _ctx: &GenerationContext,
        _decl: &TypeDeclaration,
        member: UnionMember,
    ) -> UnionMember {
        member
    }
}

pub trait EnumerationTypeHandlerPlugin: Send + Sync {
    fn class_name(
        &self,
        _ctx: &GenerationContext,
        _decl: &TypeDeclaration,
        current: String,
        _kind: NameKind,
    ) -> String {
        current
    }

    fn type_built(&self, _ctx: &GenerationContext, _decl: &TypeDeclaration, spec: EnumSpec) -> EnumSpec {
        spec
    }

    fn constant_built(
        &self,
        _ctx: &GenerationContext,
        _decl: &TypeDeclaration,
        _value: &str,
        constant: EnumConstant,
    ) -> EnumConstant {
        constant
    }
}

pub trait ReferenceTypeHandlerPlugin: Send + Sync {
    fn class_name(
        &self,
        _ctx: &GenerationContext,
        _decl: &TypeDeclaration,
        current: String,
        _kind: NameKind,
    ) -> String {
        current
    }

    fn type_built(&self, _ctx: &GenerationContext, _decl: &TypeDeclaration, spec: AliasSpec) -> AliasSpec {
        spec
    }

    /// Adjust a type reference. `property` is set when the reference is a
    /// property of `decl`; `None` when `decl` itself is a reference type.
    fn type_name(
        &self,
        _ctx: &GenerationContext,
        _decl: &TypeDeclaration,
        _property: Option<&Property>,
        current: TypeName,
    ) -> TypeName {
        current
    }
}

/// A plugin instance of exactly one capability category
#[derive(Clone)]
pub enum PluginInstance {
    Object(Arc<dyn ObjectTypeHandlerPlugin>),
    Array(Arc<dyn ArrayTypeHandlerPlugin>),
    Union(Arc<dyn UnionTypeHandlerPlugin>),
    Enumeration(Arc<dyn EnumerationTypeHandlerPlugin>),
    Reference(Arc<dyn ReferenceTypeHandlerPlugin>),
}

impl PluginInstance {
    pub fn category(&self) -> TypeCategory {
        match self {
            PluginInstance::Object(_) => TypeCategory::Object,
            PluginInstance::Array(_) => TypeCategory::Array,
            PluginInstance::Union(_) => TypeCategory::Union,
            PluginInstance::Enumeration(_) => TypeCategory::Enumeration,
            PluginInstance::Reference(_) => TypeCategory::Reference,
        }
    }
}

impl std::fmt::Debug for PluginInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PluginInstance({})", self.category())
    }
}

/// Ties a capability trait object to its category.
///
/// Implemented for `dyn ObjectTypeHandlerPlugin` and its four siblings, so
/// lookup and composition are written once, generic over the category.
pub trait PluginCategory: Send + Sync {
    const CATEGORY: TypeCategory;

    fn from_instance(instance: &PluginInstance) -> Option<Arc<Self>>;

    fn composite(members: Vec<Arc<Self>>) -> Arc<Self>;
}

macro_rules! plugin_category {
    ($trait_:ident, $variant:ident) => {
        impl PluginCategory for dyn $trait_ {
            const CATEGORY: TypeCategory = TypeCategory::$variant;

            fn from_instance(instance: &PluginInstance) -> Option<Arc<Self>> {
                match instance {
                    PluginInstance::$variant(plugin) => Some(Arc::clone(plugin)),
                    _ => None,
                }
            }

            fn composite(members: Vec<Arc<Self>>) -> Arc<Self> {
                Arc::new(Composite::new(members))
            }
        }
    };
}

plugin_category!(ObjectTypeHandlerPlugin, Object);
plugin_category!(ArrayTypeHandlerPlugin, Array);
plugin_category!(UnionTypeHandlerPlugin, Union);
plugin_category!(EnumerationTypeHandlerPlugin, Enumeration);
plugin_category!(ReferenceTypeHandlerPlugin, Reference);
