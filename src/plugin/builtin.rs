//! Built-in `core.*` plugins

use std::sync::Arc;

use super::{
    ArrayTypeHandlerPlugin, EnumerationTypeHandlerPlugin, NameKind, ObjectTypeHandlerPlugin,
    PluginInstance, PluginRegistry, ReferenceTypeHandlerPlugin, UnionTypeHandlerPlugin,
};
use crate::codegen::{EnumSpec, ObjectSpec, TypeName, UnionSpec};
use crate::context::GenerationContext;
use crate::schema::{Property, TypeDeclaration};

pub const RENAME: &str = "core.rename";
pub const RENAME_IMPLEMENTATION: &str = "core.renameImplementation";
pub const BOX: &str = "core.box";
pub const MAKE_ABSTRACT: &str = "core.makeAbstract";
pub const DERIVE: &str = "core.derive";

pub(crate) fn register_builtins(registry: &mut PluginRegistry) {
    registry.register(RENAME, |args| match args.first() {
        Some(name) => {
            let plugin = Arc::new(Rename { name: name.clone() });
            vec![
                PluginInstance::Object(plugin.clone()),
                PluginInstance::Array(plugin.clone()),
                PluginInstance::Union(plugin.clone()),
                PluginInstance::Enumeration(plugin.clone()),
                PluginInstance::Reference(plugin),
            ]
        }
        None => Vec::new(),
    });

    registry.register(RENAME_IMPLEMENTATION, |args| match args.first() {
        Some(name) => vec![PluginInstance::Object(Arc::new(RenameImplementation {
            name: name.clone(),
        }))],
        None => Vec::new(),
    });

    registry.register(BOX, |_args| vec![PluginInstance::Reference(Arc::new(BoxScalars))]);

    registry.register(DERIVE, |args| {
        let plugin = Arc::new(Derive {
            derives: args.to_vec(),
        });
        vec![
            PluginInstance::Object(plugin.clone()),
            PluginInstance::Union(plugin.clone()),
            PluginInstance::Enumeration(plugin),
        ]
    });
}

// =============================================================================
// core.rename
// =============================================================================

/// Replaces the declaration name of a generated type
pub struct Rename {
    name: String,
}

impl Rename {
    fn rename(&self, current: String, kind: NameKind) -> String {
        match kind {
            NameKind::Declaration => self.name.clone(),
            NameKind::Implementation => current,
        }
    }
}

impl ObjectTypeHandlerPlugin for Rename {
    fn class_name(&self, _: &GenerationContext, _: &TypeDeclaration, current: String, kind: NameKind) -> String {
        self.rename(current, kind)
    }
}

impl ArrayTypeHandlerPlugin for Rename {
    fn class_name(&self, _: &GenerationContext, _: &TypeDeclaration, current: String, kind: NameKind) -> String {
        self.rename(current, kind)
    }
}

impl UnionTypeHandlerPlugin for Rename {
    fn class_name(&self, _: &GenerationContext, _: &TypeDeclaration, current: String, kind: NameKind) -> String {
        self.rename(current, kind)
    }
}

impl EnumerationTypeHandlerPlugin for Rename {
    fn class_name(&self, _: &GenerationContext, _: &TypeDeclaration, current: String, kind: NameKind) -> String {
        self.rename(current, kind)
    }
}

impl ReferenceTypeHandlerPlugin for Rename {
    fn class_name(&self, _: &GenerationContext, _: &TypeDeclaration, current: String, kind: NameKind) -> String {
        self.rename(current, kind)
    }
}

// =============================================================================
// core.renameImplementation
// =============================================================================

/// Replaces the implementation struct name of an object type
pub struct RenameImplementation {
    name: String,
}

impl ObjectTypeHandlerPlugin for RenameImplementation {
    fn class_name(&self, _: &GenerationContext, _: &TypeDeclaration, current: String, kind: NameKind) -> String {
        match kind {
            NameKind::Implementation => self.name.clone(),
            NameKind::Declaration => current,
        }
    }
}

// =============================================================================
// core.box
// =============================================================================

/// Makes scalar properties nullable (`Option<T>`)
pub struct BoxScalars;

impl ReferenceTypeHandlerPlugin for BoxScalars {
    fn type_name(
        &self,
        _: &GenerationContext,
        _: &TypeDeclaration,
        property: Option<&Property>,
        current: TypeName,
    ) -> TypeName {
        match property {
            Some(_) if current.is_scalar() => current.nullable(),
            _ => current,
        }
    }
}

// =============================================================================
// core.derive
// =============================================================================

/// Appends derives to generated data types
pub struct Derive {
    derives: Vec<String>,
}

impl Derive {
    fn extend(&self, existing: &mut Vec<String>) {
        for derive in &self.derives {
            if !existing.contains(derive) {
                existing.push(derive.clone());
            }
        }
    }
}

impl ObjectTypeHandlerPlugin for Derive {
    fn type_built(&self, _: &GenerationContext, _: &TypeDeclaration, mut spec: ObjectSpec) -> ObjectSpec {
        self.extend(&mut spec.derives);
        spec
    }
}

impl UnionTypeHandlerPlugin for Derive {
    fn type_built(&self, _: &GenerationContext, _: &TypeDeclaration, mut spec: UnionSpec) -> UnionSpec {
        self.extend(&mut spec.derives);
        spec
    }
}

impl EnumerationTypeHandlerPlugin for Derive {
    fn type_built(&self, _: &GenerationContext, _: &TypeDeclaration, mut spec: EnumSpec) -> EnumSpec {
        self.extend(&mut spec.derives);
        spec
    }
}
