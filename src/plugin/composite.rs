//! Composite plugins
//!
//! Folds every call through the members in the order they were added: each
//! member receives the previous member's output.

use std::sync::Arc;

use super::{
    ArrayTypeHandlerPlugin, EnumerationTypeHandlerPlugin, NameKind, ObjectTypeHandlerPlugin,
    ReferenceTypeHandlerPlugin, UnionTypeHandlerPlugin,
};
use crate::codegen::{
    AliasSpec, EnumConstant, EnumSpec, FieldSpec, ObjectSpec, TypeName, UnionMember, UnionSpec,
};
use crate::context::GenerationContext;
use crate::schema::{Property, TypeDeclaration};

/// An ordered list of plugins behind one plugin of the same capability
pub struct Composite<T: ?Sized> {
    members: Vec<Arc<T>>,
}

impl<T: ?Sized> Composite<T> {
    pub fn new(members: Vec<Arc<T>>) -> Self {
        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl ObjectTypeHandlerPlugin for Composite<dyn ObjectTypeHandlerPlugin> {
    fn class_name(&self, ctx: &GenerationContext, decl: &TypeDeclaration, current: String, kind: NameKind) -> String {
        self.members
            .iter()
            .fold(current, |name, plugin| plugin.class_name(ctx, decl, name, kind))
    }

    fn type_built(&self, ctx: &GenerationContext, decl: &TypeDeclaration, spec: ObjectSpec) -> ObjectSpec {
        self.members
            .iter()
            .fold(spec, |spec, plugin| plugin.type_built(ctx, decl, spec))
    }

    fn field_built(
        &self,
        ctx: &GenerationContext,
        decl: &TypeDeclaration,
        property: &Property,
        field: FieldSpec,
    ) -> Option<FieldSpec> {
        self.members
            .iter()
            .try_fold(field, |field, plugin| plugin.field_built(ctx, decl, property, field))
    }
}

impl ArrayTypeHandlerPlugin for Composite<dyn ArrayTypeHandlerPlugin> {
    fn class_name(&self, ctx: &GenerationContext, decl: &TypeDeclaration, current: String, kind: NameKind) -> String {
        self.members
            .iter()
            .fold(current, |name, plugin| plugin.class_name(ctx, decl, name, kind))
    }

    fn type_built(&self, ctx: &GenerationContext, decl: &TypeDeclaration, spec: AliasSpec) -> AliasSpec {
        self.members
            .iter()
            .fold(spec, |spec, plugin| plugin.type_built(ctx, decl, spec))
    }
}

impl UnionTypeHandlerPlugin for Composite<dyn UnionTypeHandlerPlugin> {
    fn class_name(&self, ctx: &GenerationContext, decl: &TypeDeclaration, current: String, kind: NameKind) -> String {
        self.members
            .iter()
            .fold(current, |name, plugin| plugin.class_name(ctx, decl, name, kind))
    }

    fn type_built(&self, ctx: &GenerationContext, decl: &TypeDeclaration, spec: UnionSpec) -> UnionSpec {
        self.members
            .iter()
            .fold(spec, |spec, plugin| plugin.type_built(ctx, decl, spec))
    }

    fn member_built(&self, ctx: &GenerationContext, decl: &TypeDeclaration, member: UnionMember) -> UnionMember {
        self.members
            .iter()
            .fold(member, |member, plugin| plugin.member_built(ctx, decl, member))
    }
}

impl EnumerationTypeHandlerPlugin for Composite<dyn EnumerationTypeHandlerPlugin> {
    fn class_name(&self, ctx: &GenerationContext, decl: &TypeDeclaration, current: String, kind: NameKind) -> String {
        self.members
            .iter()
            .fold(current, |name, plugin| plugin.class_name(ctx, decl, name, kind))
    }

    fn type_built(&self, ctx: &GenerationContext, decl: &TypeDeclaration, spec: EnumSpec) -> EnumSpec {
        self.members
            .iter()
            .fold(spec, |spec, plugin| plugin.type_built(ctx, decl, spec))
    }

    fn constant_built(
        &self,
        ctx: &GenerationContext,
        decl: &TypeDeclaration,
        value: &str,
        constant: EnumConstant,
    ) -> EnumConstant {
        self.members
            .iter()
            .fold(constant, |constant, plugin| plugin.constant_built(ctx, decl, value, constant))
    }
}

impl ReferenceTypeHandlerPlugin for Composite<dyn ReferenceTypeHandlerPlugin> {
    fn class_name(&self, ctx: &GenerationContext, decl: &TypeDeclaration, current: String, kind: NameKind) -> String {
        self.members
            .iter()
            .fold(current, |name, plugin| plugin.class_name(ctx, decl, name, kind))
    }

    fn type_built(&self, ctx: &GenerationContext, decl: &TypeDeclaration, spec: AliasSpec) -> AliasSpec {
        self.members
            .iter()
            .fold(spec, |spec, plugin| plugin.type_built(ctx, decl, spec))
    }

    fn type_name(
        &self,
        ctx: &GenerationContext,
        decl: &TypeDeclaration,
        property: Option<&Property>,
        current: TypeName,
    ) -> TypeName {
        self.members
            .iter()
            .fold(current, |ty, plugin| plugin.type_name(ctx, decl, property, ty))
    }
}
