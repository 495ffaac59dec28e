use std::collections::HashSet;
use std::sync::Arc;

use super::{checked_name, finish, shape_mismatch};
use crate::codegen::{naming, CreationResult, EnumConstant, EnumSpec, TypeSpec};
use crate::context::GenerationContext;
use crate::error::ResolveError;
use crate::plugin::{EnumerationTypeHandlerPlugin, NameKind};
use crate::schema::{TypeCategory, TypeDeclaration, TypeShape};

pub(super) fn build(
    ctx: &GenerationContext,
    name: &str,
    decl: &TypeDeclaration,
) -> Result<Arc<CreationResult>, ResolveError> {
    let TypeShape::Enumeration { values } = &decl.shape else {
        return Err(shape_mismatch(name, TypeCategory::Enumeration));
    };

    let plugins = ctx.plugins_for::<dyn EnumerationTypeHandlerPlugin>(&[decl]);
    let type_name = plugins.class_name(ctx, decl, naming::to_pascal_case(&decl.name), NameKind::Declaration);
    let type_name = checked_name(name, type_name)?;

    let result = CreationResult::new(name, TypeCategory::Enumeration, type_name.clone(), None);
    ctx.register_expected(name, Arc::clone(&result));

    if values.is_empty() {
        return Err(ResolveError::construction(name, "enumeration has no values"));
    }

    let mut seen = HashSet::new();
    let mut constants = Vec::with_capacity(values.len());
    for value in values {
        let constant = EnumConstant {
            name: naming::variant_ident(value),
            value: value.clone(),
        };
        let constant = plugins.constant_built(ctx, decl, value, constant);
        if !seen.insert(constant.name.clone()) {
            return Err(ResolveError::construction(
                name,
                format!("value {value:?} collides with another constant as {}", constant.name),
            ));
        }
        constants.push(constant);
    }

    let spec = EnumSpec {
        name: type_name,
        constants,
        derives: ctx.settings().derives.clone(),
        doc: decl.description.clone(),
    };
    let spec = plugins.type_built(ctx, decl, spec);
    finish(name, result, TypeSpec::Enumeration(spec))
}
