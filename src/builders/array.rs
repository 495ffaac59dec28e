use std::sync::Arc;

use super::{checked_name, finish, resolve_expr, shape_mismatch};
use crate::codegen::{naming, AliasSpec, CreationResult, TypeSpec};
use crate::context::GenerationContext;
use crate::error::ResolveError;
use crate::plugin::{ArrayTypeHandlerPlugin, NameKind};
use crate::schema::{TypeCategory, TypeDeclaration, TypeExpr, TypeShape};

pub(super) fn build(
    ctx: &GenerationContext,
    name: &str,
    decl: &TypeDeclaration,
) -> Result<Arc<CreationResult>, ResolveError> {
    let TypeShape::Array { items } = &decl.shape else {
        return Err(shape_mismatch(name, TypeCategory::Array));
    };

    let plugins = ctx.plugins_for::<dyn ArrayTypeHandlerPlugin>(&[decl]);
    let type_name = plugins.class_name(ctx, decl, naming::to_pascal_case(&decl.name), NameKind::Declaration);
    let type_name = checked_name(name, type_name)?;

    let result = CreationResult::new(name, TypeCategory::Array, type_name.clone(), None);
    ctx.register_expected(name, Arc::clone(&result));

    let expr = TypeExpr::Array(Box::new(TypeExpr::parse(items, None)));
    let (target, _) = resolve_expr(ctx, name, &expr)
        .map_err(|err| ResolveError::construction(name, format!("items {items}: {err}")))?;

    let spec = AliasSpec {
        name: type_name,
        target,
        doc: decl.description.clone(),
    };
    let spec = plugins.type_built(ctx, decl, spec);
    finish(name, result, TypeSpec::Alias(spec))
}
