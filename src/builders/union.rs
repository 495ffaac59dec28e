use std::collections::HashSet;
use std::sync::Arc;

use super::{checked_name, finish, resolve_expr, shape_mismatch};
use crate::codegen::{naming, CreationResult, TypeSpec, UnionMember, UnionSpec};
use crate::context::GenerationContext;
use crate::error::ResolveError;
use crate::plugin::{NameKind, UnionTypeHandlerPlugin};
use crate::schema::{TypeCategory, TypeDeclaration, TypeExpr, TypeShape};

pub(super) fn build(
    ctx: &GenerationContext,
    name: &str,
    decl: &TypeDeclaration,
) -> Result<Arc<CreationResult>, ResolveError> {
    let TypeShape::Union { members } = &decl.shape else {
        return Err(shape_mismatch(name, TypeCategory::Union));
    };

    let plugins = ctx.plugins_for::<dyn UnionTypeHandlerPlugin>(&[decl]);
    let type_name = plugins.class_name(ctx, decl, naming::to_pascal_case(&decl.name), NameKind::Declaration);
    let type_name = checked_name(name, type_name)?;

    let result = CreationResult::new(name, TypeCategory::Union, type_name.clone(), None);
    ctx.register_expected(name, Arc::clone(&result));

    if members.is_empty() {
        return Err(ResolveError::construction(name, "union has no members"));
    }

    let mut seen = HashSet::new();
    let mut built = Vec::with_capacity(members.len());
    for member in members {
        let (ty, target) = resolve_expr(ctx, name, &TypeExpr::parse(member, None))
            .map_err(|err| ResolveError::construction(name, format!("member {member}: {err}")))?;

        // `Cat[]` becomes `CatList`
        let variant = naming::variant_ident(&member.replace("[]", " list"));
        let candidate = UnionMember {
            variant,
            ty,
            target: target.as_ref().map(Arc::downgrade),
        };
        let member_spec = plugins.member_built(ctx, decl, candidate);
        if !seen.insert(member_spec.variant.clone()) {
            return Err(ResolveError::construction(
                name,
                format!("member {member} repeats variant {}", member_spec.variant),
            ));
        }
        built.push(member_spec);
    }

    let spec = UnionSpec {
        name: type_name,
        members: built,
        derives: ctx.settings().derives.clone(),
        doc: decl.description.clone(),
    };
    let spec = plugins.type_built(ctx, decl, spec);
    finish(name, result, TypeSpec::Union(spec))
}
