//! Type Builders
//!
//! One construction routine per capability category. Every builder settles
//! its generated name first, registers the placeholder, and only then
//! resolves referenced types, so any recursive lookup of the type under
//! construction receives the placeholder.

mod array;
mod enumeration;
mod object;
mod reference;
mod union;

use std::sync::Arc;

use crate::codegen::{naming, CreationResult, TypeName, TypeSpec};
use crate::context::GenerationContext;
use crate::error::ResolveError;
use crate::schema::{TypeCategory, TypeDeclaration, TypeExpr};

/// Construct the artifact for `decl`, registered under `name`
pub(crate) fn build(
    ctx: &GenerationContext,
    name: &str,
    decl: &TypeDeclaration,
) -> Result<Arc<CreationResult>, ResolveError> {
    match decl.category() {
        TypeCategory::Object => object::build(ctx, name, decl),
        TypeCategory::Array => array::build(ctx, name, decl),
        TypeCategory::Union => union::build(ctx, name, decl),
        TypeCategory::Enumeration => enumeration::build(ctx, name, decl),
        TypeCategory::Reference => reference::build(ctx, name, decl),
    }
}

/// Rust type for a type expression used by `dependent`, plus the generated
/// type it names.
///
/// A direct reference to a type still under construction is boxed.
pub(crate) fn resolve_expr(
    ctx: &GenerationContext,
    dependent: &str,
    expr: &TypeExpr,
) -> Result<(TypeName, Option<Arc<CreationResult>>), ResolveError> {
    resolve_in(ctx, dependent, expr, true)
}

fn resolve_in(
    ctx: &GenerationContext,
    dependent: &str,
    expr: &TypeExpr,
    direct: bool,
) -> Result<(TypeName, Option<Arc<CreationResult>>), ResolveError> {
    match expr {
        TypeExpr::Scalar { scalar, format } => {
            Ok((TypeName::scalar(scalar.rust_type(format.as_deref())), None))
        }
        TypeExpr::Named(name) => {
            let target = ctx.resolve_for(dependent, name)?;
            let mut ty = target.reference_type();
            if direct && !target.is_finished() {
                ty = ty.boxed();
            }
            Ok((ty, Some(target)))
        }
        TypeExpr::Array(inner) => {
            let (ty, target) = resolve_in(ctx, dependent, inner, false)?;
            Ok((TypeName::Vec(Box::new(ty)), target))
        }
    }
}

/// Reject generated names that are not Rust type identifiers
pub(crate) fn checked_name(schema_name: &str, name: String) -> Result<String, ResolveError> {
    if naming::is_type_ident(&name) {
        Ok(name)
    } else {
        Err(ResolveError::construction(
            schema_name,
            format!("{name:?} is not a valid type name"),
        ))
    }
}

fn finish(
    schema_name: &str,
    result: Arc<CreationResult>,
    spec: TypeSpec,
) -> Result<Arc<CreationResult>, ResolveError> {
    if result.finish(spec) {
        Ok(result)
    } else {
        Err(ResolveError::construction(schema_name, "artifact was already built"))
    }
}

fn shape_mismatch(schema_name: &str, expected: TypeCategory) -> ResolveError {
    ResolveError::construction(schema_name, format!("declaration shape is not {expected}"))
}
