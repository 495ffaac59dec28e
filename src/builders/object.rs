//! Object types: a trait per declaration plus an implementation struct
//! carrying own and inherited fields.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use super::{checked_name, finish, resolve_expr, shape_mismatch};
use crate::codegen::{
    naming, AliasSpec, CreationResult, FieldSpec, InheritedFields, ObjectSpec, TypeName, TypeSpec,
    VariantMember, VariantsSpec,
};
use crate::context::GenerationContext;
use crate::error::ResolveError;
use crate::plugin::{NameKind, ObjectTypeHandlerPlugin, ReferenceTypeHandlerPlugin};
use crate::schema::{TypeCategory, TypeDeclaration, TypeShape};

/// Support artifact holding undeclared properties
pub const ADDITIONAL_PROPERTIES: &str = "AdditionalProperties";

pub(super) fn build(
    ctx: &GenerationContext,
    name: &str,
    decl: &TypeDeclaration,
) -> Result<Arc<CreationResult>, ResolveError> {
    let TypeShape::Object {
        discriminator,
        additional_properties,
        ..
    } = &decl.shape
    else {
        return Err(shape_mismatch(name, TypeCategory::Object));
    };

    let plugins = ctx.plugins_for::<dyn ObjectTypeHandlerPlugin>(&[decl]);
    let type_name = plugins.class_name(ctx, decl, naming::to_pascal_case(&decl.name), NameKind::Declaration);
    let type_name = checked_name(name, type_name)?;
    let implementation = if decl.annotations.is_abstract {
        None
    } else {
        let default = format!("{}{}", type_name, ctx.settings().implementation_suffix);
        let implementation = plugins.class_name(ctx, decl, default, NameKind::Implementation);
        Some(checked_name(name, implementation)?)
    };

    let result = CreationResult::new(name, TypeCategory::Object, type_name.clone(), implementation.clone());
    ctx.register_expected(name, Arc::clone(&result));

    let mut supertraits = Vec::new();
    for parent in decl.parents.iter().filter(|p| *p != name) {
        let parent_result = ctx
            .resolve_for(name, parent)
            .map_err(|err| ResolveError::construction(name, format!("parent {parent}: {err}")))?;
        if parent_result.category() != TypeCategory::Object {
            return Err(ResolveError::construction(
                name,
                format!("parent {parent} is a {} type", parent_result.category()),
            ));
        }
        supertraits.push(parent_result.type_name().to_string());
    }

    let mut fields = build_fields(ctx, name, decl, plugins.as_ref())?;
    let inherited = inherited_fields(ctx, name, decl)?;

    if *additional_properties {
        let artifact = ctx.register_support(additional_properties_spec);
        fields.push(FieldSpec {
            name: "additional_properties".to_string(),
            wire_name: "additional_properties".to_string(),
            ty: artifact.reference(),
            target: None,
            flatten: true,
            doc: None,
        });
    }

    let variants = match discriminator {
        Some(tag) => variants(ctx, name, decl, tag, &type_name, implementation.as_deref())?,
        None => None,
    };

    let spec = ObjectSpec {
        name: type_name,
        implementation,
        supertraits,
        fields,
        inherited,
        variants,
        derives: ctx.settings().derives.clone(),
        attributes: Vec::new(),
        doc: decl.description.clone(),
    };
    let spec = plugins.type_built(ctx, decl, spec);
    finish(name, result, TypeSpec::Object(spec))
}

/// Fields for `decl`'s own properties, stored by `dependent`
fn build_fields(
    ctx: &GenerationContext,
    dependent: &str,
    decl: &TypeDeclaration,
    plugins: &dyn ObjectTypeHandlerPlugin,
) -> Result<Vec<FieldSpec>, ResolveError> {
    let mut fields: Vec<FieldSpec> = Vec::new();
    for property in decl.properties() {
        let references = ctx.compose::<dyn ReferenceTypeHandlerPlugin>(&[decl], &property.plugins);

        let (ty, target) = resolve_expr(ctx, dependent, &property.expr()).map_err(|err| {
            ResolveError::construction(&decl.name, format!("property {}: {err}", property.name))
        })?;
        let mut ty = references.type_name(ctx, decl, Some(property), ty);
        if !property.required {
            ty = ty.nullable();
        }

        let field = FieldSpec {
            name: naming::field_ident(&property.name),
            wire_name: property.name.clone(),
            ty,
            target: target.as_ref().map(Arc::downgrade),
            flatten: false,
            doc: property.description.clone(),
        };
        let Some(field) = plugins.field_built(ctx, decl, property, field) else {
            continue;
        };
        if fields.iter().any(|f| f.name == field.name) {
            return Err(ResolveError::construction(
                &decl.name,
                format!("property {} collides with another field as {}", property.name, field.name),
            ));
        }
        fields.push(field);
    }
    Ok(fields)
}

/// Accessor groups for every ancestor trait, parents before children
fn inherited_fields(
    ctx: &GenerationContext,
    name: &str,
    decl: &TypeDeclaration,
) -> Result<Vec<InheritedFields>, ResolveError> {
    let mut ancestors = Vec::new();
    let mut visited = HashSet::from([name.to_string()]);
    collect_ancestors(ctx, decl, &mut visited, &mut ancestors);

    let mut groups = Vec::with_capacity(ancestors.len());
    for ancestor in &ancestors {
        let Some(trait_name) = ctx.cached(&ancestor.name).map(|r| r.type_name().to_string()) else {
            continue;
        };
        let plugins = ctx.plugins_for::<dyn ObjectTypeHandlerPlugin>(&[ancestor]);
        let fields = build_fields(ctx, name, ancestor, plugins.as_ref()).map_err(|err| {
            ResolveError::construction(name, format!("inherited from {}: {err}", ancestor.name))
        })?;
        groups.push(InheritedFields { trait_name, fields });
    }
    Ok(groups)
}

fn collect_ancestors(
    ctx: &GenerationContext,
    decl: &TypeDeclaration,
    visited: &mut HashSet<String>,
    ancestors: &mut Vec<TypeDeclaration>,
) {
    for parent in &decl.parents {
        if !visited.insert(parent.clone()) {
            continue;
        }
        if let Some(parent_decl) = ctx.fetch_declaration(parent) {
            collect_ancestors(ctx, &parent_decl, visited, ancestors);
            ancestors.push(parent_decl);
        }
    }
}

/// Tagged enum over this type's and its descendants' implementations
fn variants(
    ctx: &GenerationContext,
    name: &str,
    decl: &TypeDeclaration,
    tag: &str,
    type_name: &str,
    implementation: Option<&str>,
) -> Result<Option<VariantsSpec>, ResolveError> {
    let descendants: BTreeSet<String> = ctx.descendants_of(name);
    if descendants.is_empty() {
        return Ok(None);
    }

    let mut members = Vec::new();
    if let Some(implementation) = implementation {
        members.push(VariantMember {
            variant: type_name.to_string(),
            value: discriminator_value(decl),
            implementation: implementation.to_string(),
        });
    }
    for child in &descendants {
        let result = ctx
            .resolve_for(name, child)
            .map_err(|err| ResolveError::construction(name, format!("subtype {child}: {err}")))?;
        let (Some(implementation), Some(child_decl)) =
            (result.implementation_name(), ctx.fetch_declaration(child))
        else {
            continue;
        };
        members.push(VariantMember {
            variant: result.type_name().to_string(),
            value: discriminator_value(&child_decl),
            implementation: implementation.to_string(),
        });
    }

    if members.is_empty() {
        return Ok(None);
    }
    Ok(Some(VariantsSpec {
        name: format!("{type_name}Variants"),
        tag: tag.to_string(),
        members,
    }))
}

fn discriminator_value(decl: &TypeDeclaration) -> String {
    match &decl.shape {
        TypeShape::Object {
            discriminator_value: Some(value),
            ..
        } => value.clone(),
        _ => decl.name.clone(),
    }
}

fn additional_properties_spec() -> TypeSpec {
    TypeSpec::Alias(AliasSpec {
        name: ADDITIONAL_PROPERTIES.to_string(),
        target: TypeName::scalar("std::collections::HashMap<String, serde_json::Value>"),
        doc: Some("Properties not declared by the schema".to_string()),
    })
}
