//! Rust Code Emitter
//!
//! Renders TypeSpecs as Rust source.
//!
//! Key constraints:
//! - This module ONLY receives TypeSpecs - no schema declarations
//! - Names arrive already resolved and escaped
//! - Imports are the output layout's concern, not the emitter's

use super::{AliasSpec, EnumSpec, FieldSpec, ObjectSpec, TypeSpec, UnionSpec, VariantsSpec};

// =============================================================================
// Public API
// =============================================================================

/// Render one artifact
pub fn render(spec: &TypeSpec) -> String {
    let mut output = String::new();

    match spec {
        TypeSpec::Object(object) => emit_object(&mut output, object),
        TypeSpec::Enumeration(enumeration) => emit_enum(&mut output, enumeration),
        TypeSpec::Union(union) => emit_union(&mut output, union),
        TypeSpec::Alias(alias) => emit_alias(&mut output, alias),
    }

    output
}

// =============================================================================
// Object Emission
// =============================================================================

fn emit_object(output: &mut String, spec: &ObjectSpec) {
    emit_doc(output, "", spec.doc.as_deref(), &spec.name);

    if spec.supertraits.is_empty() {
        output.push_str(&format!("pub trait {} {{\n", spec.name));
    } else {
        output.push_str(&format!(
            "pub trait {}: {} {{\n",
            spec.name,
            spec.supertraits.join(" + ")
        ));
    }
    for field in &spec.fields {
        output.push_str(&format!("    fn {}(&self) -> &{};\n", field.name, field.ty));
    }
    output.push_str("}\n");

    let Some(implementation) = &spec.implementation else {
        return;
    };

    output.push('\n');
    emit_derives(output, &spec.derives);
    for attribute in &spec.attributes {
        output.push_str(attribute);
        output.push('\n');
    }
    output.push_str(&format!("pub struct {} {{\n", implementation));
    for field in spec.storage_fields() {
        emit_field(output, field);
    }
    output.push_str("}\n");

    for group in &spec.inherited {
        emit_impl(output, &group.trait_name, implementation, &group.fields);
    }
    emit_impl(output, &spec.name, implementation, &spec.fields);

    if let Some(variants) = &spec.variants {
        emit_variants(output, variants, &spec.derives);
    }
}

fn emit_field(output: &mut String, field: &FieldSpec) {
    if let Some(doc) = &field.doc {
        emit_doc(output, "    ", Some(doc), "");
    }
    if field.flatten {
        output.push_str("    #[serde(flatten)]\n");
    } else if field.name.trim_start_matches("r#") != field.wire_name {
        output.push_str(&format!("    #[serde(rename = {:?})]\n", field.wire_name));
    }
    if field.ty.is_nullable() {
        output.push_str("    #[serde(default, skip_serializing_if = \"Option::is_none\")]\n");
    }
    output.push_str(&format!("    pub {}: {},\n", field.name, field.ty));
}

fn emit_impl(output: &mut String, trait_name: &str, implementation: &str, fields: &[FieldSpec]) {
    output.push_str(&format!("\nimpl {} for {} {{\n", trait_name, implementation));
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        output.push_str(&format!(
            "    fn {name}(&self) -> &{ty} {{\n        &self.{name}\n    }}\n",
            name = field.name,
            ty = field.ty
        ));
    }
    output.push_str("}\n");
}

fn emit_variants(output: &mut String, variants: &VariantsSpec, derives: &[String]) {
    output.push('\n');
    emit_derives(output, derives);
    output.push_str(&format!("#[serde(tag = {:?})]\n", variants.tag));
    output.push_str(&format!("pub enum {} {{\n", variants.name));
    for member in &variants.members {
        output.push_str(&format!("    #[serde(rename = {:?})]\n", member.value));
        output.push_str(&format!("    {}({}),\n", member.variant, member.implementation));
    }
    output.push_str("}\n");
}

// =============================================================================
// Enum / Union / Alias Emission
// =============================================================================

fn emit_enum(output: &mut String, spec: &EnumSpec) {
    emit_doc(output, "", spec.doc.as_deref(), &spec.name);
    emit_derives(output, &spec.derives);
    output.push_str(&format!("pub enum {} {{\n", spec.name));
    for constant in &spec.constants {
        if constant.name != constant.value {
            output.push_str(&format!("    #[serde(rename = {:?})]\n", constant.value));
        }
        output.push_str(&format!("    {},\n", constant.name));
    }
    output.push_str("}\n");
}

fn emit_union(output: &mut String, spec: &UnionSpec) {
    emit_doc(output, "", spec.doc.as_deref(), &spec.name);
    emit_derives(output, &spec.derives);
    output.push_str("#[serde(untagged)]\n");
    output.push_str(&format!("pub enum {} {{\n", spec.name));
    for member in &spec.members {
        output.push_str(&format!("    {}({}),\n", member.variant, member.ty));
    }
    output.push_str("}\n");
}

fn emit_alias(output: &mut String, spec: &AliasSpec) {
    emit_doc(output, "", spec.doc.as_deref(), &spec.name);
    output.push_str(&format!("pub type {} = {};\n", spec.name, spec.target));
}

// =============================================================================
// Helper Utilities
// =============================================================================

fn emit_doc(output: &mut String, indent: &str, doc: Option<&str>, fallback: &str) {
    let text = doc.unwrap_or(fallback);
    for line in text.lines() {
        if line.is_empty() {
            output.push_str(&format!("{}///\n", indent));
        } else {
            output.push_str(&format!("{}/// {}\n", indent, line));
        }
    }
}

fn emit_derives(output: &mut String, derives: &[String]) {
    if !derives.is_empty() {
        output.push_str(&format!("#[derive({})]\n", derives.join(", ")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::{EnumConstant, InheritedFields, TypeName, UnionMember};

    fn field(name: &str, wire: &str, ty: TypeName) -> FieldSpec {
        FieldSpec {
            name: name.to_string(),
            wire_name: wire.to_string(),
            ty,
            target: None,
            flatten: false,
            doc: None,
        }
    }

    #[test]
    fn test_render_object_with_inheritance() {
        let spec = ObjectSpec {
            name: "Dog".into(),
            implementation: Some("DogImpl".into()),
            supertraits: vec!["Animal".into()],
            fields: vec![field("good_boy", "goodBoy", TypeName::scalar("bool"))],
            inherited: vec![InheritedFields {
                trait_name: "Animal".into(),
                fields: vec![field("legs", "legs", TypeName::scalar("i64").nullable())],
            }],
            variants: None,
            derives: vec!["Debug".into(), "Serialize".into()],
            attributes: vec![],
            doc: None,
        };

        let code = render(&TypeSpec::Object(spec));
        assert!(code.contains("pub trait Dog: Animal {\n    fn good_boy(&self) -> &bool;\n}"));
        assert!(code.contains("#[derive(Debug, Serialize)]\npub struct DogImpl {"));
        assert!(code.contains("    #[serde(rename = \"goodBoy\")]\n    pub good_boy: bool,"));
        assert!(code.contains("    pub legs: Option<i64>,"));
        assert!(code.contains("impl Animal for DogImpl {"));
        assert!(code.contains("impl Dog for DogImpl {"));
        // inherited fields come first
        assert!(code.find("pub legs").unwrap() < code.find("pub good_boy").unwrap());
    }

    #[test]
    fn test_redeclared_field_is_stored_once() {
        let spec = ObjectSpec {
            name: "Dog".into(),
            implementation: Some("DogImpl".into()),
            supertraits: vec!["Animal".into()],
            fields: vec![field("name", "name", TypeName::scalar("String"))],
            inherited: vec![InheritedFields {
                trait_name: "Animal".into(),
                fields: vec![
                    field("name", "name", TypeName::scalar("String").nullable()),
                    field("legs", "legs", TypeName::scalar("i64")),
                ],
            }],
            variants: None,
            derives: vec![],
            attributes: vec![],
            doc: None,
        };

        let code = render(&TypeSpec::Object(spec));
        assert_eq!(code.matches("pub name:").count(), 1);
        assert!(code.contains("    pub name: String,\n    pub legs: i64,"));
    }

    #[test]
    fn test_render_abstract_object_has_no_struct() {
        let spec = ObjectSpec {
            name: "Shape".into(),
            implementation: None,
            supertraits: vec![],
            fields: vec![field("r#type", "type", TypeName::scalar("String"))],
            inherited: vec![],
            variants: None,
            derives: vec![],
            attributes: vec![],
            doc: Some("A shape".into()),
        };

        let code = render(&TypeSpec::Object(spec));
        assert!(code.starts_with("/// A shape\npub trait Shape {"));
        assert!(code.contains("fn r#type(&self) -> &String;"));
        assert!(!code.contains("struct"));
    }

    #[test]
    fn test_render_enum_union_alias() {
        let enumeration = render(&TypeSpec::Enumeration(EnumSpec {
            name: "Color".into(),
            constants: vec![EnumConstant { name: "Red".into(), value: "red".into() }],
            derives: vec![],
            doc: None,
        }));
        assert!(enumeration.contains("#[serde(rename = \"red\")]\n    Red,"));

        let union = render(&TypeSpec::Union(UnionSpec {
            name: "Pet".into(),
            members: vec![UnionMember {
                variant: "Cat".into(),
                ty: TypeName::named("CatImpl"),
                target: None,
            }],
            derives: vec![],
            doc: None,
        }));
        assert!(union.contains("#[serde(untagged)]\npub enum Pet {\n    Cat(CatImpl),\n}"));

        let alias = render(&TypeSpec::Alias(AliasSpec {
            name: "Names".into(),
            target: TypeName::Vec(Box::new(TypeName::scalar("String"))),
            doc: None,
        }));
        assert_eq!(alias, "/// Names\npub type Names = Vec<String>;\n");
    }
}
