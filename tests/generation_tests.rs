//! Generation Tests
//!
//! End-to-end resolution and rendering over the fixture documents.

use std::sync::{Arc, Mutex};

use schema_bridge::codegen::TypeSpec;
use schema_bridge::plugin::{NameKind, ObjectTypeHandlerPlugin, PluginInstance};
use schema_bridge::schema::TypeExpr;
use schema_bridge::{
    generate, Annotations, DirectorySink, GenerationContext, GenerationError, GeneratorConfig,
    LayoutStrategy, MemorySink, PluginDef, PluginRegistry, Property, ResolutionState,
    ResolveError, ScalarType, SchemaDocument, TypeDeclaration,
};

fn pets() -> SchemaDocument {
    SchemaDocument::from_json_str(include_str!("fixtures/pets.json")).unwrap()
}

fn cycles() -> SchemaDocument {
    SchemaDocument::from_json_str(include_str!("fixtures/cycle.json")).unwrap()
}

fn render(ctx: &GenerationContext, name: &str) -> String {
    ctx.resolve(name).unwrap().render().unwrap()
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_single_scalar_property() {
    let doc = SchemaDocument::new(vec![TypeDeclaration::object(
        "Person",
        vec![Property::new("name", "string")],
    )]);
    let ctx = GenerationContext::new(doc, PluginRegistry::with_builtins());

    let person = ctx.resolve("Person").unwrap();
    let object = person.spec().and_then(TypeSpec::as_object).unwrap();
    assert_eq!(object.fields.len(), 1);

    let name = object.field("name").unwrap();
    assert!(name.ty.is_scalar());
    assert!(name.target.is_none());

    let decl = ctx.document().get("Person").unwrap();
    assert_eq!(
        decl.properties()[0].expr(),
        TypeExpr::Scalar { scalar: ScalarType::String, format: None }
    );

    // nothing else was resolved along the way
    assert_eq!(ctx.resolved().len(), 1);
    assert!(ctx.failures().is_empty());
}

#[test]
fn test_self_referential_type() {
    let ctx = GenerationContext::new(cycles(), PluginRegistry::with_builtins());

    let node = ctx.resolve("Node").unwrap();
    assert_eq!(ctx.state_of("Node"), ResolutionState::Resolved);

    let object = node.spec().and_then(TypeSpec::as_object).unwrap();
    let next = object.field("next").unwrap();
    assert!(Arc::ptr_eq(&next.referenced().unwrap(), &node));
    assert_eq!(next.ty.to_string(), "Option<Box<NodeImpl>>");
    assert!(Arc::ptr_eq(&ctx.resolve("Node").unwrap(), &node));
}

#[test]
fn test_self_reference_is_freed_with_its_context() {
    let ctx = GenerationContext::new(cycles(), PluginRegistry::with_builtins());
    let node = ctx.resolve("Node").unwrap();
    drop(ctx);

    assert_eq!(Arc::strong_count(&node), 1);
    let object = node.spec().and_then(TypeSpec::as_object).unwrap();
    assert!(Arc::ptr_eq(&object.field("next").unwrap().referenced().unwrap(), &node));
}

#[test]
fn test_mutual_references_resolve() {
    let ctx = GenerationContext::new(cycles(), PluginRegistry::with_builtins());

    let a = ctx.resolve("A").unwrap();
    assert_eq!(ctx.state_of("A"), ResolutionState::Resolved);
    assert_eq!(ctx.state_of("B"), ResolutionState::Resolved);

    let b = ctx.resolve("B").unwrap();
    let a_spec = a.spec().and_then(TypeSpec::as_object).unwrap();
    let b_spec = b.spec().and_then(TypeSpec::as_object).unwrap();
    assert!(Arc::ptr_eq(&a_spec.field("b").unwrap().referenced().unwrap(), &b));
    assert!(Arc::ptr_eq(&b_spec.field("a").unwrap().referenced().unwrap(), &a));

    // the back edge is the boxed one
    assert!(render(&ctx, "A").contains("    pub b: BImpl,\n"));
    assert!(render(&ctx, "B").contains("    pub a: Box<AImpl>,\n"));
}

#[test]
fn test_class_name_override() {
    let decl = TypeDeclaration::object("Gadget", vec![Property::new("id", "integer")]).with_annotations(
        Annotations {
            class_name: Some("Widget".into()),
            ..Annotations::default()
        },
    );
    let ctx = GenerationContext::new(SchemaDocument::new(vec![decl]), PluginRegistry::with_builtins());

    let result = ctx.resolve("Gadget").unwrap();
    assert_eq!(result.schema_name(), "Gadget");
    assert_eq!(result.type_name(), "Widget");
    assert_eq!(result.implementation_name(), Some("WidgetImpl"));
    assert!(result.render().unwrap().contains("pub trait Widget {"));
}

#[test]
fn test_implementation_override_and_abstract() {
    let doc = SchemaDocument::new(vec![
        TypeDeclaration::object("Shape", vec![Property::new("area", "number")]).with_annotations(
            Annotations {
                is_abstract: true,
                ..Annotations::default()
            },
        ),
        TypeDeclaration::object("Square", vec![Property::new("side", "number")])
            .with_parents(&["Shape"])
            .with_annotations(Annotations {
                implementation_class_name: Some("SquareData".into()),
                use_primitive: true,
                ..Annotations::default()
            }),
        TypeDeclaration::object("Canvas", vec![Property::new("shape", "Shape")]),
    ]);
    let ctx = GenerationContext::new(doc, PluginRegistry::with_builtins());

    let shape = render(&ctx, "Shape");
    assert!(shape.contains("pub trait Shape {"));
    assert!(!shape.contains("struct"));

    let square = render(&ctx, "Square");
    assert!(square.contains("pub trait Square: Shape {"));
    assert!(square.contains("pub struct SquareData {"));
    assert!(square.contains("impl Shape for SquareData {"));
    assert!(square.contains("    pub side: f64,\n"));

    assert!(render(&ctx, "Canvas").contains("    pub shape: Box<dyn Shape>,\n"));
}

// =============================================================================
// Hierarchy
// =============================================================================

#[test]
fn test_hierarchy_through_resolution() {
    let doc = SchemaDocument::new(vec![
        TypeDeclaration::object("P1", vec![]),
        TypeDeclaration::object("P2", vec![]),
        TypeDeclaration::object("C", vec![]).with_parents(&["P1", "P2", "C"]),
    ]);
    let ctx = GenerationContext::new(doc, PluginRegistry::with_builtins());

    let c = ctx.resolve("C").unwrap();
    assert!(ctx.children_of("P1").contains("C"));
    assert!(ctx.children_of("P2").contains("C"));
    assert!(!ctx.children_of("C").contains("C"));

    let object = c.spec().and_then(TypeSpec::as_object).unwrap();
    assert_eq!(object.supertraits, vec!["P1", "P2"]);
}

#[test]
fn test_discriminated_variants() {
    let ctx = GenerationContext::new(pets(), PluginRegistry::with_builtins());
    ctx.index_document();

    let animal = render(&ctx, "Animal");
    assert!(animal.contains("#[serde(tag = \"kind\")]\npub enum AnimalVariants {"));
    assert!(animal.contains("    #[serde(rename = \"Animal\")]\n    Animal(AnimalImpl),"));
    assert!(animal.contains("    #[serde(rename = \"cat\")]\n    Cat(CatImpl),"));
    assert!(animal.contains("    #[serde(rename = \"Dog\")]\n    Dog(DogImpl),"));

    let cat = render(&ctx, "Cat");
    assert!(cat.contains("pub trait Cat: Animal {\n    fn indoor(&self) -> &bool;\n}"));
    assert!(cat.contains("    pub name: String,\n    pub kind: String,\n    pub indoor: bool,\n"));
    assert!(cat.contains("impl Animal for CatImpl {"));
    assert!(cat.contains("impl Cat for CatImpl {"));
    assert!(!cat.contains("Variants"));
}

// =============================================================================
// Plugins
// =============================================================================

/// Appends its letter to declaration names and logs the call
struct Append {
    letter: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl ObjectTypeHandlerPlugin for Append {
    fn class_name(&self, _: &GenerationContext, _: &TypeDeclaration, current: String, kind: NameKind) -> String {
        match kind {
            NameKind::Declaration => {
                self.log.lock().unwrap().push(self.letter);
                format!("{current}{}", self.letter)
            }
            NameKind::Implementation => current,
        }
    }
}

fn appending_registry(log: &Arc<Mutex<Vec<&'static str>>>) -> PluginRegistry {
    let mut registry = PluginRegistry::with_builtins();
    for (id, letter) in [("test.x", "X"), ("test.y", "Y"), ("test.z", "Z")] {
        let log = Arc::clone(log);
        registry.register(id, move |_args| {
            vec![PluginInstance::Object(Arc::new(Append {
                letter,
                log: Arc::clone(&log),
            }))]
        });
    }
    registry
}

#[test]
fn test_plugin_composition_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let decl = TypeDeclaration::object("Gadget", vec![]).with_annotations(Annotations {
        plugins: vec![PluginDef::bare("test.z")],
        ..Annotations::default()
    });
    let ctx = GenerationContext::new(SchemaDocument::new(vec![decl]), appending_registry(&log))
        .with_base_plugins(vec!["test.x".into(), "test.y".into()]);

    let result = ctx.resolve("Gadget").unwrap();
    assert_eq!(result.type_name(), "GadgetXYZ");
    assert_eq!(*log.lock().unwrap(), vec!["X", "Y", "Z"]);
}

#[test]
fn test_system_rename_feeds_base_plugins() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let decl = TypeDeclaration::object("Gadget", vec![]).with_annotations(Annotations {
        class_name: Some("Widget".into()),
        ..Annotations::default()
    });
    let ctx = GenerationContext::new(SchemaDocument::new(vec![decl]), appending_registry(&log))
        .with_base_plugins(vec!["test.x".into()]);

    assert_eq!(ctx.resolve("Gadget").unwrap().type_name(), "WidgetX");
}

#[test]
fn test_unknown_plugins_are_soft_misses() {
    let decl = TypeDeclaration::object("Gadget", vec![Property::new("id", "string")]).with_annotations(
        Annotations {
            plugins: vec![PluginDef::new("acme.missing", vec!["a".into()])],
            ..Annotations::default()
        },
    );
    let ctx = GenerationContext::new(SchemaDocument::new(vec![decl]), PluginRegistry::with_builtins())
        .with_base_plugins(vec!["acme.base".into()]);

    ctx.resolve("Gadget").unwrap();
    assert_eq!(ctx.plugin_misses(), vec!["acme.base", "acme.missing"]);
}

#[test]
fn test_property_plugins_apply_to_one_property() {
    let mut name = Property::new("name", "string");
    name.plugins.push(PluginDef::bare("core.box"));
    let decl = TypeDeclaration::object("Tag", vec![name, Property::new("weight", "number")]).with_annotations(
        Annotations {
            use_primitive: true,
            ..Annotations::default()
        },
    );
    let ctx = GenerationContext::new(SchemaDocument::new(vec![decl]), PluginRegistry::with_builtins());

    let code = render(&ctx, "Tag");
    assert!(code.contains("    pub name: Option<String>,\n"));
    assert!(code.contains("    pub weight: f64,\n"));
}

// =============================================================================
// Rendering
// =============================================================================

#[test]
fn test_enumeration_golden() {
    let ctx = GenerationContext::new(pets(), PluginRegistry::with_builtins());
    assert_eq!(
        render(&ctx, "Color"),
        "/// Color\n\
         #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\n\
         pub enum Color {\n    \
         #[serde(rename = \"black\")]\n    \
         Black,\n    \
         #[serde(rename = \"ginger\")]\n    \
         Ginger,\n    \
         #[serde(rename = \"tabby-grey\")]\n    \
         TabbyGrey,\n\
         }\n"
    );
}

#[test]
fn test_union_array_reference() {
    let ctx = GenerationContext::new(pets(), PluginRegistry::with_builtins());

    let pet = render(&ctx, "Pet");
    assert!(pet.contains("#[serde(untagged)]\npub enum Pet {\n    Cat(CatImpl),\n    Dog(DogImpl),\n}"));

    assert_eq!(render(&ctx, "Names"), "/// Names\npub type Names = Vec<String>;\n");
    assert_eq!(render(&ctx, "OwnerId"), "/// OwnerId\npub type OwnerId = i64;\n");
}

#[test]
fn test_boxing_and_additional_properties() {
    let ctx = GenerationContext::new(pets(), PluginRegistry::with_builtins());

    let owner = render(&ctx, "Owner");
    assert!(owner.contains("    fn pets(&self) -> &Vec<Pet>;\n"));
    assert!(owner.contains("    #[serde(default, skip_serializing_if = \"Option::is_none\")]\n    pub favorite: Option<Color>,\n"));
    assert!(owner.contains("    pub age: Option<i32>,\n"));
    assert!(owner.contains("    #[serde(flatten)]\n    pub additional_properties: AdditionalProperties,\n"));

    let dog = render(&ctx, "Dog");
    assert!(dog.contains("    #[serde(rename = \"goodBoy\")]\n    #[serde(default, skip_serializing_if = \"Option::is_none\")]\n    pub good_boy: Option<bool>,\n"));

    ctx.resolve("Note").unwrap();
    assert_eq!(ctx.support().len(), 1);
}

// =============================================================================
// Whole Runs
// =============================================================================

#[test]
fn test_generate_writes_every_type() {
    let mut sink = MemorySink::new();
    let report = generate(pets(), PluginRegistry::with_builtins(), &GeneratorConfig::default(), &mut sink).unwrap();

    assert_eq!(
        report.written,
        vec!["Animal", "Cat", "Color", "Dog", "Names", "Note", "Owner", "OwnerId", "Pet"]
    );
    assert_eq!(report.support_written, vec!["AdditionalProperties"]);
    assert!(report.plugin_misses.is_empty());
    assert_eq!(sink.writes(), 10);
    assert!(sink.get("owner_id").is_some());
    assert!(sink
        .get("additional_properties")
        .unwrap()
        .contains("pub type AdditionalProperties = std::collections::HashMap<String, serde_json::Value>;"));
}

#[test]
fn test_generate_reports_all_failures() {
    let doc = SchemaDocument::from_json_str(include_str!("fixtures/broken.json")).unwrap();
    let mut sink = MemorySink::new();
    let err = generate(doc, PluginRegistry::with_builtins(), &GeneratorConfig::default(), &mut sink).unwrap_err();

    let failures = match err {
        GenerationError::Incomplete { failures } => failures,
        other => panic!("expected an aggregate failure, got {other:?}"),
    };
    let names: Vec<&str> = failures.iter().map(ResolveError::type_name).collect();
    assert_eq!(names, vec!["Dangling", "Empty", "Missing"]);
    assert!(matches!(failures[0], ResolveError::ConstructionFailed { .. }));
    assert!(matches!(failures[2], ResolveError::NotFound { .. }));

    // the healthy type is still written, the broken ones are not
    assert!(sink.get("good").is_some());
    assert!(sink.get("dangling").is_none());
    assert!(sink.get("empty").is_none());
}

fn renamed(name: &str, property: Property, class_name: &str) -> TypeDeclaration {
    TypeDeclaration::object(name, vec![property]).with_annotations(Annotations {
        class_name: Some(class_name.into()),
        ..Annotations::default()
    })
}

#[test]
fn test_clashing_generated_names_fail() {
    let doc = SchemaDocument::new(vec![
        renamed("A", Property::new("x", "string"), "Widget"),
        renamed("B", Property::new("y", "integer"), "Widget"),
        TypeDeclaration::object("C", vec![Property::new("w", "A")]),
        TypeDeclaration::object("D", vec![Property::new("z", "string")]),
    ]);
    let ctx = GenerationContext::new(doc, PluginRegistry::with_builtins());
    for name in ["A", "B", "C", "D"] {
        ctx.resolve(name).unwrap();
    }

    let mut sink = MemorySink::new();
    let failures = match ctx.create_all(&mut sink).unwrap_err() {
        GenerationError::Incomplete { failures } => failures,
        other => panic!("unexpected {other:?}"),
    };
    let names: Vec<&str> = failures.iter().map(ResolveError::type_name).collect();
    assert_eq!(names, vec!["A", "B", "C"]);
    match &failures[0] {
        ResolveError::ConstructionFailed { reason, .. } => {
            assert!(reason.contains("also generated for B"), "{reason}")
        }
        other => panic!("unexpected {other:?}"),
    }

    // neither Widget is written, nor what refers to them
    assert!(sink.get("widget").is_none());
    assert!(sink.get("c").is_none());
    assert!(sink.get("d").is_some());
    assert_eq!(ctx.state_of("A"), ResolutionState::Failed);
}

#[test]
fn test_type_clashing_with_support_artifact_fails() {
    let doc = SchemaDocument::from_json_str(
        r#"{
          "types": [
            { "name": "AdditionalProperties", "kind": "object",
              "properties": [ { "name": "v", "type": "string" } ] },
            { "name": "Bag", "kind": "object", "additionalProperties": true,
              "properties": [ { "name": "id", "type": "string" } ] }
          ]
        }"#,
    )
    .unwrap();
    let mut sink = MemorySink::new();
    let err = generate(doc, PluginRegistry::with_builtins(), &GeneratorConfig::default(), &mut sink).unwrap_err();

    let failures = match err {
        GenerationError::Incomplete { failures } => failures,
        other => panic!("unexpected {other:?}"),
    };
    let names: Vec<&str> = failures.iter().map(ResolveError::type_name).collect();
    assert_eq!(names, vec!["AdditionalProperties"]);

    assert!(sink.get("bag").is_some());
    assert!(sink
        .get("additional_properties")
        .unwrap()
        .contains("pub type AdditionalProperties = std::collections::HashMap"));
}

#[test]
fn test_generate_into_module_tree() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = GeneratorConfig::default();
    config.output.directory = dir.path().join("generated");
    config.output.layout = LayoutStrategy::ModuleTree;

    let mut sink = DirectorySink::from_config(&config.output);
    generate(pets(), PluginRegistry::with_builtins(), &config, &mut sink).unwrap();

    let root = dir.path().join("generated");
    for file in ["animal.rs", "cat.rs", "owner_id.rs", "additional_properties.rs", "mod.rs"] {
        assert!(root.join(file).exists(), "missing {file}");
    }
    let mod_rs = std::fs::read_to_string(root.join("mod.rs")).unwrap();
    assert!(mod_rs.contains("pub mod additional_properties;"));
    assert!(mod_rs.contains("pub use animal::*;"));
}

#[test]
fn test_generate_single_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = GeneratorConfig::default();
    config.output.directory = dir.path().to_path_buf();
    config.output.layout = LayoutStrategy::SingleFile;

    let mut sink = DirectorySink::from_config(&config.output);
    generate(cycles(), PluginRegistry::with_builtins(), &config, &mut sink).unwrap();

    let types = std::fs::read_to_string(dir.path().join("types.rs")).unwrap();
    assert!(types.starts_with("// @generated"));
    assert!(types.contains("pub trait A {"));
    assert!(types.contains("pub struct NodeImpl {"));
}
