//! Schema Bridge
//!
//! A bidirectional mapper between web-API schema types and Rust types.
//!
//! ## Features
//!
//! - **At-most-once generation**: every schema type name is built once per run,
//!   even under concurrent resolution
//! - **Cycle safety**: recursive and mutually-referential types resolve through
//!   placeholders
//! - **Pluggable customization**: plugins per capability category, composed
//!   in a deterministic order
//! - **Shared support artifacts**: helpers referenced by many types are written once
//! - **Reverse mapping**: Rust struct descriptions back to schema types
//!
//! ## Architecture
//!
//! ```text
//! SchemaDocument ──▶ GenerationContext ──resolve──▶ builders ──▶ CreationResult
//!                        │      ▲                     │
//!                        │      └──── recursive ──────┘
//!                        ├── ChildTypeIndex
//!                        ├── plugin composer ◀── PluginRegistry
//!                        └── SupportRegistry
//!                               │
//!                     create_all ──▶ ArtifactSink (directory / memory)
//! ```

mod builders;
pub mod codegen;
pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod generator;
pub mod output;
pub mod plugin;
pub mod reverse;
pub mod scalar;
pub mod schema;

pub use codegen::{CreationResult, TypeName, TypeSpec};
pub use config::{GeneratorConfig, LayoutStrategy};
pub use context::{GenerationContext, GenerationSettings, ResolutionState};
pub use document::{DocumentFetcher, SchemaDocument, TypeFetcher};
pub use error::{GenerationError, ResolveError, Result};
pub use generator::{generate, GenerationReport};
pub use output::{ArtifactSink, DirectorySink, MemorySink};
pub use plugin::{PluginInstance, PluginRegistry};
pub use scalar::ScalarType;
pub use schema::{Annotations, PluginDef, Property, TypeCategory, TypeDeclaration, TypeShape};
