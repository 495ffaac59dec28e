//! A complete generation run over one document

use crate::config::GeneratorConfig;
use crate::context::GenerationContext;
use crate::document::SchemaDocument;
use crate::error::Result;
use crate::output::ArtifactSink;
use crate::plugin::PluginRegistry;

/// Outcome of a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Schema names of the types written
    pub written: Vec<String>,
    /// Support artifacts written
    pub support_written: Vec<String>,
    /// Plugin identifiers that were requested but not registered
    pub plugin_misses: Vec<String>,
}

/// Build a context for `document` configured by `config`
pub fn context_for(document: SchemaDocument, registry: PluginRegistry, config: &GeneratorConfig) -> GenerationContext {
    GenerationContext::new(document, registry)
        .with_base_plugins(config.generation.base_plugins.clone())
        .with_settings(config.generation.settings())
}

/// Index, resolve and write every type of `document`.
///
/// Every type is attempted; failures are reported together by
/// [`GenerationContext::create_all`].
pub fn generate(
    document: SchemaDocument,
    registry: PluginRegistry,
    config: &GeneratorConfig,
    sink: &mut dyn ArtifactSink,
) -> Result<GenerationReport> {
    let ctx = context_for(document, registry, config);
    run(&ctx, sink)
}

/// [`generate`] over an existing context
pub fn run(ctx: &GenerationContext, sink: &mut dyn ArtifactSink) -> Result<GenerationReport> {
    ctx.index_document();

    let names: Vec<String> = ctx.document().type_names().map(String::from).collect();
    tracing::info!(types = names.len(), "Generating");
    for name in &names {
        if let Err(err) = ctx.resolve(name) {
            tracing::debug!(type_name = %name, error = %err, "Type failed");
        }
    }

    let summary = ctx.create_all(sink)?;
    Ok(GenerationReport {
        written: summary.written,
        support_written: summary.support_written,
        plugin_misses: ctx.plugin_misses(),
    })
}
