//! Schema Bridge CLI
//!
//! Generates Rust types from schema documents and inspects the pieces
//! a generation run uses.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use schema_bridge::{
    generate, DirectorySink, GenerationContext, GenerationError, GeneratorConfig, LayoutStrategy,
    PluginRegistry, ScalarType, SchemaDocument,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-bridge")]
#[command(about = "Map schema types to Rust types and back")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate Rust sources for every type of a schema document
    Generate {
        /// Schema document (JSON file or directory of fragments)
        #[arg(short, long)]
        schema: PathBuf,

        /// Output directory (overrides config)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Base plugin applied to every type (repeatable, appended to config)
        #[arg(long = "base-plugin")]
        base_plugins: Vec<String>,

        /// Output layout (overrides config)
        #[arg(long, value_enum)]
        layout: Option<Layout>,
    },

    /// List registered plugin identifiers
    Plugins,

    /// Print the known subtypes of a type
    Children {
        /// Schema document (JSON file or directory of fragments)
        #[arg(short, long)]
        schema: PathBuf,

        /// Type name
        type_name: String,
    },

    /// Print the schema scalar a Rust type maps to
    Scalar {
        /// Rust type, e.g. `i32` or `chrono::NaiveDate`
        host_type: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Layout {
    SingleFile,
    ModuleTree,
}

impl From<Layout> for LayoutStrategy {
    fn from(layout: Layout) -> Self {
        match layout {
            Layout::SingleFile => LayoutStrategy::SingleFile,
            Layout::ModuleTree => LayoutStrategy::ModuleTree,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            schema,
            out,
            config,
            base_plugins,
            layout,
        } => {
            let mut config = GeneratorConfig::load_from(config.as_deref())
                .context("loading configuration")?;
            config.generation.base_plugins.extend(base_plugins);
            if let Some(out) = out {
                config.output.directory = out;
            }
            if let Some(layout) = layout {
                config.output.layout = layout.into();
            }

            let document = SchemaDocument::from_path(&schema)
                .with_context(|| format!("loading schema {}", schema.display()))?;
            let mut sink = DirectorySink::from_config(&config.output);

            match generate(document, PluginRegistry::with_builtins(), &config, &mut sink) {
                Ok(report) => {
                    for plugin in &report.plugin_misses {
                        tracing::warn!(plugin = %plugin, "Unknown plugin ignored");
                    }
                    println!(
                        "✅ Generated {} types and {} support artifacts into {}",
                        report.written.len(),
                        report.support_written.len(),
                        sink.root().display()
                    );
                    Ok(())
                }
                Err(GenerationError::Incomplete { failures }) => {
                    println!("❌ {} types could not be generated:", failures.len());
                    for failure in &failures {
                        println!("   └─ {}", failure);
                    }
                    std::process::exit(1);
                }
                Err(e) => Err(e.into()),
            }
        }

        Commands::Plugins => {
            for name in PluginRegistry::with_builtins().names() {
                println!("{}", name);
            }
            Ok(())
        }

        Commands::Children { schema, type_name } => {
            let document = SchemaDocument::from_path(&schema)
                .with_context(|| format!("loading schema {}", schema.display()))?;
            if document.get(&type_name).is_none() {
                anyhow::bail!("type {} is not declared in {}", type_name, schema.display());
            }

            let ctx = GenerationContext::new(document, PluginRegistry::new());
            ctx.index_document();
            for child in ctx.descendants_of(&type_name) {
                println!("{}", child);
            }
            Ok(())
        }

        Commands::Scalar { host_type } => match ScalarType::from_host_type(&host_type) {
            Some(host) => {
                match host.format {
                    Some(format) => println!("{} (format: {})", host.scalar, format),
                    None => println!("{}", host.scalar),
                }
                Ok(())
            }
            None => anyhow::bail!("{} has no schema scalar", host_type),
        },
    }
}
