//! Artifact destinations
//!
//! A sink receives one Rust module per generated artifact and decides how
//! modules are laid out on disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{LayoutStrategy, OutputConfig};
use crate::error::Result;

/// Imports every generated module needs
const PRELUDE: &str = "#![allow(unused_imports)]\n\nuse serde::{Deserialize, Serialize};\n";

const HEADER: &str = "// @generated by schema-bridge. Do not edit.\n";

/// Destination for rendered artifacts
pub trait ArtifactSink {
    /// Store the Rust source of one module
    fn write(&mut self, module: &str, source: &str) -> Result<()>;

    /// Called once after the last module
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Keeps modules in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    modules: BTreeMap<String, String>,
    writes: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, module: &str) -> Option<&str> {
        self.modules.get(module).map(String::as_str)
    }

    pub fn modules(&self) -> &BTreeMap<String, String> {
        &self.modules
    }

    /// Number of `write` calls, including overwrites
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl ArtifactSink for MemorySink {
    fn write(&mut self, module: &str, source: &str) -> Result<()> {
        self.modules.insert(module.to_string(), source.to_string());
        self.writes += 1;
        Ok(())
    }
}

/// Writes modules below a directory, in a [`LayoutStrategy`]
#[derive(Debug)]
pub struct DirectorySink {
    root: PathBuf,
    layout: LayoutStrategy,
    single_file_name: String,
    header: bool,
    modules: BTreeMap<String, String>,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>, layout: LayoutStrategy) -> Self {
        Self {
            root: root.into(),
            layout,
            single_file_name: "types.rs".to_string(),
            header: true,
            modules: BTreeMap::new(),
        }
    }

    /// A sink following the `[output]` settings
    pub fn from_config(config: &OutputConfig) -> Self {
        Self {
            root: config.directory.clone(),
            layout: config.layout,
            single_file_name: config.single_file_name.clone(),
            header: config.header,
            modules: BTreeMap::new(),
        }
    }

    /// Override the directory written to
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn header(&self) -> &'static str {
        if self.header {
            HEADER
        } else {
            ""
        }
    }

    fn write_file(&self, name: &str, content: &str) -> Result<()> {
        let path = self.root.join(name);
        fs::write(&path, content)?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "Wrote file");
        Ok(())
    }
}

impl ArtifactSink for DirectorySink {
    fn write(&mut self, module: &str, source: &str) -> Result<()> {
        if self.layout == LayoutStrategy::ModuleTree {
            fs::create_dir_all(&self.root)?;
            let content = format!("{}{}use super::*;\n\n{}", self.header(), PRELUDE, source);
            self.write_file(&format!("{module}.rs"), &content)?;
        }
        self.modules.insert(module.to_string(), source.to_string());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        match self.layout {
            LayoutStrategy::ModuleTree => {
                let mut content = self.header().to_string();
                for module in self.modules.keys() {
                    content.push_str(&format!("pub mod {module};\n"));
                }
                content.push('\n');
                for module in self.modules.keys() {
                    content.push_str(&format!("pub use {module}::*;\n"));
                }
                self.write_file("mod.rs", &content)
            }
            LayoutStrategy::SingleFile => {
                let mut content = format!("{}{}", self.header(), PRELUDE);
                for source in self.modules.values() {
                    content.push('\n');
                    content.push_str(source);
                }
                self.write_file(&self.single_file_name, &content)
            }
        }
    }
}
