//! Configuration management for the generator
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schema-bridge.toml)
//! - Environment variables (SCHEMA_BRIDGE__*)
//!
//! ## Example config file (schema-bridge.toml):
//! ```toml
//! [generation]
//! base_plugins = ["acme.audit"]
//! derives = ["Debug", "Clone", "Serialize", "Deserialize"]
//! implementation_suffix = "Impl"
//!
//! [output]
//! directory = "src/generated"
//! layout = "module_tree"
//! header = true
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::context::GenerationSettings;

/// Main configuration for a generation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Generation settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Plugin identifiers applied to every type, in order
    #[serde(default)]
    pub base_plugins: Vec<String>,

    /// Derives on generated structs and enums
    #[serde(default = "default_derives")]
    pub derives: Vec<String>,

    /// Suffix naming an object's implementation struct
    #[serde(default = "default_implementation_suffix")]
    pub implementation_suffix: String,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory generated sources are written to
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,

    /// File/module layout strategy
    #[serde(default)]
    pub layout: LayoutStrategy,

    /// File name used by the single-file layout
    #[serde(default = "default_single_file_name")]
    pub single_file_name: String,

    /// Prefix generated files with a do-not-edit header
    #[serde(default = "default_true")]
    pub header: bool,
}

/// File/module layout strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LayoutStrategy {
    /// Single file with all types
    SingleFile,
    /// One file per type plus a `mod.rs`
    #[default]
    ModuleTree,
}

// Default value functions
fn default_derives() -> Vec<String> {
    GenerationSettings::default().derives
}

fn default_implementation_suffix() -> String {
    GenerationSettings::default().implementation_suffix
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("generated")
}

fn default_single_file_name() -> String {
    "types.rs".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_plugins: Vec::new(),
            derives: default_derives(),
            implementation_suffix: default_implementation_suffix(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            layout: LayoutStrategy::default(),
            single_file_name: default_single_file_name(),
            header: true,
        }
    }
}

impl GenerationConfig {
    /// Settings handed to the generation context
    pub fn settings(&self) -> GenerationSettings {
        GenerationSettings {
            derives: self.derives.clone(),
            implementation_suffix: self.implementation_suffix.clone(),
        }
    }
}

impl GeneratorConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering a specific file over the defaults
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = [
            "schema-bridge.toml",
            ".schema-bridge.toml",
            "config/schema-bridge.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "schema-bridge", "schema-bridge") {
            let xdg_config = config_dir.config_dir().join("schema-bridge.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // Load from environment variables (SCHEMA_BRIDGE__SECTION__KEY)
        builder = builder.add_source(
            Environment::with_prefix("SCHEMA_BRIDGE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("generation.base_plugins")
                .with_list_parse_key("generation.derives"),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeneratorConfig::default();
        assert!(config.generation.base_plugins.is_empty());
        assert_eq!(config.generation.implementation_suffix, "Impl");
        assert_eq!(config.output.layout, LayoutStrategy::ModuleTree);
        assert_eq!(config.output.directory, PathBuf::from("generated"));
        assert_eq!(config.generation.settings(), GenerationSettings::default());
    }

    #[test]
    fn test_serialize_config() {
        let config = GeneratorConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[generation]"));
        assert!(toml_str.contains("[output]"));
        assert!(toml_str.contains("layout = \"module_tree\""));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            r#"
[generation]
base_plugins = ["acme.audit", "acme.trace"]
implementation_suffix = "Data"

[output]
layout = "single_file"
"#,
        )
        .unwrap();

        let config = GeneratorConfig::load_from(Some(&path)).unwrap();
        assert_eq!(config.generation.base_plugins, vec!["acme.audit", "acme.trace"]);
        assert_eq!(config.generation.implementation_suffix, "Data");
        assert_eq!(config.output.layout, LayoutStrategy::SingleFile);
        assert_eq!(config.output.single_file_name, "types.rs");
    }

    #[test]
    fn test_save_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.toml");
        let mut config = GeneratorConfig::default();
        config.generation.base_plugins = vec!["core.box".into()];
        config.save(&path).unwrap();

        let loaded = GeneratorConfig::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.generation.base_plugins, vec!["core.box"]);
    }
}
