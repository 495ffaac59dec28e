//! Schema documents and the type fetcher seam

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{GenerationError, Result};
use crate::schema::{PluginDef, TypeDeclaration};

/// A parsed schema document: the root every type name is resolved against
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Plugins applying to every type of this document
    #[serde(default)]
    pub plugins: Vec<PluginDef>,

    #[serde(default)]
    pub types: Vec<TypeDeclaration>,

    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl SchemaDocument {
    /// Build a document from declarations. Later duplicates shadow earlier ones.
    pub fn new(types: Vec<TypeDeclaration>) -> Self {
        let mut doc = Self {
            title: None,
            plugins: Vec::new(),
            types,
            index: HashMap::new(),
        };
        doc.reindex();
        doc
    }

    pub fn with_plugins(mut self, plugins: Vec<PluginDef>) -> Self {
        self.plugins = plugins;
        self
    }

    /// Parse a JSON document
    pub fn from_json_str(content: &str) -> Result<Self> {
        let mut doc: SchemaDocument = serde_json::from_str(content)?;
        doc.reindex();
        Ok(doc)
    }

    /// Load a document from a JSON file, or merge every `*.json` fragment
    /// below a directory
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            Self::from_directory(path)
        } else {
            Self::from_json_str(&fs::read_to_string(path)?)
        }
    }

    /// Merge all `*.json` fragments below `dir`, in path order
    pub fn from_directory(dir: &Path) -> Result<Self> {
        let mut paths: Vec<_> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
            .map(|e| e.into_path())
            .collect();
        paths.sort();

        let mut merged = SchemaDocument::default();
        for path in paths {
            let fragment = Self::from_json_str(&fs::read_to_string(&path)?)?;
            tracing::debug!(path = %path.display(), types = fragment.types.len(), "Loaded schema fragment");
            if merged.title.is_none() {
                merged.title = fragment.title;
            }
            merged.plugins.extend(fragment.plugins);
            for decl in fragment.types {
                if merged.index.contains_key(&decl.name) {
                    return Err(GenerationError::InvalidDocument(format!(
                        "type {} declared more than once (again in {})",
                        decl.name,
                        path.display()
                    )));
                }
                merged.index.insert(decl.name.clone(), merged.types.len());
                merged.types.push(decl);
            }
        }
        Ok(merged)
    }

    fn reindex(&mut self) {
        self.index = self
            .types
            .iter()
            .enumerate()
            .map(|(i, decl)| (decl.name.clone(), i))
            .collect();
    }

    /// Look up a declaration by name
    pub fn get(&self, name: &str) -> Option<&TypeDeclaration> {
        self.index.get(name).map(|&i| &self.types[i])
    }

    /// Declared type names, in document order
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|decl| decl.name.as_str())
    }
}

/// Locates type declarations in a root document
pub trait TypeFetcher: Send + Sync {
    fn fetch_type(&self, document: &SchemaDocument, name: &str) -> Option<TypeDeclaration>;
}

/// Fetches declarations by name from the document itself
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentFetcher;

impl TypeFetcher for DocumentFetcher {
    fn fetch_type(&self, document: &SchemaDocument, name: &str) -> Option<TypeDeclaration> {
        document.get(name).cloned()
    }
}

/// Never finds anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullFetcher;

impl TypeFetcher for NullFetcher {
    fn fetch_type(&self, _document: &SchemaDocument, _name: &str) -> Option<TypeDeclaration> {
        None
    }
}
