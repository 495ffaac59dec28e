//! Support-artifact registry
//!
//! Auxiliary artifacts shared by several generated types, one per name.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::codegen::{naming, rust, TypeName, TypeSpec};
use crate::error::Result;
use crate::output::ArtifactSink;

/// A named auxiliary artifact
#[derive(Debug)]
pub struct SupportArtifact {
    spec: TypeSpec,
    written: AtomicBool,
}

impl SupportArtifact {
    fn new(spec: TypeSpec) -> Self {
        Self {
            spec,
            written: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        self.spec.name()
    }

    pub fn spec(&self) -> &TypeSpec {
        &self.spec
    }

    /// How generated code refers to this artifact
    pub fn reference(&self) -> TypeName {
        TypeName::named(self.name())
    }

    pub fn module_name(&self) -> String {
        naming::to_snake_case(self.name())
    }

    pub fn is_written(&self) -> bool {
        self.written.load(Ordering::Acquire)
    }
}

#[derive(Debug, Default)]
pub struct SupportRegistry {
    artifacts: DashMap<String, Arc<SupportArtifact>>,
}

impl SupportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a candidate and store it, unless an artifact with the same
    /// name exists; either way the stored artifact is returned.
    pub fn register(&self, build: impl FnOnce() -> TypeSpec) -> Arc<SupportArtifact> {
        let candidate = SupportArtifact::new(build());
        let name = candidate.name().to_string();
        Arc::clone(&self.artifacts.entry(name).or_insert_with(|| Arc::new(candidate)))
    }

    pub fn get(&self, name: &str) -> Option<Arc<SupportArtifact>> {
        self.artifacts.get(name).map(|entry| Arc::clone(&entry))
    }

    /// Every stored artifact, in name order
    pub fn artifacts(&self) -> Vec<Arc<SupportArtifact>> {
        let mut artifacts: Vec<Arc<SupportArtifact>> =
            self.artifacts.iter().map(|entry| Arc::clone(entry.value())).collect();
        artifacts.sort_by(|a, b| a.name().cmp(b.name()));
        artifacts
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Write every artifact not yet written, in name order. Returns the
    /// names written by this call.
    pub fn flush(&self, sink: &mut dyn ArtifactSink) -> Result<Vec<String>> {
        let mut pending: Vec<Arc<SupportArtifact>> = self
            .artifacts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .filter(|artifact| !artifact.is_written())
            .collect();
        pending.sort_by(|a, b| a.name().cmp(b.name()));

        let mut written = Vec::with_capacity(pending.len());
        for artifact in pending {
            if artifact.written.swap(true, Ordering::AcqRel) {
                continue;
            }
            if let Err(err) = sink.write(&artifact.module_name(), &rust::render(&artifact.spec)) {
                artifact.written.store(false, Ordering::Release);
                return Err(err);
            }
            tracing::info!(artifact = artifact.name(), "Wrote support artifact");
            written.push(artifact.name().to_string());
        }
        Ok(written)
    }
}
