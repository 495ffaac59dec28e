//! Generation Context
//!
//! Run-scoped orchestrator: resolves schema type names to [`CreationResult`]s
//! at most once each, owns the hierarchy index and the support-artifact
//! registry, and composes plugins for the builders.
//!
//! Per-name states:
//!
//! ```text
//! UNSEEN ──resolve──▶ PENDING ──built──▶ RESOLVED
//!                        │
//!                        └──error──▶ FAILED ──retry──▶ PENDING
//! ```
//!
//! A PENDING entry first announces that construction has started, then
//! carries the placeholder registered by the builder. Callers observing a
//! placeholder receive it; callers on other threads arriving before it
//! wait for it.
//!
//! Every reference one result makes to another is recorded. When a type
//! fails, the results referring to it fail as well, so no written artifact
//! names a type that is never written.

pub mod composer;
pub mod hierarchy;
pub mod support;

pub use composer::system_plugins;
pub use hierarchy::ChildTypeIndex;
pub use support::{SupportArtifact, SupportRegistry};

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};

use crate::builders;
use crate::codegen::{CreationResult, TypeSpec};
use crate::document::{DocumentFetcher, SchemaDocument, TypeFetcher};
use crate::error::{GenerationError, ResolveError, Result};
use crate::output::ArtifactSink;
use crate::plugin::PluginRegistry;
use crate::schema::TypeDeclaration;

// =============================================================================
// Settings
// =============================================================================

/// Options shaping generated artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSettings {
    /// Derives on generated structs and enums
    pub derives: Vec<String>,
    /// Appended to an object's name to name its implementation struct
    pub implementation_suffix: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            derives: ["Debug", "Clone", "PartialEq", "Serialize", "Deserialize"]
                .into_iter()
                .map(String::from)
                .collect(),
            implementation_suffix: "Impl".to_string(),
        }
    }
}

// =============================================================================
// Resolution State
// =============================================================================

/// Externally visible state of one type name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    Unseen,
    Pending,
    Resolved,
    Failed,
}

enum Slot {
    Pending(Arc<InFlight>),
    Resolved(Arc<CreationResult>),
    Failed(ResolveError),
}

enum Progress {
    Starting,
    Placeholder(Arc<CreationResult>),
    Settled,
}

enum Observed {
    Placeholder(Arc<CreationResult>),
    Settled,
    Reentered,
}

/// A construction in progress
struct InFlight {
    owner: ThreadId,
    progress: Mutex<Progress>,
    changed: Condvar,
}

impl InFlight {
    fn new() -> Self {
        Self {
            owner: thread::current().id(),
            progress: Mutex::new(Progress::Starting),
            changed: Condvar::new(),
        }
    }

    fn placeholder(&self) -> Option<Arc<CreationResult>> {
        match &*self.progress.lock() {
            Progress::Placeholder(result) => Some(Arc::clone(result)),
            _ => None,
        }
    }

    fn set_placeholder(&self, result: Arc<CreationResult>) {
        let mut progress = self.progress.lock();
        if matches!(*progress, Progress::Starting) {
            *progress = Progress::Placeholder(result);
            self.changed.notify_all();
        }
    }

    fn settle(&self) {
        *self.progress.lock() = Progress::Settled;
        self.changed.notify_all();
    }

    /// Wait until a placeholder or the final outcome is available
    fn observe(&self) -> Observed {
        let mut progress = self.progress.lock();
        loop {
            match &*progress {
                Progress::Placeholder(result) => return Observed::Placeholder(Arc::clone(result)),
                Progress::Settled => return Observed::Settled,
                Progress::Starting if self.owner == thread::current().id() => {
                    return Observed::Reentered
                }
                Progress::Starting => self.changed.wait(&mut progress),
            }
        }
    }
}

enum Claim {
    Construct(Arc<InFlight>),
    Await(Arc<InFlight>),
}

/// Reference bookkeeping between cached results
#[derive(Default)]
struct Dependents {
    /// Referenced schema name to the names whose artifacts refer to it
    by_target: HashMap<String, BTreeSet<String>>,
    /// Constructions still in flight whose references have since failed
    doomed: HashMap<String, ResolveError>,
    /// Failed name to the failed name it was taken down by
    caused_by: HashMap<String, String>,
}

/// Settles an in-flight construction that unwinds instead of returning
struct SettleOnUnwind<'a> {
    ctx: &'a GenerationContext,
    name: &'a str,
    in_flight: &'a InFlight,
    armed: bool,
}

impl Drop for SettleOnUnwind<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::error!(type_name = self.name, "Construction panicked");
            let err = ResolveError::construction(self.name, "construction panicked");
            let _ = self.ctx.settle(self.name, Err(err));
            self.in_flight.settle();
        }
    }
}

/// What [`GenerationContext::create_all`] wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Schema names of written types, in write order
    pub written: Vec<String>,
    /// Names of support artifacts written
    pub support_written: Vec<String>,
}

// =============================================================================
// Generation Context
// =============================================================================

pub struct GenerationContext {
    document: SchemaDocument,
    fetcher: Box<dyn TypeFetcher>,
    registry: PluginRegistry,
    base_plugins: Vec<String>,
    settings: GenerationSettings,
    cache: DashMap<String, Slot>,
    hierarchy: ChildTypeIndex,
    support: SupportRegistry,
    plugin_misses: Mutex<BTreeSet<String>>,
    dependents: Mutex<Dependents>,
}

impl GenerationContext {
    /// A context resolving names against `document`
    pub fn new(document: SchemaDocument, registry: PluginRegistry) -> Self {
        Self {
            document,
            fetcher: Box::new(DocumentFetcher),
            registry,
            base_plugins: Vec::new(),
            settings: GenerationSettings::default(),
            cache: DashMap::new(),
            hierarchy: ChildTypeIndex::new(),
            support: SupportRegistry::new(),
            plugin_misses: Mutex::new(BTreeSet::new()),
            dependents: Mutex::new(Dependents::default()),
        }
    }

    pub fn with_fetcher(mut self, fetcher: impl TypeFetcher + 'static) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    /// Plugin identifiers applied to every type, in order
    pub fn with_base_plugins(mut self, base_plugins: Vec<String>) -> Self {
        self.base_plugins = base_plugins;
        self
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn base_plugins(&self) -> &[String] {
        &self.base_plugins
    }

    /// Look up a declaration through the fetcher
    pub fn fetch_declaration(&self, name: &str) -> Option<TypeDeclaration> {
        self.fetcher.fetch_type(&self.document, name)
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolve `name` to its creation result, constructing it on first use.
    ///
    /// Repeated and concurrent calls construct once and observe the same
    /// result. A FAILED name returns its recorded error; see
    /// [`retry`](Self::retry).
    pub fn resolve(&self, name: &str) -> std::result::Result<Arc<CreationResult>, ResolveError> {
        loop {
            let claim = match self.cache.entry(name.to_string()) {
                Entry::Occupied(entry) => match entry.get() {
                    Slot::Resolved(result) => {
                        tracing::debug!(type_name = name, "Cache hit");
                        return Ok(Arc::clone(result));
                    }
                    Slot::Failed(err) => return Err(err.clone()),
                    Slot::Pending(in_flight) => Claim::Await(Arc::clone(in_flight)),
                },
                Entry::Vacant(entry) => {
                    let in_flight = Arc::new(InFlight::new());
                    entry.insert(Slot::Pending(Arc::clone(&in_flight)));
                    Claim::Construct(in_flight)
                }
            };

            match claim {
                Claim::Construct(in_flight) => return self.construct(name, &in_flight),
                Claim::Await(in_flight) => match in_flight.observe() {
                    Observed::Placeholder(result) => {
                        tracing::debug!(type_name = name, "Observed placeholder");
                        return Ok(result);
                    }
                    Observed::Settled => continue,
                    Observed::Reentered => {
                        return Err(ResolveError::CyclicReference {
                            name: name.to_string(),
                        })
                    }
                },
            }
        }
    }

    fn construct(
        &self,
        name: &str,
        in_flight: &InFlight,
    ) -> std::result::Result<Arc<CreationResult>, ResolveError> {
        tracing::debug!(type_name = name, "Cache miss, constructing");
        let mut guard = SettleOnUnwind {
            ctx: self,
            name,
            in_flight,
            armed: true,
        };
        let outcome = self.settle(name, self.build(name));
        guard.armed = false;
        in_flight.settle();
        outcome
    }

    /// Store the outcome of constructing `name`. A success whose references
    /// failed meanwhile is stored as a failure.
    fn settle(
        &self,
        name: &str,
        outcome: std::result::Result<Arc<CreationResult>, ResolveError>,
    ) -> std::result::Result<Arc<CreationResult>, ResolveError> {
        let mut deps = self.dependents.lock();
        let outcome = match (outcome, deps.doomed.remove(name)) {
            (Ok(_), Some(err)) => Err(err),
            (outcome, _) => outcome,
        };
        match &outcome {
            Ok(result) => {
                tracing::debug!(type_name = name, generated = result.type_name(), "Constructed");
                self.cache.insert(name.to_string(), Slot::Resolved(Arc::clone(result)));
            }
            Err(err) => {
                tracing::debug!(type_name = name, error = %err, "Construction failed");
                self.cache.insert(name.to_string(), Slot::Failed(err.clone()));
                self.fail_dependents(&mut deps, name);
            }
        }
        outcome
    }

    /// Fail every result that refers, directly or transitively, to `failed`
    fn fail_dependents(&self, deps: &mut Dependents, failed: &str) {
        let mut queue = vec![failed.to_string()];
        while let Some(cause) = queue.pop() {
            let Some(dependents) = deps.by_target.remove(&cause) else {
                continue;
            };
            for dependent in dependents {
                let Some(mut slot) = self.cache.get_mut(&dependent) else {
                    continue;
                };
                let in_flight = match &*slot {
                    Slot::Resolved(_) => false,
                    Slot::Pending(_) => true,
                    Slot::Failed(_) => continue,
                };
                let err = ResolveError::construction(&dependent, format!("depends on {cause}, which failed"));
                if in_flight {
                    drop(slot);
                    deps.doomed.entry(dependent.clone()).or_insert(err);
                    deps.caused_by.insert(dependent, cause.clone());
                } else {
                    tracing::debug!(type_name = %dependent, cause = %cause, "Failing dependent");
                    *slot = Slot::Failed(err);
                    drop(slot);
                    deps.caused_by.insert(dependent.clone(), cause.clone());
                    queue.push(dependent);
                }
            }
        }
    }

    /// Store `err` for a result that was already built
    fn reject(&self, name: &str, err: ResolveError) {
        let mut deps = self.dependents.lock();
        tracing::debug!(type_name = name, error = %err, "Rejected");
        self.cache.insert(name.to_string(), Slot::Failed(err));
        self.fail_dependents(&mut deps, name);
    }

    /// Resolve `name` on behalf of `dependent`, whose artifact will refer to it
    pub(crate) fn resolve_for(
        &self,
        dependent: &str,
        name: &str,
    ) -> std::result::Result<Arc<CreationResult>, ResolveError> {
        let result = self.resolve(name)?;
        if dependent != name {
            let mut deps = self.dependents.lock();
            let failed = matches!(self.cache.get(name).as_deref(), Some(Slot::Failed(_)));
            if failed {
                // failed after handing out its placeholder
                let err = ResolveError::construction(dependent, format!("depends on {name}, which failed"));
                deps.doomed.entry(dependent.to_string()).or_insert(err);
                deps.caused_by.insert(dependent.to_string(), name.to_string());
            } else {
                deps.by_target
                    .entry(name.to_string())
                    .or_default()
                    .insert(dependent.to_string());
            }
        }
        Ok(result)
    }

    fn build(&self, name: &str) -> std::result::Result<Arc<CreationResult>, ResolveError> {
        let decl = self
            .fetch_declaration(name)
            .ok_or_else(|| ResolveError::NotFound {
                name: name.to_string(),
            })?;
        self.record_hierarchy(name, &decl);

        let result = builders::build(self, name, &decl)?;
        if !result.is_finished() {
            return Err(ResolveError::construction(name, "builder produced no artifact"));
        }
        Ok(result)
    }

    /// Seed `name` with a placeholder before its construction completes.
    ///
    /// While `name` is PENDING, later lookups receive `result` instead of
    /// re-entering construction. An unseen name is registered directly.
    /// RESOLVED and FAILED entries are left untouched.
    pub fn register_expected(&self, name: &str, result: Arc<CreationResult>) {
        match self.cache.entry(name.to_string()) {
            Entry::Occupied(entry) => {
                if let Slot::Pending(in_flight) = entry.get() {
                    in_flight.set_placeholder(result);
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(Slot::Resolved(result));
            }
        }
    }

    /// Forget a recorded failure for `name`, and for every type that failed
    /// only because of it, then resolve `name` again
    pub fn retry(&self, name: &str) -> std::result::Result<Arc<CreationResult>, ResolveError> {
        {
            let mut deps = self.dependents.lock();
            deps.caused_by.remove(name);
            let mut queue = vec![name.to_string()];
            while let Some(cause) = queue.pop() {
                if self
                    .cache
                    .remove_if(&cause, |_, slot| matches!(slot, Slot::Failed(_)))
                    .is_none()
                {
                    continue;
                }
                let freed: Vec<String> = deps
                    .caused_by
                    .iter()
                    .filter(|(_, c)| **c == cause)
                    .map(|(dependent, _)| dependent.clone())
                    .collect();
                for dependent in freed {
                    deps.caused_by.remove(&dependent);
                    queue.push(dependent);
                }
            }
        }
        self.resolve(name)
    }

    pub fn state_of(&self, name: &str) -> ResolutionState {
        match self.cache.get(name).as_deref() {
            None => ResolutionState::Unseen,
            Some(Slot::Pending(_)) => ResolutionState::Pending,
            Some(Slot::Resolved(result)) if result.is_finished() => ResolutionState::Resolved,
            Some(Slot::Resolved(_)) => ResolutionState::Pending,
            Some(Slot::Failed(_)) => ResolutionState::Failed,
        }
    }

    /// The cached result for `name`, without constructing. A PENDING name
    /// yields its placeholder, if one is registered.
    pub fn cached(&self, name: &str) -> Option<Arc<CreationResult>> {
        match self.cache.get(name).as_deref() {
            Some(Slot::Resolved(result)) => Some(Arc::clone(result)),
            Some(Slot::Pending(in_flight)) => in_flight.placeholder(),
            _ => None,
        }
    }

    /// Every cache entry that cannot be written, sorted by type name
    pub fn failures(&self) -> Vec<ResolveError> {
        let mut failures: Vec<ResolveError> = self
            .cache
            .iter()
            .filter_map(|entry| match entry.value() {
                Slot::Failed(err) => Some(err.clone()),
                Slot::Resolved(result) if result.is_finished() => None,
                _ => Some(ResolveError::construction(entry.key(), "construction never completed")),
            })
            .collect();
        failures.sort_by(|a, b| a.type_name().cmp(b.type_name()));
        failures
    }

    /// Finished results, sorted by schema name
    pub fn resolved(&self) -> Vec<Arc<CreationResult>> {
        let mut resolved: Vec<(String, Arc<CreationResult>)> = self
            .cache
            .iter()
            .filter_map(|entry| match entry.value() {
                Slot::Resolved(result) if result.is_finished() => {
                    Some((entry.key().clone(), Arc::clone(result)))
                }
                _ => None,
            })
            .collect();
        resolved.sort_by(|a, b| a.0.cmp(&b.0));
        resolved.into_iter().map(|(_, result)| result).collect()
    }

    // =========================================================================
    // Hierarchy
    // =========================================================================

    /// Index `name`'s ancestry
    pub fn record_hierarchy(&self, name: &str, decl: &TypeDeclaration) {
        self.hierarchy
            .record(name, decl, &|parent| self.fetch_declaration(parent));
    }

    /// Index the ancestry of every type in the document
    pub fn index_document(&self) {
        for decl in &self.document.types {
            self.record_hierarchy(&decl.name, decl);
        }
    }

    pub fn children_of(&self, name: &str) -> BTreeSet<String> {
        self.hierarchy.children_of(name)
    }

    pub fn descendants_of(&self, name: &str) -> BTreeSet<String> {
        self.hierarchy.descendants_of(name)
    }

    pub fn hierarchy(&self) -> &ChildTypeIndex {
        &self.hierarchy
    }

    // =========================================================================
    // Support Artifacts
    // =========================================================================

    /// See [`SupportRegistry::register`]
    pub fn register_support(&self, build: impl FnOnce() -> TypeSpec) -> Arc<SupportArtifact> {
        self.support.register(build)
    }

    pub fn support(&self) -> &SupportRegistry {
        &self.support
    }

    /// Plugin identifiers requested by directives but not registered
    pub fn plugin_misses(&self) -> Vec<String> {
        self.plugin_misses.lock().iter().cloned().collect()
    }

    // =========================================================================
    // Output
    // =========================================================================

    /// Write every RESOLVED type and all support artifacts to `sink`.
    ///
    /// Types whose generated names or modules clash with another artifact
    /// are failed first. Failures do not stop the writes; they are reported
    /// together as [`GenerationError::Incomplete`] afterwards.
    pub fn create_all(&self, sink: &mut dyn ArtifactSink) -> Result<WriteSummary> {
        self.reject_name_clashes();
        let mut summary = WriteSummary::default();

        for result in self.resolved() {
            if let Some(source) = result.render() {
                sink.write(&result.module_name(), &source)?;
                tracing::info!(type_name = result.schema_name(), module = %result.module_name(), "Wrote type");
                summary.written.push(result.schema_name().to_string());
            }
        }
        summary.support_written = self.support.flush(sink)?;
        sink.finish()?;

        let failures = self.failures();
        if failures.is_empty() {
            Ok(summary)
        } else {
            Err(GenerationError::Incomplete { failures })
        }
    }
}

impl GenerationContext {
    /// Fail every resolved type sharing a generated name or module with
    /// another type or a support artifact
    fn reject_name_clashes(&self) {
        let mut claims: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for result in self.resolved() {
            for claim in result.claims() {
                claims.entry(claim).or_default().push(result.schema_name().to_string());
            }
        }
        for artifact in self.support.artifacts() {
            for claim in [format!("type {}", artifact.name()), format!("module {}", artifact.module_name())] {
                if let Some(owners) = claims.get_mut(&claim) {
                    owners.push(format!("support artifact {}", artifact.name()));
                }
            }
        }

        let mut rejected: BTreeMap<String, String> = BTreeMap::new();
        for (claim, owners) in &claims {
            if owners.len() < 2 {
                continue;
            }
            let types = owners.iter().filter(|owner| self.state_of(owner) == ResolutionState::Resolved);
            for owner in types {
                let others: Vec<&str> = owners
                    .iter()
                    .filter(|other| *other != owner)
                    .map(String::as_str)
                    .collect();
                rejected
                    .entry(owner.clone())
                    .or_insert_with(|| format!("{claim} is also generated for {}", others.join(", ")));
            }
        }
        for (name, reason) in rejected {
            tracing::warn!(type_name = %name, %reason, "Generated name clash");
            self.reject(&name, ResolveError::construction(&name, reason));
        }
    }
}

impl fmt::Debug for GenerationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationContext")
            .field("types", &self.document.types.len())
            .field("cached", &self.cache.len())
            .field("base_plugins", &self.base_plugins)
            .field("support", &self.support.len())
            .finish()
    }
}
