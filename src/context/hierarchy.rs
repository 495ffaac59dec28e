//! Type hierarchy index
//!
//! Directed graph of declared inheritance, one edge per parent → child.
//! Only grows during a run.

use std::collections::{BTreeSet, HashMap, HashSet};

use parking_lot::RwLock;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use petgraph::Direction;

use crate::schema::TypeDeclaration;

#[derive(Debug, Default)]
struct HierarchyGraph {
    graph: DiGraph<String, ()>,
    node_indices: HashMap<String, NodeIndex>,
    /// Types whose parent lists have been walked
    indexed: HashSet<String>,
}

impl HierarchyGraph {
    fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.node_indices.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.node_indices.insert(name.to_string(), idx);
        idx
    }
}

/// Parent → children relationships among named types
#[derive(Debug, Default)]
pub struct ChildTypeIndex {
    inner: RwLock<HierarchyGraph>,
}

impl ChildTypeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `name` as a child of each declared parent, indexing every
    /// parent's own ancestry first. `fetch` locates parent declarations;
    /// unknown parents still receive the edge.
    pub fn record(
        &self,
        name: &str,
        decl: &TypeDeclaration,
        fetch: &dyn Fn(&str) -> Option<TypeDeclaration>,
    ) {
        let mut visiting = HashSet::new();
        let mut edges = Vec::new();
        self.collect(name, decl, fetch, &mut visiting, &mut edges);

        let mut inner = self.inner.write();
        for (parent, child) in &edges {
            let from = inner.node(parent);
            let to = inner.node(child);
            inner.graph.update_edge(from, to, ());
        }
        inner.indexed.extend(visiting);
        if !edges.is_empty() {
            tracing::trace!(type_name = name, edges = edges.len(), "Recorded hierarchy");
        }
    }

    fn collect(
        &self,
        name: &str,
        decl: &TypeDeclaration,
        fetch: &dyn Fn(&str) -> Option<TypeDeclaration>,
        visiting: &mut HashSet<String>,
        edges: &mut Vec<(String, String)>,
    ) {
        if self.inner.read().indexed.contains(name) || !visiting.insert(name.to_string()) {
            return;
        }

        for parent in &decl.parents {
            if parent == name {
                continue;
            }
            if let Some(parent_decl) = fetch(parent) {
                self.collect(parent, &parent_decl, fetch, visiting, edges);
            }
        }

        for parent in decl.parents.iter().filter(|p| *p != name) {
            edges.push((parent.clone(), name.to_string()));
        }
    }

    /// Immediate children of `name`; empty if none recorded
    pub fn children_of(&self, name: &str) -> BTreeSet<String> {
        let inner = self.inner.read();
        let Some(&idx) = inner.node_indices.get(name) else {
            return BTreeSet::new();
        };
        inner
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|child| inner.graph[child].clone())
            .collect()
    }

    /// Every transitive child of `name`, excluding `name` itself
    pub fn descendants_of(&self, name: &str) -> BTreeSet<String> {
        let inner = self.inner.read();
        let Some(&start) = inner.node_indices.get(name) else {
            return BTreeSet::new();
        };

        let mut descendants = BTreeSet::new();
        let mut bfs = Bfs::new(&inner.graph, start);
        while let Some(idx) = bfs.next(&inner.graph) {
            if idx != start {
                descendants.insert(inner.graph[idx].clone());
            }
        }
        descendants
    }

    pub fn is_indexed(&self, name: &str) -> bool {
        self.inner.read().indexed.contains(name)
    }
}
