//! The one-level dependency graph used for cascade invalidation.

use std::collections::{BTreeMap, BTreeSet};

/// Directed depends-on edges between files.
///
/// For each file, records the set of files it *directly* depends on. The
/// graph is advisory: it widens invalidation (a file is rebuilt when a direct
/// dependency changed) and never implies processing order or ownership.
/// Lookups are one level deep by design; transitive chains are not followed.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    edges: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the graph from the persisted adjacency lists.
    pub fn from_document(dependencies: &BTreeMap<String, Vec<String>>) -> Self {
        let mut graph = Self::new();
        for (path, deps) in dependencies {
            for dep in deps {
                graph.add_dependency(path, dep);
            }
        }
        graph
    }

    /// Converts the graph back into the persistable adjacency form.
    pub fn to_document(&self) -> BTreeMap<String, Vec<String>> {
        self.edges
            .iter()
            .filter(|(_, deps)| !deps.is_empty())
            .map(|(path, deps)| (path.clone(), deps.iter().cloned().collect()))
            .collect()
    }

    /// Records that `path` directly depends on `dependency`.
    ///
    /// Duplicate edges and insertion order are irrelevant. Self-edges are
    /// ignored. Returns `true` if the edge was new.
    pub fn add_dependency(&mut self, path: &str, dependency: &str) -> bool {
        if path == dependency {
            return false;
        }
        self.edges
            .entry(path.to_string())
            .or_default()
            .insert(dependency.to_string())
    }

    /// Returns the direct dependencies of `path`, if any were recorded.
    pub fn dependencies_of(&self, path: &str) -> Option<&BTreeSet<String>> {
        self.edges.get(path).filter(|deps| !deps.is_empty())
    }

    /// Returns every file whose dependency list contains `path`.
    ///
    /// This is the reverse lookup used to cascade an invalidation one level
    /// up to the files that consume a changed file.
    pub fn dependents_of(&self, path: &str) -> Vec<String> {
        self.edges
            .iter()
            .filter(|(_, deps)| deps.contains(path))
            .map(|(dependent, _)| dependent.clone())
            .collect()
    }

    /// Removes `path` from the graph entirely: its own dependency list and
    /// every edge pointing at it.
    pub fn remove_path(&mut self, path: &str) {
        self.edges.remove(path);
        for deps in self.edges.values_mut() {
            deps.remove(path);
        }
    }

    /// Total number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(|deps| deps.len()).sum()
    }
}
