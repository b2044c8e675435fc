//! Dependency tracking for incremental re-renders.
//!
//! Tracks which template files import which other files, enabling precise
//! reload notifications when shared modules change.
//!
//! # Architecture
//!
//! ```text
//! DependencyGraph
//! ├── forward: Invoice.tsx → {components/Table.tsx, styles.css, ...}
//! └── reverse: components/Table.tsx → {Invoice.tsx, Receipt.tsx, ...}
//!
//! On change to a shared file:
//! 1. resolve_dependents(file) → every template transitively importing it
//! 2. Those templates are reported as changed to connected clients
//! ```
//!
//! All mutation happens on the watcher's event loop, one event at a time,
//! so the structure itself carries no locking.

pub mod scan;

use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};

use crate::utils::path::normalize_path;

/// Bidirectional import graph over the user's template files.
///
/// # Invariants
/// - Forward and reverse mappings are always consistent
/// - Paths are normalized for reliable matching
/// - Self-references are excluded
/// - A removed file appears in no dependency set; if it reappears, its
///   former dependents are relinked
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Forward: file → the files it imports
    forward: FxHashMap<PathBuf, FxHashSet<PathBuf>>,
    /// Reverse: file → the files that import it
    reverse: FxHashMap<PathBuf, FxHashSet<PathBuf>>,
    /// Removed file → the files that imported it at removal time.
    /// Consulted on upsert so delete-then-recreate keeps fan-out working.
    unlinked: FxHashMap<PathBuf, FxHashSet<PathBuf>>,
}

impl DependencyGraph {
    /// Create an empty dependency graph.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from every module file reachable under `root`.
    pub fn build(root: &Path) -> Self {
        let mut graph = Self::new();
        for file in scan::walk_modules(root) {
            let deps = scan::scan_file(&file);
            graph.record(&file, deps);
        }
        crate::debug!("graph"; "built: {} modules", graph.forward.len());
        graph
    }

    /// Record the import set for a file, replacing any previous entry.
    pub fn record(&mut self, file: &Path, imports: FxHashSet<PathBuf>) {
        let file = normalize_path(file);

        // Remove old mappings first (maintains invariant)
        self.remove_forward_entry(&file);

        // Exclude self-reference
        let deps: FxHashSet<PathBuf> = imports.into_iter().filter(|p| *p != file).collect();

        for dep in &deps {
            self.reverse
                .entry(dep.clone())
                .or_default()
                .insert(file.clone());
        }

        self.forward.insert(file, deps);
    }

    /// Incrementally re-scan a changed or added file and patch its edges.
    ///
    /// A file that was previously removed gets its former dependents
    /// re-scanned too, restoring the edges their unchanged sources still
    /// declare.
    pub fn upsert(&mut self, file: &Path) {
        let file = normalize_path(file);
        let deps = scan::scan_file(&file);
        self.record(&file, deps);

        if let Some(former) = self.unlinked.remove(&file) {
            for dependent in former {
                if dependent.is_file() {
                    let deps = scan::scan_file(&dependent);
                    self.record(&dependent, deps);
                }
            }
        }
    }

    /// Remove a deleted file: drop its node and strip it from every
    /// dependent's dependency set.
    pub fn remove(&mut self, file: &Path) {
        let file = normalize_path(file);
        self.remove_forward_entry(&file);
        if let Some(dependents) = self.reverse.remove(&file) {
            for dependent in &dependents {
                if let Some(deps) = self.forward.get_mut(dependent) {
                    deps.remove(&file);
                }
            }
            self.unlinked.insert(file, dependents);
        }
    }

    /// Files that directly import the given file.
    #[inline]
    pub fn dependents_of(&self, file: &Path) -> Option<&FxHashSet<PathBuf>> {
        self.reverse.get(file)
    }

    /// Files the given file directly imports.
    #[inline]
    pub fn dependencies_of(&self, file: &Path) -> Option<&FxHashSet<PathBuf>> {
        self.forward.get(file)
    }

    /// Transitive closure of dependents.
    ///
    /// Follows reverse edges repeatedly, collecting every file that directly
    /// or indirectly imports `file`. Iterative with a visited set so the
    /// traversal terminates on import cycles and never revisits a node.
    pub fn resolve_dependents(&self, file: &Path) -> Vec<PathBuf> {
        let start = normalize_path(file);
        let mut visited: FxHashSet<PathBuf> = FxHashSet::default();
        let mut result = Vec::new();
        let mut stack = vec![start.clone()];
        visited.insert(start);

        while let Some(current) = stack.pop() {
            let Some(dependents) = self.reverse.get(&current) else {
                continue;
            };
            for dependent in dependents {
                if visited.insert(dependent.clone()) {
                    result.push(dependent.clone());
                    stack.push(dependent.clone());
                }
            }
        }

        result
    }

    /// Every resolved file living outside `root`.
    ///
    /// These are shared modules (design-system files, utilities) reachable
    /// via imports; the watcher attaches explicit watch targets for them.
    pub fn external_files(&self, root: &Path) -> FxHashSet<PathBuf> {
        let root = normalize_path(root);
        self.forward
            .keys()
            .chain(self.reverse.keys())
            .filter(|p| !p.starts_with(&root))
            .cloned()
            .collect()
    }

    /// Number of tracked modules.
    #[inline]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Whether the graph is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    // =========================================================================
    // Private helpers
    // =========================================================================

    /// Remove forward entry and clean up corresponding reverse mappings.
    fn remove_forward_entry(&mut self, file: &Path) {
        let Some(old_deps) = self.forward.remove(file) else {
            return;
        };

        for dep in old_deps {
            if let Some(dependents) = self.reverse.get_mut(&dep) {
                dependents.remove(file);
                if dependents.is_empty() {
                    self.reverse.remove(&dep);
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    fn set(paths: &[&str]) -> FxHashSet<PathBuf> {
        paths.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn new_graph_is_empty() {
        let graph = DependencyGraph::new();
        assert!(graph.is_empty());
        assert!(graph.dependents_of(&path("/any.tsx")).is_none());
    }

    #[test]
    fn basic_recording() {
        let mut graph = DependencyGraph::new();
        graph.record(&path("/docs/Invoice.tsx"), set(&["/docs/components/Table.tsx"]));

        let users = graph
            .dependents_of(&path("/docs/components/Table.tsx"))
            .unwrap();
        assert!(users.contains(&path("/docs/Invoice.tsx")));
    }

    #[test]
    fn self_reference_excluded() {
        let mut graph = DependencyGraph::new();
        graph.record(
            &path("/docs/Invoice.tsx"),
            set(&["/docs/Invoice.tsx", "/docs/shared.ts"]),
        );

        assert!(graph.dependents_of(&path("/docs/Invoice.tsx")).is_none());
        assert!(
            graph
                .dependents_of(&path("/docs/shared.ts"))
                .unwrap()
                .contains(&path("/docs/Invoice.tsx"))
        );
    }

    #[test]
    fn update_replaces_old_dependencies() {
        let mut graph = DependencyGraph::new();

        graph.record(&path("/docs/Invoice.tsx"), set(&["/docs/old.ts"]));
        assert!(graph.dependents_of(&path("/docs/old.ts")).is_some());

        graph.record(&path("/docs/Invoice.tsx"), set(&["/docs/new.ts"]));

        assert!(graph.dependents_of(&path("/docs/old.ts")).is_none());
        assert!(
            graph
                .dependents_of(&path("/docs/new.ts"))
                .unwrap()
                .contains(&path("/docs/Invoice.tsx"))
        );
    }

    #[test]
    fn transitive_dependents_resolved() {
        // A imports B, B imports C: changing C affects both B and A
        let mut graph = DependencyGraph::new();
        graph.record(&path("/a.tsx"), set(&["/b.tsx"]));
        graph.record(&path("/b.tsx"), set(&["/c.tsx"]));

        let dependents = graph.resolve_dependents(&path("/c.tsx"));
        assert_eq!(dependents.len(), 2);
        assert!(dependents.contains(&path("/b.tsx")));
        assert!(dependents.contains(&path("/a.tsx")));
    }

    #[test]
    fn cyclic_imports_terminate() {
        // A imports B, B imports A: traversal must not loop
        let mut graph = DependencyGraph::new();
        graph.record(&path("/a.tsx"), set(&["/b.tsx"]));
        graph.record(&path("/b.tsx"), set(&["/a.tsx"]));

        // The start node is never reported as its own dependent
        let from_a = graph.resolve_dependents(&path("/a.tsx"));
        assert_eq!(from_a, vec![path("/b.tsx")]);

        let from_b = graph.resolve_dependents(&path("/b.tsx"));
        assert_eq!(from_b, vec![path("/a.tsx")]);
    }

    #[test]
    fn removal_prunes_edges() {
        let mut graph = DependencyGraph::new();
        graph.record(&path("/b.tsx"), set(&["/c.tsx"]));
        graph.remove(&path("/b.tsx"));

        // B's dependency set is gone and C no longer lists B
        assert!(graph.dependencies_of(&path("/b.tsx")).is_none());
        assert!(graph.dependents_of(&path("/c.tsx")).is_none());
    }

    #[test]
    fn removal_of_dependency_clears_reverse_entry() {
        let mut graph = DependencyGraph::new();
        graph.record(&path("/b.tsx"), set(&["/c.tsx"]));
        graph.remove(&path("/c.tsx"));

        assert!(graph.dependents_of(&path("/c.tsx")).is_none());
    }

    #[test]
    fn removal_strips_dependents_dependency_sets() {
        let mut graph = DependencyGraph::new();
        graph.record(&path("/b.tsx"), set(&["/c.tsx", "/d.tsx"]));
        graph.remove(&path("/c.tsx"));

        let deps = graph.dependencies_of(&path("/b.tsx")).unwrap();
        assert!(!deps.contains(&path("/c.tsx")));
        assert!(deps.contains(&path("/d.tsx")));
    }

    #[test]
    fn recreated_dependency_regains_dependents() {
        let dir = tempfile::tempdir().unwrap();
        let root = normalize_path(dir.path());
        let shared = root.join("shared.ts");
        let invoice = root.join("Invoice.tsx");
        std::fs::write(&shared, "export const x = 1;").unwrap();
        std::fs::write(&invoice, "import { x } from \"./shared\";").unwrap();

        let mut graph = DependencyGraph::build(&root);

        std::fs::remove_file(&shared).unwrap();
        graph.remove(&shared);
        assert!(graph.dependencies_of(&invoice).unwrap().is_empty());

        // The file comes back with the importer untouched
        std::fs::write(&shared, "export const x = 2;").unwrap();
        graph.upsert(&shared);

        assert_eq!(graph.resolve_dependents(&shared), vec![invoice]);
    }

    #[test]
    fn multiple_templates_share_dependency() {
        let mut graph = DependencyGraph::new();
        graph.record(&path("/Invoice.tsx"), set(&["/shared.tsx"]));
        graph.record(&path("/Receipt.tsx"), set(&["/shared.tsx"]));

        let users = graph.dependents_of(&path("/shared.tsx")).unwrap();
        assert_eq!(users.len(), 2);
    }

    #[test]
    fn external_files_detected() {
        let mut graph = DependencyGraph::new();
        graph.record(
            &path("/project/documents/Invoice.tsx"),
            set(&["/project/design-system/theme.ts"]),
        );

        let external = graph.external_files(&path("/project/documents"));
        assert_eq!(external.len(), 1);
        assert!(external.contains(&path("/project/design-system/theme.ts")));
    }

    #[test]
    fn empty_dependencies() {
        let mut graph = DependencyGraph::new();
        graph.record(&path("/Invoice.tsx"), FxHashSet::default());
        assert!(graph.dependents_of(&path("/Invoice.tsx")).is_none());
        assert_eq!(graph.len(), 1);
    }
}
