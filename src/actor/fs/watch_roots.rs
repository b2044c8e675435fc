use std::path::PathBuf;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;

/// Watch-target consistency manager.
///
/// Responsibility:
/// - Keep the documents root attached (recursively), re-attaching if the
///   directory is removed and recreated
/// - Keep one non-recursive watch per external file the dependency graph
///   reaches outside the root, added and removed as the graph changes
pub(super) struct WatchRoots {
    root: PathBuf,
    root_attached: bool,
    external: FxHashSet<PathBuf>,
}

impl WatchRoots {
    pub(super) fn new(root: PathBuf) -> Self {
        Self {
            root,
            root_attached: false,
            external: FxHashSet::default(),
        }
    }

    pub(super) fn attach_existing(
        &mut self,
        watcher: &mut RecommendedWatcher,
    ) -> notify::Result<()> {
        if self.root.exists() {
            watcher.watch(&self.root, RecursiveMode::Recursive)?;
            self.root_attached = true;
        }
        Ok(())
    }

    pub(super) fn maintain(&mut self, watcher: &mut RecommendedWatcher) {
        if self.root_attached && !self.root.exists() {
            self.root_attached = false;
        }

        if !self.root_attached
            && self.root.exists()
            && watcher.watch(&self.root, RecursiveMode::Recursive).is_ok()
        {
            self.root_attached = true;
            crate::debug!("watch"; "re-attached watch: {}", self.root.display());
        }
    }

    /// Reconcile explicit watches on files outside the root.
    pub(super) fn sync_external(
        &mut self,
        watcher: &mut RecommendedWatcher,
        desired: FxHashSet<PathBuf>,
    ) {
        let stale: Vec<PathBuf> = self.external.difference(&desired).cloned().collect();
        for path in stale {
            let _ = watcher.unwatch(&path);
            self.external.remove(&path);
            crate::debug!("watch"; "dropped external watch: {}", path.display());
        }

        for path in desired {
            if self.external.contains(&path) || !path.exists() {
                continue;
            }
            if watcher.watch(&path, RecursiveMode::NonRecursive).is_ok() {
                crate::debug!("watch"; "external watch: {}", path.display());
                self.external.insert(path);
            }
        }
    }
}
