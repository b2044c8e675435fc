use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};

use super::types::ChangeKind;
use crate::{
    graph::{DependencyGraph, scan},
    reload::message::{ChangeEvent, ChangeRecord},
    utils::path::is_hidden,
};

/// Turn raw debounced changes into the outgoing reload batch.
///
/// Each change patches the dependency graph, then every template that
/// transitively imports the changed file is appended as a synthetic `change`
/// record. Hidden files are excluded and duplicates collapse to the first
/// record for a filename.
pub(super) fn build_batch(
    raw: FxHashMap<PathBuf, ChangeKind>,
    graph: &mut DependencyGraph,
    root: &Path,
) -> Vec<ChangeRecord> {
    // Stable order so batches are deterministic
    let mut entries: Vec<_> = raw.into_iter().collect();
    entries.sort();

    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut records = Vec::new();

    for (path, kind) in entries {
        if is_hidden(&path) || !scan::is_module_file(&path) {
            continue;
        }

        // Dependents must be resolved before a removal drops the edges
        let dependents = graph.resolve_dependents(&path);
        match kind {
            ChangeKind::Created | ChangeKind::Modified => graph.upsert(&path),
            ChangeKind::Removed => graph.remove(&path),
        }

        let filename = relative_name(&path, root);
        if seen.insert(filename.clone()) {
            records.push(ChangeRecord::new(kind.event(), filename));
        }

        for dependent in dependents {
            if is_hidden(&dependent) {
                continue;
            }
            let filename = relative_name(&dependent, root);
            if seen.insert(filename.clone()) {
                records.push(ChangeRecord::new(ChangeEvent::Change, filename));
            }
        }
    }

    records
}

/// Path as presented on the wire: relative to the documents root when
/// inside it, absolute otherwise.
fn relative_name(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}
