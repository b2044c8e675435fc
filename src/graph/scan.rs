//! Static import scanning for template modules.
//!
//! Reads source text and extracts relative import specifiers without
//! executing anything. Covers ES `import` declarations, `export ... from`
//! re-exports, and `require("...")` calls with a string literal argument.
//! Computed specifiers and dynamic `import()` expressions are invisible to
//! this pass; changes to such files will not trigger dependent reloads.

use regex::Regex;
use rustc_hash::FxHashSet;
use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use crate::utils::path::{is_hidden, normalize_path};

/// File extensions treated as module sources.
pub const MODULE_EXTENSIONS: &[&str] = &["tsx", "ts", "jsx", "js", "css"];

/// Extensions probed when a specifier omits one.
const RESOLVE_EXTENSIONS: &[&str] = &["tsx", "ts", "jsx", "js", "css"];

/// Directories never descended into during the initial walk.
const SKIP_DIRS: &[&str] = &["node_modules", "dist", "target"];

// `import defaultExport from "x"`, `import { a, b } from "x"`,
// `import * as ns from "x"`, and side-effect `import "x"`. The clause
// matcher allows newlines so multi-line named-import lists work.
static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"import\s+(?:[\w$*\s{},]+?\s+from\s+)?["']([^"']+)["']"#).unwrap()
});

// `export { a } from "x"` and `export * from "x"`.
static EXPORT_FROM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"export\s+(?:\*(?:\s+as\s+[\w$]+)?|[\w$\s{},]+?)\s+from\s+["']([^"']+)["']"#)
        .unwrap()
});

// `require("x")` with a string literal only.
static REQUIRE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"require\(\s*["']([^"']+)["']\s*\)"#).unwrap());

/// Extract raw import specifiers from source text, in order of appearance.
pub fn scan_imports(source: &str) -> Vec<String> {
    let mut seen = FxHashSet::default();
    let mut specs = Vec::new();

    for re in [&*IMPORT_RE, &*EXPORT_FROM_RE, &*REQUIRE_RE] {
        for cap in re.captures_iter(source) {
            let spec = &cap[1];
            if seen.insert(spec.to_owned()) {
                specs.push(spec.to_owned());
            }
        }
    }

    specs
}

/// Resolve a relative specifier against its importing file.
///
/// Bare specifiers (npm packages) return `None`; only `./` and `../` paths
/// participate in the graph. Resolution probes the literal path, then the
/// path with each known extension appended, then `<path>/index.<ext>`.
pub fn resolve_specifier(importer: &Path, spec: &str) -> Option<PathBuf> {
    if !spec.starts_with("./") && !spec.starts_with("../") {
        return None;
    }

    let base = importer.parent()?;
    let candidate = normalize_path(&base.join(spec));

    if candidate.is_file() {
        return Some(candidate);
    }

    for ext in RESOLVE_EXTENSIONS {
        // Append, never replace: "./report.v2" probes "report.v2.tsx"
        let mut probe = candidate.clone().into_os_string();
        probe.push(format!(".{ext}"));
        let probe = PathBuf::from(probe);
        if probe.is_file() {
            return Some(probe);
        }
    }

    for ext in RESOLVE_EXTENSIONS {
        let index = candidate.join(format!("index.{ext}"));
        if index.is_file() {
            return Some(index);
        }
    }

    None
}

/// Scan a file and resolve its relative imports to absolute paths.
///
/// Unreadable files yield an empty set; the graph entry then simply has no
/// edges until the file becomes readable again.
pub fn scan_file(path: &Path) -> FxHashSet<PathBuf> {
    let source = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            crate::debug!("graph"; "cannot read {}: {err}", path.display());
            return FxHashSet::default();
        }
    };

    scan_imports(&source)
        .iter()
        .filter_map(|spec| resolve_specifier(path, spec))
        .collect()
}

/// Whether a path looks like a module source worth tracking.
pub fn is_module_file(path: &Path) -> bool {
    if is_hidden(path) {
        return false;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| MODULE_EXTENSIONS.contains(&ext))
}

/// Walk `root` and collect every module file, skipping hidden entries and
/// vendored directories.
pub fn walk_modules(root: &Path) -> Vec<PathBuf> {
    jwalk::WalkDir::new(root)
        .skip_hidden(true)
        .process_read_dir(|_, _, _, children| {
            children.retain(|entry| {
                entry.as_ref().is_ok_and(|e| {
                    !(e.file_type().is_dir()
                        && e.file_name()
                            .to_str()
                            .is_some_and(|name| SKIP_DIRS.contains(&name)))
                })
            });
        })
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| normalize_path(&entry.path()))
        .filter(|path| is_module_file(path))
        .collect()
}
