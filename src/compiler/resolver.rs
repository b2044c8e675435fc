//! Node-style resolution of the user's rendering package.
//!
//! Templates call `renderAsync` from `@docforge/render`. The copy that gets
//! bundled must be the one installed next to the template, not anything
//! shipped with this tool, or the React versions in the bundle and in the
//! user's components diverge. We resolve the package ourselves and splice
//! the absolute path into a synthetic bundle entry.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::utils::path::normalize_path;

/// Package that provides `renderAsync` to templates.
pub const RENDER_PACKAGE: &str = "@docforge/render";

/// Resolve the render package entry file from a template's directory.
///
/// Walks ancestor directories looking for `node_modules/@docforge/render`,
/// then honors the package manifest's `main` field, falling back to
/// `index.js`.
pub fn resolve_render_package(start: &Path) -> Result<PathBuf> {
    for dir in start.ancestors() {
        let pkg_dir = dir.join("node_modules").join(RENDER_PACKAGE);
        if pkg_dir.is_dir() {
            return package_entry(&pkg_dir).with_context(|| {
                format!("{RENDER_PACKAGE} found at {} but has no usable entry", pkg_dir.display())
            });
        }
    }
    anyhow::bail!(
        "cannot resolve {RENDER_PACKAGE} from {} (is {RENDER_PACKAGE} installed?)",
        start.display()
    )
}

/// Source text of the synthetic bundle entry.
///
/// Re-exports the template's named exports and default export, and appends
/// `renderAsync` from the resolved render package. The default export is
/// forwarded through a namespace import so a template without one still
/// bundles; the missing export is diagnosed at execution time where it can
/// carry a proper error.
pub fn synthetic_entry(template: &Path, render_entry: &Path) -> String {
    let template = js_string(template);
    let render = js_string(render_entry);
    format!(
        "import * as __template from {template};\n\
         export * from {template};\n\
         export default __template.default;\n\
         export {{ renderAsync }} from {render};\n"
    )
}

/// Quote a path as a JS string literal.
fn js_string(path: &Path) -> String {
    serde_json::to_string(&path.to_string_lossy()).unwrap_or_else(|_| "\"\"".to_owned())
}

fn package_entry(pkg_dir: &Path) -> Result<PathBuf> {
    let manifest = pkg_dir.join("package.json");
    if manifest.is_file() {
        let text = std::fs::read_to_string(&manifest)
            .with_context(|| format!("failed to read {}", manifest.display()))?;
        let json: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse {}", manifest.display()))?;
        if let Some(main) = json.get("main").and_then(|v| v.as_str()) {
            let entry = normalize_path(&pkg_dir.join(main));
            if entry.is_file() {
                return Ok(entry);
            }
        }
    }

    for name in ["index.js", "index.cjs"] {
        let entry = pkg_dir.join(name);
        if entry.is_file() {
            return Ok(normalize_path(&entry));
        }
    }

    anyhow::bail!("no entry file in {}", pkg_dir.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn resolves_from_ancestor_node_modules() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("node_modules").join(RENDER_PACKAGE);
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("package.json"), r#"{"main": "dist/main.js"}"#).unwrap();
        fs::create_dir(pkg.join("dist")).unwrap();
        fs::write(pkg.join("dist/main.js"), "module.exports = {};").unwrap();

        let docs = dir.path().join("documents");
        fs::create_dir(&docs).unwrap();

        let entry = resolve_render_package(&docs).unwrap();
        assert!(entry.ends_with("dist/main.js"));
    }

    #[test]
    fn falls_back_to_index_js() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("node_modules").join(RENDER_PACKAGE);
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("index.js"), "module.exports = {};").unwrap();

        let entry = resolve_render_package(dir.path()).unwrap();
        assert!(entry.ends_with("index.js"));
    }

    #[test]
    fn missing_package_carries_install_hint() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_render_package(dir.path()).unwrap_err();
        assert!(err.to_string().contains("is @docforge/render installed?"));
    }

    #[test]
    fn entry_reexports_template_and_render() {
        let entry = synthetic_entry(
            Path::new("/docs/Invoice.tsx"),
            Path::new("/docs/node_modules/@docforge/render/index.js"),
        );
        assert!(entry.contains(r#"import * as __template from "/docs/Invoice.tsx""#));
        assert!(entry.contains("export default __template.default"));
        assert!(entry.contains(r#"export { renderAsync } from "/docs/node_modules/@docforge/render/index.js""#));
    }
}
