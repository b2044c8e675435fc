//! esbuild invocation and artifact collection.

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use crate::{
    config::Config,
    utils::{exec::Cmd, hash::ContentHash, path::normalize_path},
};

use super::resolver;

/// Compiled artifacts for one template, read back into memory.
#[derive(Debug, Clone)]
pub struct Bundle {
    /// Absolute path of the source template.
    pub template: PathBuf,
    /// CommonJS bundle text.
    pub code: String,
    /// External source map JSON, sources rewritten to absolute paths.
    pub source_map: Option<String>,
    /// Extracted CSS, if the template imported any.
    pub css: Option<String>,
}

/// Compile one template to a self-contained CommonJS bundle.
///
/// The scratch output directory is removed before returning; callers that
/// want artifacts on disk (the `build` command) write them from the returned
/// [`Bundle`].
pub fn compile(config: &Config, template: &Path) -> Result<Bundle> {
    let template = normalize_path(template);
    anyhow::ensure!(template.is_file(), "template not found: {}", template.display());
    let template_dir = template
        .parent()
        .with_context(|| format!("template has no parent directory: {}", template.display()))?;

    let render_entry = resolver::resolve_render_package(template_dir)?;

    let out_dir = scratch_dir(&template)?;
    let result = run_esbuild(config, &template, template_dir, &render_entry, &out_dir);
    let _ = fs::remove_dir_all(&out_dir);
    result
}

fn run_esbuild(
    config: &Config,
    template: &Path,
    template_dir: &Path,
    render_entry: &Path,
    out_dir: &Path,
) -> Result<Bundle> {
    let entry_path = out_dir.join("entry.tsx");
    fs::write(&entry_path, resolver::synthetic_entry(template, render_entry))
        .with_context(|| format!("failed to write bundle entry {}", entry_path.display()))?;

    let esbuild = config.esbuild_bin()?;
    let output = Cmd::new(&esbuild)
        .arg(&entry_path)
        .args([
            "--bundle",
            "--format=cjs",
            "--platform=node",
            "--jsx=automatic",
            "--minify",
            "--sourcemap=external",
            "--loader:.css=css",
            r#"--define:process.env.NODE_ENV="development""#,
        ])
        .arg(format!("--outdir={}", out_dir.display()))
        // Resolve react and friends from the template's own node_modules
        .cwd(template_dir)
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "esbuild failed for {}\n{}",
            template.display(),
            stderr.trim()
        );
    }

    collect_artifacts(template, template_dir, out_dir)
}

/// Gather esbuild outputs from the scratch directory, classified by
/// extension alone: `.js` bundle, `.map` source map, `.css` styles.
fn collect_artifacts(template: &Path, template_dir: &Path, out_dir: &Path) -> Result<Bundle> {
    let mut code = None;
    let mut source_map = None;
    let mut css = None;

    for entry in fs::read_dir(out_dir)
        .with_context(|| format!("failed to read bundle output dir {}", out_dir.display()))?
    {
        let path = entry?.path();
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        match ext {
            "js" => code = Some(fs::read_to_string(&path)?),
            "map" => source_map = Some(fs::read_to_string(&path)?),
            "css" => css = Some(fs::read_to_string(&path)?),
            _ => {}
        }
    }

    let code = code.with_context(|| {
        format!("esbuild produced no .js output for {}", template.display())
    })?;

    let source_map = source_map.map(|map| rewrite_map_sources(&map, out_dir, template_dir));

    Ok(Bundle {
        template: template.to_path_buf(),
        code,
        source_map,
        css,
    })
}

/// Rewrite the map's `sources` to absolute paths and clear `sourceRoot`.
///
/// esbuild emits sources relative to the map's directory; downstream stack
/// remapping and editors need stable absolute paths. A map that fails to
/// parse is passed through untouched.
fn rewrite_map_sources(map: &str, map_dir: &Path, fallback_dir: &Path) -> String {
    let Ok(mut json) = serde_json::from_str::<serde_json::Value>(map) else {
        return map.to_owned();
    };

    if let Some(obj) = json.as_object_mut() {
        obj.insert("sourceRoot".into(), serde_json::Value::String(String::new()));
        if let Some(sources) = obj.get_mut("sources").and_then(|s| s.as_array_mut()) {
            for source in sources {
                if let Some(rel) = source.as_str() {
                    let path = Path::new(rel);
                    let abs = if path.is_absolute() {
                        normalize_path(path)
                    } else if rel.starts_with("./") || rel.starts_with("../") {
                        normalize_path(&map_dir.join(path))
                    } else {
                        normalize_path(&fallback_dir.join(path))
                    };
                    *source = serde_json::Value::String(abs.to_string_lossy().into_owned());
                }
            }
        }
    }

    serde_json::to_string(&json).unwrap_or_else(|_| map.to_owned())
}

/// Per-compile scratch directory under the system temp dir.
fn scratch_dir(template: &Path) -> Result<PathBuf> {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let tag = ContentHash::of(template.to_string_lossy().as_bytes());
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!(
        "docforge-{}-{tag}-{seq}",
        std::process::id()
    ));
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create scratch dir {}", dir.display()))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_sources_become_absolute() {
        let map = r#"{"version":3,"sources":["../docs/Invoice.tsx","./entry.tsx"],"mappings":""}"#;
        let rewritten = rewrite_map_sources(map, Path::new("/tmp/scratch"), Path::new("/docs"));
        let json: serde_json::Value = serde_json::from_str(&rewritten).unwrap();

        let sources: Vec<&str> = json["sources"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s.as_str().unwrap())
            .collect();
        assert_eq!(sources, vec!["/tmp/docs/Invoice.tsx", "/tmp/scratch/entry.tsx"]);
        assert_eq!(json["sourceRoot"], "");
    }

    #[test]
    fn bare_relative_sources_resolve_against_template_dir() {
        let map = r#"{"version":3,"sources":["Invoice.tsx"],"mappings":""}"#;
        let rewritten = rewrite_map_sources(map, Path::new("/tmp/scratch"), Path::new("/docs"));
        let json: serde_json::Value = serde_json::from_str(&rewritten).unwrap();
        assert_eq!(json["sources"][0], "/docs/Invoice.tsx");
    }

    #[test]
    fn unparsable_map_passed_through() {
        let garbage = "not a source map";
        assert_eq!(
            rewrite_map_sources(garbage, Path::new("/tmp"), Path::new("/docs")),
            garbage
        );
    }

    #[test]
    fn scratch_dirs_are_unique() {
        let a = scratch_dir(Path::new("/docs/Invoice.tsx")).unwrap();
        let b = scratch_dir(Path::new("/docs/Invoice.tsx")).unwrap();
        assert_ne!(a, b);
        let _ = fs::remove_dir_all(a);
        let _ = fs::remove_dir_all(b);
    }
}
