//! The `publish` command: render a template and assemble a publish bundle.
//!
//! The bundle directory holds the compiled artifacts, the rendered markup
//! and a manifest tying them together. The manifest carries the markup hash
//! so a consumer can detect a re-render, and the page configuration so PDF
//! export can be parameterized without loading the document first.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::Cli;
use crate::compiler;
use crate::config::Config;
use crate::log;
use crate::render::Renderer;
use crate::render::page_config::{PageConfig, PageConfigStore};
use crate::utils::hash::ContentHash;
use crate::utils::path::absolutize;

/// `manifest.json` in the publish bundle.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Manifest {
    document: String,
    markup_hash: String,
    page_size: String,
    page_orientation: String,
}

pub fn run(cli: &Cli, file: &Path) -> Result<()> {
    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let template = absolutize(&cwd, file);
    let documents_dir = template
        .parent()
        .with_context(|| format!("template has no parent directory: {}", template.display()))?
        .to_path_buf();

    let config = Arc::new(Config::load(cli, &documents_dir)?);
    let pages = Arc::new(PageConfigStore::new());
    let renderer = Renderer::new(Arc::clone(&config), Arc::clone(&pages));

    let name = template
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());
    let stem = template
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".into());

    // One compile feeds both the artifacts and the render
    let bundle = compiler::compile(&config, &template)?;
    let document = renderer
        .render_bundle(&bundle, None)
        .map_err(|err| anyhow::anyhow!("{}", err.to_object().message))
        .with_context(|| format!("failed to render {name}"))?;

    let bundle_dir = config.output_dir().join(&stem);
    fs::create_dir_all(&bundle_dir)
        .with_context(|| format!("failed to create bundle dir {}", bundle_dir.display()))?;

    fs::write(bundle_dir.join("index.html"), &document.markup)?;
    fs::write(bundle_dir.join(format!("{stem}.js")), &bundle.code)?;
    if let Some(map) = &bundle.source_map {
        fs::write(bundle_dir.join(format!("{stem}.js.map")), map)?;
    }
    if let Some(css) = &bundle.css {
        fs::write(bundle_dir.join(format!("{stem}.css")), css)?;
    }

    let PageConfig {
        size, orientation, ..
    } = pages.get(&name);
    let manifest = Manifest {
        document: name,
        markup_hash: ContentHash::of(&document.markup).to_hex(),
        page_size: size,
        page_orientation: orientation,
    };
    fs::write(
        bundle_dir.join("manifest.json"),
        serde_json::to_vec_pretty(&manifest)?,
    )?;

    log!("publish"; "bundle ready at {}", bundle_dir.display());
    Ok(())
}
