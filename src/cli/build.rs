//! The `build` command: compile one template to on-disk artifacts.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::Cli;
use crate::compiler;
use crate::config::Config;
use crate::log;
use crate::utils::path::absolutize;

pub fn run(cli: &Cli, file: &Path) -> Result<()> {
    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let template = absolutize(&cwd, file);
    let documents_dir = template
        .parent()
        .with_context(|| format!("template has no parent directory: {}", template.display()))?
        .to_path_buf();

    let config = Config::load(cli, &documents_dir)?;
    let bundle = compiler::compile(&config, &template)?;

    let out_dir = config.output_dir();
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create output dir {}", out_dir.display()))?;

    let stem = template
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bundle".into());

    let mut written = 1;
    fs::write(out_dir.join(format!("{stem}.js")), &bundle.code)?;
    if let Some(map) = &bundle.source_map {
        fs::write(out_dir.join(format!("{stem}.js.map")), map)?;
        written += 1;
    }
    if let Some(css) = &bundle.css {
        fs::write(out_dir.join(format!("{stem}.css")), css)?;
        written += 1;
    }

    log!("build"; "wrote {written} artifact(s) to {}", out_dir.display());
    Ok(())
}
