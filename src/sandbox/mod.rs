//! Sandboxed bundle execution.
//!
//! Each render evaluates the compiled bundle in a short-lived `node` child
//! process running the embedded harness (`embed/runner.js`). The harness
//! isolates the bundle in a `vm` context with a curated global allowlist,
//! renders the component, and answers over a one-shot JSON protocol:
//! request on stdin, response on stdout, then the child exits. The host
//! process never evaluates user code.

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::path::PathBuf;

use crate::{
    compiler::Bundle,
    config::Config,
    embed,
    render::result::{ErrorObject, RenderError},
    utils::exec::Cmd,
};

/// What a successful harness run hands back.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    /// Markup with the bundle's CSS inlined.
    pub markup: String,
    /// Component markup alone.
    pub react_markup: String,
    /// `previewProps` export (or `PreviewProps` static) if the template has one.
    pub preview_props: Option<serde_json::Value>,
    /// Time spent inside `renderAsync`, in milliseconds.
    pub render_ms: u64,
}

/// One-shot JSON response from the harness.
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum RunnerResponse {
    Ok {
        markup: String,
        #[serde(rename = "reactMarkup")]
        react_markup: String,
        #[serde(rename = "previewProps", default)]
        preview_props: Option<serde_json::Value>,
        #[serde(rename = "renderMs", default)]
        render_ms: u64,
    },
    Error {
        kind: String,
        error: ErrorObject,
    },
}

/// Execute a compiled bundle and render its default export.
///
/// `props` overrides the template's declared preview props when given.
pub fn execute(
    config: &Config,
    bundle: &Bundle,
    props: Option<&serde_json::Value>,
) -> Result<ExecOutput, RenderError> {
    let node = config.node_bin()?;
    let runner = runner_path()?;

    let request = serde_json::json!({
        "code": bundle.code,
        "path": bundle.template,
        "props": props,
        "css": bundle.css,
    });
    let payload = serde_json::to_vec(&request)
        .context("failed to encode sandbox request")
        .map_err(RenderError::Host)?;

    let output = Cmd::new(&node)
        .arg(&runner)
        // Keep experimental-feature warnings out of stderr we report to users
        .env("NODE_NO_WARNINGS", "1")
        .stdin(payload)
        .output()
        .map_err(RenderError::Host)?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let response: RunnerResponse = serde_json::from_str(stdout.trim()).map_err(|_| {
        let stderr = String::from_utf8_lossy(&output.stderr);
        RenderError::Host(anyhow!(
            "sandbox produced no response for {} ({})\n{}",
            bundle.template.display(),
            output.status,
            stderr.trim()
        ))
    })?;

    match response {
        RunnerResponse::Ok {
            markup,
            react_markup,
            preview_props,
            render_ms,
        } => Ok(ExecOutput {
            markup,
            react_markup,
            preview_props,
            render_ms,
        }),
        RunnerResponse::Error { kind, error } => Err(match kind.as_str() {
            "missing-default-export" => RenderError::MissingDefaultExport(error),
            _ => RenderError::Execution(error),
        }),
    }
}

/// Materialize the harness script once per process.
///
/// Concurrent writers race to the same content so a duplicate write is
/// harmless.
fn runner_path() -> Result<PathBuf, RenderError> {
    let path = std::env::temp_dir().join(format!("docforge-runner-{}.js", std::process::id()));
    if !path.is_file() {
        std::fs::write(&path, embed::RUNNER_JS)
            .with_context(|| format!("failed to write sandbox harness {}", path.display()))
            .map_err(RenderError::Host)?;
    }
    Ok(path)
}
