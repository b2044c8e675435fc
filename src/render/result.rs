//! Rendering result wire types.
//!
//! Everything the preview client sees crosses this boundary: a successful
//! render carries markup plus timings, a failed one carries a structured
//! error object whose stack has already been source-mapped back to template
//! positions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error as it appears on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorObject {
    pub name: String,
    pub message: String,
    #[serde(default)]
    pub stack: String,
    #[serde(default)]
    pub cause: String,
}

impl ErrorObject {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: String::new(),
            cause: String::new(),
        }
    }
}

/// Pipeline failure, by stage.
#[derive(Debug, Error)]
pub enum RenderError {
    /// esbuild rejected the template.
    #[error("{}", .0.message)]
    Compile(ErrorObject),
    /// The bundle threw during evaluation or rendering.
    #[error("{}", .0.message)]
    Execution(ErrorObject),
    /// The template has no default export.
    #[error("{}", .0.message)]
    MissingDefaultExport(ErrorObject),
    /// Tooling failure on our side (spawn, protocol, IO).
    #[error(transparent)]
    Host(#[from] anyhow::Error),
}

impl RenderError {
    /// Build the compile variant from a bundler failure.
    pub fn compile(err: &anyhow::Error) -> Self {
        Self::Compile(ErrorObject {
            name: "BuildError".into(),
            message: format!("{err:#}"),
            stack: String::new(),
            cause: String::new(),
        })
    }

    /// The wire-visible error object for this failure.
    pub fn to_object(&self) -> ErrorObject {
        match self {
            Self::Compile(obj) | Self::Execution(obj) | Self::MissingDefaultExport(obj) => {
                obj.clone()
            }
            Self::Host(err) => ErrorObject {
                name: "InternalError".into(),
                message: format!("{err:#}"),
                stack: String::new(),
                cause: String::new(),
            },
        }
    }

    /// Apply a stack/message transform to the embedded error object.
    pub fn map_object(self, f: impl FnOnce(ErrorObject) -> ErrorObject) -> Self {
        match self {
            Self::Compile(obj) => Self::Compile(f(obj)),
            Self::Execution(obj) => Self::Execution(f(obj)),
            Self::MissingDefaultExport(obj) => Self::MissingDefaultExport(f(obj)),
            host @ Self::Host(_) => host,
        }
    }
}

/// Per-stage timings in milliseconds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Timing {
    /// End-to-end wall time.
    pub total: u64,
    /// Bundle evaluation and module loading inside the sandbox.
    pub component_load: u64,
    /// The `renderAsync` call itself.
    pub rendering: u64,
    /// Bundling and artifact collection.
    pub file_read: u64,
}

/// A successful render.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedDocument {
    /// Full markup with styles inlined.
    pub markup: String,
    /// Component markup before shell assembly.
    pub react_markup: String,
    /// The template's declared preview props, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_props: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<Timing>,
}

/// Wire shape for `POST /api/render`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RenderResponse {
    Success(RenderedDocument),
    Failure { error: ErrorObject },
}

impl RenderResponse {
    pub fn from_result(result: Result<RenderedDocument, RenderError>) -> Self {
        match result {
            Ok(doc) => Self::Success(doc),
            Err(err) => Self::Failure {
                error: err.to_object(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_serializes_camel_case() {
        let doc = RenderedDocument {
            markup: "<html></html>".into(),
            react_markup: "<div></div>".into(),
            preview_props: None,
            timing: Some(Timing {
                total: 120,
                component_load: 40,
                rendering: 30,
                file_read: 50,
            }),
        };
        let json = serde_json::to_value(RenderResponse::Success(doc)).unwrap();
        assert_eq!(json["reactMarkup"], "<div></div>");
        assert_eq!(json["timing"]["componentLoad"], 40);
        assert!(json.get("previewProps").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn failure_serializes_error_object() {
        let err = RenderError::Execution(ErrorObject::new("TypeError", "x is not a function"));
        let json = serde_json::to_value(RenderResponse::from_result(Err(err))).unwrap();
        assert_eq!(json["error"]["name"], "TypeError");
        assert_eq!(json["error"]["message"], "x is not a function");
    }

    #[test]
    fn missing_default_export_is_distinguishable() {
        let err = RenderError::MissingDefaultExport(ErrorObject::new(
            "Error",
            "/docs/Invoice.tsx does not contain a default export",
        ));
        assert!(err.to_object().message.contains("does not contain a default export"));
    }

    #[test]
    fn map_object_leaves_host_errors_alone() {
        let err = RenderError::Host(anyhow::anyhow!("spawn failed"));
        let mapped = err.map_object(|mut obj| {
            obj.stack = "changed".into();
            obj
        });
        assert!(matches!(mapped, RenderError::Host(_)));
    }
}
