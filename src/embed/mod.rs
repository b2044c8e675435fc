//! Embedded JavaScript assets.
//!
//! - `runner.js` - sandbox harness executed by the node child process
//! - `paginate.js` - preview-shell client script with typed variable injection

mod template;

pub use template::{Template, TemplateVars};

/// Sandbox harness source. No variables; the request travels over stdin.
pub const RUNNER_JS: &str = include_str!("runner.js");

/// Variables for paginate.js.
pub struct PaginateVars {
    /// Reload-socket port.
    pub ws_port: u16,
    /// Template path relative to the documents root, as sent in change batches.
    pub document: String,
}

impl TemplateVars for PaginateVars {
    fn apply(&self, content: &str) -> String {
        content
            .replace("__DOCFORGE_WS_PORT__", &self.ws_port.to_string())
            .replace(
                "__DOCFORGE_DOCUMENT__",
                &serde_json::to_string(&self.document).unwrap_or_else(|_| "\"\"".into()),
            )
    }
}

/// Pagination and reload-bridge script with port/path injection.
pub const PAGINATE_JS: Template<PaginateVars> = Template::new(include_str!("paginate.js"));
