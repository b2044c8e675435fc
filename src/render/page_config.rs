//! Per-template page configuration reported by the preview client.
//!
//! The paginate script measures the document in the browser and reports
//! size and orientation over the reload socket. The store keeps the latest
//! report per template; `publish` embeds it in the bundle manifest so PDF
//! export can be parameterized without re-measuring.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Inbound layout report from the preview client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LayoutReport {
    /// Template path relative to the documents root.
    pub document: String,
    pub document_size: String,
    pub document_orientation: String,
    #[serde(default)]
    pub timestamp: u64,
}

/// Latest known page configuration for one template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageConfig {
    pub size: String,
    pub orientation: String,
    pub timestamp: u64,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            size: "A4".into(),
            orientation: "portrait".into(),
            timestamp: 0,
        }
    }
}

/// Shared store of layout reports, keyed by relative template path.
#[derive(Debug, Default)]
pub struct PageConfigStore {
    inner: Mutex<FxHashMap<String, PageConfig>>,
}

impl PageConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a layout report, keeping the newest per template.
    pub fn report(&self, report: LayoutReport) {
        let mut inner = self.inner.lock();
        let entry = inner.entry(report.document).or_default();
        if report.timestamp >= entry.timestamp {
            entry.size = report.document_size;
            entry.orientation = report.document_orientation;
            entry.timestamp = report.timestamp;
        }
    }

    /// Page configuration for a template, defaulting to A4 portrait.
    pub fn get(&self, document: &str) -> PageConfig {
        self.inner.lock().get(document).cloned().unwrap_or_default()
    }
}
