//! Hot reload message protocol.
//!
//! JSON messages exchanged with preview clients over the reload socket.
//!
//! # Message Types
//!
//! - `reload`: a debounced batch of file changes; clients re-render affected
//!   templates
//! - `connected`: handshake acknowledgment with server version
//! - `error` / `clear_error`: error overlay control

use serde::{Deserialize, Serialize};

use crate::render::result::ErrorObject;

/// What happened to a file, in watcher vocabulary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChangeEvent {
    Add,
    Change,
    Unlink,
}

/// One changed file in a reload batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ChangeRecord {
    pub event: ChangeEvent,
    /// Path relative to the documents root.
    pub filename: String,
}

impl ChangeRecord {
    pub fn new(event: ChangeEvent, filename: impl Into<String>) -> Self {
        Self {
            event,
            filename: filename.into(),
        }
    }
}

/// Hot reload message sent over the reload socket
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HotReloadMessage {
    /// Debounced change batch; affected templates should re-render
    Reload { changes: Vec<ChangeRecord> },

    /// Connection established
    Connected {
        /// Server version for compatibility check
        version: String,
    },

    /// Render error (display overlay, no reload)
    Error { path: String, error: ErrorObject },

    /// Clear error overlay (render succeeded after error)
    #[serde(rename = "clear_error")]
    ClearError,
}

impl HotReloadMessage {
    pub fn reload(changes: Vec<ChangeRecord>) -> Self {
        Self::Reload { changes }
    }

    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn error(path: impl Into<String>, error: ErrorObject) -> Self {
        Self::Error {
            path: path.into(),
            error,
        }
    }

    pub fn clear_error() -> Self {
        Self::ClearError
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload","changes":[]}"#.into())
    }

    /// Parse from JSON string
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}
