//! Actor Message Definitions
//!
//! ```text
//! FsActor --Reload batch--> WsActor --broadcast--> Clients
//! ```

use crate::reload::message::ChangeRecord;
use crate::render::result::ErrorObject;

/// Messages to WebSocket Actor
pub enum WsMsg {
    /// Broadcast a debounced change batch
    Reload { changes: Vec<ChangeRecord> },
    /// Render error (display overlay, no reload)
    Error { path: String, error: ErrorObject },
    /// Clear error overlay (render succeeded after error)
    ClearError,
    /// Add client
    AddClient(std::net::TcpStream),
    /// Shutdown
    Shutdown,
}
