//! Hot reload actor system.
//!
//! ```text
//! FsActor --Reload batch--> WsActor --broadcast--> preview clients
//! ```
//!
//! The FsActor owns the watcher, the debouncer and the dependency graph;
//! the WsActor owns every client socket. The Coordinator wires them up.

pub mod coordinator;
pub mod fs;
pub mod messages;
pub mod ws;
