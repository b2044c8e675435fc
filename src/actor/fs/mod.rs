//! FileSystem Actor
//!
//! Watches the documents root and broadcasts debounced change batches to the
//! WsActor. Implements the "Watcher-First" pattern for zero event loss.
//!
//! Architecture:
//! ```text
//! Watcher → Debouncer (pure timing) → Batch builder (graph update) → WsMsg
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify::RecommendedWatcher;
use tokio::sync::mpsc;

use super::messages::WsMsg;
use crate::config::Config;
use crate::graph::DependencyGraph;

// Graph update and wire-record assembly.
mod batch;
// Pure timing and deduplication.
mod debouncer;
// Shared fs event types.
mod types;
// Watch target attach/re-attach lifecycle.
mod watch_roots;

#[cfg(test)]
mod tests;

use debouncer::Debouncer;
use watch_roots::WatchRoots;

/// FileSystem Actor - watches for file changes
pub struct FsActor {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    watcher: RecommendedWatcher,
    /// Watch-target consistency layer (root + external imports)
    watch_roots: WatchRoots,
    /// Channel to send batches to WsActor
    ws_tx: mpsc::Sender<WsMsg>,
    /// Debouncer state
    debouncer: Debouncer,
    /// Live import graph over the documents root
    graph: DependencyGraph,
    /// Documents root, for wire-relative paths
    root: PathBuf,
}

impl FsActor {
    /// Create a new FsActor with Watcher-First pattern
    ///
    /// The watcher starts immediately, buffering events while the caller
    /// finishes startup. This eliminates the "vacuum period".
    pub fn new(config: &Arc<Config>, ws_tx: mpsc::Sender<WsMsg>) -> notify::Result<Self> {
        // Create sync channel for notify (it doesn't support async)
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        // Create and configure watcher IMMEDIATELY
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        let root = config.documents.clone();
        let mut watch_roots = WatchRoots::new(root.clone());
        watch_roots.attach_existing(&mut watcher)?;

        // Events are now buffering in notify_rx while the graph builds
        let graph = DependencyGraph::build(&root);
        watch_roots.sync_external(&mut watcher, graph.external_files(&root));

        Ok(Self {
            notify_rx,
            watcher,
            watch_roots,
            ws_tx,
            debouncer: Debouncer::new(Duration::from_millis(config.serve.debounce_ms)),
            graph,
            root,
        })
    }

    /// Run the actor event loop
    pub async fn run(self) {
        // Extract fields before consuming self
        let notify_rx = self.notify_rx;
        let ws_tx = self.ws_tx.clone();
        let root = self.root;
        let mut debouncer = self.debouncer;
        let mut watcher = self.watcher;
        let mut watch_roots = self.watch_roots;
        let mut graph = self.graph;

        let (async_tx, mut async_rx) = tokio::sync::mpsc::channel::<notify::Event>(64);

        // Spawn a thread to poll notify events and send to async channel
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break; // Receiver dropped
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            tokio::select! {
                biased;
                Some(event) = async_rx.recv() => debouncer.add_event(&event),
                _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                    // Ensure watch targets remain attached.
                    watch_roots.maintain(&mut watcher);

                    if process_changes(&mut debouncer, &ws_tx, &mut graph, &root).await.is_err() {
                        break;
                    }

                    // Imports may now reach different files outside the root.
                    watch_roots.sync_external(&mut watcher, graph.external_files(&root));
                }
            }
        }
    }
}

/// Process debounced file changes
///
/// Returns `Err(())` if WsActor shut down
async fn process_changes(
    debouncer: &mut Debouncer,
    ws_tx: &mpsc::Sender<WsMsg>,
    graph: &mut DependencyGraph,
    root: &std::path::Path,
) -> Result<(), ()> {
    let Some(raw_events) = debouncer.take_if_ready() else {
        return Ok(());
    };

    let changes = batch::build_batch(raw_events, graph, root);
    if changes.is_empty() {
        return Ok(());
    }

    crate::log!("watch"; "{} change(s)", changes.len());
    ws_tx
        .send(WsMsg::Reload { changes })
        .await
        .map_err(|_| ())
}
