//! Actor Coordinator - Wires up the Hot Reload Actor System
//!
//! The Coordinator is a thin orchestrator that:
//! - Wires up actors over their channels
//! - Runs them concurrently
//! - Propagates shutdown

use std::sync::Arc;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::fs::FsActor;
use super::messages::WsMsg;
use super::ws::WsActor;
use crate::config::Config;
use crate::render::page_config::PageConfigStore;

pub const CHANNEL_BUFFER: usize = 32;

/// Coordinator - wires up and runs the actor system.
pub struct Coordinator {
    config: Arc<Config>,
    pages: Arc<PageConfigStore>,
    ws_tx: mpsc::Sender<WsMsg>,
    ws_rx: mpsc::Receiver<WsMsg>,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    pub fn new(
        config: Arc<Config>,
        pages: Arc<PageConfigStore>,
        ws_tx: mpsc::Sender<WsMsg>,
        ws_rx: mpsc::Receiver<WsMsg>,
    ) -> Self {
        Self {
            config,
            pages,
            ws_tx,
            ws_rx,
            shutdown_rx: None,
        }
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Run the actor system.
    pub async fn run(mut self) -> Result<()> {
        let fs_actor = FsActor::new(&self.config, self.ws_tx.clone())
            .map_err(|e| anyhow::anyhow!("watcher failed: {}", e))?;
        let ws_actor = WsActor::new(self.ws_rx, Arc::clone(&self.pages));

        crate::debug!("actor"; "start");

        let fs_handle = tokio::spawn(async move { fs_actor.run().await });
        let ws_handle = tokio::spawn(async move { ws_actor.run().await });

        if let Some(rx) = self.shutdown_rx.take() {
            loop {
                if rx.try_recv().is_ok() {
                    crate::debug!("actor"; "shutdown signal received");
                    break;
                }
                tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            }
        } else {
            tokio::select! {
                _ = fs_handle => {}
                _ = ws_handle => {}
            }
            crate::debug!("actor"; "stopped");
            return Ok(());
        }

        // Let the ws actor close client sockets before we return
        let _ = self.ws_tx.send(WsMsg::Shutdown).await;
        let _ = tokio::time::timeout(std::time::Duration::from_millis(500), ws_handle).await;

        crate::debug!("actor"; "stopped");
        Ok(())
    }
}
