//! The `dev` command: preview server with hot reload.
//!
//! Wiring, in startup order:
//! 1. reload socket listener (port is injected into every preview shell)
//! 2. HTTP server on its own thread (render API and preview pages)
//! 3. actor system on a tokio runtime (watcher, debouncer, broadcast hub)
//!
//! Ctrl+C fans a shutdown signal out to the HTTP loop and the coordinator.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use crate::actor::coordinator::{CHANNEL_BUFFER, Coordinator};
use crate::actor::ws::listener;
use crate::cli::Cli;
use crate::config::Config;
use crate::log;
use crate::render::Renderer;
use crate::render::page_config::PageConfigStore;
use crate::server::DevServer;

pub fn run(cli: &Cli, dir: &Path) -> Result<()> {
    let config = Arc::new(Config::load(cli, dir)?);
    anyhow::ensure!(
        config.documents.is_dir(),
        "documents directory not found: {}",
        config.documents.display()
    );

    let (ws_tx, ws_rx) = mpsc::channel(CHANNEL_BUFFER);

    // Reload socket first so its real port can be baked into preview pages
    let ws_port = listener::spawn(config.serve.port + 1, ws_tx.clone())?;
    crate::debug!("dev"; "reload socket on port {ws_port}");

    let pages = Arc::new(PageConfigStore::new());
    let renderer = Arc::new(Renderer::new(Arc::clone(&config), Arc::clone(&pages)));

    // One signal per consumer: the HTTP loop and the coordinator
    let (shutdown_tx, shutdown_rx) = crossbeam::channel::bounded(2);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(());
        let _ = shutdown_tx.send(());
    })
    .context("failed to install Ctrl+C handler")?;

    let http_handle = {
        let server = DevServer::new(
            Arc::clone(&config),
            renderer,
            ws_tx.clone(),
            ws_port,
        );
        let rx = shutdown_rx.clone();
        std::thread::spawn(move || {
            if let Err(e) = server.run(rx) {
                log!("serve"; "server error: {e:#}");
            }
        })
    };

    log!("dev"; "watching {}", config.documents.display());

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(
        Coordinator::new(config, pages, ws_tx, ws_rx)
            .with_shutdown_signal(shutdown_rx)
            .run(),
    )?;

    let _ = http_handle.join();
    log!("dev"; "stopped");
    Ok(())
}
