//! WebSocket Actor - Bidirectional Communication
//!
//! This actor is responsible for:
//! - Managing reload-socket client connections
//! - Broadcasting change batches to all connected clients
//! - Receiving client messages (layout reports from the preview shell)
//!
//! # Architecture
//!
//! ```text
//! FsActor --[Reload batch]--> WsActor --[broadcast]--> Clients
//!                                ^                         |
//!                                +-----[layout report]-----+
//! ```
//!
//! No replay: a client that connects after a batch was broadcast only sees
//! later batches.

mod client_io;
mod delivery;
pub mod listener;

use std::net::TcpStream;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::messages::WsMsg;
use crate::reload::message::HotReloadMessage;
use crate::render::page_config::PageConfigStore;
use crate::render::result::ErrorObject;

/// WebSocket Actor - manages client connections and broadcasts
pub struct WsActor {
    /// Channel to receive messages
    rx: mpsc::Receiver<WsMsg>,
    /// Connected clients (shared for broadcast + read threads)
    clients: Arc<Mutex<Vec<WebSocket<TcpStream>>>>,
    /// Layout reports from preview shells land here
    pages: Arc<PageConfigStore>,
    /// Pending error to send to new clients (snapshot recovery)
    pending_error: Arc<Mutex<Option<(String, ErrorObject)>>>,
}

impl WsActor {
    /// Create a new WsActor
    pub fn new(rx: mpsc::Receiver<WsMsg>, pages: Arc<PageConfigStore>) -> Self {
        Self {
            rx,
            clients: Arc::new(Mutex::new(Vec::new())),
            pages,
            pending_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        // Spawn a background thread to poll client messages
        let clients_for_reader = Arc::clone(&self.clients);
        let pages_for_reader = Arc::clone(&self.pages);
        std::thread::spawn(move || {
            Self::client_reader_loop(clients_for_reader, pages_for_reader);
        });

        while let Some(msg) = self.rx.recv().await {
            match msg {
                WsMsg::Reload { changes } => {
                    crate::debug!("ws"; "broadcasting {} change(s)", changes.len());
                    let hr_msg = HotReloadMessage::reload(changes);
                    self.broadcast(Message::Text(hr_msg.to_json().into()));
                }

                WsMsg::Error { path, error } => {
                    // Cache error for new clients (snapshot recovery)
                    *self.pending_error.lock() = Some((path.clone(), error.clone()));
                    let hr_msg = HotReloadMessage::error(path, error);
                    self.broadcast(Message::Text(hr_msg.to_json().into()));
                }

                WsMsg::ClearError => {
                    let had_error = self.pending_error.lock().take().is_some();
                    if had_error {
                        let hr_msg = HotReloadMessage::clear_error();
                        self.broadcast(Message::Text(hr_msg.to_json().into()));
                    }
                }

                WsMsg::AddClient(stream) => {
                    self.add_client(stream);
                }

                WsMsg::Shutdown => {
                    crate::debug!("ws"; "shutting down");
                    let mut clients = self.clients.lock();
                    for mut client in clients.drain(..) {
                        let _ = client.close(None);
                    }
                    break;
                }
            }
        }
    }
}
