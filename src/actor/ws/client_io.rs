use std::net::TcpStream;
use std::sync::Arc;

use parking_lot::Mutex;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use crate::reload::message::HotReloadMessage;
use crate::render::page_config::{LayoutReport, PageConfigStore};

use super::WsActor;

impl WsActor {
    /// Add a new client connection
    pub(super) fn add_client(&self, stream: TcpStream) {
        // Keep blocking mode during handshake, switch to non-blocking after
        match tungstenite::accept(stream) {
            Ok(mut ws) => {
                // Now set non-blocking for polling reads
                let _ = ws.get_ref().set_nonblocking(true);

                // Send connected message
                let connected_msg = HotReloadMessage::connected();
                if let Err(e) = ws.send(Message::Text(connected_msg.to_json().into())) {
                    crate::log!("ws"; "failed to send connected message: {}", e);
                    return;
                }

                // Send pending error if any (snapshot recovery)
                if let Some((path, error)) = self.pending_error.lock().clone() {
                    let hr_msg = HotReloadMessage::error(path, error);
                    if let Err(e) = ws.send(Message::Text(hr_msg.to_json().into())) {
                        crate::log!("ws"; "failed to send pending error: {}", e);
                    } else {
                        crate::debug!("ws"; "sent pending error to new client");
                    }
                }

                let mut clients = self.clients.lock();
                crate::debug!("ws"; "client connected (total: {})", clients.len() + 1);
                clients.push(ws);
            }
            Err(e) => {
                crate::log!("ws"; "handshake failed: {}", e);
            }
        }
    }

    /// Background thread to read client messages (non-blocking poll)
    pub(super) fn client_reader_loop(
        clients: Arc<Mutex<Vec<WebSocket<TcpStream>>>>,
        pages: Arc<PageConfigStore>,
    ) {
        loop {
            std::thread::sleep(std::time::Duration::from_millis(100));

            let mut clients_guard = clients.lock();
            let mut disconnected = Vec::new();

            for (i, client) in clients_guard.iter_mut().enumerate() {
                // Non-blocking read
                match client.read() {
                    Ok(Message::Text(text)) => {
                        if let Some(report) = parse_layout_message(&text) {
                            crate::debug!("ws"; "layout: {} {} {}", report.document, report.document_size, report.document_orientation);
                            pages.report(report);
                        }
                    }
                    Ok(Message::Close(_)) => {
                        disconnected.push(i);
                    }
                    Err(tungstenite::Error::Io(ref e))
                        if e.kind() == std::io::ErrorKind::WouldBlock =>
                    {
                        // No data available, continue
                    }
                    Err(_) => {
                        disconnected.push(i);
                    }
                    _ => {}
                }
            }

            for i in disconnected.into_iter().rev() {
                clients_guard.remove(i);
            }
        }
    }
}

/// Parse a layout report from the preview shell.
///
/// The shell sends `{type:"layoutComplete", document, documentSize,
/// documentOrientation, timestamp}` after pagination settles.
fn parse_layout_message(text: &str) -> Option<LayoutReport> {
    let json = serde_json::from_str::<serde_json::Value>(text).ok()?;
    let kind = json.get("type").and_then(|t| t.as_str())?;
    if kind != "layoutComplete" && kind != "layout" {
        return None;
    }
    serde_json::from_value(json).ok()
}
