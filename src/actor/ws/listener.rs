//! Reload socket listener.
//!
//! Accepts TCP connections and hands the raw streams to the WsActor over its
//! channel; the actor owns the handshake and all client state.

use std::net::TcpListener;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::actor::messages::WsMsg;

const MAX_PORT_RETRIES: u16 = 10;
/// Acceptor nap when no connection is pending.
const ACCEPT_POLL: Duration = Duration::from_millis(100);

/// Bind the reload socket at or near `base_port` and start accepting.
///
/// Returns the port actually bound; preview shells get it injected so they
/// connect to the right place even after a retry.
pub fn spawn(base_port: u16, ws_tx: mpsc::Sender<WsMsg>) -> Result<u16> {
    let (listener, port) = bind_near(base_port)?;
    listener.set_nonblocking(true)?;
    std::thread::spawn(move || accept_loop(listener, ws_tx));
    Ok(port)
}

fn accept_loop(listener: TcpListener, ws_tx: mpsc::Sender<WsMsg>) {
    loop {
        match listener.accept() {
            Ok((stream, addr)) => {
                crate::debug!("reload"; "client connected: {}", addr);

                // The actor handshakes in blocking mode, then flips the
                // socket to non-blocking for its poll loop
                let _ = stream.set_nonblocking(false);

                if ws_tx.blocking_send(WsMsg::AddClient(stream)).is_err() {
                    // Actor gone; nothing left to accept for
                    break;
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(ACCEPT_POLL);
            }
            Err(e) => {
                crate::log!("reload"; "accept error: {}", e);
                std::thread::sleep(ACCEPT_POLL);
            }
        }
    }
}

/// Bind `base_port`, walking upward while ports are taken.
fn bind_near(base_port: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(("127.0.0.1", port)) {
            Ok(listener) => {
                let port = listener.local_addr()?.port();
                return Ok((listener, port));
            }
            Err(e) => last_error = Some(e),
        }
    }

    anyhow::bail!(
        "no free reload port in {base_port}..{} ({})",
        base_port.saturating_add(MAX_PORT_RETRIES),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    )
}
