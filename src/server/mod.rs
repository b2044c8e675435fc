//! Development HTTP server.
//!
//! `tiny_http` request loop serving the preview API:
//! - `GET /api/documents` - template files under the documents root
//! - `POST /api/render` - render one template, JSON in/out
//! - `GET /preview/<path>` - assembled HTML shell, rendered on demand
//!
//! Render failures become structured JSON responses; they never kill the
//! server.

use std::{
    io::Read,
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result};
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use tokio::sync::mpsc;

use crate::{
    actor::messages::WsMsg,
    config::Config,
    graph::scan,
    log,
    render::Renderer,
    render::result::{ErrorObject, RenderResponse},
    utils::path::normalize_path,
};

const MAX_PORT_RETRIES: u16 = 10;
const JSON: &str = "application/json; charset=utf-8";
const HTML: &str = "text/html; charset=utf-8";
const PLAIN: &str = "text/plain; charset=utf-8";

/// Body of `POST /api/render`.
#[derive(Debug, Deserialize)]
struct RenderRequest {
    /// Template path relative to the documents root.
    path: String,
    /// Props overriding the template's preview props.
    #[serde(default)]
    props: Option<serde_json::Value>,
}

/// The preview HTTP server.
pub struct DevServer {
    config: Arc<Config>,
    renderer: Arc<Renderer>,
    ws_tx: mpsc::Sender<WsMsg>,
    ws_port: u16,
}

impl DevServer {
    pub fn new(
        config: Arc<Config>,
        renderer: Arc<Renderer>,
        ws_tx: mpsc::Sender<WsMsg>,
        ws_port: u16,
    ) -> Self {
        Self {
            config,
            renderer,
            ws_tx,
            ws_port,
        }
    }

    /// Bind with port retry and run the request loop until shutdown.
    pub fn run(self, shutdown_rx: crossbeam::channel::Receiver<()>) -> Result<()> {
        let (server, port) = bind_with_retry(self.config.serve.port)?;
        log!("serve"; "http://127.0.0.1:{port}");

        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }
            match server.recv_timeout(Duration::from_millis(100)) {
                Ok(Some(request)) => {
                    if let Err(e) = self.handle_request(request) {
                        log!("serve"; "request error: {e:#}");
                    }
                }
                Ok(None) => continue,
                Err(e) => {
                    log!("serve"; "accept error: {e}");
                }
            }
        }

        Ok(())
    }

    /// Handle a single HTTP request
    fn handle_request(&self, mut request: Request) -> Result<()> {
        let url = request.url().to_owned();
        let path_only = url.split('?').next().unwrap_or(&url).to_owned();

        match (request.method(), path_only.as_str()) {
            (Method::Get, "/api/documents") => self.respond_documents(request),
            (Method::Post, "/api/render") => {
                let mut body = String::new();
                request
                    .as_reader()
                    .read_to_string(&mut body)
                    .context("failed to read request body")?;
                self.respond_render(request, &body)
            }
            (Method::Get, path) if path.starts_with("/preview/") => {
                self.respond_preview(request, &path_only["/preview/".len()..])
            }
            _ => send_body(request, 404, PLAIN, b"404 Not Found".to_vec()),
        }
    }

    /// `GET /api/documents`: relative paths of every template file.
    fn respond_documents(&self, request: Request) -> Result<()> {
        let root = &self.config.documents;
        let mut documents: Vec<String> = scan::walk_modules(root)
            .into_iter()
            .filter(|path| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|ext| matches!(ext, "tsx" | "jsx"))
            })
            .filter_map(|path| {
                path.strip_prefix(root)
                    .ok()
                    .map(|rel| rel.to_string_lossy().into_owned())
            })
            .collect();
        documents.sort();

        let body = serde_json::to_vec(&documents)?;
        send_body(request, 200, JSON, body)
    }

    /// `POST /api/render`: run the pipeline and return the wire result.
    fn respond_render(&self, request: Request, body: &str) -> Result<()> {
        let render_request: RenderRequest = match serde_json::from_str(body) {
            Ok(req) => req,
            Err(e) => {
                let error = ErrorObject::new("BadRequest", format!("invalid render request: {e}"));
                let body = serde_json::to_vec(&RenderResponse::Failure { error })?;
                return send_body(request, 400, JSON, body);
            }
        };

        let Some(template) = self.resolve_template(&render_request.path) else {
            let error = ErrorObject::new(
                "NotFound",
                format!("no such template: {}", render_request.path),
            );
            let body = serde_json::to_vec(&RenderResponse::Failure { error })?;
            return send_body(request, 404, JSON, body);
        };

        let result = self
            .renderer
            .render_document(&template, render_request.props);

        // Mirror the outcome onto the reload socket so open previews show
        // or clear the error overlay.
        let ws_msg = match &result {
            Ok(doc) => {
                let total = doc.timing.map(|t| t.total).unwrap_or_default();
                crate::logger::status_success(&format!(
                    "rendered {} in {total}ms",
                    render_request.path
                ));
                WsMsg::ClearError
            }
            Err(err) => {
                let obj = err.to_object();
                crate::logger::status_error(
                    &format!("render failed: {}", render_request.path),
                    &obj.message,
                );
                WsMsg::Error {
                    path: render_request.path.clone(),
                    error: obj,
                }
            }
        };
        let _ = self.ws_tx.blocking_send(ws_msg);

        let body = serde_json::to_vec(&RenderResponse::from_result(result))?;
        send_body(request, 200, JSON, body)
    }

    /// `GET /preview/<path>`: the full HTML shell for a template.
    fn respond_preview(&self, request: Request, encoded: &str) -> Result<()> {
        let relative = percent_decode_str(encoded)
            .decode_utf8()
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| encoded.to_owned());

        let Some(template) = self.resolve_template(&relative) else {
            return send_body(request, 404, PLAIN, b"404 Not Found".to_vec());
        };

        match self
            .renderer
            .preview_shell(&template, &relative, self.ws_port)
        {
            Ok(html) => send_body(request, 200, HTML, html.into_bytes()),
            Err(err) => {
                let obj = err.to_object();
                let body = format!(
                    "<html><body><h1>{}</h1><pre>{}\n\n{}</pre></body></html>",
                    escape(&obj.name),
                    escape(&obj.message),
                    escape(&obj.stack),
                );
                send_body(request, 500, HTML, body.into_bytes())
            }
        }
    }

    /// Resolve a wire-relative path to a real template file under the
    /// documents root. Paths escaping the root resolve to `None`.
    fn resolve_template(&self, relative: &str) -> Option<PathBuf> {
        let root = &self.config.documents;
        let candidate = normalize_path(&root.join(relative));
        if !candidate.starts_with(root) || !candidate.is_file() {
            return None;
        }
        Some(candidate)
    }
}

/// Try binding to port, retry with incremented port if in use
fn bind_with_retry(base_port: u16) -> Result<(Server, u16)> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        match Server::http(format!("127.0.0.1:{port}")) {
            Ok(server) => return Ok((server, port)),
            Err(e) => {
                last_error = Some(e);
                continue;
            }
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind HTTP server after {} attempts: {}",
        MAX_PORT_RETRIES,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

fn send_body(request: Request, status: u16, content_type: &'static str, body: Vec<u8>) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type));
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    Header::from_bytes(key, value).unwrap_or_else(|_| unreachable!("static header"))
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
