//! HTML shell assembly for the preview.

use crate::embed::{self, PaginateVars};

/// Page chrome shared by every preview shell. Keeps the rendered document on
/// white page surfaces against a neutral backdrop, matching print geometry.
const SHELL_CSS: &str = "\
html, body { margin: 0; padding: 0; background: #e5e5e5; }\n\
#document-root { display: flex; flex-direction: column; align-items: center; gap: 16px; padding: 24px 0; }\n\
.docforge-page { background: #fff; box-shadow: 0 1px 4px rgba(0,0,0,.25); overflow: hidden; box-sizing: border-box; }\n\
@media print { html, body { background: #fff; } #document-root { padding: 0; gap: 0; } .docforge-page { box-shadow: none; } }";

/// Wrap rendered markup in a complete HTML document.
///
/// `markup` already carries the template's own styles inlined; the shell
/// adds page chrome and the pagination/bridge script with the reload-socket
/// port and document identity injected.
pub fn assemble(title: &str, markup: &str, ws_port: u16, document: &str) -> String {
    let script = embed::PAGINATE_JS.render(&PaginateVars {
        ws_port,
        document: document.to_owned(),
    });

    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n\
         <style>{SHELL_CSS}</style>\n\
         </head>\n\
         <body>\n\
         <div id=\"document-root\">{markup}</div>\n\
         <script>{script}</script>\n\
         </body>\n\
         </html>\n",
        title = escape_text(title),
    )
}

/// Minimal text escaping for the title slot.
fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
