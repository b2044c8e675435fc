//! Source-map translation of sandbox errors.
//!
//! Stacks coming out of the sandbox reference positions in the minified
//! bundle. This pass rewrites every `file:line:column` occurrence that
//! points at the bundle back to the original template position, so the
//! error overlay and the editor agree on where the problem is. Frames with
//! no mapping pass through untouched, and an unparsable map degrades to the
//! raw error.

use regex::Regex;
use std::sync::LazyLock;

use crate::{compiler::Bundle, render::result::ErrorObject};

// `path:line:col`, as node prints frames. Path chars exclude whitespace,
// parens and colons so the trailing numbers split off cleanly.
static POSITION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^\s():]+):(\d+):(\d+)").unwrap());

/// Translates bundle positions in error text back to template positions.
pub struct StackRemapper {
    map: Option<sourcemap::SourceMap>,
    /// The filename the sandbox evaluated the bundle under.
    bundle_name: String,
}

impl StackRemapper {
    pub fn new(bundle: &Bundle) -> Self {
        let map = bundle
            .source_map
            .as_deref()
            .and_then(|text| match sourcemap::SourceMap::from_slice(text.as_bytes()) {
                Ok(map) => Some(map),
                Err(err) => {
                    crate::debug!("remap"; "unparsable source map for {}: {err}", bundle.template.display());
                    None
                }
            });
        Self {
            map,
            bundle_name: bundle.template.to_string_lossy().into_owned(),
        }
    }

    /// Rewrite bundle positions in the error's stack and message.
    pub fn remap_object(&self, mut obj: ErrorObject) -> ErrorObject {
        obj.stack = self.remap_text(&obj.stack);
        obj.message = self.remap_text(&obj.message);
        obj
    }

    fn remap_text(&self, text: &str) -> String {
        let Some(map) = &self.map else {
            return text.to_owned();
        };

        POSITION_RE
            .replace_all(text, |caps: &regex::Captures<'_>| {
                let (file, line, col) = (&caps[1], &caps[2], &caps[3]);
                if file != self.bundle_name {
                    return caps[0].to_owned();
                }
                match self.lookup(map, line, col) {
                    Some(mapped) => mapped,
                    None => caps[0].to_owned(),
                }
            })
            .into_owned()
    }

    /// Map a 1-based bundle position to a 1-based original position.
    fn lookup(&self, map: &sourcemap::SourceMap, line: &str, col: &str) -> Option<String> {
        let line: u32 = line.parse().ok()?;
        let col: u32 = col.parse().ok()?;
        let token = map.lookup_token(line.checked_sub(1)?, col.checked_sub(1)?)?;
        let source = token.get_source()?;
        Some(format!(
            "{source}:{}:{}",
            token.get_src_line() + 1,
            token.get_src_col() + 1
        ))
    }
}
