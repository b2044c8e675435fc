//! Per-template render state.
//!
//! Each template has a monotonically increasing render sequence. A render
//! that finishes after a newer one has already started is stale and must
//! not overwrite cache state; a render whose markup hashes identically to
//! the cached copy is a no-op. The last successful markup is retained
//! through failures so the preview is never blanked by a broken edit.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

use crate::utils::hash::ContentHash;

/// Lifecycle of one open template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocPhase {
    #[default]
    Idle,
    Compiling,
    Executing,
    Rendering,
    Ready,
    Errored,
}

/// How a finished render was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// New markup stored.
    Fresh,
    /// Identical to the cached markup; nothing stored.
    Unchanged,
    /// A newer render started in the meantime; result discarded.
    Stale,
}

/// Claim on one render attempt, handed back at completion.
#[derive(Debug, Clone)]
pub struct Ticket {
    path: PathBuf,
    seq: u64,
}

#[derive(Debug, Default)]
struct Entry {
    latest_seq: u64,
    phase: DocPhase,
    last_good: Option<(String, ContentHash)>,
}

/// Shared render-state store, one entry per template path.
#[derive(Debug, Default)]
pub struct RenderCache {
    inner: Mutex<FxHashMap<PathBuf, Entry>>,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a render: bump the sequence and enter `Compiling`.
    pub fn begin(&self, path: &Path) -> Ticket {
        let mut inner = self.inner.lock();
        let entry = inner.entry(path.to_path_buf()).or_default();
        entry.latest_seq += 1;
        entry.phase = DocPhase::Compiling;
        Ticket {
            path: path.to_path_buf(),
            seq: entry.latest_seq,
        }
    }

    /// Move the template to a later phase, unless the ticket is stale.
    pub fn advance(&self, ticket: &Ticket, phase: DocPhase) {
        let mut inner = self.inner.lock();
        if let Some(entry) = inner.get_mut(&ticket.path)
            && entry.latest_seq == ticket.seq
        {
            entry.phase = phase;
        }
    }

    /// Finish a render attempt with markup.
    pub fn complete(&self, ticket: &Ticket, markup: &str) -> Applied {
        let mut inner = self.inner.lock();
        let Some(entry) = inner.get_mut(&ticket.path) else {
            return Applied::Stale;
        };
        if entry.latest_seq != ticket.seq {
            return Applied::Stale;
        }

        entry.phase = DocPhase::Ready;
        let hash = ContentHash::of(markup);
        if entry
            .last_good
            .as_ref()
            .is_some_and(|(_, cached)| *cached == hash)
        {
            return Applied::Unchanged;
        }

        entry.last_good = Some((markup.to_owned(), hash));
        Applied::Fresh
    }

    /// Record a failed attempt, retaining the last successful markup.
    pub fn fail(&self, ticket: &Ticket) {
        let mut inner = self.inner.lock();
        if let Some(entry) = inner.get_mut(&ticket.path)
            && entry.latest_seq == ticket.seq
        {
            entry.phase = DocPhase::Errored;
        }
    }

    /// Last successfully rendered markup for a template, if any.
    pub fn last_good(&self, path: &Path) -> Option<String> {
        self.inner
            .lock()
            .get(path)
            .and_then(|entry| entry.last_good.as_ref().map(|(markup, _)| markup.clone()))
    }

    /// Current phase of a template.
    pub fn phase(&self, path: &Path) -> DocPhase {
        self.inner
            .lock()
            .get(path)
            .map(|entry| entry.phase)
            .unwrap_or_default()
    }
}
