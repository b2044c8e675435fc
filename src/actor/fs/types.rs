use crate::reload::message::ChangeEvent;

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(super) enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub(super) fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }

    /// Watcher vocabulary used on the wire.
    pub(super) fn event(self) -> ChangeEvent {
        match self {
            Self::Created => ChangeEvent::Add,
            Self::Modified => ChangeEvent::Change,
            Self::Removed => ChangeEvent::Unlink,
        }
    }
}
