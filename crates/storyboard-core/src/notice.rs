use crate::error::BoardError;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    LoadFailure,
    SaveFailure,
    ImportValidationFailure,
    FileReadFailure,
    ExportFailure,
}

impl NoticeKind {
    fn title(&self) -> &'static str {
        match self {
            NoticeKind::LoadFailure => "Could not load the board",
            NoticeKind::SaveFailure => "Could not save the board",
            NoticeKind::ImportValidationFailure => "Could not import the board",
            NoticeKind::FileReadFailure => "Could not read the file",
            NoticeKind::ExportFailure => "Could not export the board",
        }
    }
}

/// A non-fatal, user-visible failure report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn from_error(kind: NoticeKind, err: &BoardError) -> Self {
        warn!(kind = ?kind, error = %err, "{}", kind.title());
        Notice {
            kind,
            message: format!("{}: {}", kind.title(), err),
        }
    }
}
