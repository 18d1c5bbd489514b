use thiserror::Error;

use crate::cursor::CursorError;
use crate::db::DatabaseError;
use crate::email::EmailError;

/// Errors that abort a whole ingestion cycle.
///
/// Failures of a single message never surface here; they are recorded as
/// [`SkipReason::Failed`](super::SkipReason::Failed) instead.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Mail source connection failed: {0}")]
    Connection(#[source] EmailError),

    #[error("Mail source error: {0}")]
    Source(#[source] EmailError),

    #[error("Store error: {0}")]
    Store(#[from] DatabaseError),

    #[error("Cursor error: {0}")]
    Cursor(#[source] CursorError),
}

impl From<CursorError> for PipelineError {
    fn from(err: CursorError) -> Self {
        match err {
            CursorError::Store(e) => PipelineError::Store(e),
            other => PipelineError::Cursor(other),
        }
    }
}

impl PipelineError {
    /// True when the mail server could not be reached or refused the session.
    pub fn is_upstream(&self) -> bool {
        matches!(self, PipelineError::Connection(_) | PipelineError::Source(_))
    }
}
