use thiserror::Error;
use uuid::Uuid;

use venturepulse_db::DbError;
use venturepulse_signals::SignalError;

/// What went wrong inside a validation run.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// No usable search terms, neither provided nor derivable.
    #[error("no non-empty validation keywords for the project")]
    EmptyKeywords,

    #[error("store error: {0}")]
    Store(#[from] DbError),

    /// Every community target failed, or the search layer broke outright.
    #[error("community search error: {0}")]
    Search(#[from] SignalError),
}

/// A failed validation run, including how the rollback went.
///
/// The run reverts the project to the idea state on failure; that revert is
/// itself a write that can fail, and callers need to know when it did
/// because the project is then stuck mid-validation.
#[derive(Debug, Error)]
#[error("validation failed: {primary}")]
pub struct ValidationFailure {
    #[source]
    pub primary: ValidationError,
    /// `Some` when the revert to the idea state also failed.
    pub rollback_error: Option<DbError>,
}

impl ValidationFailure {
    pub(crate) fn clean(primary: impl Into<ValidationError>) -> Self {
        Self {
            primary: primary.into(),
            rollback_error: None,
        }
    }
}

/// What went wrong inside a refresh cycle.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// Another refresh for the same source holds the per-source lock.
    #[error("a refresh for source {0} is already running")]
    AlreadyRunning(Uuid),

    #[error("store error: {0}")]
    Store(#[from] DbError),

    /// The upstream fetch failed; the cycle aborts without stamping.
    #[error("fetch error: {0}")]
    Fetch(#[from] SignalError),
}
