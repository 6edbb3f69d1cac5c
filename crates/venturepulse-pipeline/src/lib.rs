//! Orchestration for the two multi-step workflows in VenturePulse.
//!
//! `validate` runs the market validation state machine for one project:
//! keyword derivation, community fan-out search, evidence persistence, AI
//! assessment, and the final commit (with best-effort rollback on failure).
//! `refresh` runs the windowed trend refresh cycle for one source: prune,
//! fetch, prune again, insert ranked, stamp.
//!
//! Both workflows talk to their collaborators through small traits so the
//! state machines are testable with in-memory fakes; the Postgres-backed
//! implementations live in [`store`].

mod error;
pub mod refresh;
pub mod store;
pub mod validate;

pub use error::{RefreshError, ValidationError, ValidationFailure};
pub use refresh::{refresh_source, RefreshLocks, RefreshReport, RefreshTarget, TrendFetch};
pub use store::{PgStore, ProjectFacts, TrendStore, ValidationStore};
pub use validate::{
    validate_project, IdeaAnalyst, ValidationOptions, ValidationReport, DEFAULT_COMMUNITIES,
};
