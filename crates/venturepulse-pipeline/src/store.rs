//! Persistence seams for the two workflows, plus the Postgres implementation.
//!
//! The state machines in [`crate::validate`] and [`crate::refresh`] only see
//! these traits; [`PgStore`] bridges them onto the query layer.

use std::collections::HashSet;
use std::future::Future;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use venturepulse_core::{SignalItem, ValidationStatus};
use venturepulse_db::projects::ValidationUpdate;
use venturepulse_db::{projects, signals, sources, DbError};

/// The project fields a validation run reads before it mutates anything.
#[derive(Debug, Clone)]
pub struct ProjectFacts {
    pub id: Uuid,
    pub name: String,
    pub idea: String,
    pub target_market: Option<String>,
    /// Keywords left behind by a previous run, possibly empty.
    pub keywords: Vec<String>,
}

/// Persistence operations the validation state machine performs.
pub trait ValidationStore {
    fn load_project(
        &self,
        project_id: Uuid,
    ) -> impl Future<Output = Result<ProjectFacts, DbError>> + Send;

    /// Enter the validating state and persist the keywords being searched.
    fn mark_validating(
        &self,
        project_id: Uuid,
        keywords: &[String],
    ) -> impl Future<Output = Result<(), DbError>> + Send;

    /// Which of these external identifiers already have a stored community
    /// post, across all projects.
    fn known_external_ids(
        &self,
        external_ids: &[String],
    ) -> impl Future<Output = Result<HashSet<String>, DbError>> + Send;

    fn insert_signal(
        &self,
        project_id: Uuid,
        item: &SignalItem,
    ) -> impl Future<Output = Result<(), DbError>> + Send;

    /// Commit the terminal scored state. `None` score and summary are valid:
    /// a run that found no signals still completes.
    fn commit_scored(
        &self,
        project_id: Uuid,
        score: Option<i32>,
        summary: Option<String>,
    ) -> impl Future<Output = Result<(), DbError>> + Send;

    /// Revert to the idea state after a failed run. Keywords and any earlier
    /// score survive the revert.
    fn revert_to_idea(&self, project_id: Uuid) -> impl Future<Output = Result<(), DbError>> + Send;
}

/// Persistence operations the refresh cycle performs.
pub trait TrendStore {
    fn delete_before(
        &self,
        source_id: Uuid,
        cutoff: DateTime<Utc>,
    ) -> impl Future<Output = Result<u64, DbError>> + Send;

    fn delete_since(
        &self,
        source_id: Uuid,
        cutoff: DateTime<Utc>,
    ) -> impl Future<Output = Result<u64, DbError>> + Send;

    /// External identifiers of the rows that survived pruning.
    fn surviving_external_ids(
        &self,
        source_id: Uuid,
    ) -> impl Future<Output = Result<HashSet<String>, DbError>> + Send;

    fn insert_batch(
        &self,
        source_id: Uuid,
        items: &[(SignalItem, f64)],
    ) -> impl Future<Output = Result<u64, DbError>> + Send;

    fn stamp_refreshed(
        &self,
        source_id: Uuid,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), DbError>> + Send;
}

/// Postgres-backed store shared by both workflows.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ValidationStore for PgStore {
    async fn load_project(&self, project_id: Uuid) -> Result<ProjectFacts, DbError> {
        let row = projects::get_project(&self.pool, project_id).await?;
        Ok(ProjectFacts {
            id: row.id,
            name: row.name,
            idea: row.idea,
            target_market: row.target_market,
            keywords: row.validation_keywords,
        })
    }

    async fn mark_validating(&self, project_id: Uuid, keywords: &[String]) -> Result<(), DbError> {
        projects::set_project_validation(
            &self.pool,
            project_id,
            &ValidationUpdate {
                status: Some(ValidationStatus::Validating),
                keywords: Some(keywords.to_vec()),
                ..ValidationUpdate::default()
            },
        )
        .await
    }

    async fn known_external_ids(
        &self,
        external_ids: &[String],
    ) -> Result<HashSet<String>, DbError> {
        let rows = signals::find_project_signals_by_external_ids(&self.pool, external_ids).await?;
        Ok(rows.into_iter().map(|r| r.external_id).collect())
    }

    async fn insert_signal(&self, project_id: Uuid, item: &SignalItem) -> Result<(), DbError> {
        signals::insert_project_signal(&self.pool, project_id, item).await?;
        Ok(())
    }

    async fn commit_scored(
        &self,
        project_id: Uuid,
        score: Option<i32>,
        summary: Option<String>,
    ) -> Result<(), DbError> {
        projects::set_project_validation(
            &self.pool,
            project_id,
            &ValidationUpdate {
                status: Some(ValidationStatus::Scored),
                score: Some(score),
                summary: Some(summary),
                ..ValidationUpdate::default()
            },
        )
        .await
    }

    async fn revert_to_idea(&self, project_id: Uuid) -> Result<(), DbError> {
        projects::set_project_validation(
            &self.pool,
            project_id,
            &ValidationUpdate {
                status: Some(ValidationStatus::Idea),
                ..ValidationUpdate::default()
            },
        )
        .await
    }
}

impl TrendStore for PgStore {
    async fn delete_before(&self, source_id: Uuid, cutoff: DateTime<Utc>) -> Result<u64, DbError> {
        signals::delete_signals_before(&self.pool, source_id, cutoff).await
    }

    async fn delete_since(&self, source_id: Uuid, cutoff: DateTime<Utc>) -> Result<u64, DbError> {
        signals::delete_signals_since(&self.pool, source_id, cutoff).await
    }

    async fn surviving_external_ids(&self, source_id: Uuid) -> Result<HashSet<String>, DbError> {
        signals::find_signal_ids_by_source(&self.pool, source_id).await
    }

    async fn insert_batch(
        &self,
        source_id: Uuid,
        items: &[(SignalItem, f64)],
    ) -> Result<u64, DbError> {
        signals::bulk_insert_trend_signals(&self.pool, source_id, items).await
    }

    async fn stamp_refreshed(&self, source_id: Uuid, at: DateTime<Utc>) -> Result<(), DbError> {
        sources::update_source_refreshed_at(&self.pool, source_id, at).await
    }
}
