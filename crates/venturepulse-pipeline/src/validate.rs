//! The market validation state machine.
//!
//! One run moves a project idea -> validating -> scored, or reverts it to
//! idea on failure. The run is deliberately not transactional: the
//! validating state is visible to readers while the search and assessment
//! are in flight, and evidence rows committed before a late failure are
//! kept (they are reusable facts about the outside world, not run-scoped
//! state).

use std::future::Future;

use uuid::Uuid;

use venturepulse_ai::{clamp_score, OpenAiClient, SignalDigest, Verdict};
use venturepulse_core::SignalItem;
use venturepulse_signals::{fan_out_search, CommunitySearch, SearchOptions};

use crate::error::{ValidationError, ValidationFailure};
use crate::store::ValidationStore;

/// Community targets every validation run searches.
pub const DEFAULT_COMMUNITIES: [&str; 6] = [
    "Entrepreneur",
    "startups",
    "SaaS",
    "technology",
    "business",
    "smallbusiness",
];

/// The qualitative collaborator: keyword derivation and feasibility
/// assessment. Both operations are infallible at this seam; the OpenAI
/// implementation fails closed to deterministic fallbacks.
pub trait IdeaAnalyst {
    fn derive_keywords(
        &self,
        name: &str,
        idea: &str,
        target_market: Option<&str>,
    ) -> impl Future<Output = Vec<String>> + Send;

    fn assess(
        &self,
        idea: &str,
        signals: &[SignalDigest],
    ) -> impl Future<Output = Verdict> + Send;
}

impl IdeaAnalyst for OpenAiClient {
    async fn derive_keywords(
        &self,
        name: &str,
        idea: &str,
        target_market: Option<&str>,
    ) -> Vec<String> {
        self.extract_keywords(name, idea, target_market).await
    }

    async fn assess(&self, idea: &str, signals: &[SignalDigest]) -> Verdict {
        self.score_and_summarize(idea, signals).await
    }
}

#[derive(Debug, Clone)]
pub struct ValidationOptions {
    pub communities: Vec<String>,
    pub search: SearchOptions,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            communities: DEFAULT_COMMUNITIES.iter().map(ToString::to_string).collect(),
            search: SearchOptions::default(),
        }
    }
}

/// What a completed run did, for the API response and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub keywords: Vec<String>,
    pub signals_found: usize,
    /// How many of the found signals were new to the store.
    pub newly_stored: usize,
    pub score: Option<i32>,
    pub summary: Option<String>,
}

/// Run a full validation for one project.
///
/// Keyword precedence: explicitly provided terms, then terms persisted by a
/// previous run, then analyst-derived terms. Empty terms after trimming are
/// rejected before any state changes.
///
/// A failure after the project entered the validating state triggers a
/// best-effort revert to the idea state; if that write also fails, the
/// returned [`ValidationFailure`] carries the rollback error too.
///
/// # Errors
///
/// Returns [`ValidationFailure`] on unusable keywords, a total search
/// failure, or a store error.
pub async fn validate_project<St, Se, An>(
    store: &St,
    search: &Se,
    analyst: &An,
    project_id: Uuid,
    keywords: Option<Vec<String>>,
    opts: &ValidationOptions,
) -> Result<ValidationReport, ValidationFailure>
where
    St: ValidationStore + Sync,
    Se: CommunitySearch + Sync,
    An: IdeaAnalyst + Sync,
{
    let facts = store
        .load_project(project_id)
        .await
        .map_err(ValidationFailure::clean)?;

    let keywords = match keywords {
        Some(provided) => provided,
        None if !facts.keywords.is_empty() => facts.keywords.clone(),
        None => {
            analyst
                .derive_keywords(&facts.name, &facts.idea, facts.target_market.as_deref())
                .await
        }
    };
    let keywords: Vec<String> = keywords
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() {
        return Err(ValidationFailure::clean(ValidationError::EmptyKeywords));
    }

    store
        .mark_validating(project_id, &keywords)
        .await
        .map_err(ValidationFailure::clean)?;
    tracing::info!(%project_id, keywords = ?keywords, "validation started");

    match run_after_entry(store, search, analyst, project_id, &facts.idea, &keywords, opts).await {
        Ok(report) => {
            tracing::info!(
                %project_id,
                signals = report.signals_found,
                score = ?report.score,
                "validation committed"
            );
            Ok(report)
        }
        Err(primary) => Err(revert(store, project_id, primary).await),
    }
}

/// Everything after the validating state is entered; errors here roll back.
async fn run_after_entry<St, Se, An>(
    store: &St,
    search: &Se,
    analyst: &An,
    project_id: Uuid,
    idea: &str,
    keywords: &[String],
    opts: &ValidationOptions,
) -> Result<ValidationReport, ValidationError>
where
    St: ValidationStore + Sync,
    Se: CommunitySearch + Sync,
    An: IdeaAnalyst + Sync,
{
    let found = fan_out_search(search, keywords, &opts.communities, &opts.search).await?;

    if found.is_empty() {
        store.commit_scored(project_id, None, None).await?;
        return Ok(ValidationReport {
            keywords: keywords.to_vec(),
            signals_found: 0,
            newly_stored: 0,
            score: None,
            summary: None,
        });
    }

    let external_ids: Vec<String> = found.iter().map(|s| s.external_id.clone()).collect();
    let known = store.known_external_ids(&external_ids).await?;

    let mut newly_stored = 0_usize;
    for item in &found {
        if !known.contains(&item.external_id) {
            store.insert_signal(project_id, item).await?;
            newly_stored += 1;
        }
    }

    let digests: Vec<SignalDigest> = found.iter().map(digest).collect();
    let verdict = analyst.assess(idea, &digests).await;
    let score = clamp_score(verdict.score);

    store
        .commit_scored(project_id, Some(score), Some(verdict.summary.clone()))
        .await?;

    Ok(ValidationReport {
        keywords: keywords.to_vec(),
        signals_found: found.len(),
        newly_stored,
        score: Some(score),
        summary: Some(verdict.summary),
    })
}

async fn revert<St: ValidationStore + Sync>(
    store: &St,
    project_id: Uuid,
    primary: ValidationError,
) -> ValidationFailure {
    tracing::warn!(%project_id, error = %primary, "validation failed; reverting to idea state");
    let rollback_error = match store.revert_to_idea(project_id).await {
        Ok(()) => None,
        Err(e) => {
            tracing::error!(%project_id, error = %e, "rollback to idea state failed");
            Some(e)
        }
    };
    ValidationFailure {
        primary,
        rollback_error,
    }
}

fn digest(item: &SignalItem) -> SignalDigest {
    SignalDigest {
        title: item.title.clone(),
        content: item.content.clone(),
        origin: item.origin.clone(),
        score: item.score,
        comment_count: item.comment_count,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use chrono::Utc;

    use venturepulse_core::ValidationStatus;
    use venturepulse_db::DbError;
    use venturepulse_signals::SignalError;

    use crate::store::ProjectFacts;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        MarkValidating(Vec<String>),
        Insert(String),
        Commit(Option<i32>, Option<String>),
        Revert,
    }

    struct FakeStore {
        facts: ProjectFacts,
        known: HashSet<String>,
        fail_insert: bool,
        fail_revert: bool,
        calls: Mutex<Vec<Call>>,
    }

    impl FakeStore {
        fn new(stored_keywords: &[&str]) -> Self {
            Self {
                facts: ProjectFacts {
                    id: Uuid::new_v4(),
                    name: "NoteGenie".to_string(),
                    idea: "AI note taking for busy teams".to_string(),
                    target_market: None,
                    keywords: stored_keywords.iter().map(ToString::to_string).collect(),
                },
                known: HashSet::new(),
                fail_insert: false,
                fail_revert: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl ValidationStore for FakeStore {
        async fn load_project(&self, _project_id: Uuid) -> Result<ProjectFacts, DbError> {
            Ok(self.facts.clone())
        }

        async fn mark_validating(
            &self,
            _project_id: Uuid,
            keywords: &[String],
        ) -> Result<(), DbError> {
            self.record(Call::MarkValidating(keywords.to_vec()));
            Ok(())
        }

        async fn known_external_ids(
            &self,
            external_ids: &[String],
        ) -> Result<HashSet<String>, DbError> {
            Ok(external_ids
                .iter()
                .filter(|id| self.known.contains(*id))
                .cloned()
                .collect())
        }

        async fn insert_signal(&self, _project_id: Uuid, item: &SignalItem) -> Result<(), DbError> {
            if self.fail_insert {
                return Err(DbError::NotFound);
            }
            self.record(Call::Insert(item.external_id.clone()));
            Ok(())
        }

        async fn commit_scored(
            &self,
            _project_id: Uuid,
            score: Option<i32>,
            summary: Option<String>,
        ) -> Result<(), DbError> {
            self.record(Call::Commit(score, summary));
            Ok(())
        }

        async fn revert_to_idea(&self, _project_id: Uuid) -> Result<(), DbError> {
            self.record(Call::Revert);
            if self.fail_revert {
                return Err(DbError::NotFound);
            }
            Ok(())
        }
    }

    struct FakeSearch {
        items: Vec<SignalItem>,
        fail_all: bool,
    }

    impl CommunitySearch for FakeSearch {
        async fn search(
            &self,
            _query: &str,
            target: &str,
            _opts: &SearchOptions,
        ) -> Result<Vec<SignalItem>, SignalError> {
            if self.fail_all {
                return Err(SignalError::Reddit("down".to_string()));
            }
            // Only the first target returns anything; enough for the machine.
            if target == DEFAULT_COMMUNITIES[0] {
                Ok(self.items.clone())
            } else {
                Ok(Vec::new())
            }
        }
    }

    /// Per-target fake for runs where some communities fail and others answer.
    struct MixedSearch {
        by_target: HashMap<String, Result<Vec<SignalItem>, String>>,
    }

    impl CommunitySearch for MixedSearch {
        async fn search(
            &self,
            _query: &str,
            target: &str,
            _opts: &SearchOptions,
        ) -> Result<Vec<SignalItem>, SignalError> {
            match self.by_target.get(target) {
                Some(Ok(items)) => Ok(items.clone()),
                Some(Err(msg)) => Err(SignalError::Reddit(msg.clone())),
                None => Ok(Vec::new()),
            }
        }
    }

    struct FakeAnalyst {
        verdict_score: i32,
        derived: Vec<String>,
    }

    impl IdeaAnalyst for FakeAnalyst {
        async fn derive_keywords(
            &self,
            _name: &str,
            _idea: &str,
            _target_market: Option<&str>,
        ) -> Vec<String> {
            self.derived.clone()
        }

        async fn assess(&self, _idea: &str, _signals: &[SignalDigest]) -> Verdict {
            Verdict {
                score: self.verdict_score,
                summary: "looks promising".to_string(),
            }
        }
    }

    fn item(external_id: &str, score: i32) -> SignalItem {
        SignalItem {
            external_id: external_id.to_string(),
            title: format!("post {external_id}"),
            content: Some("body".to_string()),
            origin: "startups".to_string(),
            score,
            comment_count: 2,
            url: format!("https://reddit.com/{external_id}"),
            published_at: Utc::now(),
        }
    }

    fn analyst(score: i32) -> FakeAnalyst {
        FakeAnalyst {
            verdict_score: score,
            derived: vec!["derived".to_string()],
        }
    }

    #[tokio::test]
    async fn successful_run_commits_scored_state() {
        let store = FakeStore::new(&[]);
        let search = FakeSearch {
            items: vec![item("a", 9), item("b", 3)],
            fail_all: false,
        };

        let report = validate_project(
            &store,
            &search,
            &analyst(77),
            store.facts.id,
            Some(vec!["note taking".to_string()]),
            &ValidationOptions::default(),
        )
        .await
        .expect("run should commit");

        assert_eq!(report.score, Some(77));
        assert_eq!(report.signals_found, 2);
        assert_eq!(report.newly_stored, 2);

        let calls = store.calls();
        assert_eq!(
            calls[0],
            Call::MarkValidating(vec!["note taking".to_string()])
        );
        assert_eq!(
            *calls.last().unwrap(),
            Call::Commit(Some(77), Some("looks promising".to_string()))
        );
        assert!(!calls.contains(&Call::Revert));
    }

    #[tokio::test]
    async fn already_known_posts_are_reused_not_reinserted() {
        let mut store = FakeStore::new(&[]);
        store.known.insert("a".to_string());
        let search = FakeSearch {
            items: vec![item("a", 9), item("b", 3)],
            fail_all: false,
        };

        let report = validate_project(
            &store,
            &search,
            &analyst(60),
            store.facts.id,
            Some(vec!["q".to_string()]),
            &ValidationOptions::default(),
        )
        .await
        .expect("run should commit");

        assert_eq!(report.signals_found, 2);
        assert_eq!(report.newly_stored, 1);
        let inserts: Vec<Call> = store
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Insert(_)))
            .collect();
        assert_eq!(inserts, vec![Call::Insert("b".to_string())]);
    }

    #[tokio::test]
    async fn empty_keywords_fail_before_any_state_change() {
        let store = FakeStore::new(&[]);
        let search = FakeSearch {
            items: Vec::new(),
            fail_all: false,
        };
        let no_derivation = FakeAnalyst {
            verdict_score: 50,
            derived: Vec::new(),
        };

        let failure = validate_project(
            &store,
            &search,
            &no_derivation,
            store.facts.id,
            Some(vec!["   ".to_string()]),
            &ValidationOptions::default(),
        )
        .await
        .expect_err("blank keywords must be rejected");

        assert!(matches!(failure.primary, ValidationError::EmptyKeywords));
        assert!(failure.rollback_error.is_none());
        assert!(store.calls().is_empty(), "no writes before the rejection");
    }

    #[tokio::test]
    async fn stored_keywords_are_reused_when_none_are_provided() {
        let store = FakeStore::new(&["from last run"]);
        let search = FakeSearch {
            items: vec![item("a", 1)],
            fail_all: false,
        };

        validate_project(
            &store,
            &search,
            &analyst(55),
            store.facts.id,
            None,
            &ValidationOptions::default(),
        )
        .await
        .expect("run should commit");

        assert_eq!(
            store.calls()[0],
            Call::MarkValidating(vec!["from last run".to_string()])
        );
    }

    #[tokio::test]
    async fn keywords_are_derived_when_nothing_is_stored() {
        let store = FakeStore::new(&[]);
        let search = FakeSearch {
            items: vec![item("a", 1)],
            fail_all: false,
        };

        validate_project(
            &store,
            &search,
            &analyst(55),
            store.facts.id,
            None,
            &ValidationOptions::default(),
        )
        .await
        .expect("run should commit");

        assert_eq!(
            store.calls()[0],
            Call::MarkValidating(vec!["derived".to_string()])
        );
    }

    #[tokio::test]
    async fn partial_search_failure_still_commits_every_unique_signal() {
        let store = FakeStore::new(&[]);
        let search = MixedSearch {
            by_target: HashMap::from([
                ("startups".to_string(), Err("down".to_string())),
                ("SaaS".to_string(), Ok(vec![item("x", 9), item("y", 4)])),
                ("business".to_string(), Ok(vec![item("z", 2)])),
            ]),
        };
        let opts = ValidationOptions {
            communities: vec![
                "startups".to_string(),
                "SaaS".to_string(),
                "business".to_string(),
            ],
            ..ValidationOptions::default()
        };

        let report = validate_project(
            &store,
            &search,
            &analyst(70),
            store.facts.id,
            Some(vec!["note taking".to_string()]),
            &opts,
        )
        .await
        .expect("one failing community must not fail the run");

        assert_eq!(report.signals_found, 3);
        assert_eq!(report.newly_stored, 3);
        assert_eq!(report.score, Some(70));

        let calls = store.calls();
        let inserts: Vec<&Call> = calls
            .iter()
            .filter(|c| matches!(c, Call::Insert(_)))
            .collect();
        assert_eq!(
            inserts,
            vec![
                &Call::Insert("x".to_string()),
                &Call::Insert("y".to_string()),
                &Call::Insert("z".to_string()),
            ]
        );
        assert_eq!(
            *calls.last().unwrap(),
            Call::Commit(Some(70), Some("looks promising".to_string()))
        );
        assert!(!calls.contains(&Call::Revert));
    }

    #[tokio::test]
    async fn total_search_failure_reverts_to_idea() {
        let store = FakeStore::new(&[]);
        let search = FakeSearch {
            items: Vec::new(),
            fail_all: true,
        };

        let failure = validate_project(
            &store,
            &search,
            &analyst(50),
            store.facts.id,
            Some(vec!["q".to_string()]),
            &ValidationOptions::default(),
        )
        .await
        .expect_err("all targets down must fail the run");

        assert!(matches!(
            failure.primary,
            ValidationError::Search(SignalError::AllTargetsFailed(_))
        ));
        assert!(failure.rollback_error.is_none());
        assert_eq!(*store.calls().last().unwrap(), Call::Revert);
    }

    #[tokio::test]
    async fn failed_rollback_is_reported_alongside_the_primary_error() {
        let mut store = FakeStore::new(&[]);
        store.fail_insert = true;
        store.fail_revert = true;
        let search = FakeSearch {
            items: vec![item("a", 1)],
            fail_all: false,
        };

        let failure = validate_project(
            &store,
            &search,
            &analyst(50),
            store.facts.id,
            Some(vec!["q".to_string()]),
            &ValidationOptions::default(),
        )
        .await
        .expect_err("insert failure must fail the run");

        assert!(matches!(failure.primary, ValidationError::Store(_)));
        assert!(failure.rollback_error.is_some());
    }

    #[tokio::test]
    async fn zero_signals_still_commit_a_scored_state() {
        let store = FakeStore::new(&[]);
        let search = FakeSearch {
            items: Vec::new(),
            fail_all: false,
        };

        let report = validate_project(
            &store,
            &search,
            &analyst(50),
            store.facts.id,
            Some(vec!["extremely niche".to_string()]),
            &ValidationOptions::default(),
        )
        .await
        .expect("empty evidence is a valid outcome");

        assert_eq!(report.signals_found, 0);
        assert_eq!(report.score, None);
        assert_eq!(*store.calls().last().unwrap(), Call::Commit(None, None));
    }

    #[tokio::test]
    async fn out_of_range_verdicts_are_clamped_at_commit() {
        let store = FakeStore::new(&[]);
        let search = FakeSearch {
            items: vec![item("a", 1)],
            fail_all: false,
        };

        let report = validate_project(
            &store,
            &search,
            &analyst(140),
            store.facts.id,
            Some(vec!["q".to_string()]),
            &ValidationOptions::default(),
        )
        .await
        .expect("run should commit");
        assert_eq!(report.score, Some(100));

        let store = FakeStore::new(&[]);
        let report = validate_project(
            &store,
            &search,
            &analyst(-5),
            store.facts.id,
            Some(vec!["q".to_string()]),
            &ValidationOptions::default(),
        )
        .await
        .expect("run should commit");
        assert_eq!(report.score, Some(0));
    }
}
