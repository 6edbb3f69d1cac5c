//! Search fan-out engine.
//!
//! Issues one search per community target, tolerates per-target failure,
//! merges, dedups, ranks, and truncates. Concurrency across targets is a
//! performance choice; the merge afterward is deterministic regardless
//! because results are combined in target order.

use std::collections::HashSet;
use std::future::Future;

use futures::future;

use venturepulse_core::SignalItem;

use crate::error::SignalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Relevance,
    Hot,
    Top,
    New,
}

impl SortOrder {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Relevance => "relevance",
            SortOrder::Hot => "hot",
            SortOrder::Top => "top",
            SortOrder::New => "new",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecencyWindow {
    Hour,
    Day,
    Week,
    Month,
    Year,
    All,
}

impl RecencyWindow {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RecencyWindow::Hour => "hour",
            RecencyWindow::Day => "day",
            RecencyWindow::Week => "week",
            RecencyWindow::Month => "month",
            RecencyWindow::Year => "year",
            RecencyWindow::All => "all",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    /// Per-target result count; the merged output is truncated to twice
    /// this so later scoring/filtering has headroom.
    pub limit: usize,
    pub sort: SortOrder,
    pub recency: RecencyWindow,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            sort: SortOrder::Relevance,
            recency: RecencyWindow::Month,
        }
    }
}

/// A client that can search one community target for a keyword query.
pub trait CommunitySearch {
    /// Search a single target. May fail per-target; the fan-out tolerates it.
    fn search(
        &self,
        query: &str,
        target: &str,
        opts: &SearchOptions,
    ) -> impl Future<Output = Result<Vec<SignalItem>, SignalError>> + Send;
}

/// Fan a term query out across community targets.
///
/// Targets are searched concurrently with the joined term query. A failing
/// target is logged and excluded. The surviving results are merged in target
/// order, deduplicated by external identifier (first-wins), sorted descending
/// by raw score (stable, so fetch order breaks ties), and truncated to
/// `2 * limit`. An empty result list is valid and propagated as `Ok`.
///
/// # Errors
///
/// Returns [`SignalError::AllTargetsFailed`] only when every target errored.
pub async fn fan_out_search<C>(
    client: &C,
    terms: &[String],
    targets: &[String],
    opts: &SearchOptions,
) -> Result<Vec<SignalItem>, SignalError>
where
    C: CommunitySearch + Sync,
{
    let query = terms.join(" ");

    let searches = targets.iter().map(|target| {
        let query = query.as_str();
        async move { (target, client.search(query, target, opts).await) }
    });
    let outcomes = future::join_all(searches).await;

    let mut merged: Vec<SignalItem> = Vec::new();
    let mut failed = 0_usize;

    for (target, outcome) in outcomes {
        match outcome {
            Ok(items) => {
                tracing::debug!(target = %target, count = items.len(), "search target resolved");
                merged.extend(items);
            }
            Err(e) => {
                tracing::warn!(target = %target, error = %e, "search target failed; excluding");
                failed += 1;
            }
        }
    }

    if !targets.is_empty() && failed == targets.len() {
        return Err(SignalError::AllTargetsFailed(failed));
    }

    let mut seen: HashSet<String> = HashSet::new();
    merged.retain(|item| seen.insert(item.external_id.clone()));

    merged.sort_by(|a, b| b.score.cmp(&a.score));
    merged.truncate(2 * opts.limit);

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;

    use super::*;

    struct FakeSearch {
        by_target: HashMap<String, Result<Vec<SignalItem>, String>>,
    }

    impl CommunitySearch for FakeSearch {
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

    fn item(external_id: &str, score: i32) -> SignalItem {
        SignalItem {
            external_id: external_id.to_string(),
            title: format!("post {external_id}"),
            content: None,
            origin: "fake".to_string(),
            score,
            comment_count: 0,
            url: format!("https://example.com/{external_id}"),
            published_at: Utc::now(),
        }
    }

    fn targets(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[tokio::test]
    async fn single_surviving_target_is_enough() {
        let client = FakeSearch {
            by_target: HashMap::from([
                ("a".to_string(), Err("down".to_string())),
                ("b".to_string(), Err("down".to_string())),
                (
                    "c".to_string(),
                    Ok(vec![item("x", 5), item("y", 9), item("z", 1)]),
                ),
            ]),
        };

        let out = fan_out_search(
            &client,
            &["note taking".to_string()],
            &targets(&["a", "b", "c"]),
            &SearchOptions::default(),
        )
        .await
        .expect("one surviving target should not fail the fan-out");

        let ids: Vec<&str> = out.iter().map(|i| i.external_id.as_str()).collect();
        assert_eq!(ids, vec!["y", "x", "z"], "ranked by score descending");
    }

    #[tokio::test]
    async fn all_targets_failing_is_an_error() {
        let client = FakeSearch {
            by_target: HashMap::from([
                ("a".to_string(), Err("down".to_string())),
                ("b".to_string(), Err("down".to_string())),
            ]),
        };

        let result = fan_out_search(
            &client,
            &["q".to_string()],
            &targets(&["a", "b"]),
            &SearchOptions::default(),
        )
        .await;

        assert!(matches!(result, Err(SignalError::AllTargetsFailed(2))));
    }

    #[tokio::test]
    async fn empty_results_from_live_targets_are_valid() {
        let client = FakeSearch {
            by_target: HashMap::from([("a".to_string(), Ok(Vec::new()))]),
        };

        let out = fan_out_search(
            &client,
            &["q".to_string()],
            &targets(&["a"]),
            &SearchOptions::default(),
        )
        .await
        .expect("empty result list is not fatal");
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn cross_target_duplicates_keep_first_target_occurrence() {
        let client = FakeSearch {
            by_target: HashMap::from([
                ("first".to_string(), Ok(vec![item("dup", 3)])),
                ("second".to_string(), Ok(vec![item("dup", 3), item("solo", 1)])),
            ]),
        };

        let out = fan_out_search(
            &client,
            &["q".to_string()],
            &targets(&["first", "second"]),
            &SearchOptions::default(),
        )
        .await
        .expect("fan-out");

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].external_id, "dup");
        assert_eq!(out[0].origin, "fake");
    }

    #[tokio::test]
    async fn output_is_truncated_to_twice_the_limit() {
        let many: Vec<SignalItem> = (0..30).map(|i| item(&format!("p{i}"), i)).collect();
        let client = FakeSearch {
            by_target: HashMap::from([("a".to_string(), Ok(many))]),
        };

        let opts = SearchOptions {
            limit: 10,
            ..SearchOptions::default()
        };
        let out = fan_out_search(&client, &["q".to_string()], &targets(&["a"]), &opts)
            .await
            .expect("fan-out");

        assert_eq!(out.len(), 20);
        // The 20 highest-scored survive.
        assert!(out.iter().all(|i| i.score >= 10));
    }

    #[tokio::test]
    async fn equal_scores_preserve_merge_order() {
        let client = FakeSearch {
            by_target: HashMap::from([
                ("a".to_string(), Ok(vec![item("first", 7)])),
                ("b".to_string(), Ok(vec![item("second", 7)])),
            ]),
        };

        let out = fan_out_search(
            &client,
            &["q".to_string()],
            &targets(&["a", "b"]),
            &SearchOptions::default(),
        )
        .await
        .expect("fan-out");

        let ids: Vec<&str> = out.iter().map(|i| i.external_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"], "stable sort keeps target order");
    }
}
