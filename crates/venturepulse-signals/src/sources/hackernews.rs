//! Hacker News official API adapter.
//!
//! Two-step fetch: the ordered top-story id list, then per-item detail
//! requests issued concurrently. A failed or malformed detail fetch drops
//! that id only; it never fails the batch.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Deserialize;

use venturepulse_core::SignalItem;

use crate::error::SignalError;

const DEFAULT_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";
const DETAIL_CONCURRENCY: usize = 10;

/// Raw item payload from `/item/{id}.json`.
#[derive(Debug, Deserialize)]
struct HnItem {
    id: i64,
    #[serde(rename = "type")]
    kind: Option<String>,
    title: Option<String>,
    url: Option<String>,
    /// Unix seconds.
    time: Option<i64>,
    score: Option<i32>,
    /// Total comment count.
    descendants: Option<i32>,
}

pub struct HackerNewsClient {
    client: reqwest::Client,
    base_url: String,
}

impl HackerNewsClient {
    #[must_use]
    pub fn from_http(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Redirect requests to a custom base URL (for testing with wiremock).
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Fetch the current top stories, normalized, in list order.
    ///
    /// Only story-type items with a non-empty URL are kept; items whose
    /// detail fetch fails are excluded with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::Http`] if the top-story id list itself cannot
    /// be fetched or decoded.
    pub async fn fetch_top(&self, limit: usize) -> Result<Vec<SignalItem>, SignalError> {
        let url = format!("{}/topstories.json", self.base_url);
        let mut ids: Vec<i64> = self.client.get(&url).send().await?.json().await?;
        ids.truncate(limit);

        // buffered (not buffer_unordered) keeps the top-story ordering.
        let details: Vec<Option<HnItem>> = stream::iter(ids)
            .map(|id| self.fetch_item(id))
            .buffered(DETAIL_CONCURRENCY)
            .collect()
            .await;

        let items = details
            .into_iter()
            .flatten()
            .filter_map(normalize_story)
            .collect();

        Ok(items)
    }

    async fn fetch_item(&self, id: i64) -> Option<HnItem> {
        let url = format!("{}/item/{id}.json", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => match response.json::<Option<HnItem>>().await {
                Ok(item) => item,
                Err(e) => {
                    tracing::warn!(item = id, error = %e, "HN item decode failed; dropping");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(item = id, error = %e, "HN item fetch failed; dropping");
                None
            }
        }
    }
}

/// Keep only story-type items with a title and a non-empty external URL.
fn normalize_story(item: HnItem) -> Option<SignalItem> {
    if item.kind.as_deref() != Some("story") {
        return None;
    }
    let title = item.title.filter(|t| !t.trim().is_empty())?;
    let url = item.url.filter(|u| !u.trim().is_empty())?;
    let published_at = item.time.and_then(|t| DateTime::from_timestamp(t, 0))?;

    Some(SignalItem {
        external_id: item.id.to_string(),
        title,
        content: None,
        origin: "hacker_news".to_string(),
        score: item.score.unwrap_or(0),
        comment_count: item.descendants.unwrap_or(0),
        url,
        published_at,
    })
}
