//! Feed/source adapters.

mod hackernews;
mod reddit;
mod rss;

pub use hackernews::HackerNewsClient;
pub use reddit::{RedditClient, RedditCredentials};
pub use rss::{parse_feed, FeedDefaults};

use std::time::Duration;

use venturepulse_core::{SignalItem, SourceType};

use crate::error::SignalError;

const REDDIT_INSIGHTS_FEED: &str =
    "https://www.reddit-insights.com/topic/marketing-opportunities/rss.xml";

/// Unified fetch entry point for trend sources.
///
/// Dispatches on the source type: `HACKER_NEWS` goes through the official
/// item API (real scores and descendant counts), `REDDIT` through the RSS
/// path with that feed's degraded score/comment defaults. The remaining
/// types have no fetch path yet.
pub struct FeedClient {
    http: reqwest::Client,
    hackernews: HackerNewsClient,
}

impl FeedClient {
    /// # Errors
    ///
    /// Returns [`SignalError::Http`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: u64) -> Result<Self, SignalError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("VenturePulse/1.0.0")
            .build()?;
        let hackernews = HackerNewsClient::from_http(http.clone());
        Ok(Self { http, hackernews })
    }

    /// Point the Hacker News adapter at a mock server. Test-only knob.
    #[must_use]
    pub fn with_hackernews_base_url(mut self, base_url: &str) -> Self {
        self.hackernews = self.hackernews.with_base_url(base_url);
        self
    }

    /// Fetch up to `limit` normalized items for a source.
    ///
    /// Unparseable individual items are dropped silently; only a whole-source
    /// failure is an error.
    ///
    /// # Errors
    ///
    /// - [`SignalError::UnsupportedSource`] for types without a fetch path.
    /// - [`SignalError::Http`] / [`SignalError::Fetch`] when the source is
    ///   unreachable or returns garbage at the envelope level.
    pub async fn fetch_top_items(
        &self,
        source_type: SourceType,
        feed_url: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SignalItem>, SignalError> {
        match source_type {
            SourceType::HackerNews => self.hackernews.fetch_top(limit).await,
            SourceType::Reddit => {
                let url = feed_url.unwrap_or(REDDIT_INSIGHTS_FEED);
                let xml = self.http.get(url).send().await?.text().await?;
                let defaults = FeedDefaults {
                    origin: "reddit",
                    score: 10,
                    comment_count: 0,
                };
                let mut items = parse_feed(&xml, &defaults)?;
                items.truncate(limit);
                Ok(items)
            }
            SourceType::ProductHunt | SourceType::Github | SourceType::Other => {
                Err(SignalError::UnsupportedSource(source_type))
            }
        }
    }
}
