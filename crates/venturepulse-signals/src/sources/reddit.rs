//! Reddit community-search client (client-credentials OAuth).

use std::future::Future;

use chrono::DateTime;
use serde::Deserialize;

use venturepulse_core::SignalItem;

use crate::error::SignalError;
use crate::fanout::{CommunitySearch, SearchOptions};

const DEFAULT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const DEFAULT_API_BASE: &str = "https://oauth.reddit.com";

#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

/// Reddit OAuth token response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Reddit search listing wrapper.
#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Post>,
}

#[derive(Debug, Deserialize)]
struct Post {
    data: PostData,
}

#[derive(Debug, Deserialize)]
struct PostData {
    id: Option<String>,
    title: Option<String>,
    selftext: Option<String>,
    subreddit: Option<String>,
    score: Option<i32>,
    num_comments: Option<i32>,
    permalink: Option<String>,
    created_utc: Option<f64>,
}

/// Reddit API client with a valid access token.
pub struct RedditClient {
    client: reqwest::Client,
    token: String,
    user_agent: String,
    api_base: String,
}

impl RedditClient {
    /// Create a client by exchanging client credentials for a token.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::Reddit`] if the token exchange fails.
    pub async fn connect(creds: &RedditCredentials) -> Result<Self, SignalError> {
        Self::connect_with_base_urls(creds, DEFAULT_TOKEN_URL, DEFAULT_API_BASE).await
    }

    /// Create a client against custom endpoints (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::Reddit`] if the token exchange fails.
    pub async fn connect_with_base_urls(
        creds: &RedditCredentials,
        token_url: &str,
        api_base: &str,
    ) -> Result<Self, SignalError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| SignalError::Reddit(format!("failed to build HTTP client: {e}")))?;

        let token = Self::fetch_token(&client, creds, token_url).await?;

        Ok(Self {
            client,
            token,
            user_agent: creds.user_agent.clone(),
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_token(
        client: &reqwest::Client,
        creds: &RedditCredentials,
        token_url: &str,
    ) -> Result<String, SignalError> {
        let response = client
            .post(token_url)
            .header("User-Agent", &creds.user_agent)
            .basic_auth(&creds.client_id, Some(&creds.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SignalError::Reddit(format!(
                "token exchange failed with status {}",
                response.status()
            )));
        }

        let token_resp: TokenResponse = response
            .json()
            .await
            .map_err(|e| SignalError::Reddit(format!("token parse error: {e}")))?;

        Ok(token_resp.access_token)
    }

    /// Search one subreddit for the given query.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::Reddit`] on a non-success status or a response
    /// that does not decode as a listing; [`SignalError::Http`] on transport
    /// failure.
    pub async fn search_target(
        &self,
        query: &str,
        subreddit: &str,
        opts: &SearchOptions,
    ) -> Result<Vec<SignalItem>, SignalError> {
        let endpoint = format!("{}/r/{subreddit}/search", self.api_base);
        let limit = opts.limit.to_string();
        let params = [
            ("q", query),
            ("restrict_sr", "true"),
            ("sort", opts.sort.as_str()),
            ("t", opts.recency.as_str()),
            ("limit", &limit),
            ("type", "link"),
        ];

        let response = self
            .client
            .get(endpoint)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", &self.user_agent)
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SignalError::Reddit(format!(
                "search of r/{subreddit} failed with status {}",
                response.status()
            )));
        }

        let listing: Listing = response
            .json()
            .await
            .map_err(|e| SignalError::Reddit(format!("listing parse error: {e}")))?;

        let items = listing
            .data
            .children
            .into_iter()
            .filter_map(|post| normalize_post(post.data))
            .collect();

        Ok(items)
    }
}

impl CommunitySearch for RedditClient {
    fn search(
        &self,
        query: &str,
        target: &str,
        opts: &SearchOptions,
    ) -> impl Future<Output = Result<Vec<SignalItem>, SignalError>> + Send {
        self.search_target(query, target, opts)
    }
}

/// Drop posts missing the fields a signal record requires.
#[allow(clippy::cast_possible_truncation)]
fn normalize_post(post: PostData) -> Option<SignalItem> {
    let id = post.id?;
    let title = post.title.filter(|t| !t.trim().is_empty())?;
    let permalink = post.permalink?;
    let published_at = post
        .created_utc
        .and_then(|secs| DateTime::from_timestamp(secs as i64, 0))?;

    Some(SignalItem {
        external_id: id,
        title,
        content: post.selftext.filter(|s| !s.is_empty()),
        origin: post.subreddit.unwrap_or_else(|| "reddit".to_string()),
        score: post.score.unwrap_or(0),
        comment_count: post.num_comments.unwrap_or(0),
        url: format!("https://reddit.com{permalink}"),
        published_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: &str) -> PostData {
        PostData {
            id: Some(id.to_string()),
            title: Some("Looking for a note app".to_string()),
            selftext: Some("I keep losing my notes".to_string()),
            subreddit: Some("startups".to_string()),
            score: Some(55),
            num_comments: Some(12),
            permalink: Some(format!("/r/startups/comments/{id}/")),
            created_utc: Some(1_700_000_000.0),
        }
    }

    #[test]
    fn complete_post_normalizes() {
        let item = normalize_post(post("abc")).expect("valid post");
        assert_eq!(item.external_id, "abc");
        assert_eq!(item.origin, "startups");
        assert_eq!(item.url, "https://reddit.com/r/startups/comments/abc/");
        assert_eq!(item.score, 55);
        assert_eq!(item.comment_count, 12);
    }

    #[test]
    fn post_without_id_is_dropped() {
        let mut p = post("abc");
        p.id = None;
        assert!(normalize_post(p).is_none());
    }

    #[test]
    fn empty_selftext_becomes_none() {
        let mut p = post("abc");
        p.selftext = Some(String::new());
        let item = normalize_post(p).expect("valid post");
        assert!(item.content.is_none());
    }
}
