use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of external feed a trend source pulls from.
///
/// `HackerNews` uses the official item API; the remaining types go through
/// the generic RSS path (or are not yet wired up for fetching at all).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "source_type", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    HackerNews,
    Reddit,
    ProductHunt,
    Github,
    Other,
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SourceType::HackerNews => "hacker_news",
            SourceType::Reddit => "reddit",
            SourceType::ProductHunt => "product_hunt",
            SourceType::Github => "github",
            SourceType::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// Lifecycle state of a project's market validation.
///
/// A failed validation run reverts the project to `Idea` so the user can
/// retry; `Scored` is reached whether or not the AI scoring step ran (a run
/// that found zero signals commits `Scored` with null score/summary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "validation_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    Idea,
    Validating,
    Scored,
}

/// A normalized external post or article, before persistence.
///
/// Produced by the source adapters (Hacker News API, RSS feeds) and the
/// community search clients. `external_id` is the source-stable dedup key:
/// the HN item id, the Reddit post id, or the canonical URL for feeds that
/// expose nothing better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalItem {
    pub external_id: String,
    pub title: String,
    pub content: Option<String>,
    /// Origin label: subreddit or feed/source name.
    pub origin: String,
    pub score: i32,
    pub comment_count: i32,
    pub url: String,
    pub published_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_type_serializes_screaming_snake() {
        let json = serde_json::to_string(&SourceType::HackerNews).unwrap();
        assert_eq!(json, "\"HACKER_NEWS\"");
    }

    #[test]
    fn validation_status_round_trips() {
        let json = serde_json::to_string(&ValidationStatus::Validating).unwrap();
        let back: ValidationStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ValidationStatus::Validating);
    }

    #[test]
    fn source_type_display_matches_db_name() {
        assert_eq!(SourceType::HackerNews.to_string(), "hacker_news");
        assert_eq!(SourceType::Other.to_string(), "other");
    }
}
