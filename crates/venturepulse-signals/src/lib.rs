//! Signal collection for VenturePulse.
//!
//! Normalizes external posts into [`SignalItem`]s from two directions: feed
//! sources for the trend engine (Hacker News API, generic RSS) and community
//! search for the validation pipeline (Reddit). Also hosts the pure ranking
//! function and the dedup/merge engine both pipelines share.
//!
//! [`SignalItem`]: venturepulse_core::SignalItem

pub mod dedup;
pub mod error;
pub mod fanout;
pub mod scorer;
pub mod sources;

pub use dedup::reconcile;
pub use error::SignalError;
pub use fanout::{fan_out_search, CommunitySearch, RecencyWindow, SearchOptions, SortOrder};
pub use scorer::hot_score;
pub use sources::{FeedClient, RedditClient};
