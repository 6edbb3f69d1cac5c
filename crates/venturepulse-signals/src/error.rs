use thiserror::Error;

use venturepulse_core::SourceType;

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Reddit API error: {0}")]
    Reddit(String),

    #[error("fetch failed for {source_name}: {reason}")]
    Fetch { source_name: String, reason: String },

    #[error("source type {0} has no fetch path")]
    UnsupportedSource(SourceType),

    #[error("all {0} search targets failed")]
    AllTargetsFailed(usize),
}
