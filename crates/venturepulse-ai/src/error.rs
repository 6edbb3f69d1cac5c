use thiserror::Error;

/// Errors from the OpenAI chat-completions client.
///
/// These stay internal to the crate's public operations, which fail closed;
/// they surface only through logs and the fallback outputs.
#[derive(Debug, Error)]
pub enum AiError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned a non-success status.
    #[error("OpenAI API error: {0}")]
    Api(String),

    /// The response body could not be deserialized into the expected shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The completion came back empty or in a shape no parser recognized.
    #[error("unusable completion: {0}")]
    EmptyCompletion(String),
}
