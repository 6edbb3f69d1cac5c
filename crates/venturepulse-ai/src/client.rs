//! HTTP client for the OpenAI chat-completions API.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AiError;
use crate::parse::{fallback_keywords, parse_keyword_response, parse_verdict_response};
use crate::{FALLBACK_SCORE, FALLBACK_SUMMARY};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const KEYWORD_MAX_TOKENS: u32 = 200;
const VERDICT_MAX_TOKENS: u32 = 500;
/// Most-popular-first sample size handed to the scoring prompt.
const SIGNAL_SAMPLE: usize = 10;
const CONTENT_SNIPPET_LEN: usize = 300;

/// Condensed signal fields the scoring prompt needs.
#[derive(Debug, Clone)]
pub struct SignalDigest {
    pub title: String,
    pub content: Option<String>,
    pub origin: String,
    pub score: i32,
    pub comment_count: i32,
}

/// Feasibility assessment for one validation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Always within `[0, 100]`.
    pub score: i32,
    pub summary: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Client for the OpenAI chat-completions endpoint.
///
/// Use [`OpenAiClient::new`] for production or
/// [`OpenAiClient::with_base_url`] to point at a mock server in tests.
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    /// # Errors
    ///
    /// Returns [`AiError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, AiError> {
        Self::with_base_url(api_key, model, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, AiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Extract 5-8 search keywords from a project description.
    ///
    /// Fails closed: any API or parse failure is logged and a small
    /// deterministic keyword set derived from the idea text is returned
    /// instead, so the caller always gets usable terms.
    pub async fn extract_keywords(
        &self,
        name: &str,
        idea: &str,
        target_market: Option<&str>,
    ) -> Vec<String> {
        let market_line = target_market
            .map(|m| format!("Target Market: {m}\n"))
            .unwrap_or_default();
        let prompt = format!(
            "You are a market research expert. Extract 5-8 relevant search keywords from the \
             following project description that would be useful for finding related discussions \
             in startup and technology communities.\n\n\
             Project Name: {name}\n\
             Project Description: {idea}\n\
             {market_line}\n\
             Return ONLY a JSON array of keywords, no other text. \
             Example: [\"keyword1\", \"keyword2\", \"keyword3\"]"
        );

        let result = self
            .chat(
                "You are a helpful assistant that extracts search keywords from project \
                 descriptions. Always respond with valid JSON arrays only.",
                &prompt,
                KEYWORD_MAX_TOKENS,
            )
            .await
            .and_then(|content| parse_keyword_response(&content));

        match result {
            Ok(keywords) => keywords,
            Err(e) => {
                tracing::warn!(error = %e, "keyword extraction failed; using fallback keywords");
                fallback_keywords(name, idea)
            }
        }
    }

    /// Score an idea's feasibility against collected community signals.
    ///
    /// Only the `SIGNAL_SAMPLE` most popular signals are included in the
    /// prompt; callers pass them most-popular-first. Fails closed to a
    /// neutral [`Verdict`] (score 50, generic summary) on any API or parse
    /// failure.
    pub async fn score_and_summarize(&self, idea: &str, signals: &[SignalDigest]) -> Verdict {
        let context: String = signals
            .iter()
            .take(SIGNAL_SAMPLE)
            .enumerate()
            .map(|(i, s)| {
                let snippet: String = s
                    .content
                    .as_deref()
                    .unwrap_or("")
                    .chars()
                    .take(CONTENT_SNIPPET_LEN)
                    .collect();
                format!(
                    "\nPost {} ({}, Score: {}, Comments: {}):\nTitle: {}\nContent: {snippet}\n",
                    i + 1,
                    s.origin,
                    s.score,
                    s.comment_count,
                    s.title
                )
            })
            .collect();

        let prompt = format!(
            "You are a startup advisor analyzing market validation data from online communities.\n\n\
             Project Idea: {idea}\n\n\
             Posts Found:\n{context}\n\
             Based on these discussions, provide:\n\
             1. A feasibility score (0-100) where 80-100 means strong market validation and \
             0-39 means weak validation with little interest.\n\
             2. A brief summary (2-3 sentences) covering key insights, demand signals, and \
             concerns or opportunities.\n\n\
             Respond in JSON format:\n{{\n  \"score\": <number>,\n  \"summary\": \"<string>\"\n}}"
        );

        let result = self
            .chat(
                "You are a startup advisor providing market validation analysis. \
                 Always respond with valid JSON only.",
                &prompt,
                VERDICT_MAX_TOKENS,
            )
            .await
            .and_then(|content| parse_verdict_response(&content));

        match result {
            Ok((score, summary)) => Verdict { score, summary },
            Err(e) => {
                tracing::warn!(error = %e, "feasibility scoring failed; using neutral fallback");
                Verdict {
                    score: FALLBACK_SCORE,
                    summary: FALLBACK_SUMMARY.to_string(),
                }
            }
        }
    }

    async fn chat(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<String, AiError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.7,
            max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AiError::Api(format!(
                "chat completion failed with status {}",
                response.status()
            )));
        }

        let body: ChatResponse = {
            let raw = response.text().await?;
            serde_json::from_str(&raw).map_err(|e| AiError::Deserialize {
                context: "chat completion envelope".to_string(),
                source: e,
            })?
        };

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AiError::EmptyCompletion("no completion content".to_string()))
    }
}
