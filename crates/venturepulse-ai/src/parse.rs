//! Pure parsing and fallback logic for AI responses.

use regex::Regex;
use serde::Deserialize;

use crate::error::AiError;

const MAX_KEYWORDS: usize = 8;
const FALLBACK_KEYWORD_COUNT: usize = 5;
const MIN_FALLBACK_WORD_LEN: usize = 4;

/// Parse a keyword-extraction completion.
///
/// Expects a JSON array of strings; falls back to pulling double-quoted
/// strings out of free text when the model wrapped the array in prose.
///
/// # Errors
///
/// Returns [`AiError::EmptyCompletion`] when neither strategy yields any
/// keyword.
pub(crate) fn parse_keyword_response(content: &str) -> Result<Vec<String>, AiError> {
    let content = content.trim();

    if let Ok(keywords) = serde_json::from_str::<Vec<String>>(content) {
        let keywords: Vec<String> = keywords
            .into_iter()
            .filter(|k| !k.trim().is_empty())
            .take(MAX_KEYWORDS)
            .collect();
        if !keywords.is_empty() {
            return Ok(keywords);
        }
    }

    // Model sometimes replies `Here you go: ["a", "b"]` — salvage the quoted
    // strings.
    let quoted = Regex::new(r#""([^"]+)""#).map_err(|e| AiError::EmptyCompletion(e.to_string()))?;
    let keywords: Vec<String> = quoted
        .captures_iter(content)
        .map(|c| c[1].to_string())
        .take(MAX_KEYWORDS)
        .collect();

    if keywords.is_empty() {
        return Err(AiError::EmptyCompletion(
            "no keywords in completion".to_string(),
        ));
    }
    Ok(keywords)
}

#[derive(Debug, Deserialize)]
struct VerdictResponse {
    score: f64,
    summary: String,
}

/// Parse a scoring completion of the shape `{"score": n, "summary": "..."}`.
///
/// # Errors
///
/// Returns [`AiError::Deserialize`] if the completion is not that shape.
pub(crate) fn parse_verdict_response(content: &str) -> Result<(i32, String), AiError> {
    let parsed: VerdictResponse =
        serde_json::from_str(content.trim()).map_err(|e| AiError::Deserialize {
            context: "score_and_summarize completion".to_string(),
            source: e,
        })?;

    #[allow(clippy::cast_possible_truncation)]
    let rounded = parsed.score.round() as i32;
    Ok((clamp_score(rounded), parsed.summary))
}

/// Clamp a feasibility score into the committed `[0, 100]` range.
#[must_use]
pub fn clamp_score(score: i32) -> i32 {
    score.clamp(0, 100)
}

/// Deterministic keyword fallback built from the idea text.
///
/// Mirrors what the extraction prompt asks for, crudely: the project name
/// plus the first few substantial words of the idea.
#[must_use]
pub fn fallback_keywords(name: &str, idea: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    if !name.trim().is_empty() {
        keywords.push(name.trim().to_string());
    }
    keywords.extend(
        idea.split_whitespace()
            .filter(|w| w.len() >= MIN_FALLBACK_WORD_LEN)
            .take(4)
            .map(ToString::to_string),
    );
    keywords.truncate(FALLBACK_KEYWORD_COUNT);
    keywords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_json_array_parses() {
        let out = parse_keyword_response(r#"["note taking", "ai notes", "pkm"]"#)
            .expect("valid array");
        assert_eq!(out, vec!["note taking", "ai notes", "pkm"]);
    }

    #[test]
    fn keyword_array_wrapped_in_prose_is_salvaged() {
        let out = parse_keyword_response(r#"Sure! ["note taking", "ai notes"]"#)
            .expect("quoted strings salvageable");
        assert_eq!(out, vec!["note taking", "ai notes"]);
    }

    #[test]
    fn keyword_count_is_capped() {
        let many: Vec<String> = (0..20).map(|i| format!("kw{i}")).collect();
        let json = serde_json::to_string(&many).unwrap();
        let out = parse_keyword_response(&json).expect("valid array");
        assert_eq!(out.len(), 8);
    }

    #[test]
    fn unusable_completion_is_an_error() {
        assert!(parse_keyword_response("no keywords here").is_err());
        assert!(parse_keyword_response("[]").is_err());
    }

    #[test]
    fn verdict_parses_and_clamps() {
        let (score, summary) =
            parse_verdict_response(r#"{"score": 140, "summary": "hot market"}"#).expect("parse");
        assert_eq!(score, 100);
        assert_eq!(summary, "hot market");

        let (score, _) =
            parse_verdict_response(r#"{"score": -5, "summary": "cold"}"#).expect("parse");
        assert_eq!(score, 0);
    }

    #[test]
    fn verdict_rounds_fractional_scores() {
        let (score, _) =
            parse_verdict_response(r#"{"score": 71.6, "summary": "ok"}"#).expect("parse");
        assert_eq!(score, 72);
    }

    #[test]
    fn malformed_verdict_is_an_error() {
        assert!(parse_verdict_response("not json").is_err());
    }

    #[test]
    fn clamp_is_identity_inside_range() {
        assert_eq!(clamp_score(0), 0);
        assert_eq!(clamp_score(73), 73);
        assert_eq!(clamp_score(100), 100);
    }

    #[test]
    fn fallback_keywords_prefer_name_then_long_idea_words() {
        let out = fallback_keywords("NoteGenie", "an AI tool for note taking and recall");
        assert_eq!(out[0], "NoteGenie");
        assert!(out.contains(&"note".to_string()));
        assert!(out.len() <= 5);
        // Short glue words never make it in.
        assert!(!out.contains(&"an".to_string()));
    }

    #[test]
    fn fallback_keywords_with_empty_name_still_yields_terms() {
        let out = fallback_keywords("  ", "automated bookkeeping for freelancers");
        assert!(!out.is_empty());
        assert_eq!(out[0], "automated");
    }
}
