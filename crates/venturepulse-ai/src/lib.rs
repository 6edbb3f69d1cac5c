//! Qualitative AI collaborator for VenturePulse.
//!
//! Wraps the OpenAI chat-completions API for the two text tasks the
//! validation pipeline needs: keyword extraction from a project idea and
//! feasibility scoring of collected community signals. Both operations fail
//! closed — an API or parse failure degrades to a deterministic fallback so
//! a validation run still completes.

mod client;
mod error;
mod parse;

pub use client::{OpenAiClient, SignalDigest, Verdict};
pub use error::AiError;
pub use parse::{clamp_score, fallback_keywords};

/// Neutral verdict used when scoring fails closed.
pub const FALLBACK_SCORE: i32 = 50;
pub const FALLBACK_SUMMARY: &str =
    "Based on the collected signals the idea shows some market potential, but the \
     analysis service was unavailable; re-run validation for a scored assessment.";
