use std::time::Duration;

use thiserror::Error;

/// Errors surfaced to callers of the pipeline
#[derive(Debug, Error)]
pub enum MinutesError {
    /// The transcript was empty or whitespace-only
    #[error("transcript is empty")]
    EmptyTranscript,

    #[error("unknown transcript format: {0} (expected ami, enron, generic or auto)")]
    UnknownFormat(String),

    #[error("unknown reminder channel: {0} (expected slack, email or text)")]
    UnknownChannel(String),

    /// A request body could not be interpreted
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Failure modes of an abstractive summarizer.
///
/// Every variant is recovered by the pipeline by switching to the
/// extractive summary; none of them reach the caller.
#[derive(Debug, Error)]
pub enum SummarizerError {
    /// The model is not configured or cannot be reached
    #[error("summarizer unavailable: {0}")]
    Unavailable(String),

    #[error("summarizer timed out after {0:?}")]
    Timeout(Duration),

    /// The model returned an error or an unusable response
    #[error("summarizer failed: {0}")]
    Failed(String),

    #[error("summarizer returned no text")]
    EmptyOutput,
}
