use async_trait::async_trait;
use tracing::debug;

use crate::error::SummarizerError;
use crate::heuristics::split_sentences;

/// A pluggable model that rewrites text into a shorter summary.
///
/// Implementations are optional collaborators: every error they return is
/// recovered by falling back to the extractive summary.
#[async_trait]
pub trait AbstractiveSummarizer: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Largest input, in rough tokens, accepted by one `summarize` call
    fn token_budget(&self) -> usize;

    /// Summarize text that fits within `token_budget`
    async fn summarize(&self, text: &str) -> Result<String, SummarizerError>;
}

/// Rough token estimate (~4 characters per token)
pub fn rough_token_count(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Split text into chunks of whole sentences that fit a token budget.
///
/// Each chunk after the first repeats the last `overlap` sentences of the
/// previous chunk, unless that would leave no room for a new sentence. A
/// single sentence larger than the budget becomes its own chunk.
pub fn chunk_sentences(text: &str, budget: usize, overlap: usize) -> Vec<String> {
    let sentences = split_sentences(text);
    let mut chunks = Vec::new();
    let mut current: Vec<(&str, usize)> = Vec::new();
    let mut current_tokens = 0usize;

    for sentence in &sentences {
        let tokens = rough_token_count(&sentence.text);

        if !current.is_empty() && current_tokens + tokens > budget {
            chunks.push(join_chunk(&current));

            let keep = overlap.min(current.len());
            current.drain(..current.len() - keep);
            current_tokens = current.iter().map(|(_, t)| t).sum();
            if current_tokens + tokens > budget {
                current.clear();
                current_tokens = 0;
            }
        }

        current.push((sentence.text.as_str(), tokens));
        current_tokens += tokens;
    }

    if !current.is_empty() {
        chunks.push(join_chunk(&current));
    }

    chunks
}

fn join_chunk(sentences: &[(&str, usize)]) -> String {
    sentences
        .iter()
        .map(|(text, _)| *text)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Summarize text of any length with a budgeted model.
///
/// Text within the budget is summarized in one call. Longer text is chunked,
/// each chunk summarized, and the combined output re-chunked until it fits,
/// for at most `max_depth` passes.
pub async fn summarize_long(
    model: &dyn AbstractiveSummarizer,
    text: &str,
    overlap: usize,
    max_depth: usize,
) -> Result<String, SummarizerError> {
    let budget = model.token_budget().max(1);
    let mut current = text.to_string();

    for depth in 0..=max_depth {
        if rough_token_count(&current) <= budget {
            if depth == 0 {
                return non_empty(model.summarize(&current).await?);
            }
            return Ok(current);
        }

        let chunks = chunk_sentences(&current, budget, overlap);
        debug!(
            "{}: pass {} summarizing {} chunks",
            model.name(),
            depth + 1,
            chunks.len()
        );

        let mut parts = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            parts.push(non_empty(model.summarize(chunk).await?)?);
        }
        current = parts.join(" ");
    }

    Err(SummarizerError::Failed(format!(
        "summary still exceeds {} tokens after {} passes",
        budget,
        max_depth + 1
    )))
}

fn non_empty(output: String) -> Result<String, SummarizerError> {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        Err(SummarizerError::EmptyOutput)
    } else {
        Ok(trimmed.to_string())
    }
}
