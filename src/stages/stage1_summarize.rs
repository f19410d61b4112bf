use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::SummarizerError;
use crate::heuristics::lexicon::{
    is_stop_word, FREQUENCY_WEIGHT, KEYWORD_WEIGHT, LENGTH_WEIGHT, POSITION_WEIGHT,
    PREFERRED_WORD_RANGE, SUMMARY_KEYWORDS,
};
use crate::heuristics::{split_sentences, words, SentenceRecord};
use crate::llm::{summarize_long, AbstractiveSummarizer};
use crate::models::Decision;

/// Substring match, so "disagreed" and "undecided" count too
static DECISION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)decide|decision|agree|consensus").expect("Invalid regex"));

/// List markers a model may put in front of its sentences
static BULLET_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*(?:[-*•]|\d{1,2}[.)])[ \t]+").expect("Invalid regex"));

/// Configuration for Stage 1 summarization
#[derive(Debug, Clone)]
pub struct SummaryConfig {
    /// Maximum number of summary bullets
    pub bullet_count: usize,
    /// Maximum number of decisions kept
    pub max_decisions: usize,
    /// Upper bound on the whole abstractive path
    pub abstractive_timeout: Duration,
    /// Sentences repeated between consecutive chunks
    pub chunk_overlap: usize,
    /// Maximum chunk-and-combine passes
    pub max_depth: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            bullet_count: 6,
            max_decisions: 10,
            abstractive_timeout: Duration::from_secs(30),
            chunk_overlap: 1,
            max_depth: 3,
        }
    }
}

/// Where the summary bullets came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarySource {
    /// Sentence scoring, no model configured or not needed
    Extractive,
    /// The abstractive model
    Abstractive,
    /// Sentence scoring after the abstractive model failed
    Fallback,
}

impl fmt::Display for SummarySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SummarySource::Extractive => "extractive",
            SummarySource::Abstractive => "abstractive",
            SummarySource::Fallback => "fallback",
        };
        f.write_str(name)
    }
}

/// Result of Stage 1 summarization
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryResult {
    /// Summary bullets, at most `bullet_count`
    pub summary: Vec<String>,
    /// Decision sentences in transcript order
    pub decisions: Vec<Decision>,
    pub source: SummarySource,
}

/// Rule-based summary and decisions
pub fn summarize(cleaned_text: &str, config: &SummaryConfig) -> SummaryResult {
    SummaryResult {
        summary: extractive_summary(cleaned_text, config.bullet_count),
        decisions: extract_decisions(cleaned_text, config.max_decisions),
        source: SummarySource::Extractive,
    }
}

/// Execute Stage 1: Summarization
///
/// Uses the abstractive model when one is supplied and the text has more
/// sentences than bullets. Any model failure, including the timeout, falls
/// back to sentence scoring. Decisions always come from the rule-based pass.
pub async fn execute_stage1(
    cleaned_text: &str,
    config: &SummaryConfig,
    abstractive: Option<&dyn AbstractiveSummarizer>,
) -> SummaryResult {
    let sentence_count = split_sentences(cleaned_text).len();
    let model = match abstractive {
        Some(model) if sentence_count > config.bullet_count => model,
        _ => return summarize(cleaned_text, config),
    };

    let decisions = extract_decisions(cleaned_text, config.max_decisions);
    match abstractive_summary(model, cleaned_text, config).await {
        Ok(summary) => {
            info!(
                "Abstractive summary from {}: {} bullets",
                model.name(),
                summary.len()
            );
            SummaryResult {
                summary,
                decisions,
                source: SummarySource::Abstractive,
            }
        }
        Err(e) => {
            warn!(
                "Abstractive summarizer {} failed, using extractive summary: {}",
                model.name(),
                e
            );
            SummaryResult {
                summary: extractive_summary(cleaned_text, config.bullet_count),
                decisions,
                source: SummarySource::Fallback,
            }
        }
    }
}

async fn abstractive_summary(
    model: &dyn AbstractiveSummarizer,
    cleaned_text: &str,
    config: &SummaryConfig,
) -> Result<Vec<String>, SummarizerError> {
    let output = tokio::time::timeout(
        config.abstractive_timeout,
        summarize_long(model, cleaned_text, config.chunk_overlap, config.max_depth),
    )
    .await
    .map_err(|_| SummarizerError::Timeout(config.abstractive_timeout))??;

    let bullets = split_into_bullets(&output, config.bullet_count);
    if bullets.is_empty() {
        return Err(SummarizerError::EmptyOutput);
    }
    Ok(bullets)
}

/// Select the highest-scoring sentences, returned in transcript order.
///
/// With no more sentences than `bullet_count`, every sentence is returned
/// unscored.
pub fn extractive_summary(text: &str, bullet_count: usize) -> Vec<String> {
    let sentences = split_sentences(text);
    if sentences.len() <= bullet_count {
        return sentences.into_iter().map(|s| s.text).collect();
    }

    let frequencies = word_frequencies(text);
    let total = sentences.len();
    let mut scored: Vec<(f64, &SentenceRecord)> = sentences
        .iter()
        .map(|s| (score_sentence(s, total, &frequencies), s))
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.index.cmp(&b.1.index)));

    let mut selected: Vec<&SentenceRecord> =
        scored.into_iter().take(bullet_count).map(|(_, s)| s).collect();
    selected.sort_by_key(|s| s.index);

    debug!(
        "Selected {} of {} sentences for the summary",
        selected.len(),
        total
    );
    selected.into_iter().map(|s| s.text.clone()).collect()
}

/// Frequencies of content words (longer than three characters, not stop words)
pub fn word_frequencies(text: &str) -> HashMap<String, usize> {
    let mut frequencies = HashMap::new();
    for word in words(text) {
        if is_content_word(&word) {
            *frequencies.entry(word).or_insert(0) += 1;
        }
    }
    frequencies
}

fn is_content_word(word: &str) -> bool {
    word.chars().count() > 3 && !is_stop_word(word)
}

/// Score one sentence.
///
/// Sum of the lead/trail position bonus, the readable-length bonus, the
/// frequency of each content word and a weight per keyword occurrence.
pub fn score_sentence(
    sentence: &SentenceRecord,
    total: usize,
    frequencies: &HashMap<String, usize>,
) -> f64 {
    let mut score = 0.0;

    let ratio = sentence.index as f64 / total as f64;
    if !(0.2..=0.8).contains(&ratio) {
        score += POSITION_WEIGHT;
    }

    let (min_words, max_words) = PREFERRED_WORD_RANGE;
    if (min_words..=max_words).contains(&sentence.word_count) {
        score += LENGTH_WEIGHT;
    }

    for word in words(&sentence.text) {
        if word.chars().count() > 3 {
            if let Some(count) = frequencies.get(&word) {
                score += FREQUENCY_WEIGHT * *count as f64;
            }
        }
    }

    let lower = sentence.text.to_lowercase();
    for keyword in SUMMARY_KEYWORDS {
        score += KEYWORD_WEIGHT * lower.matches(keyword).count() as f64;
    }

    score
}

/// Sentences mentioning a decision, agreement or consensus, deduplicated
pub fn extract_decisions(text: &str, max_decisions: usize) -> Vec<Decision> {
    let mut seen = HashSet::new();
    split_sentences(text)
        .into_iter()
        .filter(|s| DECISION_RE.is_match(&s.text))
        .filter(|s| seen.insert(s.text.clone()))
        .map(|s| s.text)
        .take(max_decisions)
        .collect()
}

/// Split model output into at most `bullet_count` bullets.
///
/// Each sentence is a bullet; when there are more sentences than bullets,
/// consecutive sentences are grouped evenly, earlier groups taking the
/// remainder.
pub fn split_into_bullets(output: &str, bullet_count: usize) -> Vec<String> {
    if bullet_count == 0 {
        return Vec::new();
    }

    let unmarked = BULLET_MARKER_RE.replace_all(output, "");
    let sentences: Vec<String> = split_sentences(&unmarked)
        .into_iter()
        .map(|s| s.text)
        .collect();
    if sentences.len() <= bullet_count {
        return sentences;
    }

    let base = sentences.len() / bullet_count;
    let extra = sentences.len() % bullet_count;
    let mut bullets = Vec::with_capacity(bullet_count);
    let mut rest = sentences.as_slice();
    for i in 0..bullet_count {
        let size = base + usize::from(i < extra);
        let (group, tail) = rest.split_at(size);
        bullets.push(group.join(" "));
        rest = tail;
    }
    bullets
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    const LONG_MEETING: &str = "Welcome everyone to the quarterly planning meeting for the platform team. \
        The weather was nice this weekend. \
        We reviewed the migration of the billing service to the new cluster in detail. \
        Lunch will be pizza. \
        After a long discussion we decided to freeze new features until the billing migration is complete. \
        Someone mentioned the coffee machine. \
        Dana must finish the billing migration runbook before the freeze begins next week. \
        The office plants need water. \
        Thanks everyone, the next planning meeting will review the billing migration results.";

    struct Echo;

    #[async_trait]
    impl AbstractiveSummarizer for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn token_budget(&self) -> usize {
            10_000
        }

        async fn summarize(&self, _text: &str) -> Result<String, SummarizerError> {
            Ok("- The team planned the billing migration.\n- Features are frozen.".to_string())
        }
    }

    struct Unavailable;

    #[async_trait]
    impl AbstractiveSummarizer for Unavailable {
        fn name(&self) -> &str {
            "unavailable"
        }

        fn token_budget(&self) -> usize {
            10_000
        }

        async fn summarize(&self, _text: &str) -> Result<String, SummarizerError> {
            Err(SummarizerError::Unavailable("no model loaded".to_string()))
        }
    }

    struct Slow;

    #[async_trait]
    impl AbstractiveSummarizer for Slow {
        fn name(&self) -> &str {
            "slow"
        }

        fn token_budget(&self) -> usize {
            10_000
        }

        async fn summarize(&self, _text: &str) -> Result<String, SummarizerError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("Too late.".to_string())
        }
    }

    fn config(bullet_count: usize) -> SummaryConfig {
        SummaryConfig {
            bullet_count,
            ..Default::default()
        }
    }

    #[test]
    fn test_short_text_returns_every_sentence() {
        let text = "We met. Sarah will draft the plan. Done?";
        let summary = extractive_summary(text, 3);
        assert_eq!(summary, vec!["We met.", "Sarah will draft the plan.", "Done?"]);
        assert_eq!(extractive_summary(text, 10).len(), 3);
    }

    #[test]
    fn test_selection_is_in_transcript_order() {
        let summary = extractive_summary(LONG_MEETING, 3);
        assert_eq!(summary.len(), 3);
        assert_eq!(
            summary,
            vec![
                "After a long discussion we decided to freeze new features until the billing migration is complete.",
                "Dana must finish the billing migration runbook before the freeze begins next week.",
                "Thanks everyone, the next planning meeting will review the billing migration results.",
            ]
        );
    }

    #[test]
    fn test_summary_is_deterministic() {
        let first = extractive_summary(LONG_MEETING, 4);
        for _ in 0..5 {
            assert_eq!(extractive_summary(LONG_MEETING, 4), first);
        }
    }

    #[test]
    fn test_score_components() {
        let sentence = SentenceRecord {
            text: "We decided the task deadline.".to_string(),
            index: 0,
            word_count: 5,
        };
        let mut frequencies = HashMap::new();
        frequencies.insert("decided".to_string(), 2);
        // position 2.0 + frequency 0.2 + keywords: decide, decided, task, deadline
        let score = score_sentence(&sentence, 10, &frequencies);
        assert!((score - 14.2).abs() < 1e-9, "score was {score}");
    }

    #[test]
    fn test_word_frequencies_skip_short_and_stop_words() {
        let frequencies = word_frequencies("The budget, the BUDGET and this plan.");
        assert_eq!(frequencies.get("budget"), Some(&2));
        assert_eq!(frequencies.get("plan"), Some(&1));
        assert!(!frequencies.contains_key("the"));
        assert!(!frequencies.contains_key("this"));
    }

    #[test]
    fn test_decisions_deduplicated_and_capped() {
        let text = "We agreed to ship. Lunch is late. We agreed to ship. \
                    The decision is final. There is consensus on pricing.";
        assert_eq!(
            extract_decisions(text, 10),
            vec![
                "We agreed to ship.",
                "The decision is final.",
                "There is consensus on pricing.",
            ]
        );
        assert_eq!(extract_decisions(text, 1), vec!["We agreed to ship."]);
        assert!(extract_decisions("Let's launch Nov 15.", 10).is_empty());
    }

    #[test]
    fn test_decision_keywords_match_inside_words() {
        let text = "Sarah disagreed with the timeline. The budget is undecided. We ship Friday.";
        assert_eq!(
            extract_decisions(text, 10),
            vec![
                "Sarah disagreed with the timeline.",
                "The budget is undecided.",
            ]
        );
    }

    #[test]
    fn test_split_into_bullets_groups_evenly() {
        let output = "One. Two. Three. Four. Five.";
        assert_eq!(
            split_into_bullets(output, 2),
            vec!["One. Two. Three.", "Four. Five."]
        );
        assert_eq!(split_into_bullets(output, 5).len(), 5);
        assert_eq!(
            split_into_bullets("1. First point.\n2. Second point.", 6),
            vec!["First point.", "Second point."]
        );
        assert!(split_into_bullets(output, 0).is_empty());
    }

    #[tokio::test]
    async fn test_abstractive_summary_used_when_available() {
        let result = execute_stage1(LONG_MEETING, &config(3), Some(&Echo)).await;
        assert_eq!(result.source, SummarySource::Abstractive);
        assert_eq!(
            result.summary,
            vec!["The team planned the billing migration.", "Features are frozen."]
        );
        // decisions still come from the transcript
        assert_eq!(result.decisions.len(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_model_falls_back() {
        let result = execute_stage1(LONG_MEETING, &config(3), Some(&Unavailable)).await;
        assert_eq!(result.source, SummarySource::Fallback);
        assert_eq!(result.summary, extractive_summary(LONG_MEETING, 3));
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let config = SummaryConfig {
            bullet_count: 3,
            abstractive_timeout: Duration::from_millis(20),
            ..Default::default()
        };
        let result = execute_stage1(LONG_MEETING, &config, Some(&Slow)).await;
        assert_eq!(result.source, SummarySource::Fallback);
        assert_eq!(result.summary.len(), 3);
    }

    #[tokio::test]
    async fn test_short_text_skips_the_model() {
        let result = execute_stage1("One point. Two points.", &config(3), Some(&Unavailable)).await;
        assert_eq!(result.source, SummarySource::Extractive);
        assert_eq!(result.summary.len(), 2);
    }
}
