use std::collections::HashSet;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use super::PreprocessResult;
use crate::heuristics::{
    first_date_expression, infer_priority, resolve_owner, split_sentences, words, DateMatch,
    OwnerContext,
};
use crate::models::{ActionItem, Participant, SpeakerTurn};

/// A name or pronoun committing to something: "Sarah will", "I'll"
static WILL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:[A-Z][a-zA-Z'’-]*|[Ww]e|[Yy]ou|[Hh]e|[Ss]he|[Tt]hey)(?:['’]ll|\s+will)\s+\w+")
        .expect("Invalid regex")
});

/// Other task-bearing phrases
static CUE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:assigned\s+to|needs?\s+to|should|must|responsible\s+for|action\s+items?|task\s+is\s+to|follow(?:ing)?[\s-]?up\s+(?:on|with))\b",
    )
    .expect("Invalid regex")
});

static NEGATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:will\s+not|won['’]t|should\s+not|shouldn['’]t|must\s+not|mustn['’]t|(?:don['’]t|doesn['’]t|no)\s+need\s+to)\b",
    )
    .expect("Invalid regex")
});

static FILLER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:(?:ok(?:ay)?|so|and|also|then|well|alright|um+|uh+|yeah|yes|right|great|sure|now)\b[,\s]*)+",
    )
    .expect("Invalid regex")
});

static SUBJECT_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:[A-Z][a-zA-Z'’-]*(?:\s+[A-Z][a-zA-Z'’-]*)?|[Ww]e|[Yy]ou|[Hh]e|[Ss]he|[Tt]hey)(?:['’]ll|\s+will|\s+should|\s+must|\s+needs?\s+to|\s+ha(?:s|ve)\s+to|\s+(?:is|are)\s+going\s+to|\s+(?:is|are)\s+responsible\s+for|\s+can)(?:\s+also)?\s+",
    )
    .expect("Invalid regex")
});

/// Preposition or phrase introducing a deadline, at the end of the text before it
static DEADLINE_LEAD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)[,\s]*\b(?:by|due(?:\s+(?:by|on))?|before|on|until|no\s+later\s+than|(?:the\s+)?deadline\s+is)\s*$",
    )
    .expect("Invalid regex")
});

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("Invalid regex"));

/// Configuration for Stage 2 action extraction
#[derive(Debug, Clone)]
pub struct ActionConfig {
    /// Token-set similarity at or above which two tasks with the same owner merge
    pub similarity_threshold: f64,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.85,
        }
    }
}

/// Execute Stage 2 on the preprocessor output
pub fn execute_stage2(
    preprocessed: &PreprocessResult,
    meeting_date: NaiveDate,
    config: &ActionConfig,
) -> Vec<ActionItem> {
    extract_actions(
        &preprocessed.cleaned_text,
        &preprocessed.turns,
        &preprocessed.participants,
        meeting_date,
        config,
    )
}

/// Perform Stage 2: action item extraction
///
/// Scans every sentence of every turn (or of the cleaned text when there are
/// no turns) for task cues, then resolves owner, deadline and priority.
/// Relative deadlines are anchored to `meeting_date`. Near-duplicates with
/// the same owner collapse into the first occurrence.
pub fn extract_actions(
    cleaned_text: &str,
    turns: &[SpeakerTurn],
    participants: &[Participant],
    meeting_date: NaiveDate,
    config: &ActionConfig,
) -> Vec<ActionItem> {
    let segments: Vec<(Option<&Participant>, &str)> = if turns.is_empty() {
        vec![(None, cleaned_text)]
    } else {
        turns
            .iter()
            .map(|turn| (turn.speaker.as_ref(), turn.text.as_str()))
            .collect()
    };

    let mut items: Vec<ActionItem> = Vec::new();
    let mut candidates = 0usize;

    for (speaker, text) in segments {
        for sentence in split_sentences(text) {
            if sentence.is_question() || !is_candidate(&sentence.text) {
                continue;
            }
            candidates += 1;

            let item = build_action_item(&sentence.text, speaker, participants, meeting_date);
            debug!(
                "Candidate {:?}: owner {:?}, deadline {:?}",
                sentence.text, item.owner, item.deadline
            );
            merge_or_push(&mut items, item, config.similarity_threshold);
        }
    }

    info!(
        "Extracted {} action items from {} candidate sentences",
        items.len(),
        candidates
    );
    items
}

/// Whether a sentence carries a task cue and no negation
pub fn is_candidate(sentence: &str) -> bool {
    (WILL_RE.is_match(sentence) || CUE_RE.is_match(sentence)) && !NEGATION_RE.is_match(sentence)
}

fn build_action_item(
    sentence: &str,
    speaker: Option<&Participant>,
    participants: &[Participant],
    meeting_date: NaiveDate,
) -> ActionItem {
    let owner = resolve_owner(&OwnerContext {
        sentence,
        speaker,
        participants,
    });

    let date_match = first_date_expression(sentence);
    let deadline = date_match
        .as_ref()
        .and_then(|m| m.expression.resolve(meeting_date));

    ActionItem {
        task: task_text(sentence, date_match.as_ref()),
        owner,
        deadline,
        priority: infer_priority(sentence, deadline.is_some()),
    }
}

/// Reduce a candidate sentence to the task it describes.
///
/// Drops the deadline phrase, leading fillers and the subject+modal prefix.
/// Falls back to the sentence itself if nothing is left.
pub fn task_text(sentence: &str, deadline: Option<&DateMatch>) -> String {
    let without_deadline = match deadline {
        Some(m) => {
            let before = DEADLINE_LEAD_RE.replace(&sentence[..m.start], "");
            format!("{} {}", before.trim_end(), sentence[m.end..].trim_start())
        }
        None => sentence.to_string(),
    };

    let text = FILLER_RE.replace(without_deadline.trim(), "");
    let text = SUBJECT_PREFIX_RE.replace(text.trim_start(), "");
    let text = WHITESPACE_RE.replace_all(&text, " ");
    let text = text.trim().trim_end_matches(['.', '!', ',', ';', ':', ' ']);

    if text.is_empty() {
        return sentence
            .trim()
            .trim_end_matches(['.', '!'])
            .to_string();
    }
    capitalize_first(text)
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Merge into an existing near-duplicate or append
fn merge_or_push(items: &mut Vec<ActionItem>, item: ActionItem, threshold: f64) {
    let existing = items
        .iter_mut()
        .find(|existing| existing.owner == item.owner && same_task(&existing.task, &item.task, threshold));

    match existing {
        Some(existing) => {
            if existing.deadline.is_none() {
                existing.deadline = item.deadline;
            }
            existing.priority = existing.priority.max(item.priority);
        }
        None => items.push(item),
    }
}

/// Normalized equality, or token-set Jaccard similarity at or above `threshold`
pub fn same_task(a: &str, b: &str, threshold: f64) -> bool {
    let a_tokens: Vec<String> = words(a).collect();
    let b_tokens: Vec<String> = words(b).collect();
    if a_tokens == b_tokens {
        return true;
    }

    let a_set: HashSet<&String> = a_tokens.iter().collect();
    let b_set: HashSet<&String> = b_tokens.iter().collect();
    let union = a_set.union(&b_set).count();
    if union == 0 {
        return false;
    }
    let intersection = a_set.intersection(&b_set).count();
    intersection as f64 / union as f64 >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, TranscriptFormat};
    use crate::stages::preprocess;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn extract_plain(text: &str, participants: &[Participant], meeting: NaiveDate) -> Vec<ActionItem> {
        extract_actions(text, &[], participants, meeting, &ActionConfig::default())
    }

    #[test]
    fn test_sarah_handles_marketing() {
        let items = extract_plain(
            "Sarah will handle marketing materials by November 1st.",
            &[Participant::new("Sarah")],
            date(2024, 10, 1),
        );
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.owner, Some(Participant::new("Sarah")));
        assert_eq!(item.deadline, Some(date(2024, 11, 1)));
        assert!(item.priority >= Priority::Medium);
        assert_eq!(item.task, "Handle marketing materials");
    }

    #[test]
    fn test_turn_speaker_owns_first_person_tasks() {
        let pre = preprocess(
            "John: Let's launch Nov 15. Sarah: I'll handle marketing by Nov 1. Mike: I'll finish testing by Nov 10.",
            TranscriptFormat::Auto,
        );
        let items = execute_stage2(&pre, date(2024, 10, 1), &ActionConfig::default());
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].owner, Some(Participant::new("Sarah")));
        assert_eq!(items[0].deadline, Some(date(2024, 11, 1)));
        assert_eq!(items[0].task, "Handle marketing");
        assert_eq!(items[1].owner, Some(Participant::new("Mike")));
        assert_eq!(items[1].deadline, Some(date(2024, 11, 10)));
        assert_eq!(items[1].task, "Finish testing");
    }

    #[test]
    fn test_typographic_apostrophes() {
        let pre = preprocess(
            "John: Let’s go. Sarah: I’ll handle marketing by Nov 1.",
            TranscriptFormat::Auto,
        );
        let items = execute_stage2(&pre, date(2024, 10, 1), &ActionConfig::default());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].owner, Some(Participant::new("Sarah")));
        assert_eq!(items[0].deadline, Some(date(2024, 11, 1)));
        assert_eq!(items[0].task, "Handle marketing");

        let items = extract_plain(
            "We’ll ship the build tomorrow. They won’t need to send the deck, they will skip it.",
            &[],
            date(2024, 1, 15),
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].task, "Ship the build");
        assert_eq!(items[0].deadline, Some(date(2024, 1, 16)));
    }

    #[test]
    fn test_single_letter_sentence_end_does_not_leak_into_task() {
        let items = extract_plain(
            "We picked plan B. Sarah will write the spec by Friday.",
            &[Participant::new("Sarah")],
            date(2024, 1, 15),
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].task, "Write the spec");
        assert_eq!(items[0].owner, Some(Participant::new("Sarah")));
        assert!(items[0].deadline.is_some());
    }

    #[test]
    fn test_questions_and_negations_are_not_tasks() {
        let items = extract_plain(
            "Should we ship on Friday? John will not attend. Will you send the deck?",
            &[Participant::new("John")],
            date(2024, 1, 15),
        );
        assert!(items.is_empty());
    }

    #[test]
    fn test_high_priority_cue() {
        let items = extract_plain(
            "John needs to fix the login bug ASAP.",
            &[Participant::new("John")],
            date(2024, 1, 15),
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].priority, Priority::High);
        assert_eq!(items[0].owner, Some(Participant::new("John")));
        assert_eq!(items[0].task, "Fix the login bug ASAP");
    }

    #[test]
    fn test_no_participants_means_no_owner() {
        let items = extract_plain("Someone should book the room.", &[], date(2024, 1, 15));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].owner, None);
        assert_eq!(items[0].deadline, None);
        assert_eq!(items[0].priority, Priority::Low);
        assert_eq!(items[0].task, "Book the room");
    }

    #[test]
    fn test_duplicates_merge_and_keep_first_deadline() {
        // 2024-01-15 is a Monday
        let items = extract_plain(
            "Mike will update the docs. Okay, Mike will update the docs by Friday.",
            &[Participant::new("Mike")],
            date(2024, 1, 15),
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].task, "Update the docs");
        assert_eq!(items[0].deadline, Some(date(2024, 1, 19)));
        assert_eq!(items[0].priority, Priority::Medium);
    }

    #[test]
    fn test_near_duplicates_merge_above_threshold() {
        assert!(same_task(
            "Send the final report to finance",
            "Send the final report to the finance team",
            0.85
        ));
        assert!(!same_task("Send the report", "Review the budget", 0.85));
        assert!(same_task("Update  the DOCS", "update the docs", 0.85));
    }

    #[test]
    fn test_different_owners_do_not_merge() {
        let people = [Participant::new("Ann"), Participant::new("Bo")];
        let items = extract_plain(
            "Ann will review the budget. Bo will review the budget.",
            &people,
            date(2024, 1, 15),
        );
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_impossible_deadline_is_unresolved() {
        let items = extract_plain(
            "Ann must file the report by Feb 30.",
            &[Participant::new("Ann")],
            date(2024, 1, 15),
        );
        assert_eq!(items[0].deadline, None);
        assert_eq!(items[0].priority, Priority::Low);
    }

    #[test]
    fn test_task_text_strips_deadline_lead() {
        let sentence = "Okay, so we should send invoices by end of the week.";
        let m = first_date_expression(sentence);
        assert_eq!(task_text(sentence, m.as_ref()), "Send invoices");
    }
}
