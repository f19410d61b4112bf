use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Participant;

/// A capitalised name directly followed by a commitment verb
static SUBJECT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b([A-Z][a-zA-Z'’-]*(?:\s+[A-Z][a-zA-Z'’-]*)?)(?:\s+will\b|['’]ll\b|\s+should\b|\s+must\b|\s+needs?\s+to\b|\s+is\s+(?:responsible|going\s+to)\b)",
    )
    .expect("Invalid regex")
});

/// A capitalised name directly following an assignment phrase
static ASSIGNEE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i:\bassigned\s+to|\bassign\s+(?:it|this|that)\s+to|\bowned\s+by|\bhanded\s+(?:off\s+)?to)\s+([A-Z][a-zA-Z'-]*(?:\s+[A-Z][a-zA-Z'-]*)?)",
    )
    .expect("Invalid regex")
});

/// Everything an owner resolver may look at
#[derive(Debug, Clone, Copy)]
pub struct OwnerContext<'a> {
    /// The candidate sentence
    pub sentence: &'a str,
    /// Speaker of the turn the sentence came from, if any
    pub speaker: Option<&'a Participant>,
    /// Meeting participants in first-appearance order
    pub participants: &'a [Participant],
}

/// A pure owner resolver. Resolvers only return members of `participants`.
pub type OwnerResolver = fn(&OwnerContext<'_>) -> Option<Participant>;

/// Resolvers in precedence order; the first to return an owner wins
pub const OWNER_RESOLVERS: &[OwnerResolver] = &[subject_before_verb, assignee, turn_speaker];

/// Resolve the owner of a candidate sentence
pub fn resolve_owner(context: &OwnerContext<'_>) -> Option<Participant> {
    OWNER_RESOLVERS.iter().find_map(|resolve| resolve(context))
}

/// "Sarah will ...", "Mike should ...", "Dana needs to ..."
pub fn subject_before_verb(context: &OwnerContext<'_>) -> Option<Participant> {
    SUBJECT_RE
        .captures_iter(context.sentence)
        .find_map(|caps| match_participant(caps.get(1)?.as_str(), context.participants))
}

/// "... assigned to Sarah", "... owned by Mike"
pub fn assignee(context: &OwnerContext<'_>) -> Option<Participant> {
    ASSIGNEE_RE
        .captures_iter(context.sentence)
        .find_map(|caps| match_participant(caps.get(1)?.as_str(), context.participants))
}

/// Falls back to whoever was speaking
pub fn turn_speaker(context: &OwnerContext<'_>) -> Option<Participant> {
    let speaker = context.speaker?;
    context
        .participants
        .iter()
        .find(|p| *p == speaker)
        .cloned()
}

/// Match a captured name against the participant list.
///
/// Tries the full capture, then its last word (the one adjacent to the
/// verb), then its first word.
fn match_participant(name: &str, participants: &[Participant]) -> Option<Participant> {
    let words: Vec<&str> = name.split_whitespace().collect();
    let mut candidates = vec![words.join(" ")];
    if words.len() > 1 {
        candidates.push(words[words.len() - 1].to_string());
        candidates.push(words[0].to_string());
    }

    candidates.iter().find_map(|candidate| {
        participants
            .iter()
            .find(|p| p.answers_to(candidate))
            .cloned()
    })
}
