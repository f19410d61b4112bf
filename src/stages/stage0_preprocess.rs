use std::collections::HashMap;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::heuristics::find_explicit_date;
use crate::heuristics::lexicon::is_label_stopword;
use crate::models::{Participant, SpeakerTurn, Transcript, TranscriptFormat};

/// `[00:01:02]`, `[01:02]`, `(01:02)` and bare `00:01:02`
static TIMESTAMP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\[\d{1,2}:\d{2}(?::\d{2})?(?:\.\d+)?\]|\(\d{1,2}:\d{2}(?::\d{2})?(?:\.\d+)?\)|\b\d{1,2}:\d{2}:\d{2}(?:\.\d+)?\b",
    )
    .expect("Invalid regex")
});

/// Speaker labels at a line start or inline after a sentence terminator.
/// A label may carry an honorific ("Dr. Smith:").
static LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?m)(?:^[ \t]*|(?P<punct>[.!?]["')\]]?)[ \t]+)(?:<(?P<angle>[^<>\n]{1,40})>[ \t]*:?|(?P<label>Speaker[ \t]+\d+|\[[A-Za-z][A-Za-z .'-]{0,40}\]|(?:(?:Dr|Mr|Mrs|Ms|Prof)\.[ \t]+)?[A-Z][A-Za-z'-]*(?:[ \t]+[A-Z][A-Za-z'-]*){0,2})[ \t]*:)[ \t]*"#,
    )
    .expect("Invalid regex")
});

/// Non-verbal annotations: `[laughter]`, `[inaudible 00:03]`
static BRACKET_ASIDE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]\n]*\]").expect("Invalid regex"));

/// Lowercase parentheticals: `(laughs)`, `(cross talk)`
static PAREN_ASIDE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([a-z][a-z ]{0,29}\)").expect("Invalid regex"));

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("Invalid regex"));

static SPACE_BEFORE_PUNCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" +([.,!?;:])").expect("Invalid regex"));

static BLOCK_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*\n").expect("Invalid regex"));

static EMAIL_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[ \t]*(from|to|cc|bcc|subject|sent|date|reply-to|importance)[ \t]*:[ \t]*(.*)$")
        .expect("Invalid regex")
});

static ORIGINAL_MESSAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[ \t]*-{2,}[ \t]*(?:original|forwarded)[ \t]+message[ \t]*-{2,}")
        .expect("Invalid regex")
});

static WROTE_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[ \t]*on\b.*\bwrote:[ \t]*$").expect("Invalid regex"));

static SUBJECT_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:(?:re|fw|fwd)[ \t]*:[ \t]*)+").expect("Invalid regex"));

static ADDRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\w.+-]+@[\w-]+(?:\.[\w-]+)+").expect("Invalid regex"));

/// Result of Stage 0 preprocessing
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessResult {
    /// The format actually used for segmentation (never `Auto`)
    pub format: TranscriptFormat,
    /// Turn texts joined in discussion order, one sentence boundary per turn
    pub cleaned_text: String,
    /// Speaker turns in discussion order
    pub turns: Vec<SpeakerTurn>,
    /// Deduplicated speakers in first-appearance order
    pub participants: Vec<Participant>,
    /// First explicit date found in headers or text
    pub inferred_date: Option<NaiveDate>,
    /// Title taken from an email subject line
    pub inferred_title: Option<String>,
}

/// A turn before cleaning and participant canonicalisation
#[derive(Debug)]
struct RawTurn {
    speaker: Option<String>,
    text: String,
}

/// Segments plus whatever metadata the layout carried
#[derive(Debug, Default)]
struct Segmentation {
    turns: Vec<RawTurn>,
    title: Option<String>,
    header_date: Option<NaiveDate>,
}

/// Execute Stage 0 on a validated transcript
pub fn execute_stage0(transcript: &Transcript) -> PreprocessResult {
    preprocess(transcript.text(), transcript.format())
}

/// Perform Stage 0: preprocessing
///
/// This stage:
/// 1. Resolves the format (`auto` inspects email headers, then speaker labels)
/// 2. Segments the text into turns for that format
/// 3. Strips timestamps, annotations and quoting from each turn
/// 4. Canonicalises speakers into the participant list
/// 5. Infers the meeting date and, for email threads, the title
///
/// Never fails: unrecognised layouts degrade to `generic`.
pub fn preprocess(raw: &str, hint: TranscriptFormat) -> PreprocessResult {
    let text = raw
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace(['\u{2018}', '\u{2019}'], "'");
    let untimed = TIMESTAMP_RE.replace_all(&text, " ");

    let format = match hint {
        TranscriptFormat::Auto => detect_format(&untimed),
        explicit => explicit,
    };

    let segmentation = match format {
        TranscriptFormat::Enron => segment_email(&text),
        TranscriptFormat::Ami => segment_labels(&untimed),
        TranscriptFormat::Generic | TranscriptFormat::Auto => segment_blocks(&text),
    };

    let mut participants: Vec<Participant> = Vec::new();
    let mut canonical: HashMap<String, Participant> = HashMap::new();
    let mut turns = Vec::new();

    for raw_turn in segmentation.turns {
        let cleaned = clean_turn_text(&raw_turn.text);
        if cleaned.is_empty() {
            continue;
        }

        let speaker = raw_turn.speaker.map(|name| {
            canonical
                .entry(name.to_lowercase())
                .or_insert_with(|| {
                    let participant = Participant::new(name.clone());
                    participants.push(participant.clone());
                    participant
                })
                .clone()
        });

        turns.push(SpeakerTurn {
            speaker,
            text: cleaned,
            turn_index: turns.len(),
        });
    }

    let cleaned_text = join_turns(&turns);
    let inferred_date = segmentation
        .header_date
        .or_else(|| find_explicit_date(&text));

    debug!(
        "Preprocessed {} format: {} turns, {} participants, date {:?}",
        format,
        turns.len(),
        participants.len(),
        inferred_date
    );

    PreprocessResult {
        format,
        cleaned_text,
        turns,
        participants,
        inferred_date,
        inferred_title: segmentation.title,
    }
}

/// Choose a format from structural cues
pub fn detect_format(text: &str) -> TranscriptFormat {
    if looks_like_email(text) {
        TranscriptFormat::Enron
    } else if LABEL_RE.captures_iter(text).any(|caps| label_name(&caps).is_some()) {
        TranscriptFormat::Ami
    } else {
        TranscriptFormat::Generic
    }
}

/// A `From:` header plus at least one other header or a reply marker
fn looks_like_email(text: &str) -> bool {
    let mut has_from = false;
    let mut has_other = false;
    for line in text.lines() {
        if ORIGINAL_MESSAGE_RE.is_match(line) {
            has_other = true;
        } else if let Some(caps) = EMAIL_HEADER_RE.captures(line) {
            if caps[1].eq_ignore_ascii_case("from") {
                has_from = true;
            } else {
                has_other = true;
            }
        }
    }
    has_from && has_other
}

/// Speaker name of a label match, if it is a real speaker
fn label_name(caps: &regex::Captures<'_>) -> Option<String> {
    let raw = caps
        .name("angle")
        .or_else(|| caps.name("label"))?
        .as_str();
    let name = normalize_speaker(raw);
    if name.is_empty() || is_label_stopword(&name) {
        None
    } else {
        Some(name)
    }
}

fn segment_labels(text: &str) -> Segmentation {
    let mut turns = Vec::new();
    let mut speaker: Option<String> = None;
    let mut text_start = 0usize;

    for caps in LABEL_RE.captures_iter(text) {
        let Some(name) = label_name(&caps) else {
            continue;
        };
        let Some(whole) = caps.get(0) else { continue };
        let previous_end = caps.name("punct").map_or(whole.start(), |p| p.end());

        turns.push(RawTurn {
            speaker: speaker.take(),
            text: text[text_start..previous_end].to_string(),
        });
        speaker = Some(name);
        text_start = whole.end();
    }

    turns.push(RawTurn {
        speaker,
        text: text[text_start..].to_string(),
    });

    Segmentation {
        turns,
        ..Default::default()
    }
}

fn segment_blocks(text: &str) -> Segmentation {
    let turns = BLOCK_SPLIT_RE
        .split(text)
        .map(|block| RawTurn {
            speaker: None,
            text: block.to_string(),
        })
        .collect();

    Segmentation {
        turns,
        ..Default::default()
    }
}

/// One message of an email thread
#[derive(Debug, Default)]
struct EmailMessage {
    sender: Option<String>,
    subject: Option<String>,
    sent: Option<String>,
    body: Vec<String>,
    in_headers: bool,
}

impl EmailMessage {
    fn started() -> Self {
        Self {
            in_headers: true,
            ..Default::default()
        }
    }

    fn has_body(&self) -> bool {
        self.body.iter().any(|line| !line.trim().is_empty())
    }
}

fn segment_email(text: &str) -> Segmentation {
    let mut messages: Vec<EmailMessage> = Vec::new();
    let mut current = EmailMessage::started();

    for line in text.lines() {
        if ORIGINAL_MESSAGE_RE.is_match(line) {
            messages.push(std::mem::replace(&mut current, EmailMessage::started()));
            continue;
        }

        if let Some(caps) = EMAIL_HEADER_RE.captures(line) {
            let header = caps[1].to_ascii_lowercase();
            if header == "from" && current.has_body() {
                messages.push(std::mem::replace(&mut current, EmailMessage::started()));
            }
            if current.in_headers || header == "from" {
                current.in_headers = true;
                let value = caps[2].trim().to_string();
                match header.as_str() {
                    "from" => current.sender = Some(value),
                    "subject" => current.subject = current.subject.take().or(Some(value)),
                    "sent" | "date" => current.sent = current.sent.take().or(Some(value)),
                    _ => {}
                }
                continue;
            }
        }

        if line.trim_start().starts_with('>') || WROTE_LINE_RE.is_match(line) {
            continue;
        }
        if !line.trim().is_empty() {
            current.in_headers = false;
        }
        current.body.push(line.to_string());
    }
    messages.push(current);

    let title = messages
        .iter()
        .filter_map(|m| m.subject.as_deref())
        .map(|s| SUBJECT_PREFIX_RE.replace(s.trim(), "").trim().to_string())
        .find(|s| !s.is_empty());

    let header_date = messages
        .iter()
        .filter_map(|m| m.sent.as_deref())
        .find_map(find_explicit_date);

    let turns = messages
        .into_iter()
        .filter(|m| m.has_body())
        .map(|m| RawTurn {
            speaker: m.sender.as_deref().map(normalize_sender).filter(|s| !s.is_empty()),
            text: m.body.join("\n"),
        })
        .collect();

    Segmentation {
        turns,
        title,
        header_date,
    }
}

/// Reduce a `From:` value to a display name
fn normalize_sender(value: &str) -> String {
    let display = match value.find('<') {
        Some(open) => {
            let name = value[..open].trim().trim_matches(['"', '\'']).trim();
            if name.is_empty() {
                value[open + 1..].trim_end_matches('>').trim().to_string()
            } else {
                name.to_string()
            }
        }
        None => value.trim().to_string(),
    };
    normalize_speaker(&display)
}

/// Normalise a speaker label.
///
/// Strips brackets, reduces e-mail addresses to a name, reorders
/// `Last, First` and title-cases ALL-CAPS names.
pub fn normalize_speaker(raw: &str) -> String {
    let mut name = raw
        .trim()
        .trim_start_matches(['[', '<', '"'])
        .trim_end_matches([']', '>', '"'])
        .trim()
        .to_string();

    if let Some(address) = ADDRESS_RE.find(&name) {
        let local = address.as_str().split('@').next().unwrap_or_default();
        name = local
            .split(['.', '_', '-', '+'])
            .filter(|part| !part.is_empty())
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" ");
    }

    if let Some((last, first)) = name.split_once(',') {
        let (last, first) = (last.trim(), first.trim());
        if !last.is_empty() && !first.is_empty() {
            name = format!("{first} {last}");
        }
    }

    let letters: Vec<char> = name.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() > 1 && letters.iter().all(|c| c.is_uppercase()) {
        name = name
            .split_whitespace()
            .map(|word| capitalize(&word.to_lowercase()))
            .collect::<Vec<_>>()
            .join(" ");
    }

    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Remove timestamps, annotations and quoting, then normalise spacing
fn clean_turn_text(text: &str) -> String {
    let unquoted: Vec<&str> = text
        .lines()
        .filter(|line| !line.trim_start().starts_with('>'))
        .collect();
    let joined = unquoted.join("\n");

    let text = TIMESTAMP_RE.replace_all(&joined, " ");
    let text = BRACKET_ASIDE_RE.replace_all(&text, " ");
    let text = PAREN_ASIDE_RE.replace_all(&text, " ");
    let text = WHITESPACE_RE.replace_all(&text, " ");
    let text = SPACE_BEFORE_PUNCT_RE.replace_all(&text, "$1");
    text.trim().to_string()
}

/// Join turns so that every turn ends a sentence
fn join_turns(turns: &[SpeakerTurn]) -> String {
    turns
        .iter()
        .map(|turn| {
            let closed = turn
                .text
                .trim_end_matches(['"', '\'', ')', ']'])
                .ends_with(['.', '!', '?']);
            if closed {
                turn.text.clone()
            } else {
                format!("{}.", turn.text)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speakers(result: &PreprocessResult) -> Vec<Option<&str>> {
        result
            .turns
            .iter()
            .map(|t| t.speaker.as_ref().map(|p| p.name()))
            .collect()
    }

    fn names(result: &PreprocessResult) -> Vec<&str> {
        result.participants.iter().map(|p| p.name()).collect()
    }

    #[test]
    fn test_inline_labels_on_one_line() {
        let result = preprocess(
            "John: Let's launch Nov 15. Sarah: I'll handle marketing by Nov 1. Mike: I'll finish testing by Nov 10.",
            TranscriptFormat::Auto,
        );
        assert_eq!(result.format, TranscriptFormat::Ami);
        assert_eq!(names(&result), vec!["John", "Sarah", "Mike"]);
        assert_eq!(result.turns.len(), 3);
        assert_eq!(result.turns[1].text, "I'll handle marketing by Nov 1.");
        assert_eq!(result.turns[2].turn_index, 2);
        assert_eq!(result.inferred_date, None);
    }

    #[test]
    fn test_typographic_apostrophes_normalised() {
        let result = preprocess(
            "John: Let’s go. Sarah: I’ll handle marketing by Nov 1.",
            TranscriptFormat::Auto,
        );
        assert_eq!(names(&result), vec!["John", "Sarah"]);
        assert_eq!(result.turns[0].text, "Let's go.");
        assert_eq!(result.turns[1].text, "I'll handle marketing by Nov 1.");
    }

    #[test]
    fn test_honorific_stays_with_label() {
        let result = preprocess("Dr. Smith: Hello all. Ann: Hi.", TranscriptFormat::Auto);
        assert_eq!(names(&result), vec!["Dr. Smith", "Ann"]);
        assert_eq!(speakers(&result), vec![Some("Dr. Smith"), Some("Ann")]);
        assert_eq!(result.cleaned_text, "Hello all. Hi.");

        let result = preprocess("Ann: Welcome. Mrs. Lee: Thanks.", TranscriptFormat::Auto);
        assert_eq!(names(&result), vec!["Ann", "Mrs. Lee"]);
        assert_eq!(result.turns[0].text, "Welcome.");
        assert_eq!(result.turns[1].text, "Thanks.");
    }

    #[test]
    fn test_participants_deduplicated_case_insensitively() {
        let text = "ALICE: Morning all.\nbob: hi\nBob: Let's start.\nAlice: Sure.";
        let result = preprocess(text, TranscriptFormat::Ami);
        // lowercase labels are not speaker labels, so "bob: hi" stays with Alice
        assert_eq!(names(&result), vec!["Alice", "Bob"]);
        assert_eq!(
            speakers(&result),
            vec![Some("Alice"), Some("Bob"), Some("Alice")]
        );
    }

    #[test]
    fn test_timestamps_and_annotations_removed() {
        let text = "[00:00:05] John: Welcome [laughter] everyone (laughs).\n(01:10) Sarah: Thanks , John";
        let result = preprocess(text, TranscriptFormat::Auto);
        assert_eq!(result.turns[0].text, "Welcome everyone.");
        assert_eq!(result.turns[1].text, "Thanks, John");
        assert_eq!(result.cleaned_text, "Welcome everyone. Thanks, John.");
    }

    #[test]
    fn test_stoplisted_labels_are_not_speakers() {
        let text = "Agenda: budget review\nJohn: We agreed on the budget. Note: it is final.";
        let result = preprocess(text, TranscriptFormat::Auto);
        assert_eq!(names(&result), vec!["John"]);
        assert_eq!(speakers(&result), vec![None, Some("John")]);
        assert_eq!(result.turns[1].text, "We agreed on the budget. Note: it is final.");
    }

    #[test]
    fn test_speaker_label_forms() {
        let text = "Speaker 1: Hello.\n[MARY JANE]: Hi there.\n<dave> Morning.";
        let result = preprocess(text, TranscriptFormat::Auto);
        assert_eq!(names(&result), vec!["Speaker 1", "Mary Jane", "dave"]);
    }

    #[test]
    fn test_unlabelled_text_is_generic() {
        let text = "we talked about the roadmap\nfor a while\n\nthen we broke for lunch";
        let result = preprocess(text, TranscriptFormat::Auto);
        assert_eq!(result.format, TranscriptFormat::Generic);
        assert!(result.participants.is_empty());
        assert_eq!(result.turns.len(), 2);
        assert_eq!(result.turns[0].text, "we talked about the roadmap for a while");
        assert!(result.turns.iter().all(|t| t.speaker.is_none()));
    }

    #[test]
    fn test_email_thread() {
        let text = "\
From: Smith, Jane <jane.smith@enron.com>
To: team@enron.com
Sent: Monday, October 15, 2001 3:30 PM
Subject: RE: Pipeline review

Mark will send the capacity numbers by Friday.

> older quoted text
On Sun, Oct 14, 2001 at 9:00 AM, Mark wrote:
-----Original Message-----
From: mark.taylor@enron.com
Subject: Pipeline review

Can we review the pipeline numbers?
";
        let result = preprocess(text, TranscriptFormat::Auto);
        assert_eq!(result.format, TranscriptFormat::Enron);
        assert_eq!(result.inferred_title.as_deref(), Some("Pipeline review"));
        assert_eq!(result.inferred_date, NaiveDate::from_ymd_opt(2001, 10, 15));
        assert_eq!(names(&result), vec!["Jane Smith", "Mark Taylor"]);
        assert_eq!(
            result.turns[0].text,
            "Mark will send the capacity numbers by Friday."
        );
        assert_eq!(result.turns[1].text, "Can we review the pipeline numbers?");
    }

    #[test]
    fn test_date_inferred_from_text() {
        let result = preprocess(
            "Meeting held on March 3, 2025.\nJohn: Let's begin.",
            TranscriptFormat::Auto,
        );
        assert_eq!(result.inferred_date, NaiveDate::from_ymd_opt(2025, 3, 3));
        assert_eq!(speakers(&result), vec![None, Some("John")]);
    }

    #[test]
    fn test_normalize_speaker() {
        assert_eq!(normalize_speaker("JOHN SMITH"), "John Smith");
        assert_eq!(normalize_speaker("[Sarah]"), "Sarah");
        assert_eq!(normalize_speaker("Doe, Jane"), "Jane Doe");
        assert_eq!(normalize_speaker("kay.mann@enron.com"), "Kay Mann");
        assert_eq!(normalize_speaker("Speaker 2"), "Speaker 2");
    }
}
