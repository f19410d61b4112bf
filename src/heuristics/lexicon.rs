//! Fixed word lists shared by the stages. Process-wide and read-only.

/// Words excluded from the summary frequency table.
///
/// Only words longer than three characters matter; shorter words are
/// excluded from the table regardless.
pub const STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "also", "although", "always", "among",
    "another", "anyone", "anything", "anyway", "around", "because", "been", "before", "being",
    "below", "between", "both", "cannot", "could", "didn't", "does", "doesn't", "doing", "don't",
    "done", "down", "during", "each", "either", "else", "enough", "even", "ever", "every",
    "everyone", "everything", "from", "further", "going", "gonna", "good", "have", "haven't",
    "having", "hello", "here", "herself", "himself", "into", "it's", "itself", "just", "know",
    "like", "maybe", "might", "more", "most", "much", "myself", "need", "never", "nothing",
    "okay", "once", "only", "other", "ours", "ourselves", "over", "really", "right", "same",
    "should", "since", "some", "something", "still", "such", "sure", "than", "thank", "thanks",
    "that", "that's", "their", "theirs", "them", "themselves", "then", "there", "there's",
    "these", "they", "thing", "things", "think", "this", "those", "though", "through", "today",
    "together", "under", "until", "upon", "very", "want", "we'll", "we're", "well", "were",
    "what", "what's", "when", "where", "whether", "which", "while", "will", "with", "within",
    "without", "would", "yeah", "your", "yours", "yourself", "yourselves",
];

/// Keywords that add to a sentence's summary score on every occurrence
pub const SUMMARY_KEYWORDS: &[&str] = &[
    "decide", "decided", "decision", "agree", "agreed", "action", "task", "deadline", "will",
    "should", "must",
];

/// Weight of one summary keyword occurrence
pub const KEYWORD_WEIGHT: f64 = 3.0;
/// Bonus for sentences in the first or last fifth of the transcript
pub const POSITION_WEIGHT: f64 = 2.0;
/// Bonus for sentences of a readable length
pub const LENGTH_WEIGHT: f64 = 2.0;
/// Multiplier applied to a word's transcript frequency
pub const FREQUENCY_WEIGHT: f64 = 0.1;
/// Inclusive word-count range that earns the length bonus
pub const PREFERRED_WORD_RANGE: (usize, usize) = (10, 30);

/// Cue words that make an action item high priority
pub const HIGH_PRIORITY_CUES: &[&str] = &[
    "urgent",
    "urgently",
    "asap",
    "critical",
    "immediately",
    "immediate",
    "high priority",
    "top priority",
];

/// Cue words that lift an action item without a deadline to medium priority
pub const MEDIUM_PRIORITY_CUES: &[&str] = &["important", "soon"];

/// Capitalised words that look like speaker labels but never are
pub const LABEL_STOPLIST: &[&str] = &[
    "action",
    "action item",
    "action items",
    "actions",
    "agenda",
    "answer",
    "attendees",
    "bcc",
    "budget",
    "cc",
    "date",
    "deadline",
    "decision",
    "decisions",
    "example",
    "follow up",
    "from",
    "fyi",
    "goal",
    "goals",
    "important",
    "issue",
    "issues",
    "item",
    "location",
    "meeting",
    "minutes",
    "next steps",
    "note",
    "notes",
    "owner",
    "participants",
    "phase",
    "priority",
    "ps",
    "question",
    "re",
    "reminder",
    "result",
    "results",
    "risk",
    "risks",
    "sent",
    "status",
    "step",
    "subject",
    "summary",
    "time",
    "to",
    "todo",
    "topic",
    "update",
    "updates",
    "warning",
];

/// Abbreviations whose trailing period does not end a sentence
pub const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "e.g", "i.e", "approx",
    "dept", "inc", "ltd", "co", "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept",
    "oct", "nov", "dec", "mon", "tue", "tues", "wed", "thu", "thurs", "fri", "sat", "sun",
];

/// Returns true if the lowercase word is a stop word
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// Returns true if the label is a known non-speaker heading
pub fn is_label_stopword(label: &str) -> bool {
    let normalized = label.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    LABEL_STOPLIST.contains(&normalized.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_words_are_lowercase_and_sorted() {
        for pair in STOP_WORDS.windows(2) {
            assert!(pair[0] < pair[1], "{} >= {}", pair[0], pair[1]);
        }
        assert!(STOP_WORDS.iter().all(|w| *w == w.to_lowercase()));
    }

    #[test]
    fn test_label_stopword_normalizes_spacing_and_case() {
        assert!(is_label_stopword("Action   Items"));
        assert!(is_label_stopword("NOTE"));
        assert!(!is_label_stopword("Sarah"));
    }
}
