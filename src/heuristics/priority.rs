use once_cell::sync::Lazy;
use regex::Regex;

use super::lexicon::{HIGH_PRIORITY_CUES, MEDIUM_PRIORITY_CUES};
use crate::models::Priority;

static HIGH_CUE_RE: Lazy<Regex> = Lazy::new(|| cue_regex(HIGH_PRIORITY_CUES));
static MEDIUM_CUE_RE: Lazy<Regex> = Lazy::new(|| cue_regex(MEDIUM_PRIORITY_CUES));

fn cue_regex(cues: &[&str]) -> Regex {
    let alternatives: Vec<String> = cues
        .iter()
        .map(|cue| cue.split_whitespace().map(regex::escape).collect::<Vec<_>>().join(r"\s+"))
        .collect();
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|"))).expect("Invalid regex")
}

/// Infer an action item's priority.
///
/// Precedence, first rule that applies wins:
/// 1. a high-priority cue (`urgent`, `asap`, `critical`, ...) gives `High`
/// 2. a resolved deadline gives `Medium`
/// 3. a medium-priority cue (`important`, `soon`) gives `Medium`
/// 4. otherwise `Low`
pub fn infer_priority(sentence: &str, has_deadline: bool) -> Priority {
    if HIGH_CUE_RE.is_match(sentence) {
        Priority::High
    } else if has_deadline || MEDIUM_CUE_RE.is_match(sentence) {
        Priority::Medium
    } else {
        Priority::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_high_cue_wins_over_deadline() {
        assert_eq!(infer_priority("This is urgent, fix it by Friday.", true), Priority::High);
        assert_eq!(infer_priority("Ship the patch ASAP.", false), Priority::High);
        assert_eq!(infer_priority("It is top  priority.", false), Priority::High);
    }

    #[test]
    fn test_deadline_lifts_to_medium() {
        assert_eq!(infer_priority("Send the deck by Nov 1.", true), Priority::Medium);
        assert_eq!(infer_priority("Send the deck.", false), Priority::Low);
    }

    #[test]
    fn test_medium_cue_without_deadline() {
        assert_eq!(infer_priority("It is important we call them.", false), Priority::Medium);
    }

    #[test]
    fn test_cues_match_whole_words() {
        assert_eq!(infer_priority("Update the criticality matrix.", false), Priority::Low);
    }
}
