use once_cell::sync::Lazy;
use regex::Regex;

use super::lexicon::ABBREVIATIONS;

/// Word tokens used for scoring: letters/digits with an optional contraction
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+(?:'\w+)?").expect("Invalid regex"));

/// A sentence with its position, used transiently by the stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceRecord {
    /// Sentence text including its terminal punctuation
    pub text: String,
    /// Zero-based position among the sentences of the source text
    pub index: usize,
    /// Whitespace-delimited word count
    pub word_count: usize,
}

impl SentenceRecord {
    fn new(text: &str, index: usize) -> Self {
        Self {
            text: text.to_string(),
            index,
            word_count: text.split_whitespace().count(),
        }
    }

    pub fn is_question(&self) -> bool {
        self.text.trim_end_matches(['"', '\'', ')']).ends_with('?')
    }
}

/// Split text into sentences on terminal punctuation.
///
/// A run of `.`, `!` or `?` ends a sentence when followed by whitespace or
/// the end of the text, unless the run is a single period after a known
/// abbreviation or a middle initial ("John F. Kennedy"). Fragments without
/// any letter or digit are dropped.
pub fn split_sentences(text: &str) -> Vec<SentenceRecord> {
    let mut sentences = Vec::new();
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let (pos, c) = chars[i];
        if !matches!(c, '.' | '!' | '?') {
            i += 1;
            continue;
        }

        // Consume the full punctuation run plus closing quotes/brackets
        let run_start = i;
        let mut j = i;
        while j < chars.len() && matches!(chars[j].1, '.' | '!' | '?') {
            j += 1;
        }
        let single_period = j - run_start == 1 && c == '.';
        while j < chars.len() && matches!(chars[j].1, '"' | '\'' | ')' | ']') {
            j += 1;
        }

        let at_boundary = j == chars.len() || chars[j].1.is_whitespace();
        let end = if j == chars.len() { text.len() } else { chars[j].0 };
        let abbreviated = single_period && follows_abbreviation(&text[start..pos], &text[end..]);
        if at_boundary && !abbreviated {
            push_sentence(&mut sentences, &text[start..end]);
            start = end;
        }
        i = j.max(i + 1);
    }

    if start < text.len() {
        push_sentence(&mut sentences, &text[start..]);
    }

    sentences
}

fn push_sentence(sentences: &mut Vec<SentenceRecord>, fragment: &str) {
    let trimmed = fragment.trim();
    if trimmed.chars().any(|c| c.is_alphanumeric()) {
        let index = sentences.len();
        sentences.push(SentenceRecord::new(trimmed, index));
    }
}

fn follows_abbreviation(preceding: &str, following: &str) -> bool {
    let mut preceding_words = preceding.split_whitespace().rev();
    let last_word = preceding_words
        .next()
        .unwrap_or_default()
        .trim_start_matches(['(', '"', '\'']);
    if last_word.is_empty() {
        return false;
    }
    if is_initial(last_word, preceding_words.next(), following) {
        return true;
    }
    ABBREVIATIONS.contains(&last_word.to_lowercase().as_str())
}

/// A capital letter between two capitalised words: "John F. Kennedy"
fn is_initial(word: &str, previous: Option<&str>, following: &str) -> bool {
    let starts_upper = |w: &str| w.chars().next().is_some_and(char::is_uppercase);
    let mut letters = word.chars();
    let single_capital =
        letters.next().is_some_and(char::is_uppercase) && letters.next().is_none();

    single_capital
        && previous.is_some_and(starts_upper)
        && following.split_whitespace().next().is_some_and(starts_upper)
}

/// Lowercase word tokens of a text
pub fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    WORD_RE.find_iter(text).map(|m| m.as_str().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(sentences: &[SentenceRecord]) -> Vec<&str> {
        sentences.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn test_split_on_terminal_punctuation() {
        let sentences = split_sentences("We met today. Did it go well? Yes!  It did");
        assert_eq!(
            texts(&sentences),
            vec!["We met today.", "Did it go well?", "Yes!", "It did"]
        );
        assert_eq!(sentences[1].index, 1);
        assert_eq!(sentences[0].word_count, 3);
        assert!(sentences[1].is_question());
    }

    #[test]
    fn test_abbreviations_do_not_split() {
        let sentences = split_sentences("Mr. Smith will ship by Nov. 1. Then we rest.");
        assert_eq!(
            texts(&sentences),
            vec!["Mr. Smith will ship by Nov. 1.", "Then we rest."]
        );
    }

    #[test]
    fn test_single_letter_ends_sentence_unless_initial() {
        let sentences = split_sentences("We picked plan B. Sarah will write it. Done.");
        assert_eq!(
            texts(&sentences),
            vec!["We picked plan B.", "Sarah will write it.", "Done."]
        );

        let sentences = split_sentences("Ask John F. Kennedy about it. Then we vote.");
        assert_eq!(
            texts(&sentences),
            vec!["Ask John F. Kennedy about it.", "Then we vote."]
        );

        let sentences = split_sentences("Go with option A. it is cheaper.");
        assert_eq!(texts(&sentences), vec!["Go with option A.", "it is cheaper."]);
    }

    #[test]
    fn test_decimals_and_ellipses() {
        let sentences = split_sentences("Version 2.5 is out... Great.");
        assert_eq!(texts(&sentences), vec!["Version 2.5 is out...", "Great."]);
    }

    #[test]
    fn test_punctuation_only_fragments_dropped() {
        assert!(split_sentences(" ... !!! ").is_empty());
        assert!(split_sentences("").is_empty());
    }

    #[test]
    fn test_words_keep_contractions() {
        let tokens: Vec<String> = words("I'll finish Testing, don't worry").collect();
        assert_eq!(tokens, vec!["i'll", "finish", "testing", "don't", "worry"]);
    }
}
