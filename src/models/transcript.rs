use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MinutesError;

/// Declared layout of an incoming transcript
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptFormat {
    /// Meeting-corpus style: `Speaker: text` turns
    Ami,
    /// Email thread: each message is one turn, the sender is the speaker
    Enron,
    /// Blank-line separated blocks with no speaker attribution
    Generic,
    /// Detect from structural cues
    #[default]
    Auto,
}

impl fmt::Display for TranscriptFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TranscriptFormat::Ami => "ami",
            TranscriptFormat::Enron => "enron",
            TranscriptFormat::Generic => "generic",
            TranscriptFormat::Auto => "auto",
        };
        f.write_str(name)
    }
}

impl FromStr for TranscriptFormat {
    type Err = MinutesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ami" => Ok(TranscriptFormat::Ami),
            "enron" | "email" => Ok(TranscriptFormat::Enron),
            "generic" => Ok(TranscriptFormat::Generic),
            "auto" | "" => Ok(TranscriptFormat::Auto),
            other => Err(MinutesError::UnknownFormat(other.to_string())),
        }
    }
}

/// Raw transcript text as received. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    text: String,
    format: TranscriptFormat,
}

impl Transcript {
    /// Create a transcript, rejecting empty or whitespace-only text
    pub fn new(text: impl Into<String>, format: TranscriptFormat) -> Result<Self, MinutesError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(MinutesError::EmptyTranscript);
        }
        Ok(Self { text, format })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn format(&self) -> TranscriptFormat {
        self.format
    }
}

/// A normalized meeting participant name.
///
/// Serialized as a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Participant(String);

impl Participant {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Case-insensitive match against a full name or the first name
    pub fn answers_to(&self, candidate: &str) -> bool {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return false;
        }
        if self.0.eq_ignore_ascii_case(candidate) {
            return true;
        }
        self.0
            .split_whitespace()
            .next()
            .is_some_and(|first| first.eq_ignore_ascii_case(candidate))
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A contiguous block of text attributed to one speaker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerTurn {
    /// Speaker, if the format carries attribution
    pub speaker: Option<Participant>,
    /// Cleaned text of the turn
    pub text: String,
    /// Position in discussion order
    pub turn_index: usize,
}
