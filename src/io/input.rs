use std::path::Path;

use anyhow::{Context, Result};

use crate::error::MinutesError;
use crate::models::{MomRequest, Transcript, TranscriptFormat};

/// A transcript loaded from disk, with the title a request file carried
#[derive(Debug, Clone)]
pub struct LoadedInput {
    pub transcript: Transcript,
    pub meeting_title: Option<String>,
}

/// Load a transcript file.
///
/// Files ending in `.json` are read as a request body
/// (`{"transcript": ..., "meeting_title": ...}`); anything else is raw text.
pub fn load_input(path: &Path, format: TranscriptFormat) -> Result<LoadedInput> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        let request = parse_request_json(&content)
            .with_context(|| format!("Failed to parse request file: {:?}", path))?;
        let transcript = Transcript::new(request.transcript, format)
            .with_context(|| format!("No transcript text in {:?}", path))?;
        Ok(LoadedInput {
            transcript,
            meeting_title: request.meeting_title,
        })
    } else {
        let transcript = Transcript::new(content, format)
            .with_context(|| format!("No transcript text in {:?}", path))?;
        Ok(LoadedInput {
            transcript,
            meeting_title: None,
        })
    }
}

/// Parse a request body
pub fn parse_request_json(json: &str) -> Result<MomRequest, MinutesError> {
    serde_json::from_str(json).map_err(|e| MinutesError::InvalidRequest(e.to_string()))
}
