use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Participant;

/// A resolved choice recorded in the minutes
pub type Decision = String;

/// Action item priority. Ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        };
        f.write_str(name)
    }
}

/// A task extracted from the discussion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub task: String,
    /// Always a member of the meeting's participant list when present
    pub owner: Option<Participant>,
    pub deadline: Option<NaiveDate>,
    pub priority: Priority,
}

/// The minutes-of-meeting record produced by one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingMinutes {
    pub title: String,
    pub date: NaiveDate,
    pub participants: Vec<Participant>,
    pub summary: Vec<String>,
    pub decisions: Vec<Decision>,
    pub action_items: Vec<ActionItem>,
    pub next_steps: Vec<String>,
    /// Opaque pass-through produced outside the pipeline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment_analysis: Option<serde_json::Value>,
}

impl MeetingMinutes {
    /// Attach an externally produced sentiment analysis
    pub fn with_sentiment(mut self, sentiment: serde_json::Value) -> Self {
        self.sentiment_analysis = Some(sentiment);
        self
    }
}

/// Request body accepted by the front door
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MomRequest {
    pub transcript: String,
    #[serde(default)]
    pub meeting_title: Option<String>,
}

/// Response body returned to the front door
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomResponse {
    pub mom_text: String,
    pub mom_json: MeetingMinutes,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_minutes() -> MeetingMinutes {
        MeetingMinutes {
            title: "Q4 Launch".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
            participants: vec![Participant::new("John"), Participant::new("Sarah")],
            summary: vec!["We reviewed the launch plan.".to_string()],
            decisions: vec!["We agreed to launch on Nov 15.".to_string()],
            action_items: vec![
                ActionItem {
                    task: "Handle marketing".to_string(),
                    owner: Some(Participant::new("Sarah")),
                    deadline: NaiveDate::from_ymd_opt(2026, 11, 1),
                    priority: Priority::Medium,
                },
                ActionItem {
                    task: "Book a venue".to_string(),
                    owner: None,
                    deadline: None,
                    priority: Priority::Low,
                },
            ],
            next_steps: vec!["Assign deadlines to 1 action item(s)".to_string()],
            sentiment_analysis: None,
        }
    }

    #[test]
    fn test_minutes_json_round_trip() {
        let mom = sample_minutes();
        let json = serde_json::to_string_pretty(&mom).unwrap();
        let back: MeetingMinutes = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mom);
    }

    #[test]
    fn test_minutes_json_shape() {
        let value = serde_json::to_value(sample_minutes()).unwrap();
        assert_eq!(value["date"], "2026-10-18");
        assert_eq!(value["participants"][1], "Sarah");
        assert_eq!(value["action_items"][0]["priority"], "medium");
        assert_eq!(value["action_items"][0]["deadline"], "2026-11-01");
        assert!(value["action_items"][1]["owner"].is_null());
        assert!(value.get("sentiment_analysis").is_none());
    }

    #[test]
    fn test_sentiment_passes_through() {
        let mom = sample_minutes().with_sentiment(serde_json::json!({"overall": "positive"}));
        let json = serde_json::to_string(&mom).unwrap();
        let back: MeetingMinutes = serde_json::from_str(&json).unwrap();
        assert_eq!(back.sentiment_analysis, Some(serde_json::json!({"overall": "positive"})));
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
    }
}
