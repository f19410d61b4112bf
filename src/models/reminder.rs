use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ActionItem;
use crate::error::MinutesError;

/// Temporal status of an action item relative to a reference date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStatus {
    /// Deadline is before the reference date
    Overdue,
    /// Deadline falls within the lookahead window
    DueSoon,
    /// Deadline is beyond the lookahead window
    OnTrack,
    /// No deadline was resolved
    NoDeadline,
}

impl ReminderStatus {
    /// Sort key used when ordering reminders for delivery
    pub fn urgency(&self) -> u8 {
        match self {
            ReminderStatus::Overdue => 0,
            ReminderStatus::DueSoon => 1,
            ReminderStatus::OnTrack | ReminderStatus::NoDeadline => 2,
        }
    }
}

impl fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReminderStatus::Overdue => "overdue",
            ReminderStatus::DueSoon => "due_soon",
            ReminderStatus::OnTrack => "on_track",
            ReminderStatus::NoDeadline => "no_deadline",
        };
        f.write_str(name)
    }
}

/// Delivery channel a reminder is rendered for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Slack,
    Email,
    Text,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Slack => "slack",
            Channel::Email => "email",
            Channel::Text => "text",
        };
        f.write_str(name)
    }
}

impl FromStr for Channel {
    type Err = MinutesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slack" => Ok(Channel::Slack),
            "email" => Ok(Channel::Email),
            "text" | "sms" => Ok(Channel::Text),
            other => Err(MinutesError::UnknownChannel(other.to_string())),
        }
    }
}

/// A channel-formatted reminder derived from an action item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpReminder {
    pub action_item: ActionItem,
    pub status: ReminderStatus,
    pub message: String,
}
