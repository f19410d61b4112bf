use chrono::NaiveDate;
use tracing::info;

use crate::models::{ActionItem, Channel, FollowUpReminder, Priority, ReminderStatus};

/// Configuration for Stage 3 follow-up tracking
#[derive(Debug, Clone)]
pub struct FollowUpConfig {
    /// Deadlines this many days ahead (inclusive) count as due soon
    pub lookahead_days: i64,
    /// Channel the reminder messages are rendered for
    pub channel: Channel,
}

impl Default for FollowUpConfig {
    fn default() -> Self {
        Self {
            lookahead_days: 3,
            channel: Channel::Slack,
        }
    }
}

/// Result of Stage 3 follow-up tracking
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FollowUpResult {
    /// One reminder per action item, in action item order
    pub reminders: Vec<FollowUpReminder>,
    /// Summary lines for the minutes
    pub next_steps: Vec<String>,
}

/// Execute Stage 3: Follow-up tracking
pub fn execute_stage3(
    items: &[ActionItem],
    reference_date: NaiveDate,
    config: &FollowUpConfig,
) -> FollowUpResult {
    let reminders = classify(items, reference_date, config);
    let next_steps = next_steps(&reminders);

    info!(
        "Classified {} action items: {} overdue, {} due soon",
        reminders.len(),
        count_status(&reminders, ReminderStatus::Overdue),
        count_status(&reminders, ReminderStatus::DueSoon)
    );

    FollowUpResult {
        reminders,
        next_steps,
    }
}

/// Classify every action item against the reference date, keeping input order
pub fn classify(
    items: &[ActionItem],
    reference_date: NaiveDate,
    config: &FollowUpConfig,
) -> Vec<FollowUpReminder> {
    items
        .iter()
        .map(|item| {
            let status = reminder_status(item.deadline, reference_date, config.lookahead_days);
            FollowUpReminder {
                message: render_message(item, status, reference_date, config.channel),
                action_item: item.clone(),
                status,
            }
        })
        .collect()
}

/// Status of a deadline relative to the reference date.
///
/// A pure function of its arguments.
pub fn reminder_status(
    deadline: Option<NaiveDate>,
    reference_date: NaiveDate,
    lookahead_days: i64,
) -> ReminderStatus {
    let Some(deadline) = deadline else {
        return ReminderStatus::NoDeadline;
    };

    let days_until = (deadline - reference_date).num_days();
    if days_until < 0 {
        ReminderStatus::Overdue
    } else if days_until <= lookahead_days {
        ReminderStatus::DueSoon
    } else {
        ReminderStatus::OnTrack
    }
}

/// Overdue first, then due soon, then everything else; stable otherwise
pub fn prioritize(mut reminders: Vec<FollowUpReminder>) -> Vec<FollowUpReminder> {
    reminders.sort_by_key(|r| r.status.urgency());
    reminders
}

/// Follow-up lines for the minutes
pub fn next_steps(reminders: &[FollowUpReminder]) -> Vec<String> {
    let mut steps = Vec::new();

    let overdue = count_status(reminders, ReminderStatus::Overdue);
    if overdue > 0 {
        steps.push(format!("Follow up on {overdue} overdue action item(s)"));
    }

    let due_soon = count_status(reminders, ReminderStatus::DueSoon);
    if due_soon > 0 {
        steps.push(format!(
            "Review {due_soon} action item(s) with upcoming deadlines"
        ));
    }

    let high = reminders
        .iter()
        .filter(|r| r.action_item.priority == Priority::High)
        .count();
    if high > 0 {
        steps.push(format!("Prioritize {high} high-priority action item(s)"));
    }

    let no_deadline = count_status(reminders, ReminderStatus::NoDeadline);
    if no_deadline > 0 {
        steps.push(format!("Assign deadlines to {no_deadline} action item(s)"));
    }

    steps
}

fn count_status(reminders: &[FollowUpReminder], status: ReminderStatus) -> usize {
    reminders.iter().filter(|r| r.status == status).count()
}

/// Render a reminder for a channel. Produces text only; nothing is sent.
pub fn render_message(
    item: &ActionItem,
    status: ReminderStatus,
    reference_date: NaiveDate,
    channel: Channel,
) -> String {
    let owner = item
        .owner
        .as_ref()
        .map_or("Unassigned", |owner| owner.name());
    let deadline = deadline_line(item.deadline, status, reference_date);

    match channel {
        Channel::Slack => {
            let emoji = match status {
                ReminderStatus::Overdue => "🔴",
                ReminderStatus::DueSoon => "🟡",
                ReminderStatus::OnTrack | ReminderStatus::NoDeadline => "🟢",
            };
            let deadline = match (&deadline.note, status) {
                (Some(note), ReminderStatus::Overdue) => format!("{} ⚠️ *{note}*", deadline.date),
                (Some(note), _) => format!("{} ⏰ *{note}*", deadline.date),
                (None, _) => deadline.date,
            };
            [
                format!("{emoji} *Action Item Reminder*"),
                String::new(),
                format!("*Task:* {}", item.task),
                format!("*Owner:* @{owner}"),
                format!("*Deadline:* {deadline}"),
                format!("*Priority:* {}", item.priority.to_string().to_uppercase()),
            ]
            .join("\n")
        }
        Channel::Email => {
            let short_task: String = item.task.chars().take(50).collect();
            let subject = match status {
                ReminderStatus::Overdue => format!("URGENT: Overdue Action Item - {short_task}"),
                ReminderStatus::DueSoon => format!("Upcoming Deadline: {short_task}"),
                ReminderStatus::OnTrack | ReminderStatus::NoDeadline => {
                    "Action Item Reminder".to_string()
                }
            };
            [
                format!("Subject: {subject}"),
                String::new(),
                format!("Dear {owner},"),
                String::new(),
                "This is a reminder about the following action item:".to_string(),
                String::new(),
                format!("Task: {}", item.task),
                format!("Deadline: {}", deadline.plain()),
                format!("Priority: {}", item.priority.to_string().to_uppercase()),
                String::new(),
                "Please provide an update on the status of this task.".to_string(),
                String::new(),
                "Best regards,".to_string(),
                "Minutes Follow-up".to_string(),
            ]
            .join("\n")
        }
        Channel::Text => {
            let tag = match status {
                ReminderStatus::Overdue => "OVERDUE",
                ReminderStatus::DueSoon => "UPCOMING",
                ReminderStatus::OnTrack | ReminderStatus::NoDeadline => "ACTIVE",
            };
            [
                format!("[{tag}] Action Item Reminder"),
                format!("Task: {}", item.task),
                format!("Owner: {owner}"),
                format!("Deadline: {}", deadline.plain()),
                format!("Priority: {}", item.priority),
            ]
            .join("\n")
        }
    }
}

/// A deadline and its optional "overdue by" / "due in" note
struct DeadlineLine {
    date: String,
    note: Option<String>,
}

impl DeadlineLine {
    fn plain(&self) -> String {
        match &self.note {
            Some(note) => format!("{} ({note})", self.date),
            None => self.date.clone(),
        }
    }
}

fn deadline_line(
    deadline: Option<NaiveDate>,
    status: ReminderStatus,
    reference_date: NaiveDate,
) -> DeadlineLine {
    let Some(deadline) = deadline else {
        return DeadlineLine {
            date: "TBD".to_string(),
            note: None,
        };
    };

    let days = (deadline - reference_date).num_days();
    let note = match status {
        ReminderStatus::Overdue => Some(format!("OVERDUE by {}", day_count(-days))),
        ReminderStatus::DueSoon => Some(format!("Due in {}", day_count(days))),
        ReminderStatus::OnTrack | ReminderStatus::NoDeadline => None,
    };

    DeadlineLine {
        date: deadline.format("%Y-%m-%d").to_string(),
        note,
    }
}

fn day_count(days: i64) -> String {
    if days == 1 {
        "1 day".to_string()
    } else {
        format!("{days} days")
    }
}
