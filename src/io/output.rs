use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::models::{ActionItem, MeetingMinutes};

/// Write any serializable value as pretty JSON
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create file: {:?}", path))?;
    serde_json::to_writer_pretty(file, value).context("Failed to write JSON")?;
    Ok(())
}

/// Human-readable views of the minutes
pub struct MinutesDocument<'a> {
    minutes: &'a MeetingMinutes,
}

impl<'a> MinutesDocument<'a> {
    pub fn new(minutes: &'a MeetingMinutes) -> Self {
        Self { minutes }
    }

    /// Render as Markdown
    pub fn to_markdown(&self) -> String {
        let mom = self.minutes;
        let mut output = String::new();

        output.push_str(&format!("# {}\n\n", mom.title));
        output.push_str(&format!("**Date:** {}\n\n", mom.date.format("%Y-%m-%d")));

        output.push_str("## Participants\n\n");
        push_markdown_list(
            &mut output,
            mom.participants.iter().map(|p| p.name().to_string()),
        );

        output.push_str("## Summary\n\n");
        push_markdown_list(&mut output, mom.summary.iter().cloned());

        output.push_str("## Decisions\n\n");
        push_markdown_list(&mut output, mom.decisions.iter().cloned());

        output.push_str("## Action Items\n\n");
        if mom.action_items.is_empty() {
            output.push_str("_None_\n\n");
        } else {
            output.push_str("| Task | Owner | Deadline | Priority |\n");
            output.push_str("|------|-------|----------|----------|\n");
            for item in &mom.action_items {
                output.push_str(&format!(
                    "| {} | {} | {} | {} |\n",
                    escape_cell(&item.task),
                    escape_cell(&owner_label(item)),
                    deadline_label(item),
                    item.priority
                ));
            }
            output.push('\n');
        }

        output.push_str("## Next Steps\n\n");
        push_markdown_list(&mut output, mom.next_steps.iter().cloned());

        output.trim_end().to_string() + "\n"
    }

    /// Render as plain text
    pub fn to_text(&self) -> String {
        let mom = self.minutes;
        let mut output = String::new();

        output.push_str("MINUTES OF MEETING\n");
        output.push_str("==================\n");
        output.push_str(&format!("Title: {}\n", mom.title));
        output.push_str(&format!("Date: {}\n", mom.date.format("%Y-%m-%d")));
        let participants: Vec<&str> = mom.participants.iter().map(|p| p.name()).collect();
        if participants.is_empty() {
            output.push_str("Participants: None identified\n");
        } else {
            output.push_str(&format!("Participants: {}\n", participants.join(", ")));
        }

        output.push_str("\nSUMMARY\n");
        push_text_list(&mut output, &mom.summary);

        output.push_str("\nDECISIONS\n");
        push_text_list(&mut output, &mom.decisions);

        output.push_str("\nACTION ITEMS\n");
        if mom.action_items.is_empty() {
            output.push_str("- None\n");
        }
        for (i, item) in mom.action_items.iter().enumerate() {
            output.push_str(&format!("{}. {}\n", i + 1, item.task));
            output.push_str(&format!(
                "   Owner: {} | Deadline: {} | Priority: {}\n",
                owner_label(item),
                deadline_label(item),
                item.priority
            ));
        }

        output.push_str("\nNEXT STEPS\n");
        push_text_list(&mut output, &mom.next_steps);

        output
    }

    /// Write Markdown to a file
    pub fn write_markdown(&self, path: &Path) -> Result<()> {
        write_file(path, &self.to_markdown())
    }

    /// Write plain text to a file
    pub fn write_text(&self, path: &Path) -> Result<()> {
        write_file(path, &self.to_text())
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create file: {:?}", path))?;
    write!(file, "{}", content)?;
    Ok(())
}

fn owner_label(item: &ActionItem) -> String {
    item.owner
        .as_ref()
        .map_or_else(|| "Unassigned".to_string(), |p| p.name().to_string())
}

fn deadline_label(item: &ActionItem) -> String {
    item.deadline
        .map_or_else(|| "TBD".to_string(), |d| d.format("%Y-%m-%d").to_string())
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

fn push_markdown_list(output: &mut String, items: impl Iterator<Item = String>) {
    let mut empty = true;
    for item in items {
        output.push_str(&format!("- {}\n", item));
        empty = false;
    }
    if empty {
        output.push_str("_None_\n");
    }
    output.push('\n');
}

fn push_text_list(output: &mut String, items: &[String]) {
    if items.is_empty() {
        output.push_str("- None\n");
    }
    for item in items {
        let wrapped = wrap_text(item, 76);
        output.push_str(&format!("- {}\n", wrapped.replace('\n', "\n  ")));
    }
}

/// Wrap text at approximately the given width
fn wrap_text(text: &str, width: usize) -> String {
    let mut result = String::new();
    let mut line_len = 0;

    for word in text.split_whitespace() {
        if line_len + word.len() + 1 > width && line_len > 0 {
            result.push('\n');
            line_len = 0;
        }
        if line_len > 0 {
            result.push(' ');
            line_len += 1;
        }
        result.push_str(word);
        line_len += word.len();
    }

    result
}
