/// System prompt for meeting summarization
pub const SUMMARY_SYSTEM_PROMPT: &str = r#"You summarize meeting transcripts for the minutes.

Rules:
1. Write 3 to 8 short, complete sentences in plain prose.
2. Cover what was discussed, what was agreed and who took on which task.
3. Use participant names exactly as they appear in the transcript.
4. Do not invent dates, owners or decisions that are not in the text.
5. Output only the sentences: no headings, no bullet markers, no preamble."#;

/// Build the user prompt for one transcript slice
pub fn build_summary_prompt(text: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str("# Transcript\n\n");
    prompt.push_str(text.trim());
    prompt.push_str("\n\n# Task\n\nSummarize the transcript above following the rules.");
    prompt
}
