pub mod error;
pub mod heuristics;
pub mod io;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod stages;

pub use error::{MinutesError, SummarizerError};
pub use io::{load_input, parse_request_json, write_json, LoadedInput, MinutesDocument};
pub use llm::{AbstractiveSummarizer, AnthropicClient, AnthropicConfig};
pub use models::{
    ActionItem, Channel, FollowUpReminder, MeetingMinutes, MomRequest, MomResponse, Participant,
    Priority, ReminderStatus, Transcript, TranscriptFormat,
};
pub use pipeline::{MinutesPipeline, PipelineConfig, PipelineOutput, PipelineStage};
pub use stages::{
    execute_stage0, execute_stage1, execute_stage2, execute_stage3, prioritize, ActionConfig,
    FollowUpConfig, SummaryConfig, SummarySource,
};
