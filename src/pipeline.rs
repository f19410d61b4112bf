//! The minutes pipeline: preprocess, summarize, extract actions, track follow-ups.
//!
//! `MinutesPipeline` holds only read-only configuration and an optional
//! shared model handle, so one instance can serve concurrent runs.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::MinutesError;
use crate::io::MinutesDocument;
use crate::llm::AbstractiveSummarizer;
use crate::models::{
    FollowUpReminder, MeetingMinutes, MomRequest, MomResponse, Transcript, TranscriptFormat,
};
use crate::stages::{
    execute_stage0, execute_stage1, execute_stage2, execute_stage3, summarize, ActionConfig,
    FollowUpConfig, FollowUpResult, PreprocessResult, SummaryConfig, SummaryResult,
    SummarySource,
};

/// Title used when neither the caller nor the transcript supplies one
pub const UNTITLED_MEETING: &str = "Untitled Meeting";

/// Configuration for every stage
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub summary: SummaryConfig,
    pub actions: ActionConfig,
    pub follow_up: FollowUpConfig,
}

/// A pipeline stage that can degrade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Preprocess,
    Summarize,
    Actions,
    FollowUp,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Preprocess => "preprocess",
            PipelineStage::Summarize => "summarize",
            PipelineStage::Actions => "actions",
            PipelineStage::FollowUp => "follow_up",
        };
        f.write_str(name)
    }
}

/// Everything one run produces
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub mom: MeetingMinutes,
    /// Reminders in action item order
    pub reminders: Vec<FollowUpReminder>,
    /// Stages that failed and were replaced by empty output
    pub degraded: Vec<PipelineStage>,
    pub summary_source: SummarySource,
}

impl PipelineOutput {
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

/// Orchestrates the stages into one minutes record
#[derive(Clone, Default)]
pub struct MinutesPipeline {
    config: PipelineConfig,
    abstractive: Option<Arc<dyn AbstractiveSummarizer>>,
}

impl MinutesPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            abstractive: None,
        }
    }

    /// Use an abstractive model for the summary when the transcript is long enough
    pub fn with_abstractive(mut self, model: Arc<dyn AbstractiveSummarizer>) -> Self {
        self.abstractive = Some(model);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline.
    ///
    /// `reference_date` is "now": it dates the minutes when the transcript
    /// carries no date and is the clock reminders are classified against.
    /// Deterministic for a given transcript, title override and reference
    /// date (with no abstractive model). Never fails: a stage that panics is
    /// recorded in `degraded` and contributes empty output.
    pub async fn run(
        &self,
        transcript: &Transcript,
        title_override: Option<&str>,
        reference_date: NaiveDate,
    ) -> PipelineOutput {
        let span = info_span!("pipeline", run_id = %Uuid::new_v4());
        self.run_stages(transcript, title_override, reference_date)
            .instrument(span)
            .await
    }

    /// Run with today's local date as the reference date
    pub async fn run_today(
        &self,
        transcript: &Transcript,
        title_override: Option<&str>,
    ) -> PipelineOutput {
        let today = chrono::Local::now().date_naive();
        self.run(transcript, title_override, today).await
    }

    /// Serve a front-door request: validate, run, render
    pub async fn respond(
        &self,
        request: &MomRequest,
        reference_date: NaiveDate,
    ) -> Result<MomResponse, MinutesError> {
        let transcript = Transcript::new(request.transcript.clone(), TranscriptFormat::Auto)?;
        let output = self
            .run(&transcript, request.meeting_title.as_deref(), reference_date)
            .await;

        if output.is_degraded() {
            warn!("Responding with partial minutes; degraded stages: {:?}", output.degraded);
        }

        Ok(MomResponse {
            mom_text: MinutesDocument::new(&output.mom).to_text(),
            mom_json: output.mom,
        })
    }

    async fn run_stages(
        &self,
        transcript: &Transcript,
        title_override: Option<&str>,
        reference_date: NaiveDate,
    ) -> PipelineOutput {
        let mut degraded = Vec::new();

        // Stage 0: Preprocess
        let preprocessed = guard(PipelineStage::Preprocess, &mut degraded, || {
            execute_stage0(transcript)
        })
        .unwrap_or_else(|| fallback_preprocess(transcript));
        info!(
            "Stage 0: {} format, {} turns, {} participants",
            preprocessed.format,
            preprocessed.turns.len(),
            preprocessed.participants.len()
        );

        let meeting_date = preprocessed.inferred_date.unwrap_or(reference_date);
        let title = resolve_title(title_override, preprocessed.inferred_title.as_deref());

        // Stage 1: Summarize
        let summary = self
            .summarize_stage(&preprocessed.cleaned_text, &mut degraded)
            .await;
        info!(
            "Stage 1: {} summary bullets ({}), {} decisions",
            summary.summary.len(),
            summary.source,
            summary.decisions.len()
        );

        // Stage 2: Action items
        let action_items = guard(PipelineStage::Actions, &mut degraded, || {
            execute_stage2(&preprocessed, meeting_date, &self.config.actions)
        })
        .unwrap_or_default();
        info!("Stage 2: {} action items", action_items.len());

        // Stage 3: Follow-ups
        let follow_up = guard(PipelineStage::FollowUp, &mut degraded, || {
            execute_stage3(&action_items, reference_date, &self.config.follow_up)
        })
        .unwrap_or_default();
        info!(
            "Stage 3: {} reminders, {} next steps",
            follow_up.reminders.len(),
            follow_up.next_steps.len()
        );

        let FollowUpResult {
            reminders,
            next_steps,
        } = follow_up;

        PipelineOutput {
            mom: MeetingMinutes {
                title,
                date: meeting_date,
                participants: preprocessed.participants,
                summary: summary.summary,
                decisions: summary.decisions,
                action_items,
                next_steps,
                sentiment_analysis: None,
            },
            reminders,
            degraded,
            summary_source: summary.source,
        }
    }

    /// Stage 1, with a panicking model treated like any other model failure
    async fn summarize_stage(
        &self,
        cleaned_text: &str,
        degraded: &mut Vec<PipelineStage>,
    ) -> SummaryResult {
        let config = self.config.summary.clone();

        if let Some(model) = self.abstractive.clone() {
            let text = cleaned_text.to_string();
            let task_config = config.clone();
            let task = tokio::spawn(
                async move { execute_stage1(&text, &task_config, Some(model.as_ref())).await }
                    .in_current_span(),
            );
            match task.await {
                Ok(result) => return result,
                Err(e) => warn!("Abstractive summarizer task failed, using extractive summary: {}", e),
            }
        }

        let source = if self.abstractive.is_some() {
            SummarySource::Fallback
        } else {
            SummarySource::Extractive
        };
        match guard(PipelineStage::Summarize, degraded, || summarize(cleaned_text, &config)) {
            Some(result) => SummaryResult { source, ..result },
            None => SummaryResult {
                summary: Vec::new(),
                decisions: Vec::new(),
                source,
            },
        }
    }
}

/// Run a stage, converting a panic into a degraded stage
fn guard<T>(
    stage: PipelineStage,
    degraded: &mut Vec<PipelineStage>,
    run: impl FnOnce() -> T,
) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(run)) {
        Ok(value) => Some(value),
        Err(_) => {
            error!("Stage {} failed; continuing with partial minutes", stage);
            degraded.push(stage);
            None
        }
    }
}

/// Override, then inferred title, then the untitled placeholder
fn resolve_title(title_override: Option<&str>, inferred: Option<&str>) -> String {
    title_override
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .or_else(|| inferred.map(str::trim).filter(|t| !t.is_empty()))
        .unwrap_or(UNTITLED_MEETING)
        .to_string()
}

/// Minimal stand-in when preprocessing itself fails
fn fallback_preprocess(transcript: &Transcript) -> PreprocessResult {
    PreprocessResult {
        format: TranscriptFormat::Generic,
        cleaned_text: transcript
            .text()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" "),
        turns: Vec::new(),
        participants: Vec::new(),
        inferred_date: None,
        inferred_title: None,
    }
}
