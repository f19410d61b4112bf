use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use minutes::heuristics::split_sentences;
use minutes::{
    execute_stage0, load_input, prioritize, write_json, AnthropicClient, AnthropicConfig,
    Channel, MinutesDocument, MinutesPipeline, PipelineConfig, TranscriptFormat,
};

#[derive(Parser)]
#[command(name = "minutes")]
#[command(author, version, about = "Meeting transcript to minutes-of-meeting pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate minutes from a meeting transcript
    Process {
        /// Input transcript (raw text, or a JSON request ending in .json)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the minutes (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output file for the minutes (Markdown)
        #[arg(long)]
        markdown: Option<PathBuf>,

        /// Output file for the minutes (plain text)
        #[arg(long)]
        text: Option<PathBuf>,

        /// Meeting title, overriding any title found in the input
        #[arg(long)]
        title: Option<String>,

        /// Transcript format: auto, ami, enron or generic
        #[arg(long, default_value = "auto")]
        format: String,

        /// Maximum number of summary bullets
        #[arg(long, default_value = "6")]
        bullets: usize,

        /// Date to treat as today (YYYY-MM-DD)
        #[arg(long)]
        reference_date: Option<NaiveDate>,

        /// Days ahead a deadline counts as due soon
        #[arg(long, default_value = "3")]
        lookahead_days: i64,

        /// Print follow-up reminders for this channel: slack, email or text
        #[arg(long)]
        reminders: Option<String>,

        /// Summarize with the Anthropic API when ANTHROPIC_API_KEY is set
        #[arg(long)]
        abstractive: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show how a transcript is read, without generating minutes
    Analyze {
        /// Input transcript (raw text, or a JSON request ending in .json)
        #[arg(short, long)]
        input: PathBuf,

        /// Transcript format: auto, ami, enron or generic
        #[arg(long, default_value = "auto")]
        format: String,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

/// Options for the process command
struct ProcessOptions {
    input: PathBuf,
    output: Option<PathBuf>,
    markdown: Option<PathBuf>,
    text: Option<PathBuf>,
    title: Option<String>,
    format: TranscriptFormat,
    reference_date: Option<NaiveDate>,
    reminders: Option<Channel>,
    abstractive: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            output,
            markdown,
            text,
            title,
            format,
            bullets,
            reference_date,
            lookahead_days,
            reminders,
            abstractive,
            verbose,
        } => {
            setup_logging(verbose);

            let reminders = reminders
                .map(|channel| channel.parse::<Channel>())
                .transpose()?;

            let mut config = PipelineConfig::default();
            config.summary.bullet_count = bullets;
            config.follow_up.lookahead_days = lookahead_days;
            if let Some(channel) = reminders {
                config.follow_up.channel = channel;
            }

            let options = ProcessOptions {
                input,
                output,
                markdown,
                text,
                title,
                format: format.parse()?,
                reference_date,
                reminders,
                abstractive,
            };
            process_transcript(options, config).await
        }
        Commands::Analyze {
            input,
            format,
            verbose,
        } => {
            setup_logging(verbose);
            analyze_transcript(input, format.parse()?)
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

async fn process_transcript(options: ProcessOptions, config: PipelineConfig) -> Result<()> {
    info!("Loading transcript from {:?}", options.input);
    let loaded = load_input(&options.input, options.format)?;

    let mut pipeline = MinutesPipeline::new(config);
    if options.abstractive {
        match AnthropicConfig::from_env() {
            Ok(api_config) => {
                info!("Abstractive summaries enabled ({})", api_config.model);
                pipeline = pipeline.with_abstractive(Arc::new(AnthropicClient::new(api_config)));
            }
            Err(e) => warn!("Abstractive summaries unavailable, using extractive: {:#}", e),
        }
    }

    let title = options.title.or(loaded.meeting_title);
    let reference_date = options
        .reference_date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let output = pipeline
        .run(&loaded.transcript, title.as_deref(), reference_date)
        .await;

    if output.is_degraded() {
        warn!("Minutes are partial; degraded stages: {:?}", output.degraded);
    }

    let document = MinutesDocument::new(&output.mom);
    let mut wrote_any = false;

    if let Some(path) = &options.output {
        write_json(&output.mom, path).context("Failed to write minutes JSON")?;
        info!("Minutes JSON written to {:?}", path);
        wrote_any = true;
    }
    if let Some(path) = &options.markdown {
        document
            .write_markdown(path)
            .context("Failed to write minutes Markdown")?;
        info!("Minutes Markdown written to {:?}", path);
        wrote_any = true;
    }
    if let Some(path) = &options.text {
        document
            .write_text(path)
            .context("Failed to write minutes text")?;
        info!("Minutes text written to {:?}", path);
        wrote_any = true;
    }
    if !wrote_any {
        print!("{}", document.to_text());
    }

    if let Some(channel) = options.reminders {
        let reminders = prioritize(output.reminders);
        println!();
        println!("Follow-up Reminders ({})", channel);
        println!("===================");
        if reminders.is_empty() {
            println!("No action items to follow up.");
        }
        for reminder in &reminders {
            println!("[{}]", reminder.status);
            println!("{}", reminder.message);
            println!();
        }
    }

    info!(
        "Complete: {} action items, {} summary bullets ({})",
        output.mom.action_items.len(),
        output.mom.summary.len(),
        output.summary_source
    );

    Ok(())
}

fn analyze_transcript(input: PathBuf, format: TranscriptFormat) -> Result<()> {
    info!("Analyzing transcript from {:?}", input);
    let loaded = load_input(&input, format)?;
    let result = execute_stage0(&loaded.transcript);

    println!("Transcript Analysis");
    println!("===================");
    println!("Format: {}", result.format);
    println!("Turns: {}", result.turns.len());
    println!(
        "Sentences: {}",
        split_sentences(&result.cleaned_text).len()
    );
    println!(
        "Inferred date: {}",
        result
            .inferred_date
            .map_or_else(|| "none".to_string(), |d| d.to_string())
    );
    let title = result.inferred_title.as_deref().or(loaded.meeting_title.as_deref());
    println!("Inferred title: {}", title.unwrap_or("none"));
    println!();

    println!("Participants");
    println!("------------");
    if result.participants.is_empty() {
        println!("None identified");
    }
    for participant in &result.participants {
        let turn_count = result
            .turns
            .iter()
            .filter(|t| t.speaker.as_ref() == Some(participant))
            .count();
        let word_count: usize = result
            .turns
            .iter()
            .filter(|t| t.speaker.as_ref() == Some(participant))
            .map(|t| t.text.split_whitespace().count())
            .sum();
        println!(
            "{}: {} turns, {} words",
            participant.name(),
            turn_count,
            word_count
        );
    }

    Ok(())
}
