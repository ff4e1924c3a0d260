use crate::infrastructure::event_ndjson::spawn_ndjson_printer;
use crate::infrastructure::openai_provider::{AiModel, OpenAiCompatibleProvider};
use crate::usecase::classify::{ClassifyOptions, RetryPolicy, DEFAULT_BATCH_SIZE, DEFAULT_MAX_RETRIES};
use crate::usecase::event::{AppEvent, EventSink};
use crate::usecase::organize::{organize_all, OrganizeConfig};
use anyhow::{anyhow, bail, Result};
use clap::{Args, Parser, Subcommand};
use std::env;
use std::path::PathBuf;
use tokio::sync::mpsc;

pub async fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    run_with_args(&args).await
}

pub async fn run_with_args(args: &[String]) -> Result<()> {
    let cli = Cli::try_parse_from(args)?;

    match cli.command {
        Command::Bookmarks(BookmarksCommand::Organize(args)) => organize(args).await,
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "ai-bookmark-organizer",
    version,
    about = "Reclassify and reorganize Netscape bookmark exports with an LLM",
    after_help = "Events:\n  If --emit-events is set, NDJSON events are written to stdout; logs and the summary go to stderr."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(subcommand)]
    Bookmarks(BookmarksCommand),
}

#[derive(Debug, Subcommand)]
enum BookmarksCommand {
    /// Classify every bookmark file in the data directory and write organized copies.
    Organize(OrganizeArgs),
}

#[derive(Debug, Args)]
struct OrganizeArgs {
    /// API key for the selected model provider.
    #[arg(long, env = "AI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// openai or deepseek.
    #[arg(long, env = "AI_MODEL", default_value = "openai")]
    model: AiModel,

    /// Override the provider endpoint (any OpenAI-compatible API).
    #[arg(long, env = "AI_BASE_URL")]
    base_url: Option<String>,

    /// Number of top-level categories to group folders into.
    #[arg(long)]
    max_folders: Option<usize>,

    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    max_retries: usize,

    /// Extra instructions appended to the classification prompt.
    #[arg(long)]
    custom_prompt: Option<String>,

    /// Extra instructions appended to the folder grouping prompt.
    #[arg(long)]
    custom_folder_prompt: Option<String>,

    #[arg(long)]
    emit_events: bool,
}

impl OrganizeArgs {
    fn to_config(&self) -> Result<OrganizeConfig> {
        if self.batch_size == 0 {
            bail!("--batch-size must be at least 1");
        }

        Ok(OrganizeConfig {
            data_dir: self.data_dir.clone(),
            output_dir: self.output_dir.clone(),
            max_folders: self.max_folders,
            classify: ClassifyOptions {
                batch_size: self.batch_size,
                retry: RetryPolicy {
                    max_retries: self.max_retries,
                    ..RetryPolicy::default()
                },
                custom_prompt: non_blank(&self.custom_prompt),
                ..ClassifyOptions::default()
            },
            custom_folder_prompt: non_blank(&self.custom_folder_prompt),
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

async fn organize(args: OrganizeArgs) -> Result<()> {
    let api_key = non_blank(&args.api_key).ok_or_else(|| {
        anyhow!("API key is required. Set AI_API_KEY environment variable or use --api-key option.")
    })?;
    let config = args.to_config()?;

    let mut provider = OpenAiCompatibleProvider::new(api_key, args.model)?;
    if let Some(base_url) = non_blank(&args.base_url) {
        provider = provider.with_base_url(base_url);
    }
    tracing::info!(model = %provider.model(), "using AI model");

    let (tx, rx) = mpsc::channel::<AppEvent>(1024);
    let (sink, printer): (EventSink, _) = if args.emit_events {
        (Some(tx), Some(spawn_ndjson_printer(rx)))
    } else {
        drop(rx);
        (None, None)
    };

    let outcome = organize_all(&provider, &config, &sink).await;

    drop(sink);
    if let Some(handle) = printer {
        handle.await.ok();
    }
    let outcome = outcome?;

    let stats = &outcome.stats;
    eprintln!(
        "summary: files_found={} files_processed={} files_skipped={} bookmarks_seen={} bookmarks_classified={} bookmarks_placed={} bookmarks_dropped={} batches_failed={}",
        stats.files_found,
        stats.files_processed,
        stats.files_skipped,
        stats.bookmarks_seen,
        stats.bookmarks_classified,
        stats.bookmarks_placed,
        stats.bookmarks_dropped,
        stats.batches_failed
    );

    match outcome.halted {
        Some(err) => Err(anyhow::Error::new(err).context("organize run halted")),
        None => Ok(()),
    }
}
