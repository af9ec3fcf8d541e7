//! Chat Insights — attribution-aware booking analytics for exported chat logs.
//!
//! Loads a record export, applies the requested selection, and writes the
//! metrics summary as JSON or a markdown report.

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::PathBuf;

use anyhow::Context;
use chat_core::config::{InsightsConfig, OutputFormat};
use chat_core::types::RecordBatch;
use chat_reporting::filter::{available_sources, DateRange, QuickView, RecordFilter};
use chat_reporting::{aggregate, render_markdown, summarize_with};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "chat-insights")]
#[command(about = "Funnel and traffic-source analytics for booking-assistant chats")]
#[command(version)]
struct Cli {
    /// Record export: `{"list": [...]}` or a bare JSON array
    #[arg(long, short)]
    input: PathBuf,

    /// Only chats for this location id
    #[arg(long)]
    s2f_id: Option<String>,

    /// First day to include (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD)
    #[arg(long)]
    end_date: Option<NaiveDate>,

    /// all | booked | revenue-opportunities | incomplete
    #[arg(long, default_value = "all")]
    view: QuickView,

    /// Only chats whose raw utm_source equals this value
    #[arg(long)]
    source: Option<String>,

    /// json | markdown (overrides config)
    #[arg(long, env = "CHAT_INSIGHTS__OUTPUT__FORMAT")]
    format: Option<OutputFormat>,

    /// Write here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Print the distinct utm_source values and exit
    #[arg(long, default_value_t = false)]
    list_sources: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_insights=info,chat_reporting=info".into()),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = InsightsConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        InsightsConfig::default()
    });
    if let Some(format) = cli.format {
        config.output.format = format;
    }

    let file = File::open(&cli.input)
        .with_context(|| format!("opening {}", cli.input.display()))?;
    let batch = RecordBatch::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", cli.input.display()))?;
    info!(records = batch.len(), input = %cli.input.display(), "Records loaded");

    if cli.list_sources {
        let mut out = open_output(cli.output.as_ref())?;
        for source in available_sources(&batch.list) {
            writeln!(out, "{source}")?;
        }
        return Ok(());
    }

    let mut filter = RecordFilter::new().view(cli.view);
    if let Some(s2f_id) = cli.s2f_id {
        filter = filter.for_location(s2f_id);
    }
    if cli.start_date.is_some() || cli.end_date.is_some() {
        filter = filter.within(DateRange::new(cli.start_date, cli.end_date)?);
    }
    if let Some(source) = cli.source {
        filter = filter.from_source(source);
    }

    let selected = filter.apply(&batch.list);
    info!(selected = selected.len(), view = ?cli.view, "Selection applied");

    let summary = summarize_with(&aggregate(selected), &config.limits);
    info!(
        total = summary.total_chats,
        booking_rate = summary.booking_rate,
        direct = summary.direct_traffic,
        paid = summary.paid_traffic,
        "Summary computed"
    );

    let rendered = match config.output.format {
        OutputFormat::Json if config.output.pretty => serde_json::to_string_pretty(&summary)?,
        OutputFormat::Json => serde_json::to_string(&summary)?,
        OutputFormat::Markdown => render_markdown(&summary, "Chat Analysis Report", Utc::now()),
    };

    let mut out = open_output(cli.output.as_ref())?;
    writeln!(out, "{rendered}")?;
    if let Some(path) = &cli.output {
        info!(output = %path.display(), "Report written");
    }
    Ok(())
}

fn open_output(path: Option<&PathBuf>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    })
}
