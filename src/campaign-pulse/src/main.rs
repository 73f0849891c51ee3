//! Campaign Pulse: rolling-window performance views and daily highlights
//! for media buying, computed from the performance sheet.

mod refresh;

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use campaign_core::config::AppConfig;
use campaign_core::Record;
use campaign_ingest::{BatchSource, CapTable, CsvFileSource};
use campaign_reporting::export::write_csv;
use campaign_reporting::{summarize, BatchStore, DateWindow, GroupBy, HighlightReport, RecordIndex};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use crate::refresh::Refresher;

#[derive(Parser, Debug)]
#[command(name = "campaign-pulse")]
#[command(about = "Rolling-window campaign performance and daily highlights")]
#[command(version)]
struct Cli {
    /// Performance sheet CSV (overrides config)
    #[arg(long, env = "CAMPAIGN_PULSE__INGEST__SOURCE_PATH")]
    source: Option<PathBuf>,

    /// Cap sheet CSV of `network-offer,cap` rows (overrides config)
    #[arg(long, env = "CAMPAIGN_PULSE__INGEST__CAPS_PATH")]
    caps: Option<PathBuf>,

    /// Config file name, extension optional
    #[arg(long, default_value = "campaign-pulse")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Window totals and per-group current vs previous period
    Summary {
        /// yesterday, 7d, 14d, mtd, 30d, 60d, lastMonth, ytd, custom:MM/DD/YYYY
        #[arg(short, long)]
        window: Option<String>,

        /// buyer, network, offer, account, network-offer, buyer-network-offer
        #[arg(short, long)]
        by: Option<String>,
    },

    /// Highlights for the latest day in the sheet
    Highlights {
        #[arg(short, long)]
        by: Option<String>,
    },

    /// Record-level CSV for a window
    Export {
        #[arg(short, long)]
        window: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Re-read the sheet on a schedule and print fresh highlights
    Watch {
        /// Seconds between refreshes (overrides config)
        #[arg(long)]
        interval: Option<u64>,

        /// Views to compute, comma separated
        #[arg(short, long, value_delimiter = ',')]
        by: Vec<String>,
    },
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "campaign_pulse=info,campaign_reporting=info,campaign_ingest=info".into()
    });
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

fn load_index(source: &dyn BatchSource) -> anyhow::Result<RecordIndex> {
    let records = source
        .fetch_batch()
        .with_context(|| format!("failed to read batch from {}", source.describe()))?;
    Ok(RecordIndex::new(records))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(&cli.config).unwrap_or_else(|e| {
        eprintln!("Failed to load config ({e}), using defaults");
        AppConfig::default()
    });
    init_tracing(config.log.json);

    let source_path = cli
        .source
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.ingest.source_path));
    let caps_path = cli
        .caps
        .clone()
        .or_else(|| config.ingest.caps_path.as_ref().map(PathBuf::from));
    let source = Arc::new(CsvFileSource::new(&source_path));

    info!(source = %source_path.display(), "Campaign Pulse starting");

    let parse_window = |raw: Option<String>| -> anyhow::Result<DateWindow> {
        let raw = raw.unwrap_or_else(|| config.report.default_window.clone());
        Ok(raw.parse::<DateWindow>()?)
    };
    let parse_view = |raw: Option<String>| -> anyhow::Result<GroupBy> {
        let raw = raw.unwrap_or_else(|| config.report.default_group_by.clone());
        Ok(raw.parse::<GroupBy>()?)
    };

    match cli.command {
        Commands::Summary { window, by } => {
            let window = parse_window(window)?;
            let view = parse_view(by)?;
            let index = load_index(source.as_ref())?;
            let mut summary = summarize(&index, window, view);

            if let Some(path) = caps_path {
                match CapTable::load(&path) {
                    Ok(caps) => summary.attach_caps(|key| caps.lookup(key)),
                    Err(e) => warn!(path = %path.display(), error = %e, "Cap table unavailable"),
                }
            }
            print_json(&summary)?;
        }
        Commands::Highlights { by } => {
            let view = parse_view(by)?;
            let index = load_index(source.as_ref())?;
            print_json(&HighlightReport::build(&index, view))?;
        }
        Commands::Export { window, out } => {
            let window = parse_window(window)?;
            let index = load_index(source.as_ref())?;
            let Some(anchor) = index.anchor() else {
                warn!("Batch is empty, exporting header only");
                let records: Vec<&Record> = Vec::new();
                write_csv(records, io::stdout().lock())?;
                return Ok(());
            };
            let range = window.resolve(anchor);
            let records = index.in_range(range);

            let rows = match &out {
                Some(path) => {
                    let file = File::create(path)
                        .with_context(|| format!("failed to create {}", path.display()))?;
                    write_csv(records, file)?
                }
                None => write_csv(records, io::stdout().lock())?,
            };
            info!(rows, window = %window, range = %range, "Export written");
        }
        Commands::Watch { interval, by } => {
            let views = if by.is_empty() {
                vec![parse_view(None)?]
            } else {
                by.into_iter()
                    .map(|raw| parse_view(Some(raw)))
                    .collect::<anyhow::Result<Vec<_>>>()?
            };
            let interval =
                Duration::from_secs(interval.unwrap_or(config.refresh.interval_secs).max(1));

            let store = Arc::new(BatchStore::new());
            let refresher = Refresher::new(source, store, &views);
            refresher
                .run(interval, |view, published| {
                    info!(
                        view = ?view,
                        generation = published.generation,
                        items = published.value.item_count(),
                        "Highlights published"
                    );
                    if let Err(e) = print_json(&published.value) {
                        warn!(error = %e, "Failed to print highlights");
                    }
                })
                .await;
        }
    }

    Ok(())
}
