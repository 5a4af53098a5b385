use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use suite_scout::diff::{ChangeReport, DiffEngine};
use suite_scout::parsing::extract_suites;
use suite_scout::scrapers::{
    BrowserPageSource, HttpPageSource, PageSource, PortfolioScraper, ScrapeParams,
};
use suite_scout::store::SnapshotStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "suite-scout", about = "Track suite availability across a property portfolio")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Capture today's availability snapshot
    Scrape {
        /// Snapshot date (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value = "data")]
        data_dir: String,
        #[arg(long, default_value = "allied")]
        source: String,
        /// Fetch pages over plain HTTP instead of headless Chrome
        #[arg(long)]
        http: bool,
        /// Keep every rendered detail page in this directory
        #[arg(long)]
        debug_dir: Option<String>,
    },
    /// Report suites added and removed between snapshots
    Diff {
        #[arg(long, default_value = "data")]
        data_dir: String,
        #[arg(long, default_value = "allied")]
        source: String,
        /// Compare exactly this date...
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,
        /// ...against this one
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
    },
    /// Run suite extraction on a saved detail page
    Extract {
        file: PathBuf,
        /// Suite count the listing declared, for the consistency check
        #[arg(long)]
        declared: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match Cli::parse().command {
        Command::Scrape {
            date,
            data_dir,
            source,
            http,
            debug_dir,
        } => {
            let params = ScrapeParams {
                data_dir,
                source,
                debug_dir,
                ..ScrapeParams::default()
            };
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            if http {
                scrape(HttpPageSource::new(&params)?, params, date).await
            } else {
                scrape(BrowserPageSource::new(params.clone())?, params, date).await
            }
        }
        Command::Diff {
            data_dir,
            source,
            from,
            to,
        } => {
            let store = SnapshotStore::new(data_dir, source);
            let engine = DiffEngine::new();
            let reports = match (from, to) {
                (Some(from), Some(to)) => {
                    let prev = store.load_date(from)?;
                    let curr = store.load_date(to)?;
                    info!("Comparing {} to {}", from, to);
                    vec![engine.compare(&prev, &curr)]
                }
                _ => {
                    let series = store.load_series()?;
                    if series.len() < 2 {
                        info!("Need at least two snapshots to compare, found {}", series.len());
                    }
                    engine.compare_consecutive(&series)
                }
            };
            reports.iter().for_each(print_report);
            Ok(())
        }
        Command::Extract { file, declared } => {
            let html = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let extraction = extract_suites(&html);
            info!(
                "Strategy: {:?}, {} suites, {} sq ft",
                extraction.strategy,
                extraction.suites.len(),
                extraction.total_sqft()
            );
            if let Some(declared) = declared {
                if declared != extraction.suites.len() {
                    warn!(
                        "Suite count mismatch: declared {}, found {}",
                        declared,
                        extraction.suites.len()
                    );
                }
            }
            println!("{}", serde_json::to_string_pretty(&extraction.suites)?);
            Ok(())
        }
    }
}

async fn scrape<S: PageSource>(source: S, params: ScrapeParams, date: NaiveDate) -> Result<()> {
    info!("🏢 Suite Scout - {} availability snapshot for {}", params.source, date);

    let scraper = PortfolioScraper::new(source, params);
    let (snapshot, _) = scraper.run(date).await?;

    let suites: usize = snapshot.properties.iter().map(|p| p.suites.len()).sum();
    let sqft: u64 = snapshot.properties.iter().map(|p| p.available_sqft).sum();
    info!(
        "✅ {} properties, {} suites, {} sq ft available, {} skipped",
        snapshot.properties.len(),
        suites,
        sqft,
        snapshot.skipped.len()
    );
    Ok(())
}

fn print_report(report: &ChangeReport) {
    for line in report.lines() {
        println!("{}", line);
    }
}
