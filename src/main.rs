// Job scrape CLI
//
// Reads the run's JSON input object from --input or stdin, applies flag
// overrides, and writes the dataset, diagnostics and run summary under the
// output directory.

use anyhow::{Context, Result};
use clap::Parser;
use kodegen_tools_jobscrape::sink::{FsSink, JobSink};
use kodegen_tools_jobscrape::{LogProgress, ScrapeConfig, ScrapeError, scrape_with_progress};
use serde_json::{Map, Value, json};
use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "kodegen-jobscrape",
    about = "Scrape job postings from a search listing into a JSON Lines dataset"
)]
struct Cli {
    /// JSON input object; read from stdin when omitted and stdin is not a terminal
    #[arg(long)]
    input: Option<PathBuf>,

    /// Absolute search URL (replaces any searchQuery from the input)
    #[arg(long)]
    search_url: Option<String>,

    /// Search keywords (replaces any searchUrl from the input)
    #[arg(long)]
    search_query: Option<String>,

    #[arg(long)]
    location: Option<String>,

    /// Maximum records to emit, 0 for unbounded
    #[arg(long)]
    max_jobs: Option<usize>,

    /// Maximum listing pages, 0 for unbounded
    #[arg(long)]
    max_pages: Option<usize>,

    /// Never fall back to the browser
    #[arg(long, default_value_t = false)]
    http_only: bool,

    /// "date" or "relevance"
    #[arg(long)]
    sort_by: Option<String>,

    /// Skip detail-page enrichment
    #[arg(long, default_value_t = false)]
    no_enrich: bool,

    /// Show the browser window
    #[arg(long, default_value_t = false)]
    headful: bool,

    #[arg(long)]
    max_concurrent_pages: Option<usize>,

    /// Root directory for dataset.jsonl and key_value_store/
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

impl Cli {
    fn read_input(&self) -> Result<Map<String, Value>> {
        let raw = match &self.input {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read input file {}", path.display()))?,
            None if !std::io::stdin().is_terminal() => {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("Failed to read input from stdin")?;
                buf
            }
            None => String::new(),
        };

        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&raw).context("Input is not valid JSON")? {
            Value::Object(map) => Ok(map),
            other => anyhow::bail!("Input must be a JSON object, got {other}"),
        }
    }

    /// Flags win over the input object
    fn apply_overrides(&self, input: &mut Map<String, Value>) {
        if let Some(url) = &self.search_url {
            input.remove("searchQuery");
            input.insert("searchUrl".into(), json!(url));
        }
        if let Some(query) = &self.search_query {
            input.remove("searchUrl");
            input.insert("searchQuery".into(), json!(query));
        }
        if let Some(location) = &self.location {
            input.insert("location".into(), json!(location));
        }
        if let Some(max_jobs) = self.max_jobs {
            input.insert("maxJobs".into(), json!(max_jobs));
        }
        if let Some(max_pages) = self.max_pages {
            input.insert("maxPages".into(), json!(max_pages));
        }
        if self.http_only {
            input.insert("httpOnly".into(), json!(true));
        }
        if let Some(sort_by) = &self.sort_by {
            input.insert("sortBy".into(), json!(sort_by));
        }
        if self.no_enrich {
            input.insert("enrichDetails".into(), json!(false));
        }
        if self.headful {
            input.insert("headless".into(), json!(false));
        }
        if let Some(pages) = self.max_concurrent_pages {
            input.insert("maxConcurrentPages".into(), json!(pages));
        }
        if let Some(dir) = &self.output_dir {
            input.insert("outputDir".into(), json!(dir));
        }
    }

    fn config(&self) -> Result<ScrapeConfig> {
        let mut input = self.read_input()?;
        self.apply_overrides(&mut input);
        Ok(ScrapeConfig::from_json(&Value::Object(input).to_string())?)
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.config()?;
    let sink: Arc<dyn JobSink> = Arc::new(FsSink::create(config.output_dir()).await?);

    let summary = scrape_with_progress(&config, sink, &LogProgress).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("Failed to serialize run summary")?
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            let invalid_input = e
                .downcast_ref::<ScrapeError>()
                .is_some_and(ScrapeError::is_fatal_input);
            if invalid_input {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
