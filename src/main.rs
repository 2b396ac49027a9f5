use anyhow::{Context, Result};
use bankscraper::{query::OutputFormat, Config};
use clap::Parser;
use std::{io, path::PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Scrape the largest banks by market cap and load them into CSV and SQLite.
#[derive(Debug, Parser)]
#[command(name = "bankscraper", version)]
struct Cli {
    /// YAML config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Source HTML document (URL or local path)
    #[arg(long)]
    source_url: Option<String>,

    /// Exchange-rate CSV with a `Currency,Rate` header (URL or local path)
    #[arg(long)]
    rates: Option<String>,

    #[arg(long)]
    output_csv: Option<PathBuf>,

    #[arg(long)]
    db: Option<PathBuf>,

    #[arg(long)]
    table: Option<String>,

    #[arg(long)]
    log_file: Option<PathBuf>,

    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Query to run after loading; repeat for several. Defaults to the three built-in reports.
    #[arg(long = "query")]
    queries: Vec<String>,

    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        let mut cfg = match &self.config {
            Some(path) => Config::from_yaml_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(v) = self.source_url {
            cfg.source_url = v;
        }
        if let Some(v) = self.rates {
            cfg.rates_location = v;
        }
        if let Some(v) = self.output_csv {
            cfg.output_csv = v;
        }
        if let Some(v) = self.db {
            cfg.db_path = v;
        }
        if let Some(v) = self.table {
            cfg.table_name = v;
        }
        if let Some(v) = self.log_file {
            cfg.log_path = v;
        }
        if let Some(v) = self.timeout_secs {
            cfg.timeout_secs = v;
        }
        if !self.queries.is_empty() {
            cfg.queries = self.queries;
        }
        if let Some(v) = self.format {
            cfg.format = v;
        }
        Ok(cfg)
    }
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();
    info!("startup");

    // ─── 2) resolve configuration ────────────────────────────────────
    let cfg = Cli::parse().into_config()?;
    info!(source = %cfg.source_url, db = %cfg.db_path.display(), "configured");

    // ─── 3) run the pipeline ─────────────────────────────────────────
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = bankscraper::run(&cfg, &mut out).context("ETL run failed")?;

    info!(
        extracted = summary.extracted,
        csv = %summary.output_csv.display(),
        table = %summary.table_name,
        "all done"
    );
    Ok(())
}
