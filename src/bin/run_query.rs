use anyhow::{Context, Result};
use bankscraper::{
    load::db,
    query::{emit, run_query, OutputFormat},
};
use clap::Parser;
use std::{io, path::PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

/// Run SQL against a database produced by `bankscraper`, without re-running the ETL.
#[derive(Debug, Parser)]
struct Args {
    #[arg(long, default_value = "Banks.db")]
    db: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// One or more SQL statements
    #[arg(required = true)]
    queries: Vec<String>,
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    if !args.db.exists() {
        anyhow::bail!("database `{}` does not exist", args.db.display());
    }

    let conn = db::open(&args.db)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for sql in &args.queries {
        let result = run_query(&conn, sql).with_context(|| format!("running {:?}", sql))?;
        emit(&result, &mut out, args.format)?;
    }
    db::close(conn)?;
    Ok(())
}
