// src/pipeline.rs

use rusqlite::Connection;
use std::{io::Write, path::PathBuf};
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::error::EtlResult;
use crate::extract::extract;
use crate::fetch::Fetcher;
use crate::load::{db, write_csv};
use crate::progress::ProgressLog;
use crate::query::{emit, run_query, QueryResult};
use crate::transform::{convert, RateTable};
use crate::types::EnrichedRecord;

/// What a completed run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub extracted: usize,
    pub loaded: usize,
    pub output_csv: PathBuf,
    pub db_path: PathBuf,
    pub table_name: String,
    pub results: Vec<QueryResult>,
}

/// Run extract → transform → load → query once, writing query output to `out`.
///
/// Stages run strictly in order and the first failure aborts the run. A rate-file
/// problem stops the run before either sink is touched. The database handle is owned
/// here and released on every path: closed explicitly after a clean run, dropped
/// when a later stage fails.
#[instrument(level = "info", skip_all, fields(table = %config.table_name))]
pub fn run<W: Write>(config: &Config, out: &mut W) -> EtlResult<RunSummary> {
    config.validate()?;
    let progress = ProgressLog::new(&config.log_path);
    progress.log("Preliminaries complete. Initiating ETL process")?;

    // ─── 1) extract ─────────────────────────────────────────────────
    let fetcher = Fetcher::new(config.timeout())?;
    let table = extract(&fetcher, &config.source(), &config.extract)?;
    progress.log("Data extraction complete. Initiating Transformation process")?;

    // ─── 2) transform ───────────────────────────────────────────────
    let rates = RateTable::load(&fetcher, &config.rates())?;
    let enriched = convert(&table, &rates);
    progress.log("Data transformation complete. Initiating Loading process")?;

    // ─── 3) flat-file sink ──────────────────────────────────────────
    write_csv(&enriched, &config.output_csv)?;
    progress.log("Data saved to CSV file")?;

    // ─── 4) relational sink + queries ───────────────────────────────
    let mut conn = db::open(&config.db_path)?;
    progress.log("SQL Connection initiated")?;

    let (loaded, results) = match load_and_query(&mut conn, config, &enriched, &progress, out) {
        Ok(done) => done,
        Err(e) => {
            warn!(error = %e, "aborting run; releasing database handle");
            drop(conn);
            return Err(e);
        }
    };

    db::close(conn)?;
    progress.log("Server Connection closed")?;

    info!(extracted = table.len(), loaded, queries = results.len(), "run complete");
    Ok(RunSummary {
        extracted: table.len(),
        loaded,
        output_csv: config.output_csv.clone(),
        db_path: config.db_path.clone(),
        table_name: config.table_name.clone(),
        results,
    })
}

fn load_and_query<W: Write>(
    conn: &mut Connection,
    config: &Config,
    records: &[EnrichedRecord],
    progress: &ProgressLog,
    out: &mut W,
) -> EtlResult<(usize, Vec<QueryResult>)> {
    let loaded = db::write_table(conn, &config.table_name, records)?;
    progress.log("Data loaded to Database as a table, Executing queries")?;

    let mut results = Vec::new();
    for sql in config.queries() {
        let result = run_query(conn, &sql)?;
        emit(&result, out, config.format)?;
        results.push(result);
    }

    progress.log("Process Complete")?;
    Ok((loaded, results))
}
