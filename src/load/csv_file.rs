// src/load/csv_file.rs

use csv::{ReaderBuilder, WriterBuilder};
use std::path::Path;
use tracing::{info, instrument};

use crate::error::{EtlError, EtlResult};
use crate::types::{EnrichedRecord, OUTPUT_COLUMNS};

/// Write `records` to `path`, replacing whatever was there. The header is always written,
/// even for an empty dataset.
#[instrument(level = "info", skip(records), fields(path = %path.display(), records = records.len()))]
pub fn write_csv(records: &[EnrichedRecord], path: &Path) -> EtlResult<()> {
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| EtlError::io(path, e))?;

    wtr.write_record(OUTPUT_COLUMNS)
        .map_err(|e| EtlError::io(path, e))?;
    for rec in records {
        wtr.serialize(rec).map_err(|e| EtlError::io(path, e))?;
    }
    wtr.flush().map_err(|e| EtlError::io(path, e))?;

    info!("wrote CSV");
    Ok(())
}

/// Read back a file produced by `write_csv`.
pub fn read_csv(path: &Path) -> EtlResult<Vec<EnrichedRecord>> {
    let mut rdr = ReaderBuilder::new()
        .from_path(path)
        .map_err(|e| EtlError::io(path, e))?;
    rdr.deserialize()
        .collect::<Result<Vec<EnrichedRecord>, _>>()
        .map_err(|e| EtlError::io(path, e))
}
