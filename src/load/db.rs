// src/load/db.rs

use rusqlite::{params, Connection};
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::error::{EtlError, EtlResult};
use crate::types::{EnrichedRecord, COL_MC_EUR, COL_MC_GBP, COL_MC_INR, COL_MC_USD, COL_NAME};

/// Column definitions, in the same order as the CSV header.
const TABLE_SCHEMA: [(&str, &str); 5] = [
    (COL_NAME, "TEXT"),
    (COL_MC_USD, "REAL"),
    (COL_MC_GBP, "REAL"),
    (COL_MC_EUR, "REAL"),
    (COL_MC_INR, "REAL"),
];

/// Open a SQLite database on disk at `path`, creating the file if it doesn't exist.
pub fn open(path: &Path) -> EtlResult<Connection> {
    let conn = Connection::open(path)
        .map_err(|e| EtlError::storage(format!("opening {}", path.display()), e))?;
    debug!(path = %path.display(), "opened database");
    Ok(conn)
}

/// Open a SQLite in-memory database
pub fn open_in_memory() -> EtlResult<Connection> {
    Connection::open_in_memory().map_err(|e| EtlError::storage("opening in-memory database", e))
}

/// Release the handle, surfacing any error SQLite reports on close.
pub fn close(conn: Connection) -> EtlResult<()> {
    conn.close()
        .map_err(|(_, e)| EtlError::storage("closing database", e))
}

/// Double-quote an identifier for SQLite.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Replace `table` with exactly `records`. Drop, create and insert run in one transaction,
/// so a failed write leaves the previous table in place.
#[instrument(level = "info", skip(conn, records), fields(records = records.len()))]
pub fn write_table(
    conn: &mut Connection,
    table: &str,
    records: &[EnrichedRecord],
) -> EtlResult<usize> {
    let ident = quote_ident(table);
    let columns = TABLE_SCHEMA
        .iter()
        .map(|(name, ty)| format!("{} {}", quote_ident(name), ty))
        .collect::<Vec<_>>()
        .join(", ");

    let tx = conn
        .transaction()
        .map_err(|e| EtlError::storage("starting transaction", e))?;

    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {ident}; CREATE TABLE {ident} ({columns});"
    ))
    .map_err(|e| EtlError::storage(format!("recreating table {}", table), e))?;

    {
        let mut stmt = tx
            .prepare(&format!("INSERT INTO {ident} VALUES (?1, ?2, ?3, ?4, ?5)"))
            .map_err(|e| EtlError::storage(format!("preparing insert into {}", table), e))?;
        for rec in records {
            stmt.execute(params![rec.name, rec.mc_usd, rec.mc_gbp, rec.mc_eur, rec.mc_inr])
                .map_err(|e| EtlError::storage(format!("inserting {:?}", rec.name), e))?;
        }
    }

    tx.commit()
        .map_err(|e| EtlError::storage(format!("committing {}", table), e))?;

    info!(table, "replaced table");
    Ok(records.len())
}

/// Number of rows currently in `table`.
pub fn row_count(conn: &Connection, table: &str) -> EtlResult<i64> {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", quote_ident(table)), [], |r| r.get(0))
        .map_err(|e| EtlError::storage(format!("counting rows in {}", table), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn dataset(prefix: &str, n: usize) -> Vec<EnrichedRecord> {
        (0..n)
            .map(|i| {
                let usd = 100.0 + i as f64;
                EnrichedRecord::new(format!("{} {}", prefix, i), usd, usd * 0.8, usd * 0.9, usd * 83.0)
            })
            .collect()
    }

    fn names(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("SELECT Name FROM {}", quote_ident(table)))
            .unwrap();
        let names = stmt
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<Result<Vec<String>, _>>()
            .unwrap();
        names
    }

    #[test]
    fn test_write_creates_table() {
        let mut conn = open_in_memory().unwrap();
        let written = write_table(&mut conn, "Largest_banks", &dataset("A", 3)).unwrap();
        assert_eq!(written, 3);
        assert_eq!(row_count(&conn, "Largest_banks").unwrap(), 3);
    }

    #[test]
    fn test_replace_semantics() {
        let mut conn = open_in_memory().unwrap();
        write_table(&mut conn, "T", &dataset("A", 5)).unwrap();
        write_table(&mut conn, "T", &dataset("B", 2)).unwrap();

        assert_eq!(names(&conn, "T"), vec!["B 0", "B 1"]);
    }

    #[test]
    fn test_replace_with_empty_dataset() {
        let mut conn = open_in_memory().unwrap();
        write_table(&mut conn, "T", &dataset("A", 2)).unwrap();
        write_table(&mut conn, "T", &[]).unwrap();
        assert_eq!(row_count(&conn, "T").unwrap(), 0);
    }

    #[test]
    fn test_persists_across_reopen() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("Banks.db");
        {
            let mut conn = open(&path).unwrap();
            write_table(&mut conn, "Largest_banks", &dataset("A", 4)).unwrap();
            close(conn).unwrap();
        }
        let conn = open(&path).unwrap();
        assert_eq!(row_count(&conn, "Largest_banks").unwrap(), 4);
    }

    #[test]
    fn test_open_failure_is_storage_error() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("missing_dir").join("Banks.db");
        let err = open(&path).unwrap_err();
        assert!(matches!(err, EtlError::Storage { .. }));
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("Largest_banks"), "\"Largest_banks\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
