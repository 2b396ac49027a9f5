// src/query.rs

use prettytable::{format, Cell, Row, Table};
use rusqlite::{types::ValueRef, Connection};
use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};
use std::{
    fmt,
    io::{self, Write},
};
use tracing::{debug, instrument};

use crate::error::{EtlError, EtlResult};

/// A single SQLite cell, owned.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<ValueRef<'_>> for SqlValue {
    fn from(v: ValueRef<'_>) -> Self {
        match v {
            ValueRef::Null => SqlValue::Null,
            ValueRef::Integer(i) => SqlValue::Integer(i),
            ValueRef::Real(f) => SqlValue::Real(f),
            ValueRef::Text(t) => SqlValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => SqlValue::Blob(b.to_vec()),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Integer(i) => write!(f, "{}", i),
            // Debug keeps the trailing `.0` on whole numbers
            SqlValue::Real(r) => write!(f, "{:?}", r),
            SqlValue::Text(t) => f.write_str(t),
            SqlValue::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

/// One result row: column name → value, in select-list order.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRow(pub Vec<(String, SqlValue)>);

impl QueryRow {
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.0.iter().find(|(name, _)| name == column).map(|(_, v)| v)
    }

    pub fn values(&self) -> impl Iterator<Item = &SqlValue> {
        self.0.iter().map(|(_, v)| v)
    }
}

impl Serialize for QueryRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub query: String,
    pub columns: Vec<String>,
    pub rows: Vec<QueryRow>,
}

impl QueryResult {
    /// First column of the first row, for aggregate queries.
    pub fn scalar(&self) -> Option<&SqlValue> {
        self.rows.first().and_then(|row| row.values().next())
    }

    /// Box-drawn console table: column names as titles, one row per result row.
    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BOX_CHARS);
        table.set_titles(Row::new(self.columns.iter().map(|c| Cell::new(c)).collect()));
        for row in &self.rows {
            table.add_row(Row::new(
                row.values().map(|v| Cell::new(&v.to_string())).collect(),
            ));
        }
        table
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_table())?;
        write!(f, "({} rows)", self.rows.len())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// The three fixed reports run after each load.
pub fn default_queries(table: &str) -> Vec<String> {
    vec![
        format!("SELECT * FROM {}", table),
        format!("SELECT AVG(MC_GBP_Billion) FROM {}", table),
        format!("SELECT Name FROM {} LIMIT 5", table),
    ]
}

/// Execute `sql` and materialize every row in order.
#[instrument(level = "info", skip(conn))]
pub fn run_query(conn: &Connection, sql: &str) -> EtlResult<QueryResult> {
    let err = |source: rusqlite::Error| EtlError::Query {
        query: sql.to_string(),
        source,
    };

    let mut stmt = conn.prepare(sql).map_err(err)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = stmt.query([]).map_err(err)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(err)? {
        let values = (0..columns.len())
            .map(|i| row.get_ref(i).map(SqlValue::from))
            .collect::<Result<Vec<_>, _>>()
            .map_err(err)?;
        out.push(QueryRow(columns.iter().cloned().zip(values).collect()));
    }

    debug!(rows = out.len(), "query complete");
    Ok(QueryResult {
        query: sql.to_string(),
        columns,
        rows: out,
    })
}

/// Write the query text followed by its result.
pub fn emit<W: Write>(result: &QueryResult, out: &mut W, format: OutputFormat) -> EtlResult<()> {
    let written = match format {
        OutputFormat::Table => writeln!(out, "{}\n{}\n", result.query, result),
        OutputFormat::Json => serde_json::to_writer(&mut *out, result)
            .map_err(io::Error::from)
            .and_then(|_| writeln!(out)),
    };
    written.map_err(|e| EtlError::io("<output>", e))
}
