// src/extract/mod.rs

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{EtlError, EtlResult};
use crate::fetch::{Fetcher, Location};
use crate::types::BankRecord;

pub mod row;

pub use row::{parse_row, sanitize_cell, RawRow};

/// Where to find the bank table and which cells hold the fields.
/// Cell positions are zero-based and bound by position, not by header text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    pub table_selector: String,
    pub name_cell: usize,
    pub value_cell: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            table_selector: "table.wikitable".to_string(),
            name_cell: 1,
            value_cell: 2,
        }
    }
}

impl ExtractOptions {
    pub fn min_cells(&self) -> usize {
        self.name_cell.max(self.value_cell) + 1
    }
}

/// Fetch the document at `location` and parse its bank table.
#[instrument(level = "info", skip(fetcher, options), fields(location = %location))]
pub fn extract(
    fetcher: &Fetcher,
    location: &Location,
    options: &ExtractOptions,
) -> EtlResult<Vec<BankRecord>> {
    let html = fetcher.fetch_text(location)?;
    debug!(bytes = html.len(), "fetched source document");
    extract_from_html(&html, options)
}

/// Parse the first table matching `options.table_selector`, skipping its header row.
pub fn extract_from_html(html: &str, options: &ExtractOptions) -> EtlResult<Vec<BankRecord>> {
    let table_sel = Selector::parse(&options.table_selector).map_err(|e| {
        EtlError::Extraction(format!(
            "invalid table selector `{}`: {:?}",
            options.table_selector, e
        ))
    })?;
    let row_sel = Selector::parse("tr").expect("tr selector should parse");
    let cell_sel = Selector::parse("td").expect("td selector should parse");

    let doc = Html::parse_document(html);
    let table = doc.select(&table_sel).next().ok_or_else(|| {
        EtlError::Extraction(format!("no table matching `{}`", options.table_selector))
    })?;

    // rows and cells of tables nested inside a cell belong to those tables
    let rows: Vec<ElementRef> = table
        .select(&row_sel)
        .filter(|tr| owned_by(tr, &table, "table"))
        .collect();
    let data_rows = rows.len().saturating_sub(1);

    let records = rows
        .iter()
        .enumerate()
        .skip(1)
        .filter_map(|(index, tr)| {
            let cells: Vec<String> = tr
                .select(&cell_sel)
                .filter(|td| owned_by(td, tr, "tr"))
                .map(|td| td.text().collect::<String>())
                .collect();
            RawRow::from_cells(&cells, options).map(|raw| (index, raw))
        })
        .filter(|(_, raw)| !raw.is_placeholder())
        .map(|(index, raw)| parse_row(index, raw))
        .collect::<EtlResult<Vec<_>>>()?;

    info!(
        rows = data_rows,
        kept = records.len(),
        dropped = data_rows - records.len(),
        "extracted bank table"
    );
    Ok(records)
}

/// True when the nearest `<name>` ancestor of `el` is `owner`.
fn owned_by(el: &ElementRef, owner: &ElementRef, name: &str) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == name)
        .map_or(false, |a| a.id() == owner.id())
}
