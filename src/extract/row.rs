// src/extract/row.rs

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use super::ExtractOptions;
use crate::error::{EtlError, EtlResult};
use crate::types::BankRecord;

/// Wiki footnote markers such as `[1]` or `[note 3]`.
static FOOTNOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]*\]").expect("footnote regex should compile"));

/// Cells meaning "no data".
const PLACEHOLDER_TOKENS: &[&str] = &["—", "–", "-", "N/A", "n/a"];
const EM_DASH: char = '—';

/// Trim whitespace, drop line breaks, thousands separators and footnote markers.
pub fn sanitize_cell(raw: &str) -> String {
    FOOTNOTE
        .replace_all(raw, "")
        .replace(['\n', '\r', ','], "")
        .trim()
        .to_string()
}

fn clean_name(raw: &str) -> String {
    FOOTNOTE.replace_all(raw, "").trim().to_string()
}

/// The two cells of interest from one table row, sanitized but not yet typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub name: String,
    pub market_cap: String,
}

impl RawRow {
    /// `None` when the row has too few cells to carry a name and a market cap.
    pub fn from_cells<S: AsRef<str>>(cells: &[S], options: &ExtractOptions) -> Option<Self> {
        if cells.len() < options.min_cells() {
            trace!(cells = cells.len(), "row too short");
            return None;
        }
        Some(Self {
            name: clean_name(cells.get(options.name_cell)?.as_ref()),
            market_cap: sanitize_cell(cells.get(options.value_cell)?.as_ref()),
        })
    }

    /// True when either cell is empty or a placeholder; such rows are dropped, not errors.
    pub fn is_placeholder(&self) -> bool {
        is_placeholder_token(&self.name)
            || is_placeholder_token(&self.market_cap)
            || self.market_cap.contains(EM_DASH)
    }
}

fn is_placeholder_token(text: &str) -> bool {
    text.is_empty() || PLACEHOLDER_TOKENS.contains(&text)
}

/// Coerce a kept row into a `BankRecord`. `index` is the row's position in the table.
pub fn parse_row(index: usize, raw: RawRow) -> EtlResult<BankRecord> {
    let parse_err = |reason: String| EtlError::Parse {
        row: index,
        text: raw.market_cap.clone(),
        reason,
    };

    let value: f64 = raw
        .market_cap
        .parse()
        .map_err(|e: std::num::ParseFloatError| parse_err(e.to_string()))?;
    if !value.is_finite() {
        return Err(parse_err("market cap is not a finite number".into()));
    }
    if value < 0.0 {
        return Err(parse_err("market cap is negative".into()));
    }

    Ok(BankRecord {
        name: raw.name,
        market_cap_usd: value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, market_cap: &str) -> RawRow {
        RawRow {
            name: name.to_string(),
            market_cap: market_cap.to_string(),
        }
    }

    #[test]
    fn test_sanitize_cell() {
        assert_eq!(sanitize_cell(" 1,194.56\n"), "1194.56");
        assert_eq!(sanitize_cell("432.92[1]"), "432.92");
        assert_eq!(sanitize_cell("\u{a0}—\n"), "—");
    }

    #[test]
    fn test_from_cells_needs_three() {
        let opts = ExtractOptions::default();
        assert!(RawRow::from_cells(&["1", "Bank"], &opts).is_none());

        let row = RawRow::from_cells(&["1", " Bank A\n", "1,000.5\n"], &opts).unwrap();
        assert_eq!(row, raw("Bank A", "1000.5"));
    }

    #[test]
    fn test_placeholder_filter() {
        assert!(raw("Bank", "—").is_placeholder());
        assert!(raw("Bank", "— (delisted)").is_placeholder());
        assert!(raw("Bank", "").is_placeholder());
        assert!(raw("", "12.0").is_placeholder());
        assert!(raw("Bank", "N/A").is_placeholder());
        assert!(!raw("Bank", "12.0").is_placeholder());
    }

    #[test]
    fn test_parse_row() {
        let rec = parse_row(1, raw("Bank A", "100.25")).unwrap();
        assert_eq!(rec.name, "Bank A");
        assert_eq!(rec.market_cap_usd, 100.25);
    }

    #[test]
    fn test_parse_row_rejects_garbage() {
        for bad in ["abc", "inf", "NaN", "-3.0"] {
            match parse_row(7, raw("Bank", bad)) {
                Err(EtlError::Parse { row, text, .. }) => {
                    assert_eq!(row, 7);
                    assert_eq!(text, bad);
                }
                other => panic!("expected parse error for {bad:?}, got {other:?}"),
            }
        }
    }
}
