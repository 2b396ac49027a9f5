// src/transform.rs

use serde::Deserialize;
use std::{collections::BTreeMap, fs, io::Read};
use tracing::{debug, info, instrument, warn};

use crate::error::{EtlError, EtlResult};
use crate::fetch::{Fetcher, Location};
use crate::types::{BankRecord, EnrichedRecord};

/// Currencies derived from the USD market cap, in output column order.
pub const TARGET_CURRENCIES: [&str; 3] = ["GBP", "EUR", "INR"];

/// Multiplier used when a target currency is missing from the rate file.
pub const DEFAULT_RATE: f64 = 1.0;

const EXPECTED_HEADER: [&str; 2] = ["Currency", "Rate"];

#[derive(Debug, Deserialize)]
struct RateRow {
    #[serde(rename = "Currency")]
    currency: String,
    #[serde(rename = "Rate")]
    rate: f64,
}

/// Currency code → multiplicative rate against USD. Immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    rates: BTreeMap<String, f64>,
}

impl RateTable {
    /// Read a `Currency,Rate` CSV. `location` is only used in error messages.
    pub fn from_csv_reader<R: Read>(reader: R, location: &str) -> EtlResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| EtlError::config(location, format!("reading header: {}", e)))?;
        if headers.iter().ne(EXPECTED_HEADER) {
            return Err(EtlError::config(
                location,
                format!(
                    "expected header `{}`, found `{}`",
                    EXPECTED_HEADER.join(","),
                    headers.iter().collect::<Vec<_>>().join(",")
                ),
            ));
        }

        let mut rates = BTreeMap::new();
        for (idx, result) in rdr.deserialize::<RateRow>().enumerate() {
            // +2: one for the header, one for 1-based line numbers
            let line = idx + 2;
            let row = result.map_err(|e| EtlError::config(location, format!("line {}: {}", line, e)))?;
            if row.currency.is_empty() {
                return Err(EtlError::config(location, format!("line {}: empty currency code", line)));
            }
            if !row.rate.is_finite() {
                return Err(EtlError::config(
                    location,
                    format!("line {}: rate for {} is not finite", line, row.currency),
                ));
            }
            rates.insert(row.currency, row.rate);
        }

        debug!(currencies = rates.len(), "parsed rate table");
        Ok(Self { rates })
    }

    /// Load the rate file from a local path or a remote URL.
    #[instrument(level = "info", skip(fetcher), fields(location = %location))]
    pub fn load(fetcher: &Fetcher, location: &Location) -> EtlResult<Self> {
        let text = match location {
            Location::Local(path) => fs::read_to_string(path).map_err(|e| {
                EtlError::config(location.to_string(), format!("unreadable rate file: {}", e))
            })?,
            Location::Remote(_) => fetcher.fetch_text(location)?,
        };
        Self::from_csv_reader(text.as_bytes(), &location.to_string())
    }

    pub fn get(&self, currency: &str) -> Option<f64> {
        self.rates.get(currency).copied()
    }

    /// The rate for `currency`, or `DEFAULT_RATE` if the file did not list it.
    pub fn rate_or_default(&self, currency: &str) -> f64 {
        self.get(currency).unwrap_or_else(|| {
            warn!(currency, default = DEFAULT_RATE, "currency missing from rate table");
            DEFAULT_RATE
        })
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.rates.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, f64)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            rates: iter.into_iter().collect(),
        }
    }
}

/// Round to `decimals` places, ties to even on the scaled value.
pub fn round_half_even(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Add GBP/EUR/INR columns. Output has the same length and order as `table`.
pub fn convert(table: &[BankRecord], rates: &RateTable) -> Vec<EnrichedRecord> {
    let [gbp, eur, inr] = TARGET_CURRENCIES.map(|code| rates.rate_or_default(code));

    let enriched: Vec<EnrichedRecord> = table
        .iter()
        .map(|rec| EnrichedRecord {
            name: rec.name.clone(),
            mc_usd: rec.market_cap_usd,
            mc_gbp: round_half_even(rec.market_cap_usd * gbp, 2),
            mc_eur: round_half_even(rec.market_cap_usd * eur, 2),
            mc_inr: round_half_even(rec.market_cap_usd * inr, 2),
        })
        .collect();

    info!(records = enriched.len(), gbp, eur, inr, "converted market caps");
    enriched
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    fn bank(name: &str, usd: f64) -> BankRecord {
        BankRecord {
            name: name.to_string(),
            market_cap_usd: usd,
        }
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(round_half_even(0.125, 2), 0.12);
        assert_eq!(round_half_even(0.375, 2), 0.38);
        assert_eq!(round_half_even(2.5, 0), 2.0);
        assert_eq!(round_half_even(3.5, 0), 4.0);
        assert_eq!(round_half_even(346.336, 2), 346.34);
    }

    #[test]
    fn test_parse_rate_file() {
        let csv = "Currency,Rate\nEUR,0.93\nGBP,0.8\nINR,82.95\n";
        let rates = RateTable::from_csv_reader(csv.as_bytes(), "inline").unwrap();
        assert_eq!(rates.len(), 3);
        assert_eq!(rates.get("GBP"), Some(0.8));
        assert_eq!(rates.get("USD"), None);
    }

    #[test]
    fn test_missing_header_is_config_error() {
        let csv = "EUR,0.93\nGBP,0.8\n";
        let err = RateTable::from_csv_reader(csv.as_bytes(), "inline").unwrap_err();
        assert!(matches!(err, EtlError::Config { .. }));
    }

    #[test]
    fn test_non_numeric_rate_is_config_error() {
        let csv = "Currency,Rate\nEUR,lots\n";
        let err = RateTable::from_csv_reader(csv.as_bytes(), "inline").unwrap_err();
        match err {
            EtlError::Config { reason, .. } => assert!(reason.contains("line 2"), "{reason}"),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_file_is_config_error() {
        let err = RateTable::from_csv_reader("".as_bytes(), "inline").unwrap_err();
        assert!(matches!(err, EtlError::Config { .. }));
    }

    #[test]
    fn test_conversion_law() {
        let rates: RateTable = [
            ("GBP".to_string(), 0.8),
            ("EUR".to_string(), 0.93),
            ("INR".to_string(), 82.95),
        ]
        .into_iter()
        .collect();
        let table = vec![bank("Bank A", 432.92), bank("Bank B", 231.52)];

        let out = convert(&table, &rates);
        assert_eq!(out.len(), table.len());
        for (rec, src) in out.iter().zip(&table) {
            assert_eq!(rec.name, src.name);
            assert_eq!(rec.mc_usd, src.market_cap_usd);
            assert_eq!(rec.mc_gbp, round_half_even(src.market_cap_usd * 0.8, 2));
            assert_eq!(rec.mc_eur, round_half_even(src.market_cap_usd * 0.93, 2));
            assert_eq!(rec.mc_inr, round_half_even(src.market_cap_usd * 82.95, 2));
        }
        assert_eq!(out[0].mc_gbp, 346.34);
    }

    #[test]
    fn test_missing_currency_defaults_to_one() {
        let rates: RateTable = [("GBP".to_string(), 0.5)].into_iter().collect();
        let out = convert(&[bank("Bank A", 10.456)], &rates);
        assert_eq!(out[0].mc_gbp, 5.23);
        // EUR and INR fall back to 1.0: value unchanged apart from rounding
        assert_eq!(out[0].mc_eur, 10.46);
        assert_eq!(out[0].mc_inr, 10.46);
    }

    #[test]
    fn test_load_local_rate_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("exchange_rate.csv");
        fs::write(&path, "Currency,Rate\nGBP,0.8\n").unwrap();

        let fetcher = Fetcher::new(Duration::from_secs(5)).unwrap();
        let rates = RateTable::load(&fetcher, &Location::Local(path)).unwrap();
        assert_eq!(rates.get("GBP"), Some(0.8));

        let missing = tmp.path().join("missing.csv");
        let err = RateTable::load(&fetcher, &Location::Local(missing)).unwrap_err();
        assert!(matches!(err, EtlError::Config { .. }));
    }
}
