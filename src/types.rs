// src/types.rs

use serde::{Deserialize, Serialize};

pub const COL_NAME: &str = "Name";
pub const COL_MC_USD: &str = "MC_USD_Billion";
pub const COL_MC_GBP: &str = "MC_GBP_Billion";
pub const COL_MC_EUR: &str = "MC_EUR_Billion";
pub const COL_MC_INR: &str = "MC_INR_Billion";

/// Output column order, shared by the CSV header and the SQL table schema.
pub const OUTPUT_COLUMNS: [&str; 5] = [COL_NAME, COL_MC_USD, COL_MC_GBP, COL_MC_EUR, COL_MC_INR];

/// One bank as scraped from the source table. `market_cap_usd` is in billions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankRecord {
    pub name: String,
    pub market_cap_usd: f64,
}

/// A `BankRecord` plus its market cap converted into GBP, EUR and INR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "MC_USD_Billion")]
    pub mc_usd: f64,
    #[serde(rename = "MC_GBP_Billion")]
    pub mc_gbp: f64,
    #[serde(rename = "MC_EUR_Billion")]
    pub mc_eur: f64,
    #[serde(rename = "MC_INR_Billion")]
    pub mc_inr: f64,
}

impl EnrichedRecord {
    pub fn new(name: impl Into<String>, mc_usd: f64, mc_gbp: f64, mc_eur: f64, mc_inr: f64) -> Self {
        Self {
            name: name.into(),
            mc_usd,
            mc_gbp,
            mc_eur,
            mc_inr,
        }
    }
}
