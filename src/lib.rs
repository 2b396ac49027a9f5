//! Scrape the largest-banks table, convert market caps into GBP/EUR/INR, and load the
//! result into a CSV file and a SQLite table before running a few reports against it.

pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod load;
pub mod pipeline;
pub mod progress;
pub mod query;
pub mod transform;
pub mod types;

pub use config::Config;
pub use error::{EtlError, EtlResult};
pub use pipeline::{run, RunSummary};
pub use types::{BankRecord, EnrichedRecord};
