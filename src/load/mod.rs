// src/load/mod.rs

pub mod csv_file;
pub mod db;

pub use csv_file::{read_csv, write_csv};
pub use db::write_table;
