// src/progress.rs

use chrono::Local;
use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};
use tracing::info;

use crate::error::{EtlError, EtlResult};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only run log, one `<timestamp> : <message>` line per stage.
/// The file is opened and closed on every call.
#[derive(Debug, Clone)]
pub struct ProgressLog {
    path: PathBuf,
}

impl ProgressLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn log(&self, message: &str) -> EtlResult<()> {
        info!(target: "progress", "{}", message);

        let timestamp = Local::now().format(TIMESTAMP_FORMAT);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| EtlError::io(&self.path, e))?;
        writeln!(file, "{} : {}", timestamp, message).map_err(|e| EtlError::io(&self.path, e))
    }
}
