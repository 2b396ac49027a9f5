// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

use crate::fetch::FetchError;

pub type EtlResult<T> = Result<T, EtlError>;

/// Every way a pipeline stage can fail. Each variant names the stage that raised it.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("network error: {0}")]
    Network(#[from] FetchError),

    #[error("extraction error: {0}")]
    Extraction(String),

    #[error("parse error in row {row}: {reason} (value {text:?})")]
    Parse {
        row: usize,
        text: String,
        reason: String,
    },

    #[error("config error in {location}: {reason}")]
    Config { location: String, reason: String },

    #[error("storage error: {context}")]
    Storage {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("query error in `{query}`")]
    Query {
        query: String,
        #[source]
        source: rusqlite::Error,
    },
}

impl EtlError {
    pub(crate) fn config(location: impl Into<String>, reason: impl Into<String>) -> Self {
        EtlError::Config {
            location: location.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn storage(context: impl Into<String>, source: rusqlite::Error) -> Self {
        EtlError::Storage {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn io(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        EtlError::Io {
            path: path.into(),
            source: source.into(),
        }
    }
}
