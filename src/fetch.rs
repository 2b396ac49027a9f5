// src/fetch.rs

use reqwest::blocking::Client;
use std::{
    fmt, fs,
    path::PathBuf,
    time::Duration,
};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

const USER_AGENT: &str = concat!("bankscraper/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("building HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("GET {url} failed")]
    Http {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("reading {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where a document lives: an http(s) URL or something on the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Remote(Url),
    Local(PathBuf),
}

impl Location {
    /// `http(s)://` → remote, `file://` → local path, anything else is taken as a path.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Location::Remote(url),
            Ok(url) if url.scheme() == "file" => match url.to_file_path() {
                Ok(path) => Location::Local(path),
                Err(()) => Location::Local(PathBuf::from(url.path())),
            },
            _ => Location::Local(PathBuf::from(raw)),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Remote(url) => write!(f, "{}", url),
            Location::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Blocking text fetcher. One attempt per call, bounded by the client timeout.
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    #[instrument(level = "debug", skip(self), fields(location = %location))]
    pub fn fetch_text(&self, location: &Location) -> Result<String, FetchError> {
        match location {
            Location::Remote(url) => {
                debug!(%url, "GET");
                self.client
                    .get(url.clone())
                    .send()
                    .and_then(|resp| resp.error_for_status())
                    .and_then(|resp| resp.text())
                    .map_err(|source| FetchError::Http {
                        url: url.clone(),
                        source,
                    })
            }
            Location::Local(path) => {
                debug!(path = %path.display(), "reading local file");
                fs::read_to_string(path).map_err(|source| FetchError::Io {
                    path: path.clone(),
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_location_parse() {
        assert!(matches!(
            Location::parse("https://example.com/banks"),
            Location::Remote(_)
        ));
        assert_eq!(
            Location::parse("./exchange_rate.csv"),
            Location::Local(PathBuf::from("./exchange_rate.csv"))
        );
        assert_eq!(
            Location::parse("file:///tmp/page.html"),
            Location::Local(PathBuf::from("/tmp/page.html"))
        );
    }

    #[test]
    fn test_fetch_local_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("page.html");
        fs::write(&path, "<html></html>").unwrap();

        let fetcher = Fetcher::new(Duration::from_secs(5)).unwrap();
        let text = fetcher.fetch_text(&Location::Local(path)).unwrap();
        assert_eq!(text, "<html></html>");
    }

    #[test]
    fn test_fetch_missing_file() {
        let tmp = tempdir().unwrap();
        let fetcher = Fetcher::new(Duration::from_secs(5)).unwrap();
        let err = fetcher
            .fetch_text(&Location::Local(tmp.path().join("nope.html")))
            .unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
    }
}
