use thiserror::Error;

/// A portal page could not be retrieved. The portal contributes no records.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timed out after {secs}s waiting for {url}")]
    Timeout { url: String, secs: u64 },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("browser could not load {url}: {reason}")]
    Navigation { url: String, reason: String },

    #[error("{url} needs a browser session but none is running")]
    BrowserUnavailable { url: String },
}

/// A single listing card was unusable. Remaining cards are still processed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("card {index}: missing {field}")]
    MissingField { index: usize, field: &'static str },

    #[error("card {index}: price {raw:?} is not a whole number")]
    InvalidPrice { index: usize, raw: String },

    #[error("card {index}: link {href:?} is not an http(s) page")]
    InvalidLink { index: usize, href: String },
}

/// The headless browser could not be started. Fatal to the whole search.
#[derive(Debug, Error)]
#[error("failed to start browser session: {0}")]
pub struct DriverInitError(pub String);
