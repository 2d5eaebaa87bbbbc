use thiserror::Error;

/// Failures of the scraping pipeline for a single URL.
///
/// `Fetch`/`Status` cover the static retrieval path, `Render`/
/// `BrowserUnavailable` the headless one. `Empty` is the escalation signal:
/// retrieval worked but no table passed the acceptance gate.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("fetch failed for {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("render failed for {url}: {reason}")]
    Render { url: String, reason: String },

    #[error("no usable browser executable; install Chrome/Chromium or set CHROME_EXECUTABLE")]
    BrowserUnavailable,

    #[error("invalid URL {0}: expected http:// or https://")]
    InvalidUrl(String),

    #[error("no draw records extracted from {url}")]
    Empty { url: String },
}

impl ScrapeError {
    /// `Empty` is an expected no-data state, not infrastructure trouble.
    pub fn is_empty(&self) -> bool {
        matches!(self, ScrapeError::Empty { .. })
    }
}

/// Validity-gate violations shared by extraction and bulk import.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RecordError {
    #[error("expected 6 numbers, got {0}")]
    WrongCount(usize),

    #[error("number {0} outside [1,43]")]
    OutOfRange(u8),

    #[error("duplicate number {0}")]
    Duplicate(u8),

    #[error("bonus number {0} outside [1,43]")]
    BonusOutOfRange(u8),
}
