use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("timed out after {timeout_ms}ms waiting for {source_name}")]
    Timeout { source_name: String, timeout_ms: u128 },

    #[error("exchange rate element not found in page from {url}")]
    RateNotFound { url: String },

    #[error("invalid exchange rate \"{raw}\": {reason}")]
    InvalidRate { raw: String, reason: String },

    #[error("malformed CSV at line {line}: {reason}")]
    Csv { line: usize, reason: String },

    #[error("sheet is missing required column \"{column}\"")]
    MissingColumn { column: &'static str },
}
