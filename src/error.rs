//! Error types for vscrape

use crate::download::DownloadProgress;
use thiserror::Error;

/// Failure to recover a payload from a packed script
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("evaluation failed: {0}")]
    Evaluation(String),

    #[error("malformed packer data: {0}")]
    Malformed(&'static str),

    #[error("packer symbol table has {found} entries, expected {expected}")]
    SymbolTable { expected: usize, found: usize },
}

/// Main error type for vscrape operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Invalid video ID: {0}")]
    InvalidVideoId(String),

    #[error("Could not find packed code in the page")]
    PackedScriptNotFound,

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Request to {url} failed with status {status}")]
    HttpStatus { status: u16, url: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Invalid request header {0}")]
    InvalidHeader(String),

    #[error("{}", .0.error.as_deref().unwrap_or("Download failed"))]
    Download(Box<DownloadProgress>),

    #[error("No playable source found for video {0}")]
    NoSource(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl ScrapeError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            ScrapeError::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            ScrapeError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Check if error means the page was fetched but held nothing usable
    pub fn is_content_error(&self) -> bool {
        matches!(
            self,
            ScrapeError::PackedScriptNotFound | ScrapeError::Decode(_) | ScrapeError::NoSource(_)
        )
    }
}

impl From<tokio::task::JoinError> for ScrapeError {
    fn from(err: tokio::task::JoinError) -> Self {
        ScrapeError::Task(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::DownloadStatus;

    #[test]
    fn test_status_retryable() {
        let err = ScrapeError::HttpStatus {
            status: 503,
            url: "https://example.com".to_string(),
        };
        assert!(err.is_retryable());

        let err = ScrapeError::HttpStatus {
            status: 429,
            url: "https://example.com".to_string(),
        };
        assert!(err.is_retryable());

        let err = ScrapeError::HttpStatus {
            status: 404,
            url: "https://example.com".to_string(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_content_errors_not_retryable() {
        assert!(!ScrapeError::PackedScriptNotFound.is_retryable());
        assert!(ScrapeError::PackedScriptNotFound.is_content_error());

        let err = ScrapeError::from(DecodeError::Malformed("no arguments"));
        assert!(err.is_content_error());
        assert_eq!(
            err.to_string(),
            "Decode error: malformed packer data: no arguments"
        );
    }

    #[test]
    fn test_download_error_message() {
        let mut progress = DownloadProgress::new();
        progress.status = DownloadStatus::Failed;
        progress.error = Some("FFmpeg process exited with code 1".to_string());

        let err = ScrapeError::Download(Box::new(progress));
        assert_eq!(err.to_string(), "FFmpeg process exited with code 1");
    }
}
