//! Upload error taxonomy

use std::path::PathBuf;

use thiserror::Error;

/// Terminal failure of an upload, or a setup problem that prevented one
#[derive(Debug, Error)]
pub enum UploadError {
    /// The media file does not exist or cannot be read
    #[error("Please specify a valid file using the --file parameter ({})", .0.display())]
    InvalidFile(PathBuf),

    /// A command-line or configuration value was rejected
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// No usable credential could be loaded
    #[error("Credentials unavailable: {0}")]
    Credentials(String),

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Non-retriable service error or unexpected response shape
    #[error("{}", fatal_message(.status, .reason))]
    Fatal { status: Option<u16>, reason: String },

    /// Retry ceiling reached
    #[error("No longer attempting to retry: gave up after {retries} retries (last error: {last_error})")]
    RetriesExhausted { retries: u32, last_error: String },

    /// The upload was cancelled before reaching a terminal state
    #[error("Upload cancelled")]
    Cancelled,
}

fn fatal_message(status: &Option<u16>, reason: &str) -> String {
    match status {
        Some(code) => format!("An HTTP error {} occurred:\n{}", code, reason),
        None => format!("The upload failed: {}", reason),
    }
}

impl UploadError {
    /// True for errors raised before any upload attempt
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidFile(_) | Self::InvalidOption(_) | Self::Credentials(_) | Self::HttpClient(_)
        )
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Fatal { .. } => 1,
            Self::RetriesExhausted { .. } => 3,
            Self::Cancelled => 130,
            _ => 2,
        }
    }
}

pub type Result<T, E = UploadError> = std::result::Result<T, E>;
