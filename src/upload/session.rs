//! Chunked upload session contract and outcome classification

use std::future::Future;

/// Status codes worth another attempt after backoff
pub const RETRIABLE_STATUS_CODES: [u16; 4] = [500, 502, 503, 504];

/// Reason given when the service finishes without a video id
pub const UNEXPECTED_TERMINAL_RESPONSE: &str = "unexpected terminal response";

/// Result of one "send next chunk" step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// Bytes were accepted; the transfer is not finished
    Progress { bytes_sent: u64, total_bytes: u64 },
    /// The service ingested the file and assigned it an id
    Complete(String),
    /// Transient transport or 5xx failure
    RetriableFailure(String),
    /// Any other service error, or a final response of the wrong shape
    FatalFailure { status: Option<u16>, reason: String },
}

impl ChunkOutcome {
    /// Build the terminal outcome for a final service response.
    ///
    /// A response without a (non-empty) id is fatal, never a success.
    pub fn complete(video_id: Option<String>, response: &str) -> Self {
        match video_id {
            Some(id) if !id.trim().is_empty() => Self::Complete(id),
            _ => Self::FatalFailure {
                status: None,
                reason: format!("{}: {}", UNEXPECTED_TERMINAL_RESPONSE, response),
            },
        }
    }

    /// Classify an error status returned by the service
    pub fn from_error_status(status: u16, content: &str) -> Self {
        if is_retriable_status(status) {
            Self::RetriableFailure(format!(
                "A retriable HTTP error {} occurred:\n{}",
                status, content
            ))
        } else {
            Self::FatalFailure {
                status: Some(status),
                reason: content.to_string(),
            }
        }
    }

    /// Classify a connection or IO level failure
    pub fn from_transport_error(err: impl std::fmt::Display) -> Self {
        Self::RetriableFailure(format!("A retriable error occurred: {}", err))
    }
}

pub fn is_retriable_status(status: u16) -> bool {
    RETRIABLE_STATUS_CODES.contains(&status)
}

/// One in-progress chunked transfer.
///
/// Implementations must not retry internally; every failure is reported
/// so the driver's single policy governs backoff.
pub trait UploadSession {
    fn send_next_chunk(&mut self) -> impl Future<Output = ChunkOutcome> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retriable_status_codes() {
        for code in [500, 502, 503, 504] {
            assert!(is_retriable_status(code));
        }
        for code in [400, 401, 403, 404, 409, 429, 501, 505] {
            assert!(!is_retriable_status(code));
        }
    }

    #[test]
    fn test_complete_without_id_is_fatal() {
        let outcome = ChunkOutcome::complete(None, r#"{"kind":"youtube#video"}"#);
        match outcome {
            ChunkOutcome::FatalFailure { status, reason } => {
                assert!(status.is_none());
                assert!(reason.starts_with(UNEXPECTED_TERMINAL_RESPONSE));
                assert!(reason.contains("youtube#video"));
            }
            other => panic!("expected fatal, got {:?}", other),
        }
        assert!(matches!(
            ChunkOutcome::complete(Some(String::new()), "{}"),
            ChunkOutcome::FatalFailure { .. }
        ));
    }

    #[test]
    fn test_error_status_classification() {
        assert!(matches!(
            ChunkOutcome::from_error_status(503, "backend"),
            ChunkOutcome::RetriableFailure(_)
        ));
        assert_eq!(
            ChunkOutcome::from_error_status(403, "forbidden"),
            ChunkOutcome::FatalFailure {
                status: Some(403),
                reason: "forbidden".to_string()
            }
        );
    }
}
