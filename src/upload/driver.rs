//! Resumable upload driver - retry/backoff state machine

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::backoff::{backoff_delay, Jitter, RandomJitter, RetryDecision, RetryState};
use super::session::{ChunkOutcome, UploadSession};
use crate::error::{Result, UploadError};

/// Successful upload summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub video_id: String,
    /// Retriable failures absorbed along the way
    pub retries: u32,
    /// Chunk steps issued, including failed ones
    pub attempts: u32,
}

/// Observable step of a driver run
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    Attempt { attempt: u32 },
    Progress { bytes_sent: u64, total_bytes: u64 },
    RetryScheduled { retry: u32, delay: Duration, reason: String },
    Succeeded { video_id: String },
    Failed { status: Option<u16>, reason: String },
    Exhausted { retries: u32 },
    Cancelled,
}

type Observer = Box<dyn FnMut(&UploadEvent) + Send>;

/// Drives one session to a terminal state
pub struct ResumableUploadDriver<J = RandomJitter> {
    max_retries: u32,
    jitter: J,
    cancel: CancellationToken,
    observer: Option<Observer>,
}

impl ResumableUploadDriver<RandomJitter> {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            jitter: RandomJitter,
            cancel: CancellationToken::new(),
            observer: None,
        }
    }
}

impl<J: Jitter> ResumableUploadDriver<J> {
    /// Replace the jitter source
    pub fn with_jitter<K: Jitter>(self, jitter: K) -> ResumableUploadDriver<K> {
        ResumableUploadDriver {
            max_retries: self.max_retries,
            jitter,
            cancel: self.cancel,
            observer: self.observer,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_observer(mut self, observer: impl FnMut(&UploadEvent) + Send + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    fn emit(&mut self, event: UploadEvent) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&event);
        }
    }

    /// Run the session until it completes, fails fatally, exhausts its
    /// retries or is cancelled. The session is dropped on return.
    pub async fn run<S: UploadSession>(&mut self, mut session: S) -> Result<UploadReport> {
        let mut retry = RetryState::new(self.max_retries);
        let mut attempts: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Err(self.cancelled());
            }

            attempts += 1;
            info!("Uploading file... (attempt {})", attempts);
            self.emit(UploadEvent::Attempt { attempt: attempts });

            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(self.cancelled()),
                outcome = session.send_next_chunk() => outcome,
            };

            match outcome {
                ChunkOutcome::Progress {
                    bytes_sent,
                    total_bytes,
                } => {
                    debug!("Uploaded {}/{} bytes", bytes_sent, total_bytes);
                    self.emit(UploadEvent::Progress {
                        bytes_sent,
                        total_bytes,
                    });
                }
                ChunkOutcome::Complete(video_id) => {
                    info!("Video id '{}' was successfully uploaded.", video_id);
                    self.emit(UploadEvent::Succeeded {
                        video_id: video_id.clone(),
                    });
                    return Ok(UploadReport {
                        video_id,
                        retries: retry.retry_count(),
                        attempts,
                    });
                }
                ChunkOutcome::FatalFailure { status, reason } => {
                    error!("Upload failed: {}", reason);
                    self.emit(UploadEvent::Failed {
                        status,
                        reason: reason.clone(),
                    });
                    return Err(UploadError::Fatal { status, reason });
                }
                ChunkOutcome::RetriableFailure(reason) => {
                    warn!("{}", reason);
                    match retry.record_failure() {
                        RetryDecision::Exhausted => {
                            error!("No longer attempting to retry.");
                            self.emit(UploadEvent::Exhausted {
                                retries: self.max_retries,
                            });
                            return Err(UploadError::RetriesExhausted {
                                retries: self.max_retries,
                                last_error: reason,
                            });
                        }
                        RetryDecision::Retry(count) => {
                            let delay = backoff_delay(count, self.jitter.sample());
                            info!(
                                "Sleeping {:.3} seconds and retrying ({}/{})...",
                                delay.as_secs_f64(),
                                count,
                                self.max_retries
                            );
                            self.emit(UploadEvent::RetryScheduled {
                                retry: count,
                                delay,
                                reason,
                            });

                            tokio::select! {
                                biased;
                                _ = self.cancel.cancelled() => return Err(self.cancelled()),
                                _ = tokio::time::sleep(delay) => {}
                            }
                        }
                    }
                }
            }
        }
    }

    fn cancelled(&mut self) -> UploadError {
        warn!("Upload cancelled");
        self.emit(UploadEvent::Cancelled);
        UploadError::Cancelled
    }
}
