//! Resumable upload core
//!
//! A session performs one step of a chunked transfer; the driver owns the
//! retry policy and runs the session to a single terminal outcome.

mod backoff;
mod driver;
mod session;

pub use backoff::{
    backoff_delay, Jitter, RandomJitter, RetryDecision, RetryState, DEFAULT_MAX_RETRIES,
};
pub use driver::{ResumableUploadDriver, UploadEvent, UploadReport};
pub use session::{
    is_retriable_status, ChunkOutcome, UploadSession, RETRIABLE_STATUS_CODES,
    UNEXPECTED_TERMINAL_RESPONSE,
};
