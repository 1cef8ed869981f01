//! yt-upload library - resumable video uploads with retry and backoff

pub mod auth;
pub mod config;
pub mod error;
pub mod http_logger;
pub mod service;
pub mod upload;

// Re-export commonly used types
pub use auth::{CredentialProvider, Credentials, EnvCredentials, FileCredentials};
pub use config::{Config, ConfigOptions, PrivacyStatus, RequestOptions, UploadRequest};
pub use error::{Result, UploadError};
pub use service::{ResumableSession, VideoService};
pub use upload::{ChunkOutcome, ResumableUploadDriver, UploadEvent, UploadReport, UploadSession};
