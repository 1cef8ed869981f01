//! Media service client

pub mod common;
pub(crate) mod youtube;

// Re-export commonly used items
pub use common::{
    build_upload_url, content_range, guess_content_type, next_offset_from_range, Snippet,
    VideoMetadata, VideoStatus, DEFAULT_CONTENT_TYPE, RESUME_INCOMPLETE, UPLOAD_PATH,
};
pub use youtube::{ResumableSession, VideoService};
