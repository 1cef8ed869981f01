//! Common types and helpers for the resumable upload protocol

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::UploadRequest;

/// Resumable upload endpoint, relative to the API host
pub const UPLOAD_PATH: &str = "/upload/youtube/v3/videos";

/// Metadata parts sent with the insert request
pub const UPLOAD_PARTS: &str = "snippet,status";

/// Fallback media type
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// HTTP status used by the service for "Resume Incomplete"
pub const RESUME_INCOMPLETE: u16 = 308;

/// Video resource body for the insert request
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VideoMetadata {
    pub snippet: Snippet,
    pub status: VideoStatus,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub category_id: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatus {
    pub privacy_status: String,
}

impl From<&UploadRequest> for VideoMetadata {
    fn from(request: &UploadRequest) -> Self {
        let tags = if request.tags().is_empty() {
            None
        } else {
            Some(request.tags().to_vec())
        };

        Self {
            snippet: Snippet {
                title: request.title().to_string(),
                description: request.description().to_string(),
                tags,
                category_id: request.category().to_string(),
            },
            status: VideoStatus {
                privacy_status: request.privacy_status().as_str().to_string(),
            },
        }
    }
}

/// Final response body; only the id matters here
#[derive(Debug, Deserialize)]
pub struct InsertResponse {
    pub id: Option<String>,
}

/// Build the session initiation URL
pub fn build_upload_url(base_url: &str) -> String {
    format!(
        "{}{}?uploadType=resumable&part={}",
        base_url.trim_end_matches('/'),
        UPLOAD_PATH,
        UPLOAD_PARTS
    )
}

/// Guess a media type from the file extension
pub fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "wmv" => "video/x-ms-wmv",
        "flv" => "video/x-flv",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mpg" | "mpeg" => "video/mpeg",
        "3gp" => "video/3gpp",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

/// Next byte offset from a `Range: bytes=0-N` header
pub fn next_offset_from_range(range: Option<&str>) -> u64 {
    range
        .and_then(|r| r.trim().strip_prefix("bytes="))
        .and_then(|r| r.split_once('-'))
        .and_then(|(_, last)| last.trim().parse::<u64>().ok())
        .map(|last| last + 1)
        .unwrap_or(0)
}

/// `Content-Range` value for a chunk of `len` bytes at `offset`
pub fn content_range(offset: u64, len: u64, total: u64) -> String {
    if len == 0 {
        format!("bytes */{}", total)
    } else {
        format!("bytes {}-{}/{}", offset, offset + len - 1, total)
    }
}
