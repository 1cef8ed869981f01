//! Configuration module - upload request and client settings

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::error::UploadError;
use crate::upload::DEFAULT_MAX_RETRIES;

/// Default API host
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";

/// Default video title
pub const DEFAULT_TITLE: &str = "Test Title";

/// Default video description
pub const DEFAULT_DESCRIPTION: &str = "Test Description";

/// Default category ("People & Blogs")
pub const DEFAULT_CATEGORY: &str = "22";

/// Chunk sizes must be a multiple of this (256 KiB)
pub const CHUNK_GRANULARITY: u64 = 256 * 1024;

/// Default connect and control-request timeout in seconds
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Largest accepted retry ceiling; keeps `2^retry` seconds representable
const MAX_RETRY_CEILING: u32 = 30;

/// Video privacy status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrivacyStatus {
    #[default]
    Public,
    Private,
    Unlisted,
}

impl PrivacyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Unlisted => "unlisted",
        }
    }
}

impl fmt::Display for PrivacyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrivacyStatus {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            "unlisted" => Ok(Self::Unlisted),
            other => Err(UploadError::InvalidOption(format!(
                "privacy status '{}' must be one of public, private, unlisted",
                other
            ))),
        }
    }
}

/// Raw caller input for an upload, before validation
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub file: PathBuf,
    pub title: String,
    pub description: String,
    pub category: String,
    pub keywords: String,
    pub privacy_status: PrivacyStatus,
}

impl RequestOptions {
    /// Options for `file` with every other field at its default
    pub fn for_file(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            title: DEFAULT_TITLE.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            keywords: String::new(),
            privacy_status: PrivacyStatus::default(),
        }
    }
}

/// Immutable description of one upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    file: PathBuf,
    title: String,
    description: String,
    category: String,
    tags: Vec<String>,
    privacy_status: PrivacyStatus,
}

impl UploadRequest {
    /// Validate caller input and build the request.
    ///
    /// Fails with a setup error when the file is missing or the category
    /// is not a numeric code; nothing is sent before this succeeds.
    pub fn from_options(options: RequestOptions) -> Result<Self, UploadError> {
        if !options.file.is_file() {
            return Err(UploadError::InvalidFile(options.file));
        }

        let category = options.category.trim().to_string();
        if category.is_empty() || !category.chars().all(|c| c.is_ascii_digit()) {
            return Err(UploadError::InvalidOption(format!(
                "category '{}' must be a numeric code",
                options.category
            )));
        }

        Ok(Self {
            file: options.file,
            title: options.title,
            description: options.description,
            category,
            tags: parse_keywords(&options.keywords),
            privacy_status: options.privacy_status,
        })
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Keyword tags in caller order; empty when none were given
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn privacy_status(&self) -> PrivacyStatus {
        self.privacy_status
    }
}

/// Split a comma-separated keyword list into tags.
///
/// Blank segments are dropped, so an empty string yields no tags at all.
pub fn parse_keywords(keywords: &str) -> Vec<String> {
    keywords
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Optional configuration parameters for Config::new()
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    pub chunk_size: Option<u64>,
    pub max_retries: Option<u32>,
    pub request_timeout: Option<u64>,
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    /// Bytes per chunk; `None` sends the rest of the file in one request
    pub chunk_size: Option<u64>,
    pub max_retries: u32,
    pub request_timeout_secs: u64,
}

impl Config {
    /// Create a new Config for the given API host plus optional settings
    pub fn new(base_url: String, options: ConfigOptions) -> Result<Arc<Self>> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();

        if base_url.is_empty() {
            return Err(anyhow!("base_url cannot be empty"));
        }
        if !base_url.starts_with("https://") && !base_url.starts_with("http://") {
            return Err(anyhow!(
                "base_url must start with http:// or https://: {}",
                base_url
            ));
        }

        if let Some(size) = options.chunk_size {
            if size == 0 || size % CHUNK_GRANULARITY != 0 {
                return Err(anyhow!(
                    "chunk_size must be a positive multiple of {} bytes, got {}",
                    CHUNK_GRANULARITY,
                    size
                ));
            }
        }

        let max_retries = options.max_retries.unwrap_or(DEFAULT_MAX_RETRIES);
        if max_retries > MAX_RETRY_CEILING {
            return Err(anyhow!(
                "max_retries cannot exceed {}, got {}",
                MAX_RETRY_CEILING,
                max_retries
            ));
        }

        let request_timeout_secs = options
            .request_timeout
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        if request_timeout_secs == 0 {
            return Err(anyhow!("request timeout must be at least one second"));
        }

        Ok(Arc::new(Self {
            base_url,
            chunk_size: options.chunk_size,
            max_retries,
            request_timeout_secs,
        }))
    }
}
