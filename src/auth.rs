//! Stored credential loading
//!
//! Credentials are produced by an external authorization flow; this module
//! only reads them back and rejects unusable ones before any upload starts.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, UploadError};
use crate::http_logger::mask_token;

/// Environment variable holding a bearer access token
pub const ENV_ACCESS_TOKEN: &str = "YT_UPLOAD_ACCESS_TOKEN";

/// Credential file read when nothing else is configured
pub const DEFAULT_CREDENTIALS_FILE: &str = "yt-upload-oauth2.json";

/// Bearer credential for the upload API
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_token: String,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>) -> Result<Self> {
        let access_token = access_token.into().trim().to_string();
        if access_token.is_empty() {
            return Err(UploadError::Credentials(
                "access token cannot be empty".to_string(),
            ));
        }
        Ok(Self { access_token })
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &mask_token(&self.access_token))
            .finish()
    }
}

/// Supplies a valid credential or a setup error
pub trait CredentialProvider {
    fn credentials(&self) -> Result<Credentials>;
}

/// Token taken from an environment variable
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new() -> Self {
        Self::with_var(ENV_ACCESS_TOKEN)
    }

    pub fn with_var(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn is_set(&self) -> bool {
        std::env::var(&self.var)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false)
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialProvider for EnvCredentials {
    fn credentials(&self) -> Result<Credentials> {
        let token = std::env::var(&self.var).map_err(|_| {
            UploadError::Credentials(format!("{} environment variable is not set", self.var))
        })?;
        Credentials::new(token)
    }
}

/// On-disk credential as written by the authorization flow
#[derive(Debug, Deserialize)]
struct StoredCredentials {
    access_token: Option<String>,
    #[serde(default)]
    token_expiry: Option<String>,
    #[serde(default)]
    invalid: bool,
}

/// Token read from a JSON credential file
#[derive(Debug, Clone)]
pub struct FileCredentials {
    path: PathBuf,
}

impl FileCredentials {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialProvider for FileCredentials {
    fn credentials(&self) -> Result<Credentials> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            UploadError::Credentials(format!(
                "cannot read credential file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let stored: StoredCredentials = serde_json::from_str(&content).map_err(|e| {
            UploadError::Credentials(format!(
                "malformed credential file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        if stored.invalid {
            return Err(UploadError::Credentials(format!(
                "credential in {} is marked invalid; re-run the authorization flow",
                self.path.display()
            )));
        }

        if let Some(expiry) = stored.token_expiry.as_deref() {
            let expiry = DateTime::parse_from_rfc3339(expiry).map_err(|e| {
                UploadError::Credentials(format!("invalid token_expiry '{}': {}", expiry, e))
            })?;
            if expiry.with_timezone(&Utc) <= Utc::now() {
                return Err(UploadError::Credentials(format!(
                    "access token in {} expired at {}",
                    self.path.display(),
                    expiry
                )));
            }
        }

        let token = stored.access_token.ok_or_else(|| {
            UploadError::Credentials(format!(
                "credential file {} has no access_token",
                self.path.display()
            ))
        })?;

        debug!("Loaded credentials from {}", self.path.display());
        Credentials::new(token)
    }
}

/// Pick a provider: an explicit file wins, then the environment, then the
/// default credential file
pub fn resolve_provider(explicit_file: Option<PathBuf>) -> Box<dyn CredentialProvider> {
    if let Some(path) = explicit_file {
        return Box::new(FileCredentials::new(path));
    }
    let env = EnvCredentials::new();
    if env.is_set() {
        return Box::new(env);
    }
    Box::new(FileCredentials::new(DEFAULT_CREDENTIALS_FILE))
}
