//! YouTube Data API resumable upload client

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, LOCATION, RANGE};
use reqwest::{redirect, Body, Client, Response};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use super::common::{
    build_upload_url, content_range, guess_content_type, next_offset_from_range, InsertResponse,
    VideoMetadata, RESUME_INCOMPLETE,
};
use crate::auth::Credentials;
use crate::config::{Config, UploadRequest};
use crate::error::{Result, UploadError};
use crate::http_logger::{
    extract_response_headers, is_enabled, log_exchange, new_request_id, HttpRequestLog,
    HttpResponseLog,
};
use crate::upload::{ChunkOutcome, UploadSession, UNEXPECTED_TERMINAL_RESPONSE};

/// Client for the video insert endpoint
pub struct VideoService {
    client: Client,
    upload_url: String,
    control_timeout: Duration,
    credentials: Credentials,
    chunk_size: Option<u64>,
}

impl VideoService {
    pub fn new(config: &Config, credentials: Credentials) -> Result<Self> {
        // Redirects stay visible: 308 means "Resume Incomplete" here.
        // No client-wide deadline: a chunk PUT may legitimately outlast it.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.request_timeout_secs))
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            upload_url: build_upload_url(&config.base_url),
            control_timeout: Duration::from_secs(config.request_timeout_secs),
            credentials,
            chunk_size: config.chunk_size,
        })
    }

    /// Prepare a resumable session for `request`.
    ///
    /// No request is sent yet; the session is initiated by its first step.
    pub fn create_upload_session(&self, request: &UploadRequest) -> Result<ResumableSession> {
        let total_bytes = std::fs::metadata(request.file())
            .map_err(|_| UploadError::InvalidFile(request.file().to_path_buf()))?
            .len();
        let content_type = guess_content_type(request.file());

        info!(
            "Prepared upload of {} ({} bytes, {}, privacy={})",
            request.file().display(),
            total_bytes,
            content_type,
            request.privacy_status()
        );

        Ok(ResumableSession {
            client: self.client.clone(),
            upload_url: self.upload_url.clone(),
            control_timeout: self.control_timeout,
            access_token: self.credentials.access_token().to_string(),
            file: request.file().to_path_buf(),
            content_type,
            metadata: VideoMetadata::from(request),
            total_bytes,
            chunk_size: self.chunk_size,
            session_uri: None,
            offset: 0,
            needs_resync: false,
        })
    }
}

/// One resumable transfer of a local file
pub struct ResumableSession {
    client: Client,
    upload_url: String,
    /// Deadline for initiation and status queries, which carry no media
    control_timeout: Duration,
    access_token: String,
    file: PathBuf,
    content_type: &'static str,
    metadata: VideoMetadata,
    total_bytes: u64,
    chunk_size: Option<u64>,
    session_uri: Option<String>,
    offset: u64,
    /// Server state unknown after a failure; ask before sending more
    needs_resync: bool,
}

impl ResumableSession {
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    pub fn session_uri(&self) -> Option<&str> {
        self.session_uri.as_deref()
    }

    /// Bytes the service has confirmed
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    async fn initiate(&mut self) -> ChunkOutcome {
        let body = match serde_json::to_string(&self.metadata) {
            Ok(body) => body,
            Err(e) => {
                return ChunkOutcome::FatalFailure {
                    status: None,
                    reason: format!("Failed to encode video metadata: {}", e),
                }
            }
        };

        let log = HttpRequestLog {
            request_id: new_request_id(),
            method: "POST",
            url: self.upload_url.clone(),
            headers: vec![
                ("Authorization".to_string(), self.bearer()),
                ("X-Upload-Content-Length".to_string(), self.total_bytes.to_string()),
                ("X-Upload-Content-Type".to_string(), self.content_type.to_string()),
            ],
            body: Some(body.clone()),
        };

        debug!("Starting resumable session: {}", self.upload_url);
        let start = Instant::now();
        let result = self
            .client
            .post(&self.upload_url)
            .timeout(self.control_timeout)
            .header(AUTHORIZATION, self.bearer())
            .header(CONTENT_TYPE, "application/json; charset=UTF-8")
            .header("X-Upload-Content-Length", self.total_bytes)
            .header("X-Upload-Content-Type", self.content_type)
            .body(body)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => return transport_failure(&log, start, e),
        };

        let status = response.status().as_u16();
        let location = header_value(&response, LOCATION.as_str());
        let text = match read_body(response, &log, start).await {
            Ok(text) => text,
            Err(outcome) => return outcome,
        };

        if !(200..300).contains(&status) {
            return ChunkOutcome::from_error_status(status, &text);
        }

        match location {
            Some(uri) => {
                info!("Resumable upload session started");
                self.session_uri = Some(uri);
                self.offset = 0;
                self.needs_resync = false;
                ChunkOutcome::Progress {
                    bytes_sent: 0,
                    total_bytes: self.total_bytes,
                }
            }
            None => ChunkOutcome::FatalFailure {
                status: None,
                reason: format!(
                    "{}: session initiation returned no Location header",
                    UNEXPECTED_TERMINAL_RESPONSE
                ),
            },
        }
    }

    async fn upload_chunk(&mut self, uri: &str) -> ChunkOutcome {
        let remaining = self.total_bytes.saturating_sub(self.offset);
        let len = self.chunk_size.map_or(remaining, |size| size.min(remaining));
        let range = content_range(self.offset, len, self.total_bytes);

        let body = match open_chunk(&self.file, self.offset, len).await {
            Ok(body) => body,
            Err(e) => return ChunkOutcome::from_transport_error(e),
        };

        let log = HttpRequestLog {
            request_id: new_request_id(),
            method: "PUT",
            url: uri.to_string(),
            headers: vec![
                ("Authorization".to_string(), self.bearer()),
                ("Content-Range".to_string(), range.clone()),
            ],
            body: Some(format!("<{} bytes of {}>", len, self.content_type)),
        };

        debug!("Sending {}", range);
        let start = Instant::now();
        let result = self
            .client
            .put(uri)
            .header(AUTHORIZATION, self.bearer())
            .header(CONTENT_TYPE, self.content_type)
            .header(CONTENT_LENGTH, len)
            .header(CONTENT_RANGE, range)
            .body(body)
            .send()
            .await;

        self.handle_upload_response(result, &log, start).await
    }

    /// Ask how many bytes the service holds after an interrupted step
    async fn query_status(&mut self, uri: &str) -> ChunkOutcome {
        let range = format!("bytes */{}", self.total_bytes);
        let log = HttpRequestLog {
            request_id: new_request_id(),
            method: "PUT",
            url: uri.to_string(),
            headers: vec![
                ("Authorization".to_string(), self.bearer()),
                ("Content-Range".to_string(), range.clone()),
            ],
            body: None,
        };

        info!("Querying upload status before resuming");
        let start = Instant::now();
        let result = self
            .client
            .put(uri)
            .timeout(self.control_timeout)
            .header(AUTHORIZATION, self.bearer())
            .header(CONTENT_LENGTH, 0)
            .header(CONTENT_RANGE, range)
            .send()
            .await;

        self.handle_upload_response(result, &log, start).await
    }

    async fn handle_upload_response(
        &mut self,
        result: reqwest::Result<Response>,
        log: &HttpRequestLog,
        start: Instant,
    ) -> ChunkOutcome {
        let response = match result {
            Ok(response) => response,
            Err(e) => return transport_failure(log, start, e),
        };

        let status = response.status().as_u16();
        let range = header_value(&response, RANGE.as_str());
        let text = match read_body(response, log, start).await {
            Ok(text) => text,
            Err(outcome) => return outcome,
        };

        if status == RESUME_INCOMPLETE {
            self.offset = next_offset_from_range(range.as_deref());
            self.needs_resync = false;
            debug!("Service holds {}/{} bytes", self.offset, self.total_bytes);
            return ChunkOutcome::Progress {
                bytes_sent: self.offset,
                total_bytes: self.total_bytes,
            };
        }

        if (200..300).contains(&status) {
            self.needs_resync = false;
            self.offset = self.total_bytes;
            let video_id = serde_json::from_str::<InsertResponse>(&text)
                .ok()
                .and_then(|r| r.id);
            return ChunkOutcome::complete(video_id, &text);
        }

        ChunkOutcome::from_error_status(status, &text)
    }
}

impl UploadSession for ResumableSession {
    async fn send_next_chunk(&mut self) -> ChunkOutcome {
        let outcome = match self.session_uri.clone() {
            None => self.initiate().await,
            Some(uri) if self.needs_resync => self.query_status(&uri).await,
            Some(uri) => self.upload_chunk(&uri).await,
        };

        if matches!(outcome, ChunkOutcome::RetriableFailure(_)) && self.session_uri.is_some() {
            self.needs_resync = true;
        }
        outcome
    }
}

async fn open_chunk(path: &Path, offset: u64, len: u64) -> std::io::Result<Body> {
    let mut file = tokio::fs::File::open(path).await?;
    file.seek(SeekFrom::Start(offset)).await?;
    Ok(Body::wrap_stream(ReaderStream::new(file.take(len))))
}

fn header_value(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn transport_failure(log: &HttpRequestLog, start: Instant, err: reqwest::Error) -> ChunkOutcome {
    let message = err.to_string();
    log_exchange(log, None, elapsed_ms(start), Some(&message));
    ChunkOutcome::from_transport_error(message)
}

/// Read the body and log the exchange; a failed read counts as a transport error
async fn read_body(
    response: Response,
    log: &HttpRequestLog,
    start: Instant,
) -> std::result::Result<String, ChunkOutcome> {
    let status = response.status().as_u16();
    let headers = if is_enabled() {
        extract_response_headers(&response)
    } else {
        Vec::new()
    };

    match response.text().await {
        Ok(text) => {
            let entry = HttpResponseLog {
                status,
                headers,
                body: Some(text.clone()),
            };
            log_exchange(log, Some(&entry), elapsed_ms(start), None);
            Ok(text)
        }
        Err(e) => Err(transport_failure(log, start, e)),
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
