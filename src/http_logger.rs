//! HTTP Exchange Logger
//!
//! Appends every upload request and its response to `.yt-upload/http_requests.log`
//! when enabled via environment variable.
//! Set `YT_UPLOAD_HTTP_LOG=1` or `YT_UPLOAD_HTTP_LOG=true` to enable.
//! Chunk payloads are never written, only their byte ranges.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use chrono::Local;
use tracing::warn;
use uuid::Uuid;

/// Environment variable to control HTTP logging
const ENV_HTTP_LOG: &str = "YT_UPLOAD_HTTP_LOG";

/// Directory the log lives in, relative to the working directory
const LOG_DIR: &str = ".yt-upload";

/// Log file name
const LOG_FILE_NAME: &str = "http_requests.log";

/// Maximum body size to log (10KB)
const MAX_BODY_SIZE: usize = 10000;

/// Sensitive headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "set-cookie",
    "cookie",
    "x-goog-api-key",
    "proxy-authorization",
];

/// Query parameter that identifies (and authorizes) a resumable session
const UPLOAD_ID_PARAM: &str = "upload_id=";

static LOG_MUTEX: Mutex<()> = Mutex::new(());

/// Check if HTTP logging is enabled
pub fn is_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| {
        std::env::var(ENV_HTTP_LOG)
            .map(|v| {
                let v = v.trim().to_lowercase();
                v == "1" || v == "true" || v == "yes" || v == "on"
            })
            .unwrap_or(false)
    })
}

/// Fresh id to correlate a request with its log entry
pub fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Outgoing request summary
pub struct HttpRequestLog {
    pub request_id: String,
    pub method: &'static str,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// JSON metadata, or a description of the chunk sent
    pub body: Option<String>,
}

/// Response summary
pub struct HttpResponseLog {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// Append one exchange to the log file; a no-op when logging is disabled
pub fn log_exchange(
    request: &HttpRequestLog,
    response: Option<&HttpResponseLog>,
    duration_ms: u64,
    error: Option<&str>,
) {
    if !is_enabled() {
        return;
    }

    let entry = format_exchange(request, response, duration_ms, error);
    if let Err(e) = write_log(&log_file_path(), &entry) {
        warn!("Failed to write HTTP log: {}", e);
    }
}

/// Render one exchange as a log entry
pub fn format_exchange(
    request: &HttpRequestLog,
    response: Option<&HttpResponseLog>,
    duration_ms: u64,
    error: Option<&str>,
) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    let separator = "=".repeat(80);

    let mut out = format!(
        "\n{}\n[{}] {} {} (request {})\n{}\n",
        separator,
        timestamp,
        request.method,
        mask_upload_id(&request.url),
        request.request_id,
        separator
    );

    out.push_str("\n--- Request Headers ---\n");
    push_headers(&mut out, &request.headers);

    if let Some(body) = &request.body {
        out.push_str("\n--- Request Body ---\n");
        out.push_str(&format_body(body));
        out.push('\n');
    }

    if let Some(resp) = response {
        out.push_str(&format!("\n--- Response ({}ms) ---\n", duration_ms));
        out.push_str(&format!("Status: {}\n", resp.status));
        out.push_str("\n--- Response Headers ---\n");
        push_headers(&mut out, &resp.headers);
        if let Some(body) = &resp.body {
            out.push_str("\n--- Response Body ---\n");
            out.push_str(&format_body(body));
            out.push('\n');
        }
    }

    if let Some(err) = error {
        out.push_str(&format!("\n--- Error ({}ms) ---\n{}\n", duration_ms, err));
    }

    out.push_str(&format!("\n{}\n", separator));
    out
}

fn push_headers(out: &mut String, headers: &[(String, String)]) {
    for (name, value) in headers {
        let value = if name.eq_ignore_ascii_case("location") {
            mask_upload_id(value)
        } else {
            mask_sensitive_header(name, value)
        };
        out.push_str(&format!("{}: {}\n", name, value));
    }
}

fn log_file_path() -> PathBuf {
    let dir = PathBuf::from(LOG_DIR);
    if !dir.exists() {
        if let Err(e) = fs::create_dir_all(&dir) {
            warn!("Failed to create {} directory: {}", LOG_DIR, e);
        }
    }
    dir.join(LOG_FILE_NAME)
}

fn write_log(path: &Path, content: &str) -> std::io::Result<()> {
    let _guard = LOG_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(content.as_bytes())
}

/// Check if a header is sensitive and should be masked
pub fn is_sensitive_header(name: &str) -> bool {
    let name_lower = name.to_lowercase();
    SENSITIVE_HEADERS.iter().any(|h| name_lower == *h)
}

fn mask_sensitive_header(name: &str, value: &str) -> String {
    if is_sensitive_header(name) {
        mask_token(value)
    } else {
        value.to_string()
    }
}

/// Mask a token, keeping four characters at each end when it is long enough
pub fn mask_token(value: &str) -> String {
    let (prefix, token) = match value.strip_prefix("Bearer ") {
        Some(token) => ("Bearer ", token),
        None => ("", value),
    };

    let chars: Vec<char> = token.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}...{}", prefix, head, tail)
    } else {
        format!("{}****", prefix)
    }
}

/// Hide the session id in a resumable session URI
pub fn mask_upload_id(url: &str) -> String {
    let Some(start) = url.find(UPLOAD_ID_PARAM) else {
        return url.to_string();
    };
    let value_start = start + UPLOAD_ID_PARAM.len();
    let value_end = url[value_start..]
        .find('&')
        .map(|i| value_start + i)
        .unwrap_or(url.len());

    format!(
        "{}{}{}",
        &url[..value_start],
        mask_token(&url[value_start..value_end]),
        &url[value_end..]
    )
}

fn format_body(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        let pretty = serde_json::to_string_pretty(&json).unwrap_or_else(|_| body.to_string());
        truncate_utf8_safe(&pretty, MAX_BODY_SIZE)
    } else {
        truncate_utf8_safe(body, MAX_BODY_SIZE)
    }
}

/// Truncate string at UTF-8 character boundary (safe for multi-byte chars)
pub fn truncate_utf8_safe(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }

    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}...\n[truncated, total {} bytes]", &s[..end], s.len())
}

/// Collect headers from a reqwest response for logging
pub fn extract_response_headers(response: &reqwest::Response) -> Vec<(String, String)> {
    response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                value.to_str().unwrap_or("<binary>").to_string(),
            )
        })
        .collect()
}
