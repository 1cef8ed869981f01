//! Tests for credential loading

use std::path::PathBuf;

use tempfile::TempDir;
use yt_upload::auth::{resolve_provider, CredentialProvider, EnvCredentials, FileCredentials};
use yt_upload::{Credentials, UploadError};

fn write_credentials(dir: &TempDir, json: serde_json::Value) -> PathBuf {
    let path = dir.path().join("yt-upload-oauth2.json");
    std::fs::write(&path, serde_json::to_string_pretty(&json).unwrap()).unwrap();
    path
}

fn assert_credentials_error<T: std::fmt::Debug>(result: Result<T, UploadError>, needle: &str) {
    match result {
        Err(err @ UploadError::Credentials(_)) => {
            assert!(err.is_setup_error());
            assert!(
                err.to_string().contains(needle),
                "'{}' does not mention '{}'",
                err,
                needle
            );
        }
        other => panic!("expected credentials error, got {:?}", other),
    }
}

#[test]
fn test_credentials_reject_empty_token() {
    assert_credentials_error(Credentials::new("   "), "empty");
}

#[test]
fn test_credentials_debug_masks_token() {
    let creds = Credentials::new("ya29.a0AfH6SMBx-long-access-token").unwrap();
    let debug = format!("{:?}", creds);
    assert!(!debug.contains("long-access"));
    assert!(debug.contains("ya29"));
}

#[test]
fn test_env_credentials_read_variable() {
    let var = "YT_UPLOAD_TEST_TOKEN_PRESENT";
    std::env::set_var(var, " env-token ");

    let provider = EnvCredentials::with_var(var);

    assert!(provider.is_set());
    assert_eq!(provider.credentials().unwrap().access_token(), "env-token");
    std::env::remove_var(var);
}

#[test]
fn test_env_credentials_missing_variable() {
    let provider = EnvCredentials::with_var("YT_UPLOAD_TEST_TOKEN_ABSENT");
    assert!(!provider.is_set());
    assert_credentials_error(provider.credentials(), "YT_UPLOAD_TEST_TOKEN_ABSENT");
}

#[test]
fn test_file_credentials_valid() {
    let dir = TempDir::new().unwrap();
    let path = write_credentials(
        &dir,
        serde_json::json!({
            "access_token": "file-token",
            "token_expiry": "2999-01-01T00:00:00Z",
            "invalid": false
        }),
    );

    let creds = FileCredentials::new(&path).credentials().unwrap();
    assert_eq!(creds.access_token(), "file-token");
}

#[test]
fn test_file_credentials_without_expiry() {
    let dir = TempDir::new().unwrap();
    let path = write_credentials(&dir, serde_json::json!({ "access_token": "file-token" }));

    assert!(FileCredentials::new(&path).credentials().is_ok());
}

#[test]
fn test_file_credentials_expired() {
    let dir = TempDir::new().unwrap();
    let path = write_credentials(
        &dir,
        serde_json::json!({
            "access_token": "file-token",
            "token_expiry": "2001-01-01T00:00:00Z"
        }),
    );

    assert_credentials_error(FileCredentials::new(&path).credentials(), "expired");
}

#[test]
fn test_file_credentials_marked_invalid() {
    let dir = TempDir::new().unwrap();
    let path = write_credentials(
        &dir,
        serde_json::json!({ "access_token": "file-token", "invalid": true }),
    );

    assert_credentials_error(FileCredentials::new(&path).credentials(), "invalid");
}

#[test]
fn test_file_credentials_missing_token() {
    let dir = TempDir::new().unwrap();
    let path = write_credentials(&dir, serde_json::json!({ "refresh_token": "r" }));

    assert_credentials_error(FileCredentials::new(&path).credentials(), "access_token");
}

#[test]
fn test_file_credentials_malformed_and_missing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert_credentials_error(FileCredentials::new(&path).credentials(), "malformed");
    assert_credentials_error(
        FileCredentials::new(dir.path().join("absent.json")).credentials(),
        "cannot read",
    );
}

#[test]
fn test_resolve_provider_prefers_explicit_file() {
    let dir = TempDir::new().unwrap();
    let path = write_credentials(&dir, serde_json::json!({ "access_token": "explicit" }));

    let provider = resolve_provider(Some(path));

    assert_eq!(provider.credentials().unwrap().access_token(), "explicit");
}
