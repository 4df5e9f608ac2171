use std::fs;
use std::sync::Arc;

use recall_engine::{CredentialStore, FileCredentialStore};
use tempfile::TempDir;

const NOW: i64 = 1_700_000_000_000;

fn store(dir: &TempDir, body: Option<&str>) -> FileCredentialStore {
    let path = dir.path().join("auth.json");
    if let Some(body) = body {
        fs::write(&path, body).unwrap();
    }
    FileCredentialStore::with_clock(path, Arc::new(|| NOW))
}

#[test]
fn unexpired_token_is_valid() {
    let dir = TempDir::new().unwrap();
    let body = format!(r#"{{"idToken":"abc","expiresAt":{}}}"#, NOW + 60_000);
    let credential = store(&dir, Some(&body)).current();
    assert!(credential.is_valid);
    assert_eq!(credential.token, "abc");
}

#[test]
fn expired_token_is_invalid() {
    let dir = TempDir::new().unwrap();
    let body = format!(r#"{{"idToken":"abc","expiresAt":{}}}"#, NOW);
    assert!(!store(&dir, Some(&body)).current().is_valid);
}

#[test]
fn missing_or_unreadable_file_means_signed_out() {
    let dir = TempDir::new().unwrap();
    assert!(!store(&dir, None).current().is_valid);
    assert!(!store(&dir, Some("{not json")).current().is_valid);
    assert!(!store(&dir, Some(r#"{"idToken":"","expiresAt":99999999999999}"#))
        .current()
        .is_valid);
}

#[test]
fn file_is_reread_on_every_call() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir, None);
    assert!(!store.current().is_valid);

    let body = format!(r#"{{"idToken":"fresh","expiresAt":{}}}"#, NOW + 1);
    fs::write(dir.path().join("auth.json"), body).unwrap();
    assert_eq!(store.current().token, "fresh");
}
