// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for identity
//! Extracted from identity.rs

use std::fs;

use chatsync_core::identity::*;
use tempfile::tempdir;

#[test]
fn test_static_identity() {
    assert_eq!(
        StaticIdentity::new("alice").local_user_id(),
        Some("alice".to_string())
    );
    assert_eq!(StaticIdentity::anonymous().local_user_id(), None);
}

#[test]
fn test_missing_file_means_no_user() {
    let dir = tempdir().unwrap();
    let store = FileIdentityStore::new(dir.path().join("identity.json"));

    assert_eq!(store.load().unwrap(), None);
    assert_eq!(store.local_user_id(), None);
}

#[test]
fn test_save_and_load() {
    let dir = tempdir().unwrap();
    let store = FileIdentityStore::new(dir.path().join("nested").join("identity.json"));

    store.save("  alice ").unwrap();

    assert_eq!(store.load().unwrap(), Some("alice".to_string()));
    assert_eq!(store.local_user_id(), Some("alice".to_string()));
}

#[test]
fn test_file_format() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("identity.json");
    let store = FileIdentityStore::new(&path);

    store.save("alice").unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value, serde_json::json!({ "userId": "alice" }));
}

#[test]
fn test_save_rejects_blank_user() {
    let dir = tempdir().unwrap();
    let store = FileIdentityStore::new(dir.path().join("identity.json"));

    assert!(matches!(store.save("   "), Err(IdentityError::Empty)));
}

#[test]
fn test_clear() {
    let dir = tempdir().unwrap();
    let store = FileIdentityStore::new(dir.path().join("identity.json"));
    store.save("alice").unwrap();

    store.clear().unwrap();
    store.clear().unwrap();

    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn test_corrupt_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("identity.json");
    fs::write(&path, "not json").unwrap();
    let store = FileIdentityStore::new(&path);

    assert!(matches!(store.load(), Err(IdentityError::Serialization(_))));
    assert_eq!(store.local_user_id(), None);
}

#[test]
fn test_empty_user_id_in_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("identity.json");
    fs::write(&path, r#"{"userId":""}"#).unwrap();

    assert_eq!(FileIdentityStore::new(&path).load().unwrap(), None);
}
