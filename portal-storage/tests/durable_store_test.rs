//! Durable store behaviour across backends

use portal_core::{StorageBackendKind, StorageConfig};
use portal_storage::{DurableStore, FileBackend, KeyValueBackend, MemoryBackend, PersistedValue};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Preferences {
    theme: String,
    page_size: u32,
    pinned_merchants: Vec<String>,
}

fn sample_preferences() -> Preferences {
    Preferences {
        theme: "dark".to_string(),
        page_size: 50,
        pinned_merchants: vec!["m_001".to_string(), "m_042".to_string()],
    }
}

fn file_store(dir: &TempDir) -> DurableStore {
    let backend = FileBackend::new(dir.path()).unwrap();
    DurableStore::new(Arc::new(backend), "portal:")
}

#[test]
fn test_roundtrip_on_both_backends() {
    let temp_dir = TempDir::new().unwrap();
    let stores = [DurableStore::in_memory(), file_store(&temp_dir)];

    for store in stores {
        store.set("preferences", &sample_preferences());
        store.set("feature_flags", &json!({"new_dashboard": true, "beta": null}));
        store.set("token", "mock-jwt-token-1700000000000");

        assert_eq!(
            store.get("preferences", Preferences {
                theme: "light".to_string(),
                page_size: 10,
                pinned_merchants: vec![],
            }),
            sample_preferences()
        );
        assert_eq!(
            store.get("feature_flags", json!({})),
            json!({"new_dashboard": true, "beta": null})
        );
        assert_eq!(
            store.get::<Option<String>>("token", None).as_deref(),
            Some("mock-jwt-token-1700000000000")
        );
    }
}

#[test]
fn test_file_store_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();

    {
        let store = file_store(&temp_dir);
        store.set("preferences", &sample_preferences());
    }

    let reopened = file_store(&temp_dir);
    let loaded: Option<Preferences> = assert_ok!(reopened.try_get("preferences"));
    assert_eq!(loaded, Some(sample_preferences()));
    assert_eq!(reopened.keys().unwrap(), vec!["preferences"]);
}

#[test]
fn test_corrupt_file_falls_back() {
    let temp_dir = TempDir::new().unwrap();
    let store = file_store(&temp_dir);
    store.set("page_size", &25u32);

    // Damage the entry behind the store's back
    let backend = FileBackend::new(temp_dir.path()).unwrap();
    backend.set_item("portal:page_size", "25,,").unwrap();

    assert_eq!(store.get("page_size", 10u32), 10);
    assert_err!(store.try_get::<u32>("page_size"));
}

#[test]
fn test_remove_then_get_returns_fallback() {
    let temp_dir = TempDir::new().unwrap();
    let store = file_store(&temp_dir);

    store.set("last_route", "/merchants");
    store.remove("last_route");
    store.remove("last_route");

    assert_eq!(store.get("last_route", "/".to_string()), "/");
    assert!(!store.contains("last_route"));
}

#[test]
fn test_quota_exceeded_keeps_previous_value() {
    let store = DurableStore::new(Arc::new(MemoryBackend::with_quota(Some(40))), "");

    store.set("draft", "short");
    store.set("draft", &"y".repeat(100));

    assert_eq!(store.get("draft", String::new()), "short");
}

#[test]
fn test_from_config_selects_backend() {
    let temp_dir = TempDir::new().unwrap();
    let config = StorageConfig {
        backend: StorageBackendKind::File,
        data_dir: temp_dir.path().join("data").to_string_lossy().into_owned(),
        key_prefix: "wallet:".to_string(),
        quota_bytes: None,
    };

    let store = assert_ok!(DurableStore::from_config(&config));
    assert_eq!(store.prefix(), "wallet:");
    store.set("currency", "EUR");

    let raw = FileBackend::new(temp_dir.path().join("data")).unwrap();
    assert_eq!(raw.keys().unwrap(), vec!["wallet:currency"]);
}

#[test]
fn test_persisted_value_over_file_backend() {
    let temp_dir = TempDir::new().unwrap();

    {
        let mut page = PersistedValue::load(file_store(&temp_dir), "tickets_page", 1u32);
        page.update(|p| *p += 2);
    }

    let page = PersistedValue::load(file_store(&temp_dir), "tickets_page", 1u32);
    assert_eq!(*page.get(), 3);
}
