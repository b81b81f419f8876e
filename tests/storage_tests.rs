//! 文件存储后端集成测试
//!
//! 验证状态在进程重启（重新打开同一文件）后保持，以及失败
//! 事件队列的有界 FIFO 行为。

use std::collections::HashMap;

use tempfile::TempDir;

use linktracker::models::{Event, InstallData};
use linktracker::storage::{FileStore, PersistenceStore, MAX_FAILED_EVENTS};

fn make_event(event_type: &str) -> Event {
    Event {
        event_type: event_type.to_string(),
        project_id: "proj".to_string(),
        project_token: "token".to_string(),
        short_link: None,
        deep_link: None,
        timestamp: 0,
        device_id: "dev".to_string(),
        session_id: "sess".to_string(),
        extra: HashMap::new(),
        user_agent: None,
        ip_address: None,
    }
}

#[test]
fn test_device_id_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tracking_store.json");

    let first_id = {
        let store = FileStore::new(&path).unwrap();
        store.device_id()
    };
    assert!(!first_id.is_empty());

    // 重新打开同一文件，设备 ID 不变
    let store = FileStore::new(&path).unwrap();
    assert_eq!(store.device_id(), first_id);
}

#[test]
fn test_first_install_flag_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tracking_store.json");

    {
        let store = FileStore::new(&path).unwrap();
        assert!(store.is_first_install());
        store.set_first_install_complete();
    }

    let store = FileStore::new(&path).unwrap();
    assert!(!store.is_first_install());

    store.reset_first_install();
    assert!(store.is_first_install());

    // 重置也会持久化
    let store = FileStore::new(&path).unwrap();
    assert!(store.is_first_install());
}

#[test]
fn test_install_referrer_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tracking_store.json");

    {
        let store = FileStore::new(&path).unwrap();
        store.store_install_referrer("utm_source=tryinhouse.com/abc");
    }

    let store = FileStore::new(&path).unwrap();
    assert_eq!(
        store.install_referrer(),
        Some("utm_source=tryinhouse.com/abc".to_string())
    );
}

#[test]
fn test_install_data_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tracking_store.json");

    {
        let store = FileStore::new(&path).unwrap();
        let mut pairs = HashMap::new();
        pairs.insert("campaign".to_string(), "summer".to_string());
        store.store_install_data(&InstallData::new("https://tryinhouse.com/x", pairs));
    }

    let store = FileStore::new(&path).unwrap();
    let data = store.install_data().unwrap();
    assert_eq!(data.short_link, "https://tryinhouse.com/x");
    assert_eq!(data.key_value_pairs["campaign"], "summer");
}

#[test]
fn test_failed_event_queue_fifo_cap() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tracking_store.json");
    let store = FileStore::new(&path).unwrap();

    for i in 0..(MAX_FAILED_EVENTS + 1) {
        store.store_failed_event(&make_event(&format!("event_{}", i)));
    }

    let events = store.failed_events();
    assert_eq!(events.len(), MAX_FAILED_EVENTS);
    // 最旧的 event_0 被淘汰，剩余 100 条保持相对顺序
    assert_eq!(events[0].event_type, "event_1");
    assert_eq!(
        events[MAX_FAILED_EVENTS - 1].event_type,
        format!("event_{}", MAX_FAILED_EVENTS)
    );

    // 上限在重新打开后依然成立
    let store = FileStore::new(&path).unwrap();
    assert_eq!(store.failed_events().len(), MAX_FAILED_EVENTS);

    store.clear_failed_events();
    assert!(store.failed_events().is_empty());
}

#[test]
fn test_corrupt_state_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tracking_store.json");
    std::fs::write(&path, "not json at all").unwrap();

    assert!(FileStore::new(&path).is_err());
}
