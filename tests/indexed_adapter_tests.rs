//! Tests for the indexed keyspace strategy
//!
//! These tests verify:
//! - Index Record layout and lifecycle
//! - Phantom members left by a failed record write
//! - Partial bulk deletes
//! - Decode failures and structural filtering
//! - Lazy entry cursors

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use spacekv::{
    BincodeCodec, IndexedAdapter, KeyspaceAdapter, KvEngine, MemoryEngine, SpaceKvError,
    StructuralCriteria,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    name: String,
    age: u32,
}

fn user(name: &str, age: u32) -> User {
    User {
        name: name.to_string(),
        age,
    }
}

fn seeded() -> IndexedAdapter<MemoryEngine> {
    let store = IndexedAdapter::new(MemoryEngine::new());
    store.put("1", user("Alice", 30), "users").unwrap();
    store.put("2", user("Bob", 25), "users").unwrap();
    store.put("3", user("Carol", 41), "users").unwrap();
    store
}

fn ids(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// =============================================================================
// Index Record
// =============================================================================

#[test]
fn test_index_record_lives_under_keyspace_name() {
    let store = seeded();

    let raw = store.engine().get(b"users").unwrap().unwrap();
    assert_eq!(raw, br#"["1","2","3"]"#);
    assert_eq!(store.members("users").unwrap(), ids(&["1", "2", "3"]));

    let record = store.engine().get(b"users:2").unwrap().unwrap();
    assert_eq!(record, br#"{"name":"Bob","age":25}"#);
}

#[test]
fn test_index_record_removed_with_last_member() {
    let store = seeded();
    for id in ["1", "2", "3"] {
        store.delete::<User>(id, "users").unwrap();
    }

    assert_eq!(store.engine().get(b"users").unwrap(), None);
    assert!(store.engine().is_empty());
}

#[test]
fn test_delete_all_of_removes_index_record() {
    let store = seeded();
    store.put("1", user("Other", 1), "other").unwrap();
    store.delete_all_of("users").unwrap();

    assert_eq!(store.engine().get(b"users").unwrap(), None);
    // "other" index + record
    assert_eq!(store.engine().len(), 2);
}

// =============================================================================
// Phantom Members
// =============================================================================

#[test]
fn test_failed_record_write_leaves_phantom() {
    let store = IndexedAdapter::new(MemoryEngine::new());
    // Index write succeeds, record write fails
    store.engine().fail_writes_after(1);

    let err = store.put("9", user("Ghost", 0), "users").unwrap_err();
    assert!(matches!(err, SpaceKvError::Io(_)));
    store.engine().clear_faults();

    assert!(store.contains("9", "users").unwrap());
    assert_eq!(store.count("users").unwrap(), 1);
    assert_eq!(store.get::<User>("9", "users").unwrap(), None);
    assert!(store.get_all_of::<User>("users").unwrap().is_empty());

    // Deleting the phantom clears the stale id
    assert_eq!(store.delete::<User>("9", "users").unwrap(), None);
    assert!(!store.contains("9", "users").unwrap());
    assert_eq!(store.count("users").unwrap(), 0);
}

#[test]
fn test_phantoms_skipped_by_entries_and_find() {
    let store = seeded();
    store.engine().fail_writes_after(1);
    assert!(store.put("4", user("Ghost", 99), "users").is_err());
    store.engine().clear_faults();

    let entries: Vec<_> = store
        .entries::<User>("users")
        .unwrap()
        .collect::<spacekv::Result<_>>()
        .unwrap();
    assert_eq!(entries.len(), 3);

    let all = StructuralCriteria::new();
    assert_eq!(store.find::<User>(&all, "users").unwrap().len(), 3);
    assert_eq!(store.count_matching::<User>(&all, "users").unwrap(), 3);
}

#[test]
fn test_partial_delete_all_of_leaves_stale_index() {
    let store = seeded();
    store.engine().fail_deletes_after(1);

    assert!(store.delete_all_of("users").is_err());
    store.engine().clear_faults();

    // Record "1" is gone, the index still lists every id
    assert_eq!(store.count("users").unwrap(), 3);
    assert_eq!(store.get::<User>("1", "users").unwrap(), None);
    assert_eq!(store.get::<User>("2", "users").unwrap(), Some(user("Bob", 25)));
    assert_eq!(
        store.get_all_of::<User>("users").unwrap(),
        vec![user("Bob", 25), user("Carol", 41)]
    );

    // A retry finishes the job
    store.delete_all_of("users").unwrap();
    assert_eq!(store.count("users").unwrap(), 0);
    assert!(store.engine().is_empty());
}

// =============================================================================
// Decoding
// =============================================================================

#[test]
fn test_get_propagates_decode_error() {
    let store = seeded();
    store.engine().raw_put(b"users:2", b"not json");

    let err = store.get::<User>("2", "users").unwrap_err();
    assert!(err.is_decode());
    assert!(store.get_all_of::<User>("users").unwrap_err().is_decode());
}

#[test]
fn test_find_skips_undecodable_records() {
    let store = seeded();
    store.engine().raw_put(b"users:2", b"{broken");

    let all = StructuralCriteria::new();
    let found = store.find::<User>(&all, "users").unwrap();
    assert_eq!(found, vec![user("Alice", 30), user("Carol", 41)]);
}

#[test]
fn test_get_as_wrong_type_is_decode_error() {
    let store = seeded();
    assert!(store.get::<u64>("1", "users").unwrap_err().is_decode());
}

#[test]
fn test_bincode_codec_store() {
    let store = IndexedAdapter::with_codec(MemoryEngine::new(), BincodeCodec);
    store.put("1", user("Alice", 30), "users").unwrap();
    store.put("2", user("Bob", 25), "users").unwrap();

    assert_eq!(store.get::<User>("1", "users").unwrap(), Some(user("Alice", 30)));
    assert_eq!(store.count("users").unwrap(), 2);
    assert!(serde_json::from_slice::<User>(&store.engine().get(b"users:1").unwrap().unwrap()).is_err());
}

// =============================================================================
// Structural Filtering
// =============================================================================

#[test]
fn test_find_by_value() {
    let store = seeded();
    let criteria = StructuralCriteria::new().value(|u: &User| u.age >= 30);

    let found = store.find(&criteria, "users").unwrap();
    assert_eq!(found, vec![user("Alice", 30), user("Carol", 41)]);
    assert_eq!(store.count_matching(&criteria, "users").unwrap(), 2);
}

#[test]
fn test_find_by_id_and_keyspace() {
    let store = seeded();
    store.put("2", user("Bob-other", 1), "other").unwrap();

    let by_id = StructuralCriteria::<User>::new().id(|id| id == "2");
    assert_eq!(store.find(&by_id, "users").unwrap(), vec![user("Bob", 25)]);

    let wrong_space = StructuralCriteria::<User>::new().keyspace(|ks| ks == "other");
    assert!(store.find(&wrong_space, "users").unwrap().is_empty());
    assert_eq!(store.count_matching(&wrong_space, "other").unwrap(), 1);
}

#[test]
fn test_find_on_missing_keyspace_is_empty() {
    let store = seeded();
    let all = StructuralCriteria::<User>::new();
    assert!(store.find(&all, "nobody").unwrap().is_empty());
}

// =============================================================================
// Entry Cursor
// =============================================================================

#[test]
fn test_entries_yield_keys_and_ids_in_order() {
    let store = seeded();
    let entries: Vec<_> = store
        .entries::<User>("users")
        .unwrap()
        .map(|e| e.unwrap())
        .collect();

    let keys: Vec<_> = entries.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["users:1", "users:2", "users:3"]);
    assert_eq!(entries[1].id, "2");
    assert_eq!(entries[1].value, user("Bob", 25));
}

#[test]
fn test_entries_snapshot_ignores_later_members() {
    let store = seeded();
    let mut cursor = store.entries::<User>("users").unwrap();
    assert_eq!(cursor.remaining(), 3);

    store.put("4", user("Dave", 50), "users").unwrap();
    let first = cursor.next().unwrap().unwrap();
    assert_eq!(first.id, "1");

    assert_eq!(cursor.count(), 2);
}

#[test]
fn test_entries_close_stops_iteration() {
    let store = seeded();
    let mut cursor = store.entries::<User>("users").unwrap();
    cursor.next().unwrap().unwrap();
    cursor.close();

    assert_eq!(cursor.remaining(), 0);
    assert!(cursor.next().is_none());
}

#[test]
fn test_entries_stop_after_decode_error() {
    let store = seeded();
    store.engine().raw_put(b"users:1", b"garbage");

    let mut cursor = store.entries::<User>("users").unwrap();
    assert!(cursor.next().unwrap().unwrap_err().is_decode());
    assert!(cursor.next().is_none());
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_clear_closes_engine() {
    let store = seeded();
    store.clear().unwrap();

    assert!(store.engine().is_closed());
    assert!(store.contains("1", "users").unwrap_err().is_closed());
}
