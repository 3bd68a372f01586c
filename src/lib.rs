//! # spacekv
//!
//! Keyspace-partitioned object store on top of a flat, ordered, byte-keyed
//! LSM engine. Callers put, get, enumerate, query and delete typed records
//! inside named keyspaces; the engine underneath only knows point
//! get/put/delete and an ordered forward cursor.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Keyspace Adapter                          │
//! │          IndexedAdapter  |  ScanAdapter                      │
//! └───────┬──────────────────────┬──────────────────────────────┘
//!         │                      │
//!   ┌─────▼──────┐   ┌───────────▼──────┐   ┌─────────────────┐
//!   │  Keyspace  │   │   Key Encoding   │   │     Codec       │
//!   │   Index    │   │  keyspace:id     │   │  JSON / bincode │
//!   └─────┬──────┘   └───────────┬──────┘   └─────────────────┘
//!         │                      │
//! ┌───────▼──────────────────────▼──────────────────────────────┐
//! │              Engine Facade (KvEngine + EngineCursor)         │
//! └───────┬──────────────────────────────────┬──────────────────┘
//!         │                                  │
//!  ┌──────▼──────┐                    ┌──────▼──────┐
//!  │   Engine    │ WAL → MemTable →   │MemoryEngine │
//!  │   (LSM)     │ SSTables           │ (tests)     │
//!  └─────────────┘                    └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use spacekv::{IndexedAdapter, KeyspaceAdapter, MemoryEngine};
//!
//! let store = IndexedAdapter::new(MemoryEngine::new());
//! store.put("1", "Alice".to_string(), "users").unwrap();
//! store.put("2", "Bob".to_string(), "users").unwrap();
//!
//! assert_eq!(store.count("users").unwrap(), 2);
//! assert_eq!(store.get::<String>("1", "users").unwrap().as_deref(), Some("Alice"));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod wal;
pub mod memtable;
pub mod storage;
pub mod engine;
pub mod facade;
pub mod memory;

pub mod codec;
pub mod keys;
pub mod index;
pub mod criteria;
pub mod adapter;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{SpaceKvError, Result};
pub use config::{Config, Strategy, WalSyncStrategy};
pub use engine::Engine;
pub use facade::{EngineCursor, KvEngine};
pub use memory::MemoryEngine;
pub use codec::{BincodeCodec, Codec, JsonCodec};
pub use criteria::{StructuralCriteria, TextualCriteria};
pub use adapter::{
    open_indexed, open_scan, Entry, IndexedAdapter, IndexedEntries, KeyspaceAdapter, ScanAdapter,
    ScanCursor,
};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of spacekv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
