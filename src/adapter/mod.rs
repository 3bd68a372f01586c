//! Keyspace Adapters
//!
//! Collections on top of a flat engine. Two interchangeable backends, picked
//! when the store is built and never mixed over the same data:
//!
//! - [`IndexedAdapter`]: keeps an Index Record per keyspace, so membership,
//!   enumeration and counts touch only that keyspace.
//! - [`ScanAdapter`]: no bookkeeping; keyspace-level operations walk the
//!   engine in key order and keep keys starting with `keyspace + ':'`.
//!
//! Both implement [`KeyspaceAdapter`]. Filtering is strategy specific:
//! `IndexedAdapter::find` takes [`StructuralCriteria`](crate::StructuralCriteria),
//! `ScanAdapter::find` takes [`TextualCriteria`](crate::TextualCriteria).
//!
//! ## Consistency
//!
//! Single-record operations are as atomic as the engine's point writes.
//! Bulk operations (`delete_all_of`, `get_all_of`, `find`, `count`) are
//! best-effort: a failure part-way leaves whatever was already done in place,
//! with no rollback. The indexed strategy's index update is a read-modify-write
//! that needs external serialization when several writers touch one keyspace.

mod cursor;
mod indexed;
mod scan;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::Config;
use crate::engine::Engine;
use crate::error::Result;

pub use cursor::{IndexedEntries, ScanCursor};
pub use indexed::IndexedAdapter;
pub use scan::ScanAdapter;

/// One record produced by an `entries` cursor
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<T> {
    /// Engine key, `keyspace:id`
    pub key: String,
    pub id: String,
    pub value: T,
}

/// Operations shared by both strategies
///
/// Ids are strings; empty ids and keyspace names that are empty or contain
/// `:` fail with `InvalidArgument` before the engine is touched.
pub trait KeyspaceAdapter {
    /// Store `value` under `id`, replacing any previous record; returns the value
    fn put<T: Serialize>(&self, id: &str, value: T, keyspace: &str) -> Result<T>;

    /// `Ok(None)` when nothing is stored; undecodable bytes are an error
    fn get<T: DeserializeOwned>(&self, id: &str, keyspace: &str) -> Result<Option<T>>;

    fn contains(&self, id: &str, keyspace: &str) -> Result<bool>;

    /// Remove the record and return what was stored, if anything
    fn delete<T: DeserializeOwned>(&self, id: &str, keyspace: &str) -> Result<Option<T>>;

    /// Remove every record of the keyspace. Not atomic.
    fn delete_all_of(&self, keyspace: &str) -> Result<()>;

    fn get_all_of<T: DeserializeOwned>(&self, keyspace: &str) -> Result<Vec<T>>;

    fn count(&self, keyspace: &str) -> Result<u64>;

    /// Close the underlying engine; every later call fails with `EngineClosed`
    fn destroy(&self) -> Result<()>;

    /// Same as [`destroy`](KeyspaceAdapter::destroy)
    fn clear(&self) -> Result<()> {
        self.destroy()
    }
}

/// Open an LSM engine from `config` behind the indexed strategy
pub fn open_indexed(config: Config) -> Result<IndexedAdapter<Engine>> {
    Ok(IndexedAdapter::new(Engine::open(config)?))
}

/// Open an LSM engine from `config` behind the scan strategy
pub fn open_scan(config: Config) -> Result<ScanAdapter<Engine>> {
    Ok(ScanAdapter::new(Engine::open(config)?))
}
