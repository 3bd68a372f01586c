//! Keyspace Index
//!
//! Membership bookkeeping for the indexed strategy. Each keyspace owns one
//! Index Record, stored under the bare keyspace name, whose value is the
//! codec-encoded set of member ids. Every mutation is a read-modify-write of
//! that single record.
//!
//! ## Concurrency
//!
//! `add`/`remove` are not atomic: two writers mutating the same keyspace can
//! both read the old set and one update is lost. Callers with more than one
//! writer per keyspace must serialize them externally (a per-keyspace lock or
//! a single-writer discipline).

use std::collections::BTreeSet;

use crate::codec::Codec;
use crate::error::Result;
use crate::facade::KvEngine;
use crate::keys;

/// Borrowed view of the Index Records stored in an engine
pub struct KeyspaceIndex<'a, E, C> {
    engine: &'a E,
    codec: &'a C,
}

impl<'a, E: KvEngine, C: Codec> KeyspaceIndex<'a, E, C> {
    pub fn new(engine: &'a E, codec: &'a C) -> Self {
        Self { engine, codec }
    }

    /// Current member ids; empty when the keyspace has no Index Record
    pub fn members(&self, keyspace: &str) -> Result<BTreeSet<String>> {
        match self.engine.get(&keys::index_key(keyspace)?)? {
            Some(bytes) => self.codec.decode(&bytes),
            None => Ok(BTreeSet::new()),
        }
    }

    pub fn contains(&self, keyspace: &str, id: &str) -> Result<bool> {
        Ok(self.members(keyspace)?.contains(id))
    }

    pub fn add(&self, keyspace: &str, id: &str) -> Result<()> {
        let mut ids = self.members(keyspace)?;
        if ids.insert(id.to_string()) {
            self.store(keyspace, &ids)?;
        }
        Ok(())
    }

    /// Remove `id`; an emptied set deletes the Index Record instead of storing `[]`
    pub fn remove(&self, keyspace: &str, id: &str) -> Result<()> {
        let mut ids = self.members(keyspace)?;
        if !ids.remove(id) {
            return Ok(());
        }
        if ids.is_empty() {
            self.drop_keyspace(keyspace)
        } else {
            self.store(keyspace, &ids)
        }
    }

    /// Delete the Index Record outright
    pub fn drop_keyspace(&self, keyspace: &str) -> Result<()> {
        self.engine.delete(&keys::index_key(keyspace)?)
    }

    fn store(&self, keyspace: &str, ids: &BTreeSet<String>) -> Result<()> {
        let bytes = self.codec.encode(ids)?;
        self.engine.put(&keys::index_key(keyspace)?, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonCodec;
    use crate::memory::MemoryEngine;

    #[test]
    fn missing_record_is_empty_set() {
        let engine = MemoryEngine::new();
        let index = KeyspaceIndex::new(&engine, &JsonCodec);
        assert!(index.members("nothing").unwrap().is_empty());
    }

    #[test]
    fn add_persists_as_json_array() {
        let engine = MemoryEngine::new();
        let index = KeyspaceIndex::new(&engine, &JsonCodec);

        index.add("users", "2").unwrap();
        index.add("users", "1").unwrap();
        index.add("users", "1").unwrap();

        let raw = engine.get(b"users").unwrap().unwrap();
        assert_eq!(raw, br#"["1","2"]"#);
    }

    #[test]
    fn removing_last_member_deletes_record() {
        let engine = MemoryEngine::new();
        let index = KeyspaceIndex::new(&engine, &JsonCodec);

        index.add("users", "1").unwrap();
        index.add("users", "2").unwrap();
        index.remove("users", "1").unwrap();
        assert_eq!(engine.get(b"users").unwrap().unwrap(), br#"["2"]"#);

        index.remove("users", "2").unwrap();
        assert_eq!(engine.get(b"users").unwrap(), None);
        assert!(engine.is_empty());
    }

    #[test]
    fn removing_unknown_id_writes_nothing() {
        let engine = MemoryEngine::new();
        let index = KeyspaceIndex::new(&engine, &JsonCodec);

        index.remove("users", "ghost").unwrap();
        assert!(engine.is_empty());
    }
}
