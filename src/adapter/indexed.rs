//! Indexed strategy
//!
//! Writes go index first, record second. A crash between the two leaves a
//! phantom member: `contains` reports the id, `get` finds no record and
//! answers `None`. Enumeration skips phantoms; `delete` of a phantom drops
//! the stale id from the index.

use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::codec::{Codec, JsonCodec};
use crate::criteria::StructuralCriteria;
use crate::error::Result;
use crate::facade::KvEngine;
use crate::index::KeyspaceIndex;
use crate::keys;

use super::{IndexedEntries, KeyspaceAdapter};

/// Keyspace adapter that maintains one Index Record per keyspace
pub struct IndexedAdapter<E, C = JsonCodec> {
    engine: E,
    codec: C,
}

impl<E: KvEngine> IndexedAdapter<E, JsonCodec> {
    pub fn new(engine: E) -> Self {
        Self::with_codec(engine, JsonCodec)
    }
}

impl<E: KvEngine, C: Codec> IndexedAdapter<E, C> {
    pub fn with_codec(engine: E, codec: C) -> Self {
        Self { engine, codec }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    fn index(&self) -> KeyspaceIndex<'_, E, C> {
        KeyspaceIndex::new(&self.engine, &self.codec)
    }

    /// Ids currently listed in the keyspace's Index Record
    pub fn members(&self, keyspace: &str) -> Result<BTreeSet<String>> {
        self.index().members(keyspace)
    }

    /// Read the record itself, without consulting the index
    pub(crate) fn fetch<T: DeserializeOwned>(&self, id: &str, keyspace: &str) -> Result<Option<T>> {
        match self.engine.get(&keys::encode_key(keyspace, id)?)? {
            Some(bytes) => self.codec.decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Members whose record decodes and satisfies `criteria`
    ///
    /// Phantom members and undecodable records are skipped.
    pub fn find<T: DeserializeOwned>(
        &self,
        criteria: &StructuralCriteria<T>,
        keyspace: &str,
    ) -> Result<Vec<T>> {
        let mut found = Vec::new();
        for id in self.members(keyspace)? {
            if let Some(value) = self.fetch_for_filter(&id, keyspace)? {
                if criteria.matches(keyspace, &id, &value) {
                    found.push(value);
                }
            }
        }
        Ok(found)
    }

    /// Number of entries [`find`](Self::find) would return
    pub fn count_matching<T: DeserializeOwned>(
        &self,
        criteria: &StructuralCriteria<T>,
        keyspace: &str,
    ) -> Result<u64> {
        let mut count = 0;
        for id in self.members(keyspace)? {
            if let Some(value) = self.fetch_for_filter::<T>(&id, keyspace)? {
                if criteria.matches(keyspace, &id, &value) {
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    /// Cursor over the members present right now
    ///
    /// The id set is snapshotted here; records are fetched one by one as the
    /// cursor advances. Concurrent writes may or may not show up, and ids
    /// added after this call never do.
    pub fn entries<T: DeserializeOwned>(&self, keyspace: &str) -> Result<IndexedEntries<'_, E, C, T>> {
        let ids = self.members(keyspace)?;
        Ok(IndexedEntries::new(self, keyspace, ids))
    }

    /// Decode errors become `None` here; engine errors still propagate
    fn fetch_for_filter<T: DeserializeOwned>(&self, id: &str, keyspace: &str) -> Result<Option<T>> {
        match self.fetch(id, keyspace) {
            Ok(Some(value)) => Ok(Some(value)),
            Ok(None) => {
                warn!(keyspace, id, "skipping phantom member");
                Ok(None)
            }
            Err(e) if e.is_decode() => {
                warn!(keyspace, id, error = %e, "skipping undecodable record");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

impl<E: KvEngine, C: Codec> KeyspaceAdapter for IndexedAdapter<E, C> {
    fn put<T: Serialize>(&self, id: &str, value: T, keyspace: &str) -> Result<T> {
        let key = keys::encode_key(keyspace, id)?;
        let bytes = self.codec.encode(&value)?;

        self.index().add(keyspace, id)?;
        self.engine.put(&key, &bytes)?;

        debug!(keyspace, id, bytes = bytes.len(), "put");
        Ok(value)
    }

    fn get<T: DeserializeOwned>(&self, id: &str, keyspace: &str) -> Result<Option<T>> {
        keys::encode_key(keyspace, id)?;
        if !self.contains(id, keyspace)? {
            return Ok(None);
        }
        self.fetch(id, keyspace)
    }

    /// Index membership only; the record itself is not checked
    fn contains(&self, id: &str, keyspace: &str) -> Result<bool> {
        keys::encode_key(keyspace, id)?;
        self.index().contains(keyspace, id)
    }

    fn delete<T: DeserializeOwned>(&self, id: &str, keyspace: &str) -> Result<Option<T>> {
        let key = keys::encode_key(keyspace, id)?;

        match self.get(id, keyspace)? {
            Some(value) => {
                self.engine.delete(&key)?;
                self.index().remove(keyspace, id)?;
                debug!(keyspace, id, "delete");
                Ok(Some(value))
            }
            None => {
                // Phantom member: nothing to return, but the id must not linger
                self.index().remove(keyspace, id)?;
                Ok(None)
            }
        }
    }

    /// Deletes each member's record, then the Index Record
    ///
    /// If a record delete fails, the records already deleted stay deleted and
    /// the Index Record still lists every id; the survivors show up as phantoms.
    fn delete_all_of(&self, keyspace: &str) -> Result<()> {
        let ids = self.members(keyspace)?;
        for id in &ids {
            self.engine.delete(&keys::encode_key(keyspace, id)?)?;
        }
        self.index().drop_keyspace(keyspace)?;

        debug!(keyspace, removed = ids.len(), "delete_all_of");
        Ok(())
    }

    /// Every member's record, in id order; phantoms are skipped
    fn get_all_of<T: DeserializeOwned>(&self, keyspace: &str) -> Result<Vec<T>> {
        let mut values = Vec::new();
        for id in self.members(keyspace)? {
            match self.fetch(&id, keyspace)? {
                Some(value) => values.push(value),
                None => warn!(keyspace, id = %id, "skipping phantom member"),
            }
        }
        Ok(values)
    }

    fn count(&self, keyspace: &str) -> Result<u64> {
        Ok(self.members(keyspace)?.len() as u64)
    }

    fn destroy(&self) -> Result<()> {
        self.engine.close()
    }
}
