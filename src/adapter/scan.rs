//! Scan strategy
//!
//! No index. Single-record operations go straight to the record key;
//! everything keyed by keyspace walks the engine from its first key and
//! keeps keys starting with `keyspace + ':'`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::codec::{Codec, JsonCodec};
use crate::criteria::TextualCriteria;
use crate::error::Result;
use crate::facade::KvEngine;
use crate::keys;

use super::cursor::PrefixScan;
use super::{KeyspaceAdapter, ScanCursor};

/// Keyspace adapter that synthesizes collections by scanning
pub struct ScanAdapter<E, C = JsonCodec> {
    engine: E,
    codec: C,
}

impl<E: KvEngine> ScanAdapter<E, JsonCodec> {
    pub fn new(engine: E) -> Self {
        Self::with_codec(engine, JsonCodec)
    }
}

impl<E: KvEngine, C: Codec> ScanAdapter<E, C> {
    pub fn with_codec(engine: E, codec: C) -> Self {
        Self { engine, codec }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    fn scan(&self, keyspace: &str) -> Result<PrefixScan<E::Cursor<'_>>> {
        let prefix = keys::keyspace_prefix(keyspace)?;
        Ok(PrefixScan::new(self.engine.cursor()?, prefix))
    }

    /// Lazy cursor over the keyspace; release it with `close` or by dropping it
    pub fn entries<T: DeserializeOwned>(&self, keyspace: &str) -> Result<ScanCursor<'_, E, C, T>> {
        Ok(ScanCursor::new(self.scan(keyspace)?, &self.codec))
    }

    /// Records of the keyspace whose raw key and value text satisfy `criteria`
    ///
    /// Matching happens on the stored bytes, before decoding. Matches that
    /// fail to decode are skipped.
    pub fn find<T: DeserializeOwned>(&self, criteria: &TextualCriteria, keyspace: &str) -> Result<Vec<T>> {
        let mut found = Vec::new();
        for pair in self.scan(keyspace)? {
            let (key, value) = pair?;
            if !criteria.matches(&key, &value) {
                continue;
            }
            match self.codec.decode(&value) {
                Ok(decoded) => found.push(decoded),
                Err(e) if e.is_decode() => warn!(
                    key = %String::from_utf8_lossy(&key),
                    error = %e,
                    "skipping undecodable record"
                ),
                Err(e) => return Err(e),
            }
        }
        Ok(found)
    }

    /// Number of keyspace records whose raw text satisfies `criteria`
    pub fn count_matching(&self, criteria: &TextualCriteria, keyspace: &str) -> Result<u64> {
        let mut count = 0;
        for pair in self.scan(keyspace)? {
            let (key, value) = pair?;
            if criteria.matches(&key, &value) {
                count += 1;
            }
        }
        Ok(count)
    }
}

impl<E: KvEngine, C: Codec> KeyspaceAdapter for ScanAdapter<E, C> {
    fn put<T: Serialize>(&self, id: &str, value: T, keyspace: &str) -> Result<T> {
        let key = keys::encode_key(keyspace, id)?;
        let bytes = self.codec.encode(&value)?;
        self.engine.put(&key, &bytes)?;

        debug!(keyspace, id, bytes = bytes.len(), "put");
        Ok(value)
    }

    fn get<T: DeserializeOwned>(&self, id: &str, keyspace: &str) -> Result<Option<T>> {
        match self.engine.get(&keys::encode_key(keyspace, id)?)? {
            Some(bytes) => self.codec.decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    fn contains(&self, id: &str, keyspace: &str) -> Result<bool> {
        Ok(self.engine.get(&keys::encode_key(keyspace, id)?)?.is_some())
    }

    fn delete<T: DeserializeOwned>(&self, id: &str, keyspace: &str) -> Result<Option<T>> {
        let key = keys::encode_key(keyspace, id)?;
        let value = self.get(id, keyspace)?;
        if value.is_some() {
            self.engine.delete(&key)?;
            debug!(keyspace, id, "delete");
        }
        Ok(value)
    }

    /// Collects the keyspace's keys in one pass, releases the cursor, then
    /// deletes them one by one. A failure leaves the earlier deletes in place.
    fn delete_all_of(&self, keyspace: &str) -> Result<()> {
        let mut doomed = Vec::new();
        for pair in self.scan(keyspace)? {
            doomed.push(pair?.0);
        }

        for key in &doomed {
            self.engine.delete(key)?;
        }

        debug!(keyspace, removed = doomed.len(), "delete_all_of");
        Ok(())
    }

    /// Every record of the keyspace in key order
    fn get_all_of<T: DeserializeOwned>(&self, keyspace: &str) -> Result<Vec<T>> {
        let mut values = Vec::new();
        for pair in self.scan(keyspace)? {
            let (_, value) = pair?;
            values.push(self.codec.decode(&value)?);
        }
        Ok(values)
    }

    fn count(&self, keyspace: &str) -> Result<u64> {
        let mut count = 0;
        for pair in self.scan(keyspace)? {
            pair?;
            count += 1;
        }
        Ok(count)
    }

    fn destroy(&self) -> Result<()> {
        self.engine.close()
    }
}
