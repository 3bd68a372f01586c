//! Entry cursors
//!
//! Pull-based iteration over one keyspace. Both cursors are single pass and
//! yield `Result<Entry<T>>`; after an error they yield nothing more.

use std::collections::btree_set;
use std::collections::BTreeSet;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use tracing::{trace, warn};

use crate::codec::Codec;
use crate::error::Result;
use crate::facade::{EngineCursor, KvEngine};
use crate::keys;

use super::{Entry, IndexedAdapter};

// =============================================================================
// Indexed strategy
// =============================================================================

/// Entries of a snapshotted id set, fetched lazily
pub struct IndexedEntries<'a, E, C, T> {
    adapter: &'a IndexedAdapter<E, C>,
    keyspace: String,
    ids: btree_set::IntoIter<String>,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, E: KvEngine, C: Codec, T: DeserializeOwned> IndexedEntries<'a, E, C, T> {
    pub(super) fn new(adapter: &'a IndexedAdapter<E, C>, keyspace: &str, ids: BTreeSet<String>) -> Self {
        Self {
            adapter,
            keyspace: keyspace.to_string(),
            ids: ids.into_iter(),
            _marker: PhantomData,
        }
    }

    /// Ids not yet visited
    pub fn remaining(&self) -> usize {
        self.ids.len()
    }

    /// Stop early; holds no engine resource so this only drops the snapshot
    pub fn close(&mut self) {
        self.ids = BTreeSet::new().into_iter();
    }
}

impl<E: KvEngine, C: Codec, T: DeserializeOwned> Iterator for IndexedEntries<'_, E, C, T> {
    type Item = Result<Entry<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.ids.next() {
            match self.adapter.fetch(&id, &self.keyspace) {
                Ok(Some(value)) => {
                    return Some(Ok(Entry {
                        key: format!("{}{}{}", self.keyspace, keys::SEPARATOR, id),
                        id,
                        value,
                    }));
                }
                Ok(None) => warn!(keyspace = %self.keyspace, id = %id, "skipping phantom member"),
                Err(e) => {
                    self.close();
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

// =============================================================================
// Scan strategy
// =============================================================================

/// Raw `(key, value)` pairs whose key starts with a prefix
///
/// Starts at the engine's first key. Keys arrive in ascending order, so the
/// scan ends at the first key that sorts past every key carrying the prefix.
/// The engine cursor is released on exhaustion, on error, on `close` and on drop.
pub(crate) struct PrefixScan<Cur: EngineCursor> {
    cursor: Cur,
    prefix: Vec<u8>,
    started: bool,
    done: bool,
}

impl<Cur: EngineCursor> PrefixScan<Cur> {
    pub(crate) fn new(cursor: Cur, prefix: Vec<u8>) -> Self {
        Self {
            cursor,
            prefix,
            started: false,
            done: false,
        }
    }

    pub(crate) fn close(&mut self) {
        if !self.done {
            self.done = true;
            self.cursor.close();
            trace!(prefix = %String::from_utf8_lossy(&self.prefix), "prefix scan released");
        }
    }
}

impl<Cur: EngineCursor> Iterator for PrefixScan<Cur> {
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut step = if self.started {
            self.cursor.next()
        } else {
            self.started = true;
            self.cursor.seek_to_first()
        };

        loop {
            if let Err(e) = step {
                self.close();
                return Some(Err(e));
            }

            let (key, value) = match (self.cursor.key(), self.cursor.value()) {
                (Some(k), Some(v)) if self.cursor.is_valid() => (k, v),
                _ => {
                    self.close();
                    return None;
                }
            };

            if key.starts_with(&self.prefix) {
                return Some(Ok((key.to_vec(), value.to_vec())));
            }
            if key > self.prefix.as_slice() {
                self.close();
                return None;
            }

            step = self.cursor.next();
        }
    }
}

/// Lazy cursor over one keyspace under the scan strategy
///
/// Holds an open engine cursor until it is exhausted, closed or dropped.
pub struct ScanCursor<'a, E, C, T>
where
    E: KvEngine + 'a,
{
    scan: PrefixScan<E::Cursor<'a>>,
    codec: &'a C,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, E, C, T> ScanCursor<'a, E, C, T>
where
    E: KvEngine + 'a,
    C: Codec,
    T: DeserializeOwned,
{
    pub(super) fn new(scan: PrefixScan<E::Cursor<'a>>, codec: &'a C) -> Self {
        Self {
            scan,
            codec,
            _marker: PhantomData,
        }
    }

    /// Release the engine cursor now instead of at drop
    pub fn close(&mut self) {
        self.scan.close();
    }
}

impl<'a, E, C, T> Iterator for ScanCursor<'a, E, C, T>
where
    E: KvEngine + 'a,
    C: Codec,
    T: DeserializeOwned,
{
    type Item = Result<Entry<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        let (raw_key, raw_value) = match self.scan.next()? {
            Ok(pair) => pair,
            Err(e) => return Some(Err(e)),
        };

        let decoded = keys::decode_key(&raw_key).and_then(|(keyspace, id)| {
            let value = self.codec.decode(&raw_value)?;
            Ok(Entry {
                key: format!("{}{}{}", keyspace, keys::SEPARATOR, id),
                id,
                value,
            })
        });

        if decoded.is_err() {
            self.scan.close();
        }
        Some(decoded)
    }
}
