//! Engine Facade
//!
//! The primitive surface the keyspace adapters are written against: point
//! get/put/delete by raw byte key plus an ordered forward cursor. Nothing
//! here knows about keyspaces, indexes or codecs.

use crate::error::Result;

/// Ordered byte-keyed storage engine
///
/// Implementations must be safe for concurrent point operations. After
/// [`close`](KvEngine::close) every method fails with
/// [`SpaceKvError::EngineClosed`](crate::SpaceKvError::EngineClosed).
pub trait KvEngine: Send + Sync {
    /// Cursor type borrowed from the engine
    type Cursor<'a>: EngineCursor
    where
        Self: 'a;

    /// Read the live value for `key`, `None` when absent or deleted
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Insert or replace the value for `key`
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    fn delete(&self, key: &[u8]) -> Result<()>;

    /// New unpositioned cursor; call [`EngineCursor::seek_to_first`] before use
    fn cursor(&self) -> Result<Self::Cursor<'_>>;

    /// Release every engine resource. Irreversible.
    fn close(&self) -> Result<()>;

    fn is_closed(&self) -> bool;
}

/// Forward cursor over an engine in ascending key order
///
/// Mirrors the raw-iterator protocol of embedded LSM engines: position with
/// `seek_to_first`, test `is_valid`, read `key`/`value`, advance with `next`.
/// `close` releases the underlying handle; it is idempotent and implementations
/// also release on drop.
pub trait EngineCursor {
    fn seek_to_first(&mut self) -> Result<()>;

    /// True while the cursor sits on an entry
    fn is_valid(&self) -> bool;

    /// Advance to the next live key; the cursor becomes invalid past the end
    fn next(&mut self) -> Result<()>;

    fn key(&self) -> Option<&[u8]>;

    fn value(&self) -> Option<&[u8]>;

    fn close(&mut self);
}
