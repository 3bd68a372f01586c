//! In-memory engine
//!
//! `BTreeMap`-backed [`KvEngine`] for tests and embedding. Carries fault
//! injection hooks so callers can simulate a disk failure part-way through
//! a multi-step operation.

use std::collections::BTreeMap;
use std::io;
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::trace;

use crate::error::{Result, SpaceKvError};
use crate::facade::{EngineCursor, KvEngine};

/// Remaining successful writes before injected failures start
#[derive(Debug, Default, Clone, Copy)]
struct Faults {
    writes_left: Option<usize>,
    deletes_left: Option<usize>,
}

/// In-memory ordered engine
#[derive(Default)]
pub struct MemoryEngine {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    faults: Mutex<Faults>,
    closed: AtomicBool,
    open_cursors: AtomicUsize,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `n` more puts or deletes succeed, then fail every later one with an I/O error
    pub fn fail_writes_after(&self, n: usize) {
        self.faults.lock().writes_left = Some(n);
    }

    /// Let `n` more deletes succeed, then fail every later delete
    pub fn fail_deletes_after(&self, n: usize) {
        self.faults.lock().deletes_left = Some(n);
    }

    pub fn clear_faults(&self) {
        *self.faults.lock() = Faults::default();
    }

    /// Write bytes directly, bypassing faults (for planting corrupt records)
    pub fn raw_put(&self, key: &[u8], value: &[u8]) {
        self.data.write().insert(key.to_vec(), value.to_vec());
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Cursors handed out and not yet closed or dropped
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SpaceKvError::EngineClosed);
        }
        Ok(())
    }

    fn check_fault(&self, is_delete: bool) -> Result<()> {
        let mut guard = self.faults.lock();
        let faults = &mut *guard;
        if is_delete {
            Self::spend(&mut faults.deletes_left)?;
        }
        Self::spend(&mut faults.writes_left)
    }

    fn spend(budget: &mut Option<usize>) -> Result<()> {
        match budget {
            Some(0) => Err(SpaceKvError::Io(io::Error::new(
                io::ErrorKind::Other,
                "injected write failure",
            ))),
            Some(n) => {
                *n -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn first_after(&self, after: Option<&[u8]>) -> Option<(Vec<u8>, Vec<u8>)> {
        let data = self.data.read();
        let lower = match after {
            Some(key) => Bound::Excluded(key),
            None => Bound::Unbounded,
        };
        data.range::<[u8], _>((lower, Bound::Unbounded))
            .next()
            .map(|(k, v)| (k.clone(), v.clone()))
    }
}

impl KvEngine for MemoryEngine {
    type Cursor<'a> = MemoryCursor<'a>;

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.ensure_open()?;
        Ok(self.data.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.ensure_open()?;
        self.check_fault(false)?;
        self.data.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.ensure_open()?;
        self.check_fault(true)?;
        self.data.write().remove(key);
        Ok(())
    }

    fn cursor(&self) -> Result<MemoryCursor<'_>> {
        self.ensure_open()?;
        self.open_cursors.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryCursor {
            engine: self,
            current: None,
            released: false,
        })
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(SpaceKvError::EngineClosed);
        }
        self.data.write().clear();
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for MemoryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEngine")
            .field("keys", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Cursor over a [`MemoryEngine`]; re-seeks past the current key on every step
pub struct MemoryCursor<'a> {
    engine: &'a MemoryEngine,
    current: Option<(Vec<u8>, Vec<u8>)>,
    released: bool,
}

impl MemoryCursor<'_> {
    fn advance(&mut self, after: Option<Vec<u8>>) -> Result<()> {
        self.current = None;
        if self.released {
            return Ok(());
        }
        self.engine.ensure_open()?;
        self.current = self.engine.first_after(after.as_deref());
        Ok(())
    }
}

impl EngineCursor for MemoryCursor<'_> {
    fn seek_to_first(&mut self) -> Result<()> {
        self.advance(None)
    }

    fn is_valid(&self) -> bool {
        self.current.is_some()
    }

    fn next(&mut self) -> Result<()> {
        match self.current.take() {
            Some((key, _)) => self.advance(Some(key)),
            None => Ok(()),
        }
    }

    fn key(&self) -> Option<&[u8]> {
        self.current.as_ref().map(|(k, _)| k.as_slice())
    }

    fn value(&self) -> Option<&[u8]> {
        self.current.as_ref().map(|(_, v)| v.as_slice())
    }

    fn close(&mut self) {
        if !self.released {
            self.released = true;
            self.current = None;
            self.engine.open_cursors.fetch_sub(1, Ordering::SeqCst);
            trace!("memory cursor released");
        }
    }
}

impl Drop for MemoryCursor<'_> {
    fn drop(&mut self) {
        self.close();
    }
}
