//! Engine cursor
//!
//! Lazy ordered iteration over the merged memtable + SSTable view.

use tracing::trace;

use crate::error::Result;
use crate::facade::EngineCursor;

use super::Engine;

/// Forward cursor over live keys of an [`Engine`]
///
/// Holds no lock between steps: every `next` looks up the smallest key
/// strictly greater than the current one across all sources and resolves it
/// through a normal `get`, skipping tombstones. Writes made while the cursor
/// is open may or may not be observed.
pub struct EngineIter<'a> {
    engine: &'a Engine,
    current: Option<(Vec<u8>, Vec<u8>)>,
    released: bool,
}

impl<'a> EngineIter<'a> {
    pub(super) fn new(engine: &'a Engine) -> Self {
        Self {
            engine,
            current: None,
            released: false,
        }
    }

    fn advance(&mut self, mut after: Option<Vec<u8>>) -> Result<()> {
        self.current = None;
        if self.released {
            return Ok(());
        }

        while let Some(key) = self.engine.next_key_after(after.as_deref())? {
            if let Some(value) = self.engine.get(&key)? {
                self.current = Some((key, value));
                return Ok(());
            }
            after = Some(key);
        }
        Ok(())
    }
}

impl EngineCursor for EngineIter<'_> {
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
            self.engine.release_cursor();
            trace!("engine cursor released");
        }
    }
}

impl Drop for EngineIter<'_> {
    fn drop(&mut self) {
        self.close();
    }
}
