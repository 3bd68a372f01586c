//! Storage Module
//!
//! Persistent storage layer using SSTable-like files.
//!
//! ## Responsibilities
//! - Persist flushed memtables to disk in sorted format
//! - Point lookups newest → oldest
//! - Ordered key discovery for engine cursors
//!
//! See [`sstable`] for the on-disk layout.

pub mod sstable;
mod manager;

pub use sstable::{SSTable, SSTableBuilder, SSTableReader};
pub use manager::StorageManager;
