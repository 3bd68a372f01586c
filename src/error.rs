//! Error types for spacekv
//!
//! Provides a unified error type for engine and adapter operations.

use thiserror::Error;

/// Result type alias using SpaceKvError
pub type Result<T> = std::result::Result<T, SpaceKvError>;

/// Unified error type for spacekv operations
#[derive(Debug, Error)]
pub enum SpaceKvError {
    // -------------------------------------------------------------------------
    // Caller Errors
    // -------------------------------------------------------------------------
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Decode error: {0}")]
    Decode(String),

    // -------------------------------------------------------------------------
    // Engine Lifecycle / I/O Errors
    // -------------------------------------------------------------------------
    #[error("Engine is closed")]
    EngineClosed,

    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    /// Miss inside a single SSTable; the storage manager moves on to the next one.
    #[error("Key not found")]
    KeyNotFound,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SpaceKvError {
    /// True for stored bytes that could not be decoded
    pub fn is_decode(&self) -> bool {
        matches!(self, SpaceKvError::Decode(_))
    }

    /// True when the engine was already closed
    pub fn is_closed(&self) -> bool {
        matches!(self, SpaceKvError::EngineClosed)
    }
}
