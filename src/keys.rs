//! Key Encoding
//!
//! Maps `(keyspace, id)` onto a single engine key `keyspace + ':' + id`.
//!
//! `:` is reserved: keyspace names may not contain it, so the first `:` in a
//! record key always ends the keyspace and `"a:"` can never be a prefix of a
//! key in keyspace `"ab"`. Ids may contain `:` freely.
//!
//! The Index Record of a keyspace (indexed strategy) lives under the bare
//! keyspace name, which never collides with a record key because record keys
//! always contain the separator.

use crate::error::{Result, SpaceKvError};

/// Reserved keyspace/id separator
pub const SEPARATOR: char = ':';

/// Reject empty keyspace names and names containing the separator
pub fn validate_keyspace(keyspace: &str) -> Result<()> {
    if keyspace.is_empty() {
        return Err(SpaceKvError::InvalidArgument(
            "keyspace must not be empty".to_string(),
        ));
    }
    if keyspace.contains(SEPARATOR) {
        return Err(SpaceKvError::InvalidArgument(format!(
            "keyspace '{}' contains reserved separator '{}'",
            keyspace, SEPARATOR
        )));
    }
    Ok(())
}

fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(SpaceKvError::InvalidArgument("id must not be empty".to_string()));
    }
    Ok(())
}

/// Engine key for a record
pub fn encode_key(keyspace: &str, id: &str) -> Result<Vec<u8>> {
    validate_keyspace(keyspace)?;
    validate_id(id)?;

    let mut key = Vec::with_capacity(keyspace.len() + 1 + id.len());
    key.extend_from_slice(keyspace.as_bytes());
    key.push(SEPARATOR as u8);
    key.extend_from_slice(id.as_bytes());
    Ok(key)
}

/// Split an engine key back into `(keyspace, id)`
pub fn decode_key(key: &[u8]) -> Result<(String, String)> {
    let text = std::str::from_utf8(key)
        .map_err(|_| SpaceKvError::InvalidArgument(format!("engine key {:?} is not UTF-8", key)))?;

    match text.split_once(SEPARATOR) {
        Some((keyspace, id)) if !keyspace.is_empty() && !id.is_empty() => {
            Ok((keyspace.to_string(), id.to_string()))
        }
        _ => Err(SpaceKvError::InvalidArgument(format!(
            "engine key '{}' is not a record key",
            text
        ))),
    }
}

/// `keyspace + ':'`, the prefix every record key of the keyspace starts with
pub fn keyspace_prefix(keyspace: &str) -> Result<Vec<u8>> {
    validate_keyspace(keyspace)?;
    let mut prefix = keyspace.as_bytes().to_vec();
    prefix.push(SEPARATOR as u8);
    Ok(prefix)
}

/// Engine key of the keyspace's Index Record
pub fn index_key(keyspace: &str) -> Result<Vec<u8>> {
    validate_keyspace(keyspace)?;
    Ok(keyspace.as_bytes().to_vec())
}
