//! Record codecs
//!
//! Turn application values into engine bytes and back. The adapters treat a
//! codec as opaque; the scan strategy's textual criteria match against
//! whatever bytes the codec produced, so [`JsonCodec`] is the default.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, SpaceKvError};

/// Serializer for stored records and index records
pub trait Codec: Send + Sync {
    /// Encode a value; unencodable values fail with `Encode`
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>>;

    /// Decode bytes as `T`; corrupt bytes or a type mismatch fail with `Decode`
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T>;
}

/// JSON via serde_json
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| SpaceKvError::Encode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|e| SpaceKvError::Decode(e.to_string()))
    }
}

/// Compact binary via bincode
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl Codec for BincodeCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        bincode::serialize(value).map_err(|e| SpaceKvError::Encode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        bincode::deserialize(bytes).map_err(|e| SpaceKvError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct User {
        name: String,
        age: u32,
    }

    #[test]
    fn json_decode_type_mismatch_is_decode_error() {
        let bytes = JsonCodec.encode("just a string").unwrap();
        let err = JsonCodec.decode::<User>(&bytes).unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn json_corrupt_bytes_is_decode_error() {
        let err = JsonCodec.decode::<User>(b"{\"name\": ").unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn json_non_string_map_keys_fail_to_encode() {
        let mut map = HashMap::new();
        map.insert((1, 2), "pair");
        let err = JsonCodec.encode(&map).unwrap_err();
        assert!(matches!(err, SpaceKvError::Encode(_)));
    }

    #[test]
    fn bincode_truncated_bytes_is_decode_error() {
        let user = User {
            name: "Alice".to_string(),
            age: 30,
        };
        let bytes = BincodeCodec.encode(&user).unwrap();
        let err = BincodeCodec.decode::<User>(&bytes[..3]).unwrap_err();
        assert!(err.is_decode());
    }
}
