use crate::serial::SerializationError;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Payload serializer, selected per message by the envelope's one-byte tag.
///
/// The wire never assumes a single format: a provider can answer a JSON
/// request from one consumer and a bincode request from another on the same
/// connection, keyed purely by the tag each envelope carries.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
pub enum SerializeKind {
    Json = 1,
    Bincode = 2,
}

impl SerializeKind {
    /// Resolves a wire tag, failing on values no serializer claims.
    pub fn from_tag(tag: u8) -> Result<Self, SerializationError> {
        Self::try_from(tag).map_err(|_| SerializationError::UnknownSerializeTag(tag))
    }

    pub fn tag(&self) -> u8 {
        (*self).into()
    }

    pub fn to_bytes<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, SerializationError> {
        match self {
            SerializeKind::Json => {
                serde_json::to_vec(value).map_err(|e| SerializationError::Encode(e.to_string()))
            }
            SerializeKind::Bincode => {
                bincode::serialize(value).map_err(|e| SerializationError::Encode(e.to_string()))
            }
        }
    }

    pub fn from_bytes<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, SerializationError> {
        match self {
            SerializeKind::Json => {
                serde_json::from_slice(bytes).map_err(|e| SerializationError::Decode(e.to_string()))
            }
            SerializeKind::Bincode => {
                bincode::deserialize(bytes).map_err(|e| SerializationError::Decode(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tag_is_an_error() {
        assert_eq!(
            SerializeKind::from_tag(0xFF),
            Err(SerializationError::UnknownSerializeTag(0xFF))
        );
    }

    #[test]
    fn both_kinds_round_trip() {
        let value = vec!["a".to_string(), "bb".to_string()];
        for kind in [SerializeKind::Json, SerializeKind::Bincode] {
            let bytes = kind.to_bytes(&value).unwrap();
            let back: Vec<String> = kind.from_bytes(&bytes).unwrap();
            assert_eq!(back, value);
        }
    }

    #[test]
    fn malformed_payload_is_a_decode_error() {
        let result: Result<String, _> = SerializeKind::Json.from_bytes(b"{not json");
        assert!(matches!(result, Err(SerializationError::Decode(_))));
    }
}
