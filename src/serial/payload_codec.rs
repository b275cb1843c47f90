use crate::serial::{CompressKind, SerializationError, SerializeKind};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Serializes then compresses a payload value for an outgoing envelope.
pub fn encode_payload<T: Serialize>(
    serialize: SerializeKind,
    compress: CompressKind,
    value: &T,
) -> Result<Vec<u8>, SerializationError> {
    let serialized = serialize.to_bytes(value)?;
    Ok(compress.compress(&serialized)?.into_owned())
}

/// Decompresses then deserializes an incoming envelope's payload, resolving
/// both strategies from the raw wire tags.
pub fn decode_payload<T: DeserializeOwned>(
    serialize_tag: u8,
    compress_tag: u8,
    bytes: &[u8],
) -> Result<T, SerializationError> {
    let compress = CompressKind::from_tag(compress_tag)?;
    let serialize = SerializeKind::from_tag(serialize_tag)?;
    let decompressed = compress.decompress(bytes)?;
    serialize.from_bytes(&decompressed)
}
