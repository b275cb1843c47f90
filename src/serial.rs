mod compress_kind;
mod payload_codec;
mod serial_error;
mod serialize_kind;

pub use compress_kind::CompressKind;
pub use payload_codec::{decode_payload, encode_payload};
pub use serial_error::SerializationError;
pub use serialize_kind::SerializeKind;
