use std::fmt;

/// Errors from the payload codec layer: unknown strategy tags or payload
/// bytes that the named strategy cannot interpret.
///
/// Unlike a [`ProtocolError`] these are scoped to one call, not the whole
/// connection: the envelope framing around the payload was still sound.
///
/// [`ProtocolError`]: crate::envelope::ProtocolError
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerializationError {
    /// The envelope's serialize tag names no registered serializer.
    UnknownSerializeTag(u8),

    /// The envelope's compress tag names no registered compressor.
    UnknownCompressTag(u8),

    /// A value could not be serialized.
    Encode(String),

    /// Payload bytes were malformed for the selected serializer.
    Decode(String),
}

impl fmt::Display for SerializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializationError::UnknownSerializeTag(tag) => {
                write!(f, "unknown serialize tag: {}", tag)
            }
            SerializationError::UnknownCompressTag(tag) => {
                write!(f, "unknown compress tag: {}", tag)
            }
            SerializationError::Encode(msg) => write!(f, "serialize failed: {}", msg),
            SerializationError::Decode(msg) => write!(f, "deserialize failed: {}", msg),
        }
    }
}

impl std::error::Error for SerializationError {}
