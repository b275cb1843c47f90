use std::fmt;

/// Errors raised while parsing envelope framing from a byte stream.
///
/// Every variant is fatal to the connection the stream came from: once the
/// framing is untrusted, no later byte boundary can be recovered. None of
/// these are recoverable mid-stream and none should ever panic the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Fewer bytes than one fixed header. Only surfaces when a caller hands
    /// the single-frame codec a truncated buffer; the stream decoder waits
    /// for a full header instead.
    TruncatedFrame,

    /// The three-byte protocol tag did not match; this is foreign traffic.
    BadMagic([u8; 3]),

    /// The version byte names a protocol revision this build does not speak.
    UnsupportedVersion(u8),

    /// The on-wire `header_length` disagrees with the header size this
    /// implementation knows how to parse.
    HeaderLengthMismatch(u16),

    /// `full_length` is smaller than the header or exceeds the sanity bound.
    InvalidFrameLength(usize),

    /// The message type byte does not name a known envelope kind.
    UnknownMessageType(u8),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::TruncatedFrame => {
                write!(f, "buffer shorter than an envelope header")
            }
            ProtocolError::BadMagic(magic) => {
                write!(f, "bad protocol magic: {:02x?}", magic)
            }
            ProtocolError::UnsupportedVersion(version) => {
                write!(f, "unsupported protocol version: {}", version)
            }
            ProtocolError::HeaderLengthMismatch(len) => {
                write!(f, "header length {} does not match known header size", len)
            }
            ProtocolError::InvalidFrameLength(len) => {
                write!(f, "invalid frame length: {}", len)
            }
            ProtocolError::UnknownMessageType(tag) => {
                write!(f, "unknown message type: {}", tag)
            }
        }
    }
}

impl std::error::Error for ProtocolError {}
