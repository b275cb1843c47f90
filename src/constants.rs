/// Constant protocol tag carried in the first three bytes of every envelope.
/// Foreign traffic is rejected on this tag before anything else is parsed.
pub const ENVELOPE_MAGIC: [u8; 3] = *b"yrp";

/// The only protocol version currently emitted or accepted.
pub const PROTOCOL_VERSION: u8 = 1;

// Envelope header layout. All multi-byte fields are big-endian.
pub const ENVELOPE_MAGIC_OFFSET: usize = 0;
pub const ENVELOPE_VERSION_OFFSET: usize = 3;
pub const ENVELOPE_HEADER_LENGTH_OFFSET: usize = 4;
pub const ENVELOPE_FULL_LENGTH_OFFSET: usize = 6;
pub const ENVELOPE_MESSAGE_TYPE_OFFSET: usize = 10;
pub const ENVELOPE_SERIALIZE_TAG_OFFSET: usize = 11;
pub const ENVELOPE_COMPRESS_TAG_OFFSET: usize = 12;
pub const ENVELOPE_REQUEST_ID_OFFSET: usize = 13;

/// Total size of the fixed-length envelope header.
/// The `header_length` field on the wire must match this value.
pub const ENVELOPE_HEADER_SIZE: usize = ENVELOPE_REQUEST_ID_OFFSET + 8;

/// Upper bound on `full_length`. A header announcing a larger frame is
/// treated as corrupt rather than buffered indefinitely.
pub const MAX_ENVELOPE_SIZE: usize = 8 * 1024 * 1024;
