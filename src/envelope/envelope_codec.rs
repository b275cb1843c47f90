use crate::constants::{
    ENVELOPE_COMPRESS_TAG_OFFSET, ENVELOPE_FULL_LENGTH_OFFSET, ENVELOPE_HEADER_LENGTH_OFFSET,
    ENVELOPE_HEADER_SIZE, ENVELOPE_MAGIC, ENVELOPE_MESSAGE_TYPE_OFFSET, ENVELOPE_REQUEST_ID_OFFSET,
    ENVELOPE_SERIALIZE_TAG_OFFSET, ENVELOPE_VERSION_OFFSET, MAX_ENVELOPE_SIZE, PROTOCOL_VERSION,
};
use crate::envelope::{Envelope, MessageType, ProtocolError};
use bytes::{BufMut, BytesMut};

/// Encodes and decodes single envelopes.
///
/// `decode` expects a buffer holding exactly one complete frame; partial-read
/// handling and frame boundary detection live in [`EnvelopeStreamDecoder`],
/// which calls into this codec once a full frame has been buffered.
///
/// [`EnvelopeStreamDecoder`]: crate::envelope::EnvelopeStreamDecoder
pub struct EnvelopeCodec;

impl EnvelopeCodec {
    /// Frames one envelope onto `buf`. All integer fields are big-endian.
    pub fn encode(envelope: &Envelope, buf: &mut BytesMut) {
        let full_length = ENVELOPE_HEADER_SIZE + envelope.payload.len();
        buf.reserve(full_length);

        buf.put_slice(&ENVELOPE_MAGIC);
        buf.put_u8(PROTOCOL_VERSION);
        buf.put_u16(ENVELOPE_HEADER_SIZE as u16);
        buf.put_u32(full_length as u32);
        buf.put_u8(envelope.message_type.into());
        buf.put_u8(envelope.serialize_tag);
        buf.put_u8(envelope.compress_tag);
        buf.put_u64(envelope.request_id);
        buf.put_slice(&envelope.payload);
    }

    /// Convenience wrapper returning a freshly allocated frame.
    pub fn encode_to_vec(envelope: &Envelope) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(ENVELOPE_HEADER_SIZE + envelope.payload.len());
        Self::encode(envelope, &mut buf);
        buf.to_vec()
    }

    /// Validates the fixed header fields and returns the announced
    /// `full_length`.
    pub fn parse_header(buf: &[u8]) -> Result<usize, ProtocolError> {
        if buf.len() < ENVELOPE_HEADER_SIZE {
            return Err(ProtocolError::TruncatedFrame);
        }

        if buf[..3] != ENVELOPE_MAGIC {
            return Err(ProtocolError::BadMagic([buf[0], buf[1], buf[2]]));
        }

        let version = buf[ENVELOPE_VERSION_OFFSET];
        if version != PROTOCOL_VERSION {
            return Err(ProtocolError::UnsupportedVersion(version));
        }

        let header_length = u16::from_be_bytes([
            buf[ENVELOPE_HEADER_LENGTH_OFFSET],
            buf[ENVELOPE_HEADER_LENGTH_OFFSET + 1],
        ]);
        if header_length as usize != ENVELOPE_HEADER_SIZE {
            return Err(ProtocolError::HeaderLengthMismatch(header_length));
        }

        let full_length = u32::from_be_bytes([
            buf[ENVELOPE_FULL_LENGTH_OFFSET],
            buf[ENVELOPE_FULL_LENGTH_OFFSET + 1],
            buf[ENVELOPE_FULL_LENGTH_OFFSET + 2],
            buf[ENVELOPE_FULL_LENGTH_OFFSET + 3],
        ]) as usize;
        if full_length < ENVELOPE_HEADER_SIZE || full_length > MAX_ENVELOPE_SIZE {
            return Err(ProtocolError::InvalidFrameLength(full_length));
        }

        Ok(full_length)
    }

    /// Decodes one complete frame. `buf` must span exactly the frame an
    /// earlier [`parse_header`](Self::parse_header) announced.
    pub fn decode(buf: &[u8]) -> Result<Envelope, ProtocolError> {
        let full_length = Self::parse_header(buf)?;
        if buf.len() < full_length {
            return Err(ProtocolError::TruncatedFrame);
        }

        let type_tag = buf[ENVELOPE_MESSAGE_TYPE_OFFSET];
        let message_type = MessageType::try_from(type_tag)
            .map_err(|_| ProtocolError::UnknownMessageType(type_tag))?;

        let request_id = u64::from_be_bytes([
            buf[ENVELOPE_REQUEST_ID_OFFSET],
            buf[ENVELOPE_REQUEST_ID_OFFSET + 1],
            buf[ENVELOPE_REQUEST_ID_OFFSET + 2],
            buf[ENVELOPE_REQUEST_ID_OFFSET + 3],
            buf[ENVELOPE_REQUEST_ID_OFFSET + 4],
            buf[ENVELOPE_REQUEST_ID_OFFSET + 5],
            buf[ENVELOPE_REQUEST_ID_OFFSET + 6],
            buf[ENVELOPE_REQUEST_ID_OFFSET + 7],
        ]);

        Ok(Envelope {
            message_type,
            serialize_tag: buf[ENVELOPE_SERIALIZE_TAG_OFFSET],
            compress_tag: buf[ENVELOPE_COMPRESS_TAG_OFFSET],
            request_id,
            payload: buf[ENVELOPE_HEADER_SIZE..full_length].to_vec(),
        })
    }
}
