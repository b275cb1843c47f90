use crate::constants::ENVELOPE_HEADER_SIZE;
use crate::envelope::{Envelope, EnvelopeCodec, ProtocolError};
use std::collections::VecDeque;

/// Incremental envelope decoder for a continuous byte stream.
///
/// Transports deliver arbitrary chunks: a read may hold part of a frame,
/// several whole frames, or both. The decoder buffers partial data and only
/// consumes a frame once the `full_length` announced by its header has
/// arrived in full; leftover bytes stay buffered for the next frame.
///
/// A framing error poisons the stream: the byte boundary can no longer be
/// trusted, so the internal buffer is dropped and the error is yielded once.
/// The owning connection is expected to terminate after seeing it.
pub struct EnvelopeStreamDecoder {
    buffer: Vec<u8>, // Holds partial frame data
    poisoned: bool,
}

pub struct EnvelopeIterator {
    queue: VecDeque<Result<Envelope, ProtocolError>>,
}

impl Iterator for EnvelopeIterator {
    type Item = Result<Envelope, ProtocolError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.queue.pop_front()
    }
}

impl Default for EnvelopeStreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvelopeStreamDecoder {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            poisoned: false,
        }
    }

    /// Feeds newly received bytes and yields every envelope completed by
    /// them, in arrival order.
    pub fn read_bytes(&mut self, data: &[u8]) -> EnvelopeIterator {
        let mut queue = VecDeque::new();

        if self.poisoned {
            // Stream already failed; discard everything after the error.
            return EnvelopeIterator { queue };
        }

        self.buffer.extend_from_slice(data);

        while self.buffer.len() >= ENVELOPE_HEADER_SIZE {
            let full_length = match EnvelopeCodec::parse_header(&self.buffer) {
                Ok(len) => len,
                Err(e) => {
                    self.poison(&mut queue, e);
                    break;
                }
            };

            if self.buffer.len() < full_length {
                // Partial frame; wait for more bytes.
                break;
            }

            match EnvelopeCodec::decode(&self.buffer[..full_length]) {
                Ok(envelope) => {
                    self.buffer.drain(..full_length);
                    queue.push_back(Ok(envelope));
                }
                Err(e) => {
                    self.poison(&mut queue, e);
                    break;
                }
            }
        }

        EnvelopeIterator { queue }
    }

    fn poison(&mut self, queue: &mut VecDeque<Result<Envelope, ProtocolError>>, e: ProtocolError) {
        self.poisoned = true;
        self.buffer.clear();
        queue.push_back(Err(e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::MessageType;

    fn sample(request_id: u64) -> Envelope {
        Envelope {
            message_type: MessageType::Request,
            serialize_tag: 1,
            compress_tag: 0,
            request_id,
            payload: vec![0xAB; 37],
        }
    }

    #[test]
    fn decodes_whole_frame_in_one_read() {
        let envelope = sample(7);
        let mut decoder = EnvelopeStreamDecoder::new();
        let decoded: Vec<_> = decoder
            .read_bytes(&EnvelopeCodec::encode_to_vec(&envelope))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(decoded, vec![envelope]);
    }

    #[test]
    fn reassembles_frame_split_at_every_offset() {
        let envelope = sample(99);
        let encoded = EnvelopeCodec::encode_to_vec(&envelope);

        for split in 1..encoded.len() {
            let mut decoder = EnvelopeStreamDecoder::new();
            assert!(decoder.read_bytes(&encoded[..split]).next().is_none());
            let decoded: Vec<_> = decoder
                .read_bytes(&encoded[split..])
                .collect::<Result<_, _>>()
                .unwrap();
            assert_eq!(decoded, vec![envelope.clone()], "split at {}", split);
        }
    }

    #[test]
    fn decodes_multiple_frames_from_one_read() {
        let first = sample(1);
        let second = sample(2);
        let mut bytes = EnvelopeCodec::encode_to_vec(&first);
        bytes.extend(EnvelopeCodec::encode_to_vec(&second));

        let mut decoder = EnvelopeStreamDecoder::new();
        let decoded: Vec<_> = decoder
            .read_bytes(&bytes)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(decoded, vec![first, second]);
    }

    #[test]
    fn byte_at_a_time_matches_whole_stream() {
        let envelopes = [sample(1), sample(2), sample(3)];
        let mut bytes = Vec::new();
        for envelope in &envelopes {
            bytes.extend(EnvelopeCodec::encode_to_vec(envelope));
        }

        let mut decoder = EnvelopeStreamDecoder::new();
        let mut decoded = Vec::new();
        for byte in bytes {
            for result in decoder.read_bytes(&[byte]) {
                decoded.push(result.unwrap());
            }
        }
        assert_eq!(decoded, envelopes);
    }

    #[test]
    fn foreign_traffic_poisons_the_stream() {
        let mut decoder = EnvelopeStreamDecoder::new();
        let results: Vec<_> = decoder.read_bytes(&[b'G'; 32]).collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(ProtocolError::BadMagic(_))));

        // Later bytes are discarded, even valid ones.
        let valid = EnvelopeCodec::encode_to_vec(&sample(5));
        assert!(decoder.read_bytes(&valid).next().is_none());
    }
}
