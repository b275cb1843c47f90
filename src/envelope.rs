mod envelope_codec;
mod envelope_error;
mod envelope_stream_decoder;
mod envelope_struct;
mod message_type;

pub use envelope_codec::EnvelopeCodec;
pub use envelope_error::ProtocolError;
pub use envelope_stream_decoder::{EnvelopeIterator, EnvelopeStreamDecoder};
pub use envelope_struct::Envelope;
pub use message_type::MessageType;
