use crate::envelope::MessageType;

/// One complete framed unit on the wire: the fixed header fields plus the
/// raw payload bytes.
///
/// The payload is opaque at this layer. For `Request`/`Response` envelopes it
/// is a serialized message transformed through the codecs named by
/// `serialize_tag` and `compress_tag`; for heartbeats it is empty. The tags
/// are carried raw so that an envelope with an unknown codec tag still
/// decodes cleanly, failing later (and more precisely) at the payload layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub message_type: MessageType,

    /// Selects the payload serializer. Interpreted by the `serial` module.
    pub serialize_tag: u8,

    /// Selects the payload compressor. Zero means uncompressed.
    pub compress_tag: u8,

    /// Correlation key, unique per originating client while the call is
    /// outstanding. Responses echo the id of the request they answer.
    pub request_id: u64,

    pub payload: Vec<u8>,
}

impl Envelope {
    pub fn request(request_id: u64, serialize_tag: u8, compress_tag: u8, payload: Vec<u8>) -> Self {
        Self {
            message_type: MessageType::Request,
            serialize_tag,
            compress_tag,
            request_id,
            payload,
        }
    }

    pub fn response(
        request_id: u64,
        serialize_tag: u8,
        compress_tag: u8,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            message_type: MessageType::Response,
            serialize_tag,
            compress_tag,
            request_id,
            payload,
        }
    }

    /// Builds a liveness probe. Heartbeats carry no payload, so the codec
    /// tags are irrelevant and left at zero.
    pub fn heartbeat_request(request_id: u64) -> Self {
        Self {
            message_type: MessageType::HeartbeatRequest,
            serialize_tag: 0,
            compress_tag: 0,
            request_id,
            payload: Vec::new(),
        }
    }

    pub fn heartbeat_response(request_id: u64) -> Self {
        Self {
            message_type: MessageType::HeartbeatResponse,
            serialize_tag: 0,
            compress_tag: 0,
            request_id,
            payload: Vec::new(),
        }
    }
}
