use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Discriminates what an envelope carries.
///
/// `Request` and `Response` payloads hold a serialized [`RpcRequest`] or
/// [`RpcResponse`]; the heartbeat variants carry an empty payload and exist
/// only for liveness probing.
///
/// [`RpcRequest`]: crate::message::RpcRequest
/// [`RpcResponse`]: crate::message::RpcResponse
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
pub enum MessageType {
    Request = 1,
    Response = 2,
    HeartbeatRequest = 3,
    HeartbeatResponse = 4,
}
