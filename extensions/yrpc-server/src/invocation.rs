use serde::Serialize;
use serde::de::DeserializeOwned;
use yrpc::message::RpcRequest;
use yrpc::serial::{SerializationError, SerializeKind};

/// One decoded call as seen by a method handler.
///
/// Arguments deserialize lazily, by position, with the serializer the
/// consumer chose for this message; the reply is serialized with the same
/// one, so mixed-format consumers coexist on a single provider.
pub struct Invocation {
    request: RpcRequest,
    serialize: SerializeKind,
}

impl Invocation {
    pub(crate) fn new(request: RpcRequest, serialize: SerializeKind) -> Self {
        Self { request, serialize }
    }

    pub fn request(&self) -> &RpcRequest {
        &self.request
    }

    /// Decodes the argument at `index`.
    pub fn arg<T: DeserializeOwned>(&self, index: usize) -> Result<T, SerializationError> {
        let bytes = self.request.args.get(index).ok_or_else(|| {
            SerializationError::Decode(format!(
                "method {} got {} arguments, wanted index {}",
                self.request.method,
                self.request.args.len(),
                index
            ))
        })?;
        self.serialize.from_bytes(bytes)
    }

    /// Serializes a return value for the wire.
    pub fn reply<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, SerializationError> {
        self.serialize.to_bytes(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation() -> Invocation {
        let serialize = SerializeKind::Json;
        Invocation::new(
            RpcRequest {
                interface: "com.acme.HelloYrpc".to_string(),
                method: "sayHi".to_string(),
                param_types: vec!["&str".to_string()],
                args: vec![serialize.to_bytes(&"hi").unwrap()],
                group: "default".to_string(),
            },
            serialize,
        )
    }

    #[test]
    fn args_decode_by_position() {
        let inv = invocation();
        let msg: String = inv.arg(0).unwrap();
        assert_eq!(msg, "hi");
    }

    #[test]
    fn out_of_range_argument_is_a_decode_error() {
        let inv = invocation();
        let result: Result<String, _> = inv.arg(1);
        assert!(matches!(result, Err(SerializationError::Decode(_))));
    }

    #[test]
    fn reply_round_trips_through_the_request_serializer() {
        let inv = invocation();
        let bytes = inv.reply(&"hi consumer:hi").unwrap();
        let back: String = SerializeKind::Json.from_bytes(&bytes).unwrap();
        assert_eq!(back, "hi consumer:hi");
    }
}
