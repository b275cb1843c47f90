use serde::{Deserialize, Serialize};

/// The decoded payload of a `Request` envelope: a method-call descriptor.
///
/// A call names its target by the interface's full name plus a group (so
/// multiple implementations of one interface can coexist), and carries each
/// argument pre-serialized with the serializer named by the envelope's tag.
/// `param_types` lists a type descriptor per argument, in order, which lets
/// the provider side report precise diagnostics on arity or shape mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub interface: String,
    pub method: String,
    pub param_types: Vec<String>,
    pub args: Vec<Vec<u8>>,
    pub group: String,
}
