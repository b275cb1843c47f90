use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

/// Application-level outcome of a dispatched call, carried inside the
/// response payload (distinct from the envelope's message type, which only
/// says "this is a response").
#[repr(u8)]
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    IntoPrimitive,
    TryFromPrimitive,
    Serialize,
    Deserialize,
)]
#[serde(into = "u8", try_from = "u8")]
pub enum ResponseCode {
    /// The target method ran and returned a value.
    Success = 20,

    /// No implementation is registered for the requested interface, group,
    /// or method. The connection stays open.
    NotFound = 44,

    /// The implementation ran and raised; the diagnostic travels back as
    /// data and is re-raised on the caller.
    Fail = 50,
}
