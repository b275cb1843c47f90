use crate::message::ResponseCode;
use serde::{Deserialize, Serialize};

/// The decoded payload of a `Response` envelope.
///
/// On success `body` holds the serialized return value; otherwise `message`
/// carries the exception or diagnostic text from the provider side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub code: ResponseCode,
    pub body: Option<Vec<u8>>,
    pub message: Option<String>,
}

impl RpcResponse {
    pub fn success(body: Vec<u8>) -> Self {
        Self {
            code: ResponseCode::Success,
            body: Some(body),
            message: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            code: ResponseCode::NotFound,
            body: None,
            message: Some(message.into()),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            code: ResponseCode::Fail,
            body: None,
            message: Some(message.into()),
        }
    }
}
