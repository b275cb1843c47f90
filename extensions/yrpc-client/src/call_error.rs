use std::fmt;
use std::io;
use std::time::Duration;
use yrpc::envelope::ProtocolError;
use yrpc::serial::SerializationError;
use yrpc_registry::DiscoveryError;

/// Everything a remote call can fail with, from the caller's perspective.
#[derive(Debug)]
pub enum CallError {
    /// Resolution produced no usable candidate, or the registry is
    /// misconfigured. Never retried automatically.
    Discovery(DiscoveryError),

    /// A channel could not be established or reused.
    Connection(io::Error),

    /// The channel died underneath the call before a response arrived.
    ChannelClosed,

    /// No response within the per-call deadline. The pending entry has
    /// already been expired; a late response will be dropped.
    Timeout(Duration),

    Protocol(ProtocolError),

    Serialization(SerializationError),

    /// The remote implementation raised. The diagnostic travels as data and
    /// is re-raised here verbatim; this is not a transport failure.
    Remote(String),

    /// The provider has no registration matching the request.
    ServiceNotFound(String),
}

impl CallError {
    /// Whether the retry loop may re-resolve and try again. Only transport
    /// troubles qualify; application outcomes and configuration problems
    /// would fail identically on every attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CallError::Connection(_) | CallError::ChannelClosed | CallError::Timeout(_)
        )
    }
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallError::Discovery(e) => write!(f, "discovery failed: {}", e),
            CallError::Connection(e) => write!(f, "connection failed: {}", e),
            CallError::ChannelClosed => write!(f, "channel closed mid-call"),
            CallError::Timeout(limit) => {
                write!(f, "no response within {:?}", limit)
            }
            CallError::Protocol(e) => write!(f, "protocol error: {}", e),
            CallError::Serialization(e) => write!(f, "serialization error: {}", e),
            CallError::Remote(msg) => write!(f, "remote call raised: {}", msg),
            CallError::ServiceNotFound(msg) => write!(f, "service not found: {}", msg),
        }
    }
}

impl std::error::Error for CallError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CallError::Discovery(e) => Some(e),
            CallError::Connection(e) => Some(e),
            CallError::Protocol(e) => Some(e),
            CallError::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DiscoveryError> for CallError {
    fn from(e: DiscoveryError) -> Self {
        CallError::Discovery(e)
    }
}

impl From<io::Error> for CallError {
    fn from(e: io::Error) -> Self {
        CallError::Connection(e)
    }
}

impl From<SerializationError> for CallError {
    fn from(e: SerializationError) -> Self {
        CallError::Serialization(e)
    }
}

impl From<ProtocolError> for CallError {
    fn from(e: ProtocolError) -> Self {
        CallError::Protocol(e)
    }
}
