use std::time::Duration;
use yrpc::serial::{CompressKind, SerializeKind};

/// Consumer-side defaults, applied to every call unless the service
/// reference overrides them.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Payload serializer stamped into outgoing envelopes.
    pub serialize: SerializeKind,

    /// Payload compressor stamped into outgoing envelopes.
    pub compress: CompressKind,

    /// Default group for service references that do not set one.
    pub group: String,

    /// How long a call may wait for its response.
    pub call_timeout: Duration,

    /// How long a cold channel acquisition may take.
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            serialize: SerializeKind::Json,
            compress: CompressKind::None,
            group: "default".to_string(),
            call_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
        }
    }
}
