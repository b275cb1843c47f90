use std::fmt;

/// Errors from the discovery layer.
///
/// Configuration variants (`BadConnectString`, `UnknownBackend`) surface at
/// startup when the registry is built; the rest surface per call and are
/// reported to the caller rather than retried here. Retry is the invocation
/// pipeline's decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    /// The connect string is not of the form `<backend>://<locator>`.
    BadConnectString(String),

    /// The connect string names a backend no registry implementation claims.
    UnknownBackend(String),

    /// A lookup produced zero usable candidates.
    NoProviders { service: String, group: String },

    /// The backing coordination store failed.
    Store(String),
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryError::BadConnectString(s) => {
                write!(f, "malformed registry connect string: {:?}", s)
            }
            DiscoveryError::UnknownBackend(backend) => {
                write!(f, "unknown registry backend: {:?}", backend)
            }
            DiscoveryError::NoProviders { service, group } => {
                write!(f, "no available providers for {} (group {})", service, group)
            }
            DiscoveryError::Store(msg) => write!(f, "coordination store failure: {}", msg),
        }
    }
}

impl std::error::Error for DiscoveryError {}
