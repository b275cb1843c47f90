use crate::DiscoveryError;
use std::net::SocketAddr;
use std::sync::Arc;

/// Callback invoked with the fresh provider list whenever the backend pushes
/// a change for a subscribed service.
pub type AddressListener = Arc<dyn Fn(&[SocketAddr]) + Send + Sync>;

/// The fixed discovery contract.
///
/// Implementations differ only in backend (hierarchical store, static list,
/// whatever comes next); the runtime is written against this trait alone.
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// Publishes one provider address for `(interface, group)`. Registering
    /// an address that is already present is a no-op, not an error.
    async fn register(
        &self,
        interface: &str,
        group: &str,
        addr: SocketAddr,
    ) -> Result<(), DiscoveryError>;

    /// Records a consumer under the parallel consumers tree. Observability
    /// only: failures here must never fail a call.
    async fn register_consumer(
        &self,
        interface: &str,
        group: &str,
        addr: SocketAddr,
    ) -> Result<(), DiscoveryError>;

    /// Returns every live provider address for `(interface, group)`.
    /// An empty result is reported as [`DiscoveryError::NoProviders`] so no
    /// caller can silently proceed with zero candidates.
    async fn lookup(&self, interface: &str, group: &str)
    -> Result<Vec<SocketAddr>, DiscoveryError>;

    /// Subscribes to provider-list changes for `(interface, group)`.
    async fn subscribe(
        &self,
        interface: &str,
        group: &str,
        listener: AddressListener,
    ) -> Result<(), DiscoveryError>;
}
