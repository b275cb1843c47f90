use crate::{
    AddressListener, CoordinationStore, CreateMode, DiscoveryError, Registry,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Root of the metadata tree in the coordination store.
const BASE_PATH: &str = "/yrpc-metadata";

/// [`Registry`] implementation over any [`CoordinationStore`].
///
/// Path layout:
///
/// ```text
/// /yrpc-metadata
/// ├── providers/<interface>/<group>/<ip:port>   (ephemeral leaf per instance)
/// └── consumers/<interface>/<group>/<ip:port>
/// ```
///
/// The directory levels are persistent; only the address leaves are
/// ephemeral, so a provider that dies takes exactly its own leaf with it.
pub struct StoreRegistry {
    store: Arc<dyn CoordinationStore>,
}

impl StoreRegistry {
    pub fn new(store: Arc<dyn CoordinationStore>) -> Self {
        Self { store }
    }

    fn providers_path(interface: &str, group: &str) -> String {
        format!("{}/providers/{}/{}", BASE_PATH, interface, group)
    }

    fn consumers_path(interface: &str, group: &str) -> String {
        format!("{}/consumers/{}/{}", BASE_PATH, interface, group)
    }

    /// Creates the persistent skeleton down to `parent`, then the ephemeral
    /// address leaf. Every level tolerates already existing.
    async fn register_under(&self, parent: &str, addr: SocketAddr) -> Result<(), DiscoveryError> {
        let mut path = String::new();
        for segment in parent.split('/').filter(|s| !s.is_empty()) {
            path.push('/');
            path.push_str(segment);
            self.store.create(&path, CreateMode::Persistent).await?;
        }

        let leaf = format!("{}/{}", parent, addr);
        self.store.create(&leaf, CreateMode::Ephemeral).await?;
        Ok(())
    }

    fn parse_children(children: &[String]) -> Vec<SocketAddr> {
        children
            .iter()
            .filter_map(|child| match child.parse::<SocketAddr>() {
                Ok(addr) => Some(addr),
                Err(_) => {
                    // Tolerate stray nodes rather than failing the lookup.
                    warn!(node = %child, "ignoring provider node that is not ip:port");
                    None
                }
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl Registry for StoreRegistry {
    async fn register(
        &self,
        interface: &str,
        group: &str,
        addr: SocketAddr,
    ) -> Result<(), DiscoveryError> {
        self.register_under(&Self::providers_path(interface, group), addr)
            .await?;
        debug!(%interface, %group, %addr, "provider registered");
        Ok(())
    }

    async fn register_consumer(
        &self,
        interface: &str,
        group: &str,
        addr: SocketAddr,
    ) -> Result<(), DiscoveryError> {
        self.register_under(&Self::consumers_path(interface, group), addr)
            .await
    }

    async fn lookup(
        &self,
        interface: &str,
        group: &str,
    ) -> Result<Vec<SocketAddr>, DiscoveryError> {
        let path = Self::providers_path(interface, group);
        let children = self.store.get_children(&path).await?;
        let addrs = Self::parse_children(&children);

        if addrs.is_empty() {
            return Err(DiscoveryError::NoProviders {
                service: interface.to_string(),
                group: group.to_string(),
            });
        }
        Ok(addrs)
    }

    async fn subscribe(
        &self,
        interface: &str,
        group: &str,
        listener: AddressListener,
    ) -> Result<(), DiscoveryError> {
        let path = Self::providers_path(interface, group);
        self.store
            .watch_children(
                &path,
                Arc::new(move |_path: &str, children: &[String]| {
                    let addrs = Self::parse_children(children);
                    listener(&addrs);
                }),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn addr(s: &str) -> SocketAddr {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn lookup_returns_exactly_what_was_registered() {
        let registry = StoreRegistry::new(Arc::new(MemoryStore::new()));
        let provider = addr("127.0.0.1:8094");

        registry
            .register("com.acme.HelloYrpc", "default", provider)
            .await
            .unwrap();

        let addrs = registry.lookup("com.acme.HelloYrpc", "default").await.unwrap();
        assert_eq!(addrs, vec![provider]);
    }

    #[tokio::test]
    async fn re_registering_the_same_address_is_a_no_op() {
        let registry = StoreRegistry::new(Arc::new(MemoryStore::new()));
        let provider = addr("127.0.0.1:8094");

        for _ in 0..3 {
            registry
                .register("com.acme.HelloYrpc", "default", provider)
                .await
                .unwrap();
        }

        let addrs = registry.lookup("com.acme.HelloYrpc", "default").await.unwrap();
        assert_eq!(addrs.len(), 1);
    }

    #[tokio::test]
    async fn empty_lookup_is_a_discovery_error() {
        let registry = StoreRegistry::new(Arc::new(MemoryStore::new()));
        let err = registry
            .lookup("com.acme.Nothing", "default")
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::NoProviders { .. }));
    }

    #[tokio::test]
    async fn groups_partition_the_same_interface() {
        let registry = StoreRegistry::new(Arc::new(MemoryStore::new()));
        registry
            .register("com.acme.HelloYrpc", "default", addr("127.0.0.1:1111"))
            .await
            .unwrap();
        registry
            .register("com.acme.HelloYrpc", "canary", addr("127.0.0.1:2222"))
            .await
            .unwrap();

        assert_eq!(
            registry.lookup("com.acme.HelloYrpc", "default").await.unwrap(),
            vec![addr("127.0.0.1:1111")]
        );
        assert_eq!(
            registry.lookup("com.acme.HelloYrpc", "canary").await.unwrap(),
            vec![addr("127.0.0.1:2222")]
        );
    }

    #[tokio::test]
    async fn subscription_pushes_updated_address_lists() {
        use std::sync::Mutex;

        let store = Arc::new(MemoryStore::new());
        let registry = StoreRegistry::new(store.clone());
        registry
            .register("com.acme.HelloYrpc", "default", addr("127.0.0.1:1111"))
            .await
            .unwrap();

        let seen: Arc<Mutex<Vec<Vec<SocketAddr>>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        registry
            .subscribe(
                "com.acme.HelloYrpc",
                "default",
                Arc::new(move |addrs: &[SocketAddr]| {
                    seen_clone.lock().unwrap().push(addrs.to_vec());
                }),
            )
            .await
            .unwrap();

        registry
            .register("com.acme.HelloYrpc", "default", addr("127.0.0.1:2222"))
            .await
            .unwrap();

        let snapshots = seen.lock().unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].len(), 2);
    }
}
