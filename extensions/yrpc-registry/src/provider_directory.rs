use crate::{DiscoveryError, LoadBalancer, Registry};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info, warn};

type ServiceKey = (String, String);

/// Consumer-side view of the provider landscape.
///
/// Combines three inputs into every selection: the registry lookup (cached
/// after the first call per service), push updates from the backend's watch
/// mechanism (replacing the cached list without another lookup), and the
/// health verdicts of the heartbeat monitor (filtering demoted addresses out
/// of selection while keeping them probed so they can come back).
pub struct ProviderDirectory {
    registry: Arc<dyn Registry>,
    balancer: Arc<dyn LoadBalancer>,
    cache: Arc<RwLock<HashMap<ServiceKey, Vec<SocketAddr>>>>,
    subscribed: Mutex<HashSet<ServiceKey>>,
    unhealthy: RwLock<HashSet<SocketAddr>>,
}

impl ProviderDirectory {
    pub fn new(registry: Arc<dyn Registry>, balancer: Arc<dyn LoadBalancer>) -> Self {
        Self {
            registry,
            balancer,
            cache: Arc::new(RwLock::new(HashMap::new())),
            subscribed: Mutex::new(HashSet::new()),
            unhealthy: RwLock::new(HashSet::new()),
        }
    }

    pub fn registry(&self) -> Arc<dyn Registry> {
        self.registry.clone()
    }

    /// Resolves one call target: cached-or-looked-up candidates, health
    /// filter, then the balancer's pick.
    pub async fn resolve(&self, interface: &str, group: &str) -> Result<SocketAddr, DiscoveryError> {
        let candidates = self.candidates(interface, group).await?;
        self.balancer
            .select(&candidates)
            .ok_or_else(|| DiscoveryError::NoProviders {
                service: interface.to_string(),
                group: group.to_string(),
            })
    }

    /// Returns the healthy candidate list for `(interface, group)`.
    pub async fn candidates(
        &self,
        interface: &str,
        group: &str,
    ) -> Result<Vec<SocketAddr>, DiscoveryError> {
        let key = (interface.to_string(), group.to_string());

        let cached = self.cache.read().expect("cache lock").get(&key).cloned();
        let all = match cached {
            Some(list) => list,
            None => self.fetch_and_watch(&key).await?,
        };

        let unhealthy = self.unhealthy.read().expect("health lock");
        let healthy: Vec<SocketAddr> = all
            .into_iter()
            .filter(|addr| !unhealthy.contains(addr))
            .collect();
        drop(unhealthy);

        if healthy.is_empty() {
            return Err(DiscoveryError::NoProviders {
                service: interface.to_string(),
                group: group.to_string(),
            });
        }
        Ok(healthy)
    }

    async fn fetch_and_watch(&self, key: &ServiceKey) -> Result<Vec<SocketAddr>, DiscoveryError> {
        let addrs = self.registry.lookup(&key.0, &key.1).await?;

        let first_subscription = self
            .subscribed
            .lock()
            .expect("subscription lock")
            .insert(key.clone());
        if first_subscription {
            let cache = self.cache.clone();
            let listener_key = key.clone();
            self.registry
                .subscribe(
                    &key.0,
                    &key.1,
                    Arc::new(move |pushed: &[SocketAddr]| {
                        debug!(
                            interface = %listener_key.0,
                            group = %listener_key.1,
                            count = pushed.len(),
                            "provider list updated by watch"
                        );
                        cache
                            .write()
                            .expect("cache lock")
                            .insert(listener_key.clone(), pushed.to_vec());
                    }),
                )
                .await?;
        }

        self.cache
            .write()
            .expect("cache lock")
            .entry(key.clone())
            .or_insert_with(|| addrs.clone());
        Ok(addrs)
    }

    /// Every address the directory currently knows, demoted ones included.
    /// This is the heartbeat monitor's probe set: unhealthy providers keep
    /// getting probed so a recovery can restore them.
    pub fn known_providers(&self) -> Vec<SocketAddr> {
        let cache = self.cache.read().expect("cache lock");
        let mut all: Vec<SocketAddr> = cache.values().flatten().copied().collect();
        all.sort();
        all.dedup();
        all
    }

    /// Excludes `addr` from selection until it passes a probe again.
    pub fn mark_unhealthy(&self, addr: SocketAddr) {
        let newly = self.unhealthy.write().expect("health lock").insert(addr);
        if newly {
            warn!(%addr, "provider demoted after failed heartbeat");
        }
    }

    /// Restores `addr` into selection.
    pub fn mark_healthy(&self, addr: SocketAddr) {
        let was_demoted = self.unhealthy.write().expect("health lock").remove(&addr);
        if was_demoted {
            info!(%addr, "provider restored after successful heartbeat");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, RoundRobin, StoreRegistry};

    const IFACE: &str = "com.acme.HelloYrpc";
    const GROUP: &str = "default";

    fn addr(s: &str) -> SocketAddr {
        s.parse().unwrap()
    }

    async fn directory_with(addrs: &[&str]) -> (Arc<MemoryStore>, ProviderDirectory) {
        let store = Arc::new(MemoryStore::new());
        let registry = Arc::new(StoreRegistry::new(store.clone()));
        for a in addrs {
            registry.register(IFACE, GROUP, addr(a)).await.unwrap();
        }
        let directory = ProviderDirectory::new(registry, Arc::new(RoundRobin::new()));
        (store, directory)
    }

    #[tokio::test]
    async fn resolve_fails_when_nothing_is_registered() {
        let (_store, directory) = directory_with(&[]).await;
        assert!(matches!(
            directory.resolve(IFACE, GROUP).await,
            Err(DiscoveryError::NoProviders { .. })
        ));
    }

    #[tokio::test]
    async fn unhealthy_addresses_are_excluded_until_restored() {
        let (_store, directory) = directory_with(&["127.0.0.1:7001", "127.0.0.1:7002"]).await;
        let dead = addr("127.0.0.1:7001");

        directory.mark_unhealthy(dead);
        for _ in 0..4 {
            assert_eq!(directory.resolve(IFACE, GROUP).await.unwrap(), addr("127.0.0.1:7002"));
        }

        directory.mark_healthy(dead);
        let mut seen = HashSet::new();
        for _ in 0..4 {
            seen.insert(directory.resolve(IFACE, GROUP).await.unwrap());
        }
        assert!(seen.contains(&dead));
    }

    #[tokio::test]
    async fn demoting_every_provider_is_a_discovery_error() {
        let (_store, directory) = directory_with(&["127.0.0.1:7001"]).await;
        directory.mark_unhealthy(addr("127.0.0.1:7001"));
        assert!(matches!(
            directory.resolve(IFACE, GROUP).await,
            Err(DiscoveryError::NoProviders { .. })
        ));
    }

    #[tokio::test]
    async fn watch_updates_replace_the_cached_list_without_lookup() {
        let (store, directory) = directory_with(&["127.0.0.1:7001"]).await;

        // Prime the cache and the subscription.
        assert_eq!(
            directory.candidates(IFACE, GROUP).await.unwrap(),
            vec![addr("127.0.0.1:7001")]
        );

        // A second provider appears; the watch pushes the new list.
        directory
            .registry()
            .register(IFACE, GROUP, addr("127.0.0.1:7002"))
            .await
            .unwrap();
        let mut candidates = directory.candidates(IFACE, GROUP).await.unwrap();
        candidates.sort();
        assert_eq!(candidates, vec![addr("127.0.0.1:7001"), addr("127.0.0.1:7002")]);

        // The first provider's ephemeral node expires.
        store.delete(&format!("/yrpc-metadata/providers/{}/{}/127.0.0.1:7001", IFACE, GROUP));
        assert_eq!(
            directory.candidates(IFACE, GROUP).await.unwrap(),
            vec![addr("127.0.0.1:7002")]
        );
    }

    #[tokio::test]
    async fn known_providers_still_lists_demoted_addresses() {
        let (_store, directory) = directory_with(&["127.0.0.1:7001", "127.0.0.1:7002"]).await;
        directory.candidates(IFACE, GROUP).await.unwrap();

        directory.mark_unhealthy(addr("127.0.0.1:7001"));
        let known = directory.known_providers();
        assert!(known.contains(&addr("127.0.0.1:7001")));
        assert!(known.contains(&addr("127.0.0.1:7002")));
    }
}
