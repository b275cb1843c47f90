use crate::{DiscoveryError, MemoryStore, Registry, StoreRegistry};
use std::sync::Arc;

/// Parsed registry connect string of the form `<backend>://<locator>`.
///
/// Parsing happens at startup so a typo fails the process while it is still
/// booting, not on the first call. The locator's meaning belongs to the
/// backend (host list for a networked store, ignored for `memory`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    backend: String,
    locator: String,
}

impl RegistryConfig {
    pub fn parse(connect_string: &str) -> Result<Self, DiscoveryError> {
        // Exactly one "://": none means no backend, two means garbage.
        if connect_string.matches("://").count() != 1 {
            return Err(DiscoveryError::BadConnectString(connect_string.to_string()));
        }

        let (backend, locator) = connect_string
            .split_once("://")
            .ok_or_else(|| DiscoveryError::BadConnectString(connect_string.to_string()))?;

        if backend.trim().is_empty() {
            return Err(DiscoveryError::BadConnectString(connect_string.to_string()));
        }

        Ok(Self {
            backend: backend.trim().to_lowercase(),
            locator: locator.to_string(),
        })
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Builds the registry implementation the backend names.
    ///
    /// `memory` is built in. Networked stores (a ZooKeeper-like deployment)
    /// are wired through [`Self::build_with_store`] with the store client
    /// the embedding process owns.
    pub fn build(&self) -> Result<Arc<dyn Registry>, DiscoveryError> {
        match self.backend.as_str() {
            "memory" => Ok(Arc::new(StoreRegistry::new(Arc::new(MemoryStore::new())))),
            other => Err(DiscoveryError::UnknownBackend(other.to_string())),
        }
    }

    /// Builds a registry over an externally supplied coordination store.
    pub fn build_with_store(
        &self,
        store: Arc<dyn crate::CoordinationStore>,
    ) -> Arc<dyn Registry> {
        Arc::new(StoreRegistry::new(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_and_locator() {
        let config = RegistryConfig::parse("memory://127.0.0.1:2181").unwrap();
        assert_eq!(config.backend(), "memory");
        assert_eq!(config.locator(), "127.0.0.1:2181");
    }

    #[test]
    fn missing_separator_fails_fast() {
        assert!(matches!(
            RegistryConfig::parse("memory-127.0.0.1:2181"),
            Err(DiscoveryError::BadConnectString(_))
        ));
    }

    #[test]
    fn doubled_separator_fails_fast() {
        assert!(matches!(
            RegistryConfig::parse("memory://host://oops"),
            Err(DiscoveryError::BadConnectString(_))
        ));
    }

    #[test]
    fn empty_backend_fails_fast() {
        assert!(matches!(
            RegistryConfig::parse("://127.0.0.1:2181"),
            Err(DiscoveryError::BadConnectString(_))
        ));
    }

    #[test]
    fn unknown_backend_is_reported_by_name() {
        let config = RegistryConfig::parse("etcd://127.0.0.1:2379").unwrap();
        assert_eq!(
            config.build().unwrap_err(),
            DiscoveryError::UnknownBackend("etcd".to_string())
        );
    }
}
