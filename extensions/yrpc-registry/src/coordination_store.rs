use crate::DiscoveryError;
use std::sync::Arc;

/// Node lifetime in the coordination store.
///
/// Persistent nodes form the directory skeleton; ephemeral nodes represent
/// one live provider instance each and disappear with the session that
/// created them, which is what makes discovery self-cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateMode {
    Persistent,
    Ephemeral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// The path was already present. Callers treat this as success so that
    /// re-registration stays a no-op.
    AlreadyExists,
}

/// Notification callback for child-list changes under a watched path.
/// Invoked with the path and its full child list after every mutation.
pub type PathWatcher = Arc<dyn Fn(&str, &[String]) + Send + Sync>;

/// The slice of a ZooKeeper-like hierarchical store this runtime consumes.
///
/// Only these four primitives are assumed; everything else (sessions,
/// authentication, data payloads on nodes) stays behind the concrete
/// backend. Implementations must be safe to share across tasks.
#[async_trait::async_trait]
pub trait CoordinationStore: Send + Sync {
    async fn create(&self, path: &str, mode: CreateMode) -> Result<CreateOutcome, DiscoveryError>;

    async fn exists(&self, path: &str) -> Result<bool, DiscoveryError>;

    /// Returns the names (not full paths) of the direct children of `path`.
    async fn get_children(&self, path: &str) -> Result<Vec<String>, DiscoveryError>;

    /// Subscribes to child-list changes under `path`. Watches persist until
    /// the store is dropped; they are not one-shot.
    async fn watch_children(&self, path: &str, watcher: PathWatcher)
    -> Result<(), DiscoveryError>;
}
