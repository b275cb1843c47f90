use crate::{CoordinationStore, CreateMode, CreateOutcome, DiscoveryError, PathWatcher};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// In-process [`CoordinationStore`] backend.
///
/// Backs single-process deployments and tests. Ephemeral semantics collapse
/// to process lifetime here, which is exactly what an in-process store can
/// honestly promise.
pub struct MemoryStore {
    nodes: Mutex<BTreeMap<String, CreateMode>>,
    watchers: Mutex<HashMap<String, Vec<PathWatcher>>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            nodes: Mutex::new(BTreeMap::new()),
            watchers: Mutex::new(HashMap::new()),
        }
    }

    /// Drops a node, firing watchers on its parent. Not part of the store
    /// contract consumed by the runtime; exists so tests and process
    /// shutdown can simulate an ephemeral node expiring.
    pub fn delete(&self, path: &str) {
        let removed = self.nodes.lock().expect("store lock").remove(path).is_some();
        if removed {
            if let Some(parent) = parent_of(path) {
                self.notify(&parent);
            }
        }
    }

    fn children_of(&self, path: &str) -> Vec<String> {
        let nodes = self.nodes.lock().expect("store lock");
        let prefix = format!("{}/", path.trim_end_matches('/'));
        nodes
            .keys()
            .filter_map(|candidate| {
                let rest = candidate.strip_prefix(&prefix)?;
                // Direct children only, not grandchildren.
                (!rest.is_empty() && !rest.contains('/')).then(|| rest.to_string())
            })
            .collect()
    }

    fn notify(&self, path: &str) {
        let children = self.children_of(path);
        let watchers = self.watchers.lock().expect("watcher lock");
        if let Some(list) = watchers.get(path) {
            for watcher in list {
                watcher(path, &children);
            }
        }
    }
}

fn parent_of(path: &str) -> Option<String> {
    let trimmed = path.trim_end_matches('/');
    let idx = trimmed.rfind('/')?;
    (idx > 0).then(|| trimmed[..idx].to_string())
}

#[async_trait::async_trait]
impl CoordinationStore for MemoryStore {
    async fn create(&self, path: &str, mode: CreateMode) -> Result<CreateOutcome, DiscoveryError> {
        let outcome = {
            let mut nodes = self.nodes.lock().expect("store lock");
            if nodes.contains_key(path) {
                CreateOutcome::AlreadyExists
            } else {
                nodes.insert(path.to_string(), mode);
                CreateOutcome::Created
            }
        };

        if outcome == CreateOutcome::Created {
            if let Some(parent) = parent_of(path) {
                self.notify(&parent);
            }
        }
        Ok(outcome)
    }

    async fn exists(&self, path: &str) -> Result<bool, DiscoveryError> {
        Ok(self.nodes.lock().expect("store lock").contains_key(path))
    }

    async fn get_children(&self, path: &str) -> Result<Vec<String>, DiscoveryError> {
        Ok(self.children_of(path))
    }

    async fn watch_children(
        &self,
        path: &str,
        watcher: PathWatcher,
    ) -> Result<(), DiscoveryError> {
        self.watchers
            .lock()
            .expect("watcher lock")
            .entry(path.to_string())
            .or_default()
            .push(watcher);
        Ok(())
    }
}
