//! Component registry: id -> registered configuration.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use thiserror::Error;

use crate::mount::MountTarget;
use crate::node::{ComponentId, Node};
use crate::placeholder::{PlaceholderFactory, PlaceholderSpec};

/// Failure reported by a creator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CreateError {
    #[error("construction failed: {0}")]
    Failed(String),

    #[error("creator panicked: {0}")]
    Panicked(String),
}

impl CreateError {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }
}

/// Asynchronous factory producing a unit's node.
#[async_trait::async_trait]
pub trait Creator: Send + Sync {
    async fn create(&self) -> Result<Node, CreateError>;
}

#[async_trait::async_trait]
impl<F, Fut> Creator for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Node, CreateError>> + Send + 'static,
{
    async fn create(&self) -> Result<Node, CreateError> {
        (self)().await
    }
}

/// Registered configuration for one lazily or eagerly loaded unit.
#[derive(Clone)]
pub struct ComponentEntry {
    pub id: ComponentId,
    pub mount_target: Arc<dyn MountTarget>,
    pub creator: Arc<dyn Creator>,
    /// Defer construction until the container becomes visible.
    pub lazy: bool,
    /// Lower value = loaded earlier by the preload scheduler.
    pub priority: i32,
    pub show_placeholder: bool,
    pub placeholder: Option<PlaceholderFactory>,
    /// Units resolving faster than this are held back before mounting.
    pub minimum_display: Option<Duration>,
}

impl std::fmt::Debug for ComponentEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentEntry")
            .field("id", &self.id)
            .field("lazy", &self.lazy)
            .field("priority", &self.priority)
            .field("show_placeholder", &self.show_placeholder)
            .field("minimum_display", &self.minimum_display)
            .finish()
    }
}

impl ComponentEntry {
    /// A lazy entry with priority 0 and no placeholder.
    pub fn new<F, Fut>(id: impl Into<ComponentId>, mount_target: Arc<dyn MountTarget>, creator: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Node, CreateError>> + Send + 'static,
    {
        Self::with_creator(id, mount_target, Arc::new(creator))
    }

    /// Like [`ComponentEntry::new`] for an existing [`Creator`] implementation.
    pub fn with_creator(
        id: impl Into<ComponentId>,
        mount_target: Arc<dyn MountTarget>,
        creator: Arc<dyn Creator>,
    ) -> Self {
        Self {
            id: id.into(),
            mount_target,
            creator,
            lazy: true,
            priority: 0,
            show_placeholder: false,
            placeholder: None,
            minimum_display: None,
        }
    }

    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    pub fn eager(self) -> Self {
        self.lazy(false)
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Show the default placeholder while the unit is pending.
    pub fn show_placeholder(mut self, show: bool) -> Self {
        self.show_placeholder = show;
        self
    }

    /// Show a custom placeholder while the unit is pending.
    pub fn with_placeholder<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> PlaceholderSpec + Send + Sync + 'static,
    {
        self.show_placeholder = true;
        self.placeholder = Some(Arc::new(factory));
        self
    }

    pub fn minimum_display_ms(mut self, ms: u64) -> Self {
        self.minimum_display = Some(Duration::from_millis(ms));
        self
    }
}

/// Concurrent map of registered entries.
pub struct Registry {
    entries: DashMap<ComponentId, Arc<ComponentEntry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Store an entry, replacing any entry with the same id.
    pub fn register(&self, entry: ComponentEntry) -> (Arc<ComponentEntry>, Option<Arc<ComponentEntry>>) {
        let entry = Arc::new(entry);
        let previous = self.entries.insert(entry.id.clone(), Arc::clone(&entry));
        (entry, previous)
    }

    pub fn get(&self, id: &str) -> Option<Arc<ComponentEntry>> {
        self.entries.get(id).map(|e| Arc::clone(e.value()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn remove(&self, id: &str) -> Option<Arc<ComponentEntry>> {
        self.entries.remove(id).map(|(_, e)| e)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mount::MemoryMountTarget;

    fn entry(id: &str, priority: i32) -> ComponentEntry {
        let target: Arc<dyn MountTarget> = Arc::new(MemoryMountTarget::new("root"));
        ComponentEntry::new(id, target, || async { Ok(Node::element("x")) }).priority(priority)
    }

    #[test]
    fn test_register_overwrites_by_id() {
        let registry = Registry::new();
        let (_, previous) = registry.register(entry("a", 1));
        assert!(previous.is_none());

        let (current, previous) = registry.register(entry("a", 7));
        assert_eq!(previous.map(|p| p.priority), Some(1));
        assert_eq!(current.priority, 7);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("a").map(|e| e.priority), Some(7));
    }

    #[test]
    fn test_get_unknown_is_none() {
        let registry = Registry::new();
        assert!(registry.get("missing").is_none());
        assert!(!registry.contains("missing"));
    }

    #[test]
    fn test_builder_defaults() {
        let e = entry("a", 0);
        assert!(e.lazy);
        assert!(!e.show_placeholder);
        assert!(e.minimum_display.is_none());

        let e = e.eager().with_placeholder(|| PlaceholderSpec::simple(80, "card")).minimum_display_ms(300);
        assert!(!e.lazy);
        assert!(e.show_placeholder);
        assert_eq!(e.minimum_display, Some(Duration::from_millis(300)));
    }
}
