//! Mount target capability.
//!
//! The container a unit is appended into is owned by the host (window chrome,
//! layout tree, ...). The scheduler only appends, removes and looks up tagged nodes.

use parking_lot::Mutex;

use crate::node::Node;

/// Container capability a component is mounted into.
pub trait MountTarget: Send + Sync {
    /// Append a node as the last child.
    fn append(&self, node: Node);

    /// Detach a node. Returns false if it was not a child.
    fn remove(&self, node: &Node) -> bool;

    /// First child tagged with the given component id.
    fn find_tagged(&self, id: &str) -> Option<Node>;
}

/// In-memory mount target, suitable for tests and headless hosts.
pub struct MemoryMountTarget {
    name: String,
    children: Mutex<Vec<Node>>,
}

impl MemoryMountTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snapshot of the current children, in mount order.
    pub fn children(&self) -> Vec<Node> {
        self.children.lock().clone()
    }

    pub fn contains(&self, node: &Node) -> bool {
        self.children.lock().iter().any(|n| n == node)
    }

    pub fn len(&self) -> usize {
        self.children.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.lock().is_empty()
    }

    /// Number of placeholder children tagged with `id`.
    pub fn placeholder_count(&self, id: &str) -> usize {
        self.children
            .lock()
            .iter()
            .filter(|n| n.is_placeholder() && n.tag().map(|t| t.as_str()) == Some(id))
            .count()
    }
}

impl MountTarget for MemoryMountTarget {
    fn append(&self, node: Node) {
        self.children.lock().push(node);
    }

    fn remove(&self, node: &Node) -> bool {
        let mut children = self.children.lock();
        match children.iter().position(|n| n == node) {
            Some(index) => {
                children.remove(index);
                true
            }
            None => false,
        }
    }

    fn find_tagged(&self, id: &str) -> Option<Node> {
        self.children
            .lock()
            .iter()
            .find(|n| n.tag().map(|t| t.as_str()) == Some(id))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ComponentId;

    #[test]
    fn test_append_and_remove() {
        let target = MemoryMountTarget::new("feed");
        assert_eq!(target.name(), "feed");
        let node = Node::element("card");
        target.append(node.clone());
        assert!(target.contains(&node));
        assert!(target.remove(&node));
        assert!(!target.remove(&node));
        assert!(target.is_empty());
    }

    #[test]
    fn test_find_tagged_ignores_untagged() {
        let target = MemoryMountTarget::new("feed");
        target.append(Node::element("plain"));
        let tagged = Node::tagged_element("owned", ComponentId::new("a"));
        target.append(tagged.clone());
        assert_eq!(target.find_tagged("a"), Some(tagged));
        assert_eq!(target.find_tagged("b"), None);
    }
}
