//! Component ids and opaque node handles.
//!
//! A [`Node`] is what a creator produces and what a [`MountTarget`](crate::mount::MountTarget)
//! holds. The scheduler never looks inside a node beyond its identity and owner tag.

use std::borrow::Borrow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::placeholder::PlaceholderSpec;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Unique key of a registered component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(Arc<str>);

impl ComponentId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ComponentId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl Borrow<str> for ComponentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ComponentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ComponentId {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

/// Process-unique identity of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

/// What a node stands for.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A realized unit produced by a creator.
    Element { name: String },
    /// A skeleton shown until the real unit is mounted.
    Placeholder(PlaceholderSpec),
}

#[derive(Debug)]
struct NodeData {
    id: NodeId,
    kind: NodeKind,
    tag: Option<ComponentId>,
}

/// Cheaply cloneable handle to a node. Equality is identity.
#[derive(Debug, Clone)]
pub struct Node(Arc<NodeData>);

impl Node {
    /// A realized element with a descriptive name.
    pub fn element(name: impl Into<String>) -> Self {
        Self::build(NodeKind::Element { name: name.into() }, None)
    }

    /// A realized element tagged with its owning component.
    pub fn tagged_element(name: impl Into<String>, owner: ComponentId) -> Self {
        Self::build(NodeKind::Element { name: name.into() }, Some(owner))
    }

    pub(crate) fn placeholder(owner: ComponentId, spec: PlaceholderSpec) -> Self {
        Self::build(NodeKind::Placeholder(spec), Some(owner))
    }

    fn build(kind: NodeKind, tag: Option<ComponentId>) -> Self {
        Self(Arc::new(NodeData { id: NodeId::next(), kind, tag }))
    }

    pub fn id(&self) -> NodeId {
        self.0.id
    }

    pub fn kind(&self) -> &NodeKind {
        &self.0.kind
    }

    /// Owning component, if the node carries one.
    pub fn tag(&self) -> Option<&ComponentId> {
        self.0.tag.as_ref()
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.0.kind, NodeKind::Placeholder(_))
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Node {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_nodes_compare_by_identity() {
        let a = Node::element("card");
        let b = Node::element("card");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_component_id_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(ComponentId::new("hero"), 1);
        assert_eq!(map.get("hero"), Some(&1));
    }
}
