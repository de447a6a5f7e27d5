//! Placeholder (skeleton) nodes shown until a unit is mounted.
//!
//! Placeholders carry no state beyond their owner tag and visual parameters.

use std::sync::Arc;

use crate::mount::MountTarget;
use crate::node::{ComponentId, Node};
use crate::registry::ComponentEntry;

/// Builds the placeholder spec for an entry at registration time.
pub type PlaceholderFactory = Arc<dyn Fn() -> PlaceholderSpec + Send + Sync>;

/// A length along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Px(u32),
    Percent(u8),
}

/// Shape of one skeleton element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderShape {
    /// A single bar, as for a line of text.
    Line,
    /// A circular badge, as for an avatar.
    Circle,
    /// A rectangular block, as for media.
    Block,
}

/// One element of a composite placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderElement {
    pub shape: PlaceholderShape,
    pub width: Option<Dimension>,
    pub height: Option<Dimension>,
    pub spacing: Option<u32>,
}

impl PlaceholderElement {
    pub fn new(shape: PlaceholderShape) -> Self {
        Self {
            shape,
            width: None,
            height: None,
            spacing: None,
        }
    }

    pub fn width(mut self, width: Dimension) -> Self {
        self.width = Some(width);
        self
    }

    pub fn height(mut self, height: Dimension) -> Self {
        self.height = Some(height);
        self
    }

    pub fn spacing(mut self, spacing: u32) -> Self {
        self.spacing = Some(spacing);
        self
    }

    /// Width with the shape default applied.
    pub fn resolved_width(&self) -> Dimension {
        self.width.unwrap_or(match self.shape {
            PlaceholderShape::Line | PlaceholderShape::Block => Dimension::Percent(100),
            PlaceholderShape::Circle => Dimension::Px(40),
        })
    }

    /// Height with the shape default applied.
    pub fn resolved_height(&self) -> Dimension {
        self.height.unwrap_or(match self.shape {
            PlaceholderShape::Line => Dimension::Px(16),
            PlaceholderShape::Circle => Dimension::Px(40),
            PlaceholderShape::Block => Dimension::Px(120),
        })
    }

    pub fn resolved_spacing(&self) -> u32 {
        self.spacing.unwrap_or(8)
    }
}

/// Visual parameters of a placeholder node.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaceholderSpec {
    /// A single block of fixed height with a free-form style hint.
    Simple { height: u32, style_hint: String },
    /// A stack of lines, badges and blocks within a fixed height.
    Composite {
        height: u32,
        elements: Vec<PlaceholderElement>,
    },
}

impl PlaceholderSpec {
    pub fn simple(height: u32, style_hint: impl Into<String>) -> Self {
        Self::Simple {
            height,
            style_hint: style_hint.into(),
        }
    }

    pub fn composite(height: u32, elements: Vec<PlaceholderElement>) -> Self {
        Self::Composite { height, elements }
    }

    pub fn height(&self) -> u32 {
        match self {
            Self::Simple { height, .. } | Self::Composite { height, .. } => *height,
        }
    }
}

/// Creates, attaches and removes placeholder nodes.
pub struct PlaceholderManager {
    default_height: u32,
}

impl PlaceholderManager {
    pub fn new(default_height: u32) -> Self {
        Self { default_height }
    }

    /// Build a placeholder node tagged with `owner`.
    pub fn create(&self, owner: ComponentId, spec: PlaceholderSpec) -> Node {
        Node::placeholder(owner, spec)
    }

    /// Materialize the entry's placeholder and append it to its mount target.
    ///
    /// Returns `None` if the entry has no placeholder policy or one tagged with
    /// the id is already mounted.
    pub fn attach(&self, entry: &ComponentEntry) -> Option<Node> {
        if !entry.show_placeholder {
            return None;
        }
        if let Some(existing) = entry.mount_target.find_tagged(entry.id.as_str()) {
            if existing.is_placeholder() {
                return None;
            }
        }

        let spec = match &entry.placeholder {
            Some(factory) => factory(),
            None => PlaceholderSpec::simple(self.default_height, ""),
        };
        let node = self.create(entry.id.clone(), spec);
        entry.mount_target.append(node.clone());
        tracing::debug!(component_id = %entry.id, "placeholder attached");
        Some(node)
    }

    /// Detach the placeholder tagged with `id`, if any.
    pub fn remove_for(&self, target: &dyn MountTarget, id: &str) -> bool {
        match target.find_tagged(id) {
            Some(node) if node.is_placeholder() => target.remove(&node),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mount::MemoryMountTarget;
    use crate::node::NodeKind;

    #[test]
    fn test_element_defaults_per_shape() {
        let circle = PlaceholderElement::new(PlaceholderShape::Circle);
        assert_eq!(circle.resolved_width(), Dimension::Px(40));
        assert_eq!(circle.resolved_height(), Dimension::Px(40));

        let line = PlaceholderElement::new(PlaceholderShape::Line).width(Dimension::Percent(60));
        assert_eq!(line.resolved_width(), Dimension::Percent(60));
        assert_eq!(line.resolved_height(), Dimension::Px(16));
        assert_eq!(line.resolved_spacing(), 8);
    }

    #[test]
    fn test_create_tags_owner() {
        let manager = PlaceholderManager::new(200);
        let spec = PlaceholderSpec::composite(
            180,
            vec![
                PlaceholderElement::new(PlaceholderShape::Circle),
                PlaceholderElement::new(PlaceholderShape::Line).spacing(4),
            ],
        );
        let node = manager.create(ComponentId::new("profile"), spec.clone());

        assert!(node.is_placeholder());
        assert_eq!(node.tag().map(|t| t.as_str()), Some("profile"));
        assert_eq!(node.kind(), &NodeKind::Placeholder(spec));
    }

    #[test]
    fn test_remove_for_missing_is_noop() {
        let manager = PlaceholderManager::new(200);
        let target = MemoryMountTarget::new("feed");
        assert!(!manager.remove_for(&target, "nothing"));
    }

    #[test]
    fn test_remove_for_leaves_real_nodes() {
        let manager = PlaceholderManager::new(200);
        let target = MemoryMountTarget::new("feed");
        let real = Node::tagged_element("card", ComponentId::new("a"));
        target.append(real.clone());

        assert!(!manager.remove_for(&target, "a"));
        assert!(target.contains(&real));
    }
}
