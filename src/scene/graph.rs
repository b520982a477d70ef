//! The scene graph arena
//!
//! Nodes live in an arena keyed by [`NodeId`]; parent links are plain id
//! back-references, so the tree has no ownership cycles. Structural mutation
//! keeps the parent/children invariants; [`SceneGraph::resize`] only ever
//! writes the rectangle — constraint awareness lives in the propagation
//! engine, not here.

use std::collections::HashMap;

use thiserror::Error;

use super::geometry::Rect;
use super::node::{ContainerData, Node, NodeId, NodeKind, ShapePrimitive, TextData, TextStyle};

/// Errors raised by structural scene-graph operations
#[derive(Debug, Error)]
pub enum SceneError {
    /// The node id no longer resolves to a live node
    #[error("stale node reference: {id} is not in the scene")]
    StaleNode { id: NodeId },

    /// The node cannot hold children
    #[error("node '{name}' ({id}) cannot hold children")]
    NotAContainer { id: NodeId, name: String },

    /// Attaching a node that already has a parent
    #[error("node {child} is already attached to {parent}")]
    AlreadyAttached { child: NodeId, parent: NodeId },

    /// The document root cannot be detached, moved, or deleted
    #[error("the document root cannot be detached")]
    RootDetach,

    /// Child index out of bounds
    #[error("child index {index} out of bounds for node {parent} ({len} children)")]
    IndexOutOfBounds {
        parent: NodeId,
        index: usize,
        len: usize,
    },
}

/// The in-memory tree of nodes
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: HashMap<NodeId, Node>,
    next_id: u64,
    root: NodeId,
}

impl SceneGraph {
    /// Create a scene with a free-form root container of the given size
    pub fn new(width: f64, height: f64) -> Self {
        let root = NodeId(1);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Node::new(
                root,
                "document",
                Rect::new(0.0, 0.0, width, height),
                NodeKind::Container(ContainerData::free_form()),
            ),
        );
        Self {
            nodes,
            next_id: 2,
            root,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of live nodes, including the root
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Result<&Node, SceneError> {
        self.nodes.get(&id).ok_or(SceneError::StaleNode { id })
    }

    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut Node, SceneError> {
        self.nodes.get_mut(&id).ok_or(SceneError::StaleNode { id })
    }

    pub fn try_get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    fn alloc_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Insert a detached node into the arena and attach it under `parent`
    fn attach_new(
        &mut self,
        mut node: Node,
        parent: NodeId,
        index: Option<usize>,
    ) -> Result<NodeId, SceneError> {
        let id = node.id;
        node.parent = Some(parent);
        self.nodes.insert(id, node);
        let result = match index {
            Some(i) => self.link_child_at(parent, id, i),
            None => self.link_child(parent, id),
        };
        if result.is_err() {
            self.nodes.remove(&id);
        }
        result.map(|_| id)
    }

    /// Create a container node under `parent`
    pub fn create_container(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        rect: Rect,
        data: ContainerData,
    ) -> Result<NodeId, SceneError> {
        let id = self.alloc_id();
        let node = Node::new(id, name, rect, NodeKind::Container(data));
        self.attach_new(node, parent, None)
    }

    /// Create a shape node under `parent`
    pub fn create_shape(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        rect: Rect,
        primitive: ShapePrimitive,
    ) -> Result<NodeId, SceneError> {
        let id = self.alloc_id();
        let node = Node::new(id, name, rect, NodeKind::Shape(primitive));
        self.attach_new(node, parent, None)
    }

    /// Create a text node under `parent`
    pub fn create_text(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        rect: Rect,
        content: impl Into<String>,
        font: TextStyle,
    ) -> Result<NodeId, SceneError> {
        let id = self.alloc_id();
        let node = Node::new(
            id,
            name,
            rect,
            NodeKind::Text(TextData {
                content: content.into(),
                font,
            }),
        );
        self.attach_new(node, parent, None)
    }

    fn link_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        let len = self.get(parent)?.children().len();
        self.link_child_at(parent, child, len)
    }

    fn link_child_at(
        &mut self,
        parent: NodeId,
        child: NodeId,
        index: usize,
    ) -> Result<(), SceneError> {
        let node = self.get(parent)?;
        let name = node.name.clone();
        let container = self
            .get_mut(parent)?
            .as_container_mut()
            .ok_or(SceneError::NotAContainer { id: parent, name })?;
        if index > container.children.len() {
            return Err(SceneError::IndexOutOfBounds {
                parent,
                index,
                len: container.children.len(),
            });
        }
        container.children.insert(index, child);
        Ok(())
    }

    /// Attach a detached node to the end of `parent`'s child list
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        let len = self.get(parent)?.children().len();
        self.insert_child_at(parent, child, len)
    }

    /// Attach a detached node at `index` in `parent`'s child list
    pub fn insert_child_at(
        &mut self,
        parent: NodeId,
        child: NodeId,
        index: usize,
    ) -> Result<(), SceneError> {
        if let Some(existing) = self.get(child)?.parent {
            return Err(SceneError::AlreadyAttached {
                child,
                parent: existing,
            });
        }
        self.link_child_at(parent, child, index)?;
        self.get_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Unlink a node from its parent, keeping the subtree alive in the arena
    pub fn detach(&mut self, id: NodeId) -> Result<(), SceneError> {
        if id == self.root {
            return Err(SceneError::RootDetach);
        }
        let parent = self.get(id)?.parent;
        if let Some(parent) = parent {
            if let Some(container) = self.get_mut(parent)?.as_container_mut() {
                container.children.retain(|c| *c != id);
            }
        }
        self.get_mut(id)?.parent = None;
        Ok(())
    }

    /// Remove a node and its entire subtree from the scene
    pub fn remove(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.detach(id)?;
        for descendant in self.preorder(id) {
            self.nodes.remove(&descendant);
        }
        Ok(())
    }

    /// Write the node's size. Not constraint-aware.
    pub fn resize(&mut self, id: NodeId, width: f64, height: f64) -> Result<(), SceneError> {
        let node = self.get_mut(id)?;
        node.rect.width = width;
        node.rect.height = height;
        Ok(())
    }

    /// Write the node's position in its parent's coordinate space
    pub fn set_position(&mut self, id: NodeId, x: f64, y: f64) -> Result<(), SceneError> {
        let node = self.get_mut(id)?;
        node.rect.x = x;
        node.rect.y = y;
        Ok(())
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.try_get(id).and_then(|n| n.parent)
    }

    /// Position of `id` in its parent's child list
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent_of(id)?;
        self.try_get(parent)?.children().iter().position(|c| *c == id)
    }

    /// Sibling ids (same parent, excluding `id` itself) in child-list order
    pub fn siblings(&self, id: NodeId) -> Vec<NodeId> {
        match self.parent_of(id) {
            Some(parent) => self
                .try_get(parent)
                .map(|p| p.children().iter().copied().filter(|c| *c != id).collect())
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// Siblings whose top edge sits at or below `id`'s bottom edge, sorted by
    /// vertical position
    pub fn siblings_below(&self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.try_get(id) else {
            return Vec::new();
        };
        let bottom = node.rect.bottom();
        let mut below: Vec<NodeId> = self
            .siblings(id)
            .into_iter()
            .filter(|sib| {
                self.try_get(*sib)
                    .map(|s| s.rect.y >= bottom - 0.5)
                    .unwrap_or(false)
            })
            .collect();
        below.sort_by(|a, b| {
            let ya = self.nodes[a].rect.y;
            let yb = self.nodes[b].rect.y;
            ya.partial_cmp(&yb).unwrap_or(std::cmp::Ordering::Equal)
        });
        below
    }

    /// Ancestors of `id`, nearest first, ending at the document root
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.parent_of(id);
        while let Some(ancestor) = cursor {
            out.push(ancestor);
            cursor = self.parent_of(ancestor);
        }
        out
    }

    /// Subtree ids in pre-order (parents before children)
    pub fn preorder(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.contains(current) {
                continue;
            }
            out.push(current);
            let children = self.nodes[&current].children();
            for child in children.iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// Subtree ids in post-order (children before parents)
    pub fn postorder(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.postorder_into(id, &mut out);
        out
    }

    fn postorder_into(&self, id: NodeId, out: &mut Vec<NodeId>) {
        if !self.contains(id) {
            return;
        }
        let children: Vec<NodeId> = self.nodes[&id].children().to_vec();
        for child in children {
            self.postorder_into(child, out);
        }
        out.push(id);
    }

    /// Deep-copy a subtree with fresh ids. The copied root is left detached;
    /// attach it with [`SceneGraph::append_child`] or
    /// [`SceneGraph::insert_child_at`].
    pub fn clone_subtree(&mut self, source: NodeId) -> Result<NodeId, SceneError> {
        let mut copy = self.get(source)?.clone();
        let id = self.alloc_id();
        copy.id = id;
        copy.parent = None;

        if let Some(container) = copy.as_container_mut() {
            let child_ids = std::mem::take(&mut container.children);
            let mut cloned_children = Vec::with_capacity(child_ids.len());
            for child in child_ids {
                let cloned = self.clone_subtree(child)?;
                cloned_children.push(cloned);
            }
            self.nodes.insert(id, copy);
            for child in &cloned_children {
                self.nodes.get_mut(child).expect("freshly cloned child").parent = Some(id);
            }
            self.nodes
                .get_mut(&id)
                .expect("freshly cloned node")
                .as_container_mut()
                .expect("clone preserves kind")
                .children = cloned_children;
        } else {
            self.nodes.insert(id, copy);
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::geometry::Padding;
    use crate::scene::node::LayoutMode;

    fn text_style() -> TextStyle {
        TextStyle {
            family: "Inter".to_string(),
            style: "Regular".to_string(),
            size: 14.0,
        }
    }

    #[test]
    fn test_new_scene_has_root() {
        let scene = SceneGraph::new(800.0, 600.0);
        let root = scene.get(scene.root()).unwrap();
        assert_eq!(root.rect.width, 800.0);
        assert!(root.is_container());
    }

    #[test]
    fn test_create_and_query_children() {
        let mut scene = SceneGraph::new(400.0, 300.0);
        let root = scene.root();
        let a = scene
            .create_shape(root, "a", Rect::new(0.0, 0.0, 100.0, 50.0), ShapePrimitive::Rectangle)
            .unwrap();
        let b = scene
            .create_shape(root, "b", Rect::new(0.0, 100.0, 100.0, 50.0), ShapePrimitive::Rectangle)
            .unwrap();

        assert_eq!(scene.get(root).unwrap().children(), &[a, b]);
        assert_eq!(scene.parent_of(a), Some(root));
        assert_eq!(scene.index_in_parent(b), Some(1));
    }

    #[test]
    fn test_stale_reference_error() {
        let mut scene = SceneGraph::new(400.0, 300.0);
        let root = scene.root();
        let a = scene
            .create_shape(root, "a", Rect::zero(), ShapePrimitive::Rectangle)
            .unwrap();
        scene.remove(a).unwrap();

        let err = scene.get(a).unwrap_err();
        assert!(matches!(err, SceneError::StaleNode { .. }));
        assert!(scene.resize(a, 10.0, 10.0).is_err());
    }

    #[test]
    fn test_append_to_leaf_fails() {
        let mut scene = SceneGraph::new(400.0, 300.0);
        let root = scene.root();
        let shape = scene
            .create_shape(root, "leaf", Rect::zero(), ShapePrimitive::Rectangle)
            .unwrap();
        let err = scene
            .create_shape(shape, "child", Rect::zero(), ShapePrimitive::Rectangle)
            .unwrap_err();
        assert!(matches!(err, SceneError::NotAContainer { .. }));
    }

    #[test]
    fn test_remove_drops_subtree() {
        let mut scene = SceneGraph::new(400.0, 300.0);
        let root = scene.root();
        let frame = scene
            .create_container(
                root,
                "frame",
                Rect::new(0.0, 0.0, 200.0, 200.0),
                ContainerData::auto_flow(LayoutMode::Vertical, Padding::uniform(10.0), 8.0),
            )
            .unwrap();
        let inner = scene
            .create_shape(frame, "inner", Rect::zero(), ShapePrimitive::Rectangle)
            .unwrap();

        scene.remove(frame).unwrap();
        assert!(!scene.contains(frame));
        assert!(!scene.contains(inner));
        assert!(scene.get(root).unwrap().children().is_empty());
    }

    #[test]
    fn test_root_cannot_be_removed() {
        let mut scene = SceneGraph::new(400.0, 300.0);
        let root = scene.root();
        assert!(matches!(scene.remove(root), Err(SceneError::RootDetach)));
    }

    #[test]
    fn test_siblings_below_sorted_by_y() {
        let mut scene = SceneGraph::new(400.0, 600.0);
        let root = scene.root();
        let target = scene
            .create_shape(root, "target", Rect::new(0.0, 0.0, 100.0, 100.0), ShapePrimitive::Rectangle)
            .unwrap();
        let far = scene
            .create_shape(root, "far", Rect::new(0.0, 400.0, 100.0, 50.0), ShapePrimitive::Rectangle)
            .unwrap();
        let near = scene
            .create_shape(root, "near", Rect::new(0.0, 150.0, 100.0, 50.0), ShapePrimitive::Rectangle)
            .unwrap();
        // Above the target's bottom edge: not "below"
        let _beside = scene
            .create_shape(root, "beside", Rect::new(200.0, 20.0, 100.0, 50.0), ShapePrimitive::Rectangle)
            .unwrap();

        assert_eq!(scene.siblings_below(target), vec![near, far]);
    }

    #[test]
    fn test_clone_subtree_fresh_ids() {
        let mut scene = SceneGraph::new(400.0, 300.0);
        let root = scene.root();
        let frame = scene
            .create_container(
                root,
                "card",
                Rect::new(0.0, 0.0, 200.0, 100.0),
                ContainerData::free_form(),
            )
            .unwrap();
        let label = scene
            .create_text(frame, "label", Rect::new(10.0, 10.0, 80.0, 20.0), "hello", text_style())
            .unwrap();

        let copy = scene.clone_subtree(frame).unwrap();
        assert_ne!(copy, frame);
        assert_eq!(scene.get(copy).unwrap().parent, None);

        let copied_children = scene.get(copy).unwrap().children().to_vec();
        assert_eq!(copied_children.len(), 1);
        assert_ne!(copied_children[0], label);
        assert_eq!(scene.get(copied_children[0]).unwrap().name, "label");
        assert_eq!(scene.parent_of(copied_children[0]), Some(copy));

        scene.append_child(root, copy).unwrap();
        assert_eq!(scene.parent_of(copy), Some(root));
    }

    #[test]
    fn test_double_attach_rejected() {
        let mut scene = SceneGraph::new(400.0, 300.0);
        let root = scene.root();
        let a = scene
            .create_shape(root, "a", Rect::zero(), ShapePrimitive::Rectangle)
            .unwrap();
        let err = scene.append_child(root, a).unwrap_err();
        assert!(matches!(err, SceneError::AlreadyAttached { .. }));
    }
}
