//! Node arena that decoded models live in and animations write to.
//!
//! Nodes are addressed by [`NodeId`] and form a forest: every node has at
//! most one parent, and [`SceneGraph::add_child`] refuses to re-parent a node
//! or to close a cycle.

use std::fmt::{self, Display, Formatter};

use glam::Mat4;
use thiserror::Error;

use crate::asset::node::DecomposedTransform;

mod node;

pub use node::{MeshInstance, MorphInstance, SceneNode, SkinInstance};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("node {0} does not exist")]
    MissingNode(NodeId),
    #[error("node {child} already has parent {parent}")]
    AlreadyParented { child: NodeId, parent: NodeId },
    #[error("attaching {child} under {parent} would create a cycle")]
    Cycle { child: NodeId, parent: NodeId },
}

#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<Option<SceneNode>>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, name: Option<String>, transform: DecomposedTransform) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(SceneNode::new(id, name, transform)));
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes.iter().flatten()
    }

    /// Nodes without a parent, in creation order.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter()
            .filter(|node| node.parent.is_none())
            .map(SceneNode::id)
    }

    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        if !self.contains(parent) {
            return Err(SceneError::MissingNode(parent));
        }
        let child_node = self.node(child).ok_or(SceneError::MissingNode(child))?;
        if let Some(current) = child_node.parent {
            return Err(SceneError::AlreadyParented {
                child,
                parent: current,
            });
        }
        if self.ancestors(parent).any(|ancestor| ancestor == child) {
            return Err(SceneError::Cycle { child, parent });
        }

        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
        Ok(())
    }

    /// Detach a node from its parent, keeping its subtree intact.
    pub fn detach(&mut self, id: NodeId) -> Result<(), SceneError> {
        let node = self.node_mut(id).ok_or(SceneError::MissingNode(id))?;
        if let Some(parent) = node.parent.take() {
            if let Some(parent) = self.node_mut(parent) {
                parent.children.retain(|child| *child != id);
            }
        }
        Ok(())
    }

    /// The node itself followed by its ancestors up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(id).map(SceneNode::id), move |current| {
            self.node(*current).and_then(SceneNode::parent)
        })
    }

    /// The node and all of its descendants in depth-first pre-order.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            result.push(id);
            stack.extend(node.children.iter().rev());
        }
        result
    }

    /// First node named `name` under `root`, in depth-first pre-order.
    pub fn find_by_name(&self, root: NodeId, name: &str) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|id| self.node(*id).and_then(SceneNode::name) == Some(name))
    }

    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        self.ancestors(id)
            .filter_map(|ancestor| self.node(ancestor))
            .fold(Mat4::IDENTITY, |matrix, node| node.local_matrix() * matrix)
    }

    /// Drop a node and its subtree, returning the number of removed nodes.
    pub fn remove_subtree(&mut self, root: NodeId) -> usize {
        if self.detach(root).is_err() {
            return 0;
        }
        let removed = self.descendants(root);
        for id in &removed {
            self.nodes[id.0] = None;
        }
        removed.len()
    }
}
