use glam::{Mat4, Quat, Vec3};
use log::debug;

use crate::{
    asset::node::{DecomposedTransform, NodeTransform},
    scene::{NodeId, SceneGraph},
};

use super::{
    document::{Document, Node},
    error::ParseError,
};

fn node_transform(node: &Node) -> NodeTransform {
    match node.matrix {
        Some(matrix) => NodeTransform::Matrix(Mat4::from_cols_array(&matrix)),
        None => NodeTransform::Decomposed(DecomposedTransform {
            translation: node.translation.map(Vec3::from_array).unwrap_or(Vec3::ZERO),
            rotation: node.rotation.map(Quat::from_array).unwrap_or(Quat::IDENTITY),
            scale: node.scale.map(Vec3::from_array).unwrap_or(Vec3::ONE),
        }),
    }
}

/// Add one scene node per document node, in document order.
pub(crate) fn create_nodes(document: &Document, scene: &mut SceneGraph) -> Vec<NodeId> {
    document
        .nodes
        .iter()
        .map(|node| scene.add_node(node.name.clone(), node_transform(node).into()))
        .collect()
}

/// Wire the `children` of every document node. A node listed as the child of
/// two parents, or a cycle, fails the parse.
pub(crate) fn link_hierarchy(
    document: &Document,
    scene: &mut SceneGraph,
    nodes: &[NodeId],
) -> Result<(), ParseError> {
    for (index, (node, parent)) in document.nodes.iter().zip(nodes).enumerate() {
        for child in &node.children {
            let Some(child_id) = nodes.get(*child) else {
                return Err(ParseError::MissingNode {
                    context: format!("node #{}", index),
                    node: *child,
                });
            };
            scene.add_child(*parent, *child_id)?;
        }
    }
    debug!("Linked {} nodes", nodes.len());
    Ok(())
}
