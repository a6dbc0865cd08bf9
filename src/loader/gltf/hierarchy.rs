use log::{debug, warn};

use crate::{
    asset::{mesh::MeshAsset, node::DecomposedTransform, skin::SkinAsset},
    scene::{MeshInstance, MorphInstance, NodeId, SceneGraph, SkinInstance},
};

use super::{document::Document, error::ParseError};

/// Place mesh primitives on their nodes. Primitives with morph targets get
/// weights from the node, falling back to the mesh defaults.
pub(crate) fn attach_meshes(
    document: &Document,
    scene: &mut SceneGraph,
    nodes: &[NodeId],
    meshes: &[MeshAsset],
) {
    for (node, id) in document.nodes.iter().zip(nodes) {
        let Some(mesh_index) = node.mesh else {
            continue;
        };
        let Some(mesh) = meshes.get(mesh_index) else {
            warn!("Node {} references missing mesh #{}", id, mesh_index);
            continue;
        };
        let weights = node.weights.as_ref().unwrap_or(&mesh.weights);
        let instances = mesh
            .primitives
            .iter()
            .enumerate()
            .map(|(primitive_index, primitive)| MeshInstance {
                mesh: mesh_index,
                primitive: primitive_index,
                morph: (!primitive.targets.is_empty()).then(|| {
                    let mut weights = weights.clone();
                    weights.resize(primitive.targets.len(), 0.0);
                    MorphInstance::new(weights)
                }),
            })
            .collect();
        if let Some(scene_node) = scene.node_mut(*id) {
            scene_node.mesh_instances = instances;
        }
    }
}

pub(crate) fn attach_skins(
    document: &Document,
    scene: &mut SceneGraph,
    nodes: &[NodeId],
    skins: &[SkinAsset],
) {
    for (node, id) in document.nodes.iter().zip(nodes) {
        let Some(skin_index) = node.skin else {
            continue;
        };
        let Some(skin) = skins.get(skin_index) else {
            warn!("Node {} references missing skin #{}", id, skin_index);
            continue;
        };
        if let Some(scene_node) = scene.node_mut(*id) {
            scene_node.skin = Some(SkinInstance {
                skin: skin_index,
                joints: skin.joints.clone(),
            });
        }
    }
}

/// Create the model root and hang the selected scene under it.
///
/// The scene is `preferred`, else the document's default scene, else the
/// first one. A document without scenes gets every parentless node.
pub(crate) fn build_root(
    document: &Document,
    scene: &mut SceneGraph,
    nodes: &[NodeId],
    preferred: Option<usize>,
) -> Result<NodeId, ParseError> {
    let exists = |index: &usize| *index < document.scenes.len();
    for index in [preferred, document.scene].into_iter().flatten() {
        if !exists(&index) {
            warn!("Scene #{} not found", index);
        }
    }
    let selected = preferred
        .filter(exists)
        .or(document.scene.filter(exists))
        .or((!document.scenes.is_empty()).then_some(0));

    let (name, children) = match selected {
        Some(index) => {
            let gltf_scene = &document.scenes[index];
            let children = gltf_scene
                .nodes
                .iter()
                .map(|node| {
                    nodes.get(*node).copied().ok_or(ParseError::MissingNode {
                        context: format!("scene #{}", index),
                        node: *node,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            (gltf_scene.name.clone(), children)
        }
        None => (None, scene.roots().collect()),
    };

    let root = scene.add_node(
        Some(name.unwrap_or_else(|| "root".to_string())),
        DecomposedTransform::default(),
    );
    for child in &children {
        scene.add_child(root, *child)?;
    }
    debug!("Model root {} has {} children", root, children.len());
    Ok(root)
}
