use glam::Mat4;
use log::warn;

use crate::{asset::skin::SkinAsset, loader::chunk_mat4, scene::NodeId};

use super::{
    accessor::decode_accessor,
    document::{Document, Skin},
    error::ParseError,
};

fn node(nodes: &[NodeId], index: usize, skin: usize) -> Result<NodeId, ParseError> {
    nodes.get(index).copied().ok_or(ParseError::MissingNode {
        context: format!("skin #{}", skin),
        node: index,
    })
}

pub(crate) fn load_skin(
    document: &Document,
    buffers: &[Vec<u8>],
    nodes: &[NodeId],
    index: usize,
    skin: &Skin,
) -> Result<SkinAsset, ParseError> {
    let joints = skin
        .joints
        .iter()
        .map(|joint| node(nodes, *joint, index))
        .collect::<Result<Vec<_>, _>>()?;
    let skeleton = skin
        .skeleton
        .map(|skeleton| node(nodes, skeleton, index))
        .transpose()?;

    let identity = || vec![Mat4::IDENTITY; joints.len()];
    let inverse_bind_matrices = match skin.inverse_bind_matrices {
        Some(accessor) => match decode_accessor(document, buffers, accessor) {
            Some(accessor) if accessor.element_size == 16 => {
                let matrices = chunk_mat4(&accessor.to_f32());
                if matrices.len() == joints.len() {
                    matrices
                } else {
                    warn!(
                        "Skin #{} has {} inverse bind matrices for {} joints",
                        index,
                        matrices.len(),
                        joints.len()
                    );
                    identity()
                }
            }
            _ => {
                warn!("Skin #{} has unreadable inverse bind matrices", index);
                identity()
            }
        },
        None => identity(),
    };

    Ok(SkinAsset {
        index,
        name: skin.name.clone(),
        inverse_bind_matrices,
        joints,
        skeleton,
    })
}

pub(crate) fn load_skins(
    document: &Document,
    buffers: &[Vec<u8>],
    nodes: &[NodeId],
) -> Result<Vec<SkinAsset>, ParseError> {
    document
        .skins
        .iter()
        .enumerate()
        .map(|(index, skin)| load_skin(document, buffers, nodes, index, skin))
        .collect()
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use crate::{asset::node::DecomposedTransform, scene::SceneGraph};

    use super::*;

    #[test]
    fn test_load_skins() {
        let mut matrix = Mat4::from_translation(glam::Vec3::X).to_cols_array().to_vec();
        matrix.extend(Mat4::IDENTITY.to_cols_array());
        let buffer: Vec<u8> = matrix.iter().flat_map(|value| value.to_le_bytes()).collect();
        let document: Document = serde_json::from_value(json!({
            "bufferViews": [{"buffer": 0, "byteLength": 128}],
            "accessors": [{"bufferView": 0, "componentType": 5126, "count": 2, "type": "MAT4"}],
            "skins": [
                {"joints": [0, 1], "inverseBindMatrices": 0, "skeleton": 0},
                {"joints": [1]},
                {"joints": [0], "inverseBindMatrices": 0}
            ]
        }))
        .unwrap();
        let mut scene = SceneGraph::new();
        let nodes = vec![
            scene.add_node(None, DecomposedTransform::default()),
            scene.add_node(None, DecomposedTransform::default()),
        ];
        let skins = load_skins(&document, &[buffer], &nodes).unwrap();
        assert_eq!(skins[0].joints, nodes);
        assert_eq!(skins[0].skeleton, Some(nodes[0]));
        assert_eq!(
            skins[0].inverse_bind_matrices[0],
            Mat4::from_translation(glam::Vec3::X)
        );
        assert_eq!(skins[1].inverse_bind_matrices, vec![Mat4::IDENTITY]);
        // Count mismatch falls back to identity
        assert_eq!(skins[2].inverse_bind_matrices, vec![Mat4::IDENTITY]);
    }

    #[test]
    fn test_missing_joint() {
        let document: Document =
            serde_json::from_value(json!({"skins": [{"joints": [4]}]})).unwrap();
        assert!(matches!(
            load_skins(&document, &[], &[]),
            Err(ParseError::MissingNode { node: 4, .. })
        ));
    }
}
