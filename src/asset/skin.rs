use glam::Mat4;

use crate::scene::NodeId;

#[derive(Debug, Clone)]
pub struct SkinAsset {
    pub index: usize,
    pub name: Option<String>,
    /// One matrix per joint. Identity matrices are used when the source
    /// document has none.
    pub inverse_bind_matrices: Vec<Mat4>,
    pub joints: Vec<NodeId>,
    pub skeleton: Option<NodeId>,
}
