use std::sync::Arc;

use glam::Vec3;

use super::material::MaterialAsset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimitiveAssetMode {
    Points,
    LineList,
    LineLoop,
    LineStrip,
    #[default]
    TriangleList,
    TriangleStrip,
    TriangleFan,
}

impl PrimitiveAssetMode {
    /// Map a glTF primitive `mode` code.
    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => PrimitiveAssetMode::Points,
            1 => PrimitiveAssetMode::LineList,
            2 => PrimitiveAssetMode::LineLoop,
            3 => PrimitiveAssetMode::LineStrip,
            4 => PrimitiveAssetMode::TriangleList,
            5 => PrimitiveAssetMode::TriangleStrip,
            6 => PrimitiveAssetMode::TriangleFan,
            _ => return None,
        })
    }

    pub fn is_triangles(self) -> bool {
        matches!(
            self,
            PrimitiveAssetMode::TriangleList
                | PrimitiveAssetMode::TriangleStrip
                | PrimitiveAssetMode::TriangleFan
        )
    }
}

pub type Position = Vec<[f32; 3]>;
pub type Normal = Vec<[f32; 3]>;
pub type Tangent = Vec<[f32; 4]>;
pub type TexCoord = Vec<[f32; 2]>;
pub type VertexColor = Vec<[f32; 4]>;
pub type Joints = Vec<[u16; 4]>;
pub type Weights = Vec<[f32; 4]>;

#[derive(Debug, Clone, Default)]
pub struct PrimitiveAssetAttributes {
    pub position: Position,
    pub normal: Normal,
    pub tangent: Tangent,
    /// Texture coordinate sets by slot. Sets after the first unusable one are dropped.
    pub tex_coord: Vec<TexCoord>,
    pub color: Vec<VertexColor>,
    pub joints: Vec<Joints>,
    pub weights: Vec<Weights>,
}

impl PrimitiveAssetAttributes {
    pub fn vertex_count(&self) -> usize {
        self.position.len()
    }
}

/// Per-vertex deltas of one morph target.
#[derive(Debug, Clone, Default)]
pub struct PrimitiveAssetMorphTarget {
    pub position: Position,
    pub normal: Normal,
    pub tangent: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveIndices {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl PrimitiveIndices {
    pub fn len(&self) -> usize {
        match self {
            PrimitiveIndices::U16(indices) => indices.len(),
            PrimitiveIndices::U32(indices) => indices.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_u32(&self) -> Vec<u32> {
        match self {
            PrimitiveIndices::U16(indices) => indices.iter().map(|index| *index as u32).collect(),
            PrimitiveIndices::U32(indices) => indices.clone(),
        }
    }
}

/// Axis aligned bounds stored as center and half extents.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl BoundingBox {
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self {
            center: (min + max) * 0.5,
            half_extents: (max - min) * 0.5,
        }
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.half_extents
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.half_extents
    }
}

#[derive(Debug, Clone)]
pub struct PrimitiveAsset {
    pub attributes: PrimitiveAssetAttributes,
    pub indices: Option<PrimitiveIndices>,
    pub material: Arc<MaterialAsset>,
    /// Index of the material in the source document, `None` when the default
    /// material is used.
    pub material_index: Option<usize>,
    pub mode: PrimitiveAssetMode,
    pub targets: Vec<PrimitiveAssetMorphTarget>,
    pub bounds: BoundingBox,
}
