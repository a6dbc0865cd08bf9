//! Boundary to an external compressed mesh codec.
//!
//! The loader never decodes compressed geometry itself. It hands the bytes of
//! the extension's buffer view to a [`CompressedMeshDecoder`] and reads the
//! attributes back by their unique id.

use thiserror::Error;

pub const KHR_DRACO_MESH_COMPRESSION: &str = "KHR_draco_mesh_compression";

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed compressed mesh: {0}")]
    Malformed(String),
    #[error("unsupported compressed mesh: {0}")]
    Unsupported(String),
}

/// Geometry produced by a [`CompressedMeshDecoder`].
pub trait DecodedGeometry {
    fn point_count(&self) -> usize;

    /// Flattened float components of the attribute with `unique_id`.
    fn attribute(&self, unique_id: u32) -> Option<Vec<f32>>;

    /// Triangle list vertex indices.
    fn face_indices(&self) -> Vec<u32>;
}

pub trait CompressedMeshDecoder: Send + Sync {
    fn decode_buffer(&self, data: &[u8]) -> Result<Box<dyn DecodedGeometry>, DecodeError>;
}
