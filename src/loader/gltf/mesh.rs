use std::{collections::HashMap, sync::Arc};

use glam::Vec3;
use log::{debug, warn};

use crate::{
    asset::{
        material::MaterialAsset,
        mesh::MeshAsset,
        normal::calculate_normal,
        primitive::{
            BoundingBox, PrimitiveAsset, PrimitiveAssetAttributes, PrimitiveAssetMode,
            PrimitiveAssetMorphTarget, PrimitiveIndices,
        },
    },
    loader::{chunk_and_pad_vec3_to_vec4_f32, chunk_vec2, chunk_vec3, chunk_vec4},
};

use super::{
    accessor::{decode_accessor, element_size},
    buffer::buffer_view_bytes,
    compression::{CompressedMeshDecoder, DecodedGeometry, KHR_DRACO_MESH_COMPRESSION},
    document::{Document, DracoExtension, Mesh, Primitive},
};

/// Where the vertex data of one primitive comes from.
enum Geometry<'g> {
    Direct,
    Compressed {
        geometry: &'g dyn DecodedGeometry,
        ids: &'g HashMap<String, u32>,
    },
    /// Compressed data that could not be decoded.
    Empty,
}

fn default_components(semantic: &str) -> usize {
    match semantic {
        "TEXCOORD_0" | "TEXCOORD_1" => 2,
        "POSITION" | "NORMAL" => 3,
        _ => 4,
    }
}

fn pack_indices(indices: Vec<u32>, point_count: usize) -> PrimitiveIndices {
    if point_count <= u16::MAX as usize && indices.iter().all(|index| *index <= u16::MAX as u32) {
        PrimitiveIndices::U16(indices.into_iter().map(|index| index as u16).collect())
    } else {
        PrimitiveIndices::U32(indices)
    }
}

/// Drop `data` with a warning unless it has one item per vertex.
fn per_vertex<T>(semantic: &str, data: Vec<T>, vertex_count: usize) -> Option<Vec<T>> {
    if data.len() == vertex_count {
        Some(data)
    } else {
        warn!(
            "Dropping {} with {} items for {} vertices",
            semantic,
            data.len(),
            vertex_count
        );
        None
    }
}

pub(crate) struct MeshBuilder<'a> {
    document: &'a Document,
    buffers: &'a [Vec<u8>],
    decoder: Option<&'a dyn CompressedMeshDecoder>,
    materials: &'a [Arc<MaterialAsset>],
    default_material: &'a Arc<MaterialAsset>,
}

impl<'a> MeshBuilder<'a> {
    pub(crate) fn new(
        document: &'a Document,
        buffers: &'a [Vec<u8>],
        decoder: Option<&'a dyn CompressedMeshDecoder>,
        materials: &'a [Arc<MaterialAsset>],
        default_material: &'a Arc<MaterialAsset>,
    ) -> Self {
        Self {
            document,
            buffers,
            decoder,
            materials,
            default_material,
        }
    }

    fn accessor_f32(&self, index: usize) -> Option<(Vec<f32>, usize)> {
        let accessor = decode_accessor(self.document, self.buffers, index)?;
        Some((accessor.to_f32(), accessor.element_size))
    }

    /// Flattened components of `semantic` and the number of components per
    /// vertex.
    fn attribute(
        &self,
        primitive: &Primitive,
        geometry: &Geometry,
        semantic: &str,
    ) -> Option<(Vec<f32>, usize)> {
        match geometry {
            Geometry::Direct => self.accessor_f32(*primitive.attributes.get(semantic)?),
            Geometry::Compressed { geometry, ids } => {
                let data = geometry.attribute(*ids.get(semantic)?)?;
                let components = primitive
                    .attributes
                    .get(semantic)
                    .and_then(|index| self.document.accessors.get(*index))
                    .map(|accessor| element_size(&accessor.kind))
                    .unwrap_or_else(|| default_components(semantic));
                Some((data, components))
            }
            Geometry::Empty => None,
        }
    }

    fn attribute_with<T>(
        &self,
        primitive: &Primitive,
        geometry: &Geometry,
        semantic: &str,
        components: usize,
        chunk: impl Fn(&[f32]) -> Vec<T>,
    ) -> Option<Vec<T>> {
        let (data, actual) = self.attribute(primitive, geometry, semantic)?;
        if actual != components {
            warn!(
                "Dropping {} with {} components, expected {}",
                semantic, actual, components
            );
            return None;
        }
        Some(chunk(&data))
    }

    fn indices(&self, primitive: &Primitive, geometry: &Geometry) -> Option<Vec<u32>> {
        match geometry {
            Geometry::Direct => {
                let index = primitive.indices?;
                let accessor = decode_accessor(self.document, self.buffers, index)?;
                let indices = accessor.to_u32();
                if indices.is_none() {
                    warn!("Index accessor #{} is not unsigned", index);
                }
                indices
            }
            Geometry::Compressed { geometry, .. } => Some(geometry.face_indices()),
            Geometry::Empty => None,
        }
    }

    fn bounds(&self, primitive: &Primitive) -> BoundingBox {
        let accessor = primitive
            .attributes
            .get("POSITION")
            .and_then(|index| self.document.accessors.get(*index));
        match accessor.and_then(|accessor| accessor.min.as_deref().zip(accessor.max.as_deref())) {
            Some(([min_x, min_y, min_z, ..], [max_x, max_y, max_z, ..])) => BoundingBox::from_min_max(
                Vec3::new(*min_x, *min_y, *min_z),
                Vec3::new(*max_x, *max_y, *max_z),
            ),
            _ => BoundingBox::default(),
        }
    }

    fn morph_target(
        &self,
        target: &HashMap<String, usize>,
        vertex_count: usize,
    ) -> PrimitiveAssetMorphTarget {
        let read = |semantic: &str| {
            target
                .get(semantic)
                .and_then(|index| self.accessor_f32(*index))
                .and_then(|(data, components)| {
                    if components == 3 {
                        per_vertex(semantic, chunk_vec3(&data), vertex_count)
                    } else {
                        warn!("Dropping morph {} with {} components", semantic, components);
                        None
                    }
                })
                .unwrap_or_default()
        };
        PrimitiveAssetMorphTarget {
            position: read("POSITION"),
            normal: read("NORMAL"),
            tangent: read("TANGENT"),
        }
    }

    fn build_attributes(
        &self,
        primitive: &Primitive,
        geometry: &Geometry,
        mode: PrimitiveAssetMode,
        indices: Option<&[u32]>,
    ) -> PrimitiveAssetAttributes {
        let position = self
            .attribute_with(primitive, geometry, "POSITION", 3, chunk_vec3)
            .unwrap_or_default();
        let vertex_count = position.len();

        let normal = self
            .attribute_with(primitive, geometry, "NORMAL", 3, chunk_vec3)
            .and_then(|normal| per_vertex("NORMAL", normal, vertex_count))
            .unwrap_or_else(|| {
                if mode.is_triangles() && vertex_count > 0 {
                    calculate_normal(mode, &position, indices)
                } else {
                    Vec::new()
                }
            });

        let tangent = self
            .attribute_with(primitive, geometry, "TANGENT", 4, chunk_vec4)
            .and_then(|tangent| per_vertex("TANGENT", tangent, vertex_count))
            .unwrap_or_default();

        // Sets stay in slot order, so an unusable set hides the ones after it
        const TEX_COORD_SETS: [&str; 2] = ["TEXCOORD_0", "TEXCOORD_1"];
        let mut tex_coord = Vec::new();
        for (set, semantic) in TEX_COORD_SETS.iter().enumerate() {
            let Some(data) = self
                .attribute_with(primitive, geometry, semantic, 2, chunk_vec2)
                .and_then(|data| per_vertex(semantic, data, vertex_count))
            else {
                for skipped in TEX_COORD_SETS[set + 1..]
                    .iter()
                    .filter(|skipped| primitive.attributes.contains_key(**skipped))
                {
                    warn!("Skipping {} after unusable {}", skipped, semantic);
                }
                break;
            };
            tex_coord.push(data);
        }

        let color = self
            .attribute(primitive, geometry, "COLOR_0")
            .and_then(|(data, components)| match components {
                3 => Some(chunk_and_pad_vec3_to_vec4_f32(&data)),
                4 => Some(chunk_vec4(&data)),
                _ => {
                    warn!("Dropping COLOR_0 with {} components", components);
                    None
                }
            })
            .and_then(|color| per_vertex("COLOR_0", color, vertex_count))
            .into_iter()
            .collect();

        let joints = self
            .attribute_with(primitive, geometry, "JOINTS_0", 4, |data| {
                chunk_vec4(&data.iter().map(|joint| *joint as u16).collect::<Vec<_>>())
            })
            .and_then(|joints| per_vertex("JOINTS_0", joints, vertex_count));
        let weights = self
            .attribute_with(primitive, geometry, "WEIGHTS_0", 4, chunk_vec4)
            .and_then(|weights| per_vertex("WEIGHTS_0", weights, vertex_count));
        let (joints, weights) = match (joints, weights) {
            (Some(joints), Some(weights)) => (vec![joints], vec![weights]),
            (None, None) => (Vec::new(), Vec::new()),
            _ => {
                warn!("Dropping unpaired JOINTS_0 and WEIGHTS_0");
                (Vec::new(), Vec::new())
            }
        };

        PrimitiveAssetAttributes {
            position,
            normal,
            tangent,
            tex_coord,
            color,
            joints,
            weights,
        }
    }

    fn decode_compressed(&self, draco: &DracoExtension) -> Option<Box<dyn DecodedGeometry>> {
        let decoder = self.decoder?;
        let Some(data) = buffer_view_bytes(self.document, self.buffers, draco.buffer_view) else {
            warn!(
                "Compressed buffer view #{} is out of bounds",
                draco.buffer_view
            );
            return None;
        };
        match decoder.decode_buffer(data) {
            Ok(geometry) => Some(geometry),
            Err(error) => {
                warn!("Failed to decode compressed primitive: {}", error);
                None
            }
        }
    }

    pub(crate) fn build_primitive(&self, mesh: usize, primitive: &Primitive) -> PrimitiveAsset {
        let mode = match primitive.mode {
            None => PrimitiveAssetMode::TriangleList,
            Some(code) => PrimitiveAssetMode::from_code(code).unwrap_or_else(|| {
                warn!("Mesh #{} has unknown primitive mode {}", mesh, code);
                PrimitiveAssetMode::TriangleList
            }),
        };

        let decoded = match &primitive.extensions.draco {
            Some(_) if self.decoder.is_none() => {
                warn!(
                    "Mesh #{} uses {} but no mesh decoder is set, reading accessors instead",
                    mesh, KHR_DRACO_MESH_COMPRESSION
                );
                None
            }
            Some(draco) => Some(self.decode_compressed(draco)),
            None => None,
        };
        let geometry = match (&decoded, &primitive.extensions.draco) {
            (Some(Some(geometry)), Some(draco)) => Geometry::Compressed {
                geometry: geometry.as_ref(),
                ids: &draco.attributes,
            },
            (Some(None), _) => Geometry::Empty,
            _ => Geometry::Direct,
        };

        let indices = self.indices(primitive, &geometry);
        let attributes = self.build_attributes(primitive, &geometry, mode, indices.as_deref());
        let vertex_count = attributes.vertex_count();
        let point_count = match &geometry {
            Geometry::Compressed { geometry, .. } => geometry.point_count(),
            _ => vertex_count,
        };

        let material = match primitive.material {
            Some(index) => match self.materials.get(index) {
                Some(material) => material.clone(),
                None => {
                    warn!("Mesh #{} references missing material #{}", mesh, index);
                    self.default_material.clone()
                }
            },
            None => self.default_material.clone(),
        };

        PrimitiveAsset {
            targets: primitive
                .targets
                .iter()
                .map(|target| self.morph_target(target, vertex_count))
                .collect(),
            indices: indices.map(|indices| pack_indices(indices, point_count)),
            attributes,
            material_index: primitive.material.filter(|index| *index < self.materials.len()),
            material,
            mode,
            bounds: self.bounds(primitive),
        }
    }

    pub(crate) fn build_mesh(&self, index: usize, mesh: &Mesh) -> MeshAsset {
        let primitives: Vec<_> = mesh
            .primitives
            .iter()
            .map(|primitive| self.build_primitive(index, primitive))
            .collect();
        debug!(
            "Built mesh #{} with {} primitives",
            index,
            primitives.len()
        );
        MeshAsset {
            name: mesh.name.clone(),
            primitives,
            weights: mesh.weights.clone(),
        }
    }

    pub(crate) fn build_meshes(&self) -> Vec<MeshAsset> {
        self.document
            .meshes
            .iter()
            .enumerate()
            .map(|(index, mesh)| self.build_mesh(index, mesh))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::{super::compression::DecodeError, *};

    fn floats(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|value| value.to_le_bytes()).collect()
    }

    fn triangle_document(extra: serde_json::Value) -> (Document, Vec<Vec<u8>>) {
        let mut buffer = floats(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        buffer.extend(floats(&[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]));
        let mut value = json!({
            "bufferViews": [
                {"buffer": 0, "byteLength": 36},
                {"buffer": 0, "byteOffset": 36, "byteLength": 36}
            ],
            "accessors": [
                {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                 "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]},
                {"bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC3"}
            ]
        });
        if let (Some(value), Some(extra)) = (value.as_object_mut(), extra.as_object()) {
            value.extend(extra.clone());
        }
        (serde_json::from_value(value).unwrap(), vec![buffer])
    }

    #[test]
    fn test_direct_primitive() {
        let (document, buffers) = triangle_document(json!({
            "meshes": [{
                "primitives": [{"attributes": {"POSITION": 0, "COLOR_0": 1}, "targets": [{"POSITION": 1}]}],
                "weights": [0.5]
            }]
        }));
        let default_material = Arc::new(MaterialAsset::default());
        let meshes = MeshBuilder::new(&document, &buffers, None, &[], &default_material).build_meshes();
        let mesh = &meshes[0];
        assert_eq!(mesh.weights, vec![0.5]);
        let primitive = &mesh.primitives[0];
        assert_eq!(primitive.mode, PrimitiveAssetMode::TriangleList);
        assert_eq!(primitive.attributes.vertex_count(), 3);
        assert_eq!(primitive.material_index, None);
        assert!(primitive.indices.is_none());

        // Normals are synthesized from the single counter-clockwise face
        assert_eq!(primitive.attributes.normal, vec![[0.0, 0.0, 1.0]; 3]);
        // Vertex colors get an opaque alpha
        assert_eq!(primitive.attributes.color[0][0], [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(primitive.targets.len(), 1);
        assert_eq!(primitive.targets[0].position[2], [0.0, 0.0, 1.0]);
        assert!(primitive.targets[0].normal.is_empty());

        assert_eq!(primitive.bounds.center, Vec3::new(0.5, 0.5, 0.0));
        assert_eq!(primitive.bounds.half_extents, Vec3::new(0.5, 0.5, 0.0));
    }

    #[test]
    fn test_mismatched_attribute_dropped() {
        let (document, buffers) = triangle_document(json!({
            "meshes": [{"primitives": [{"attributes": {"POSITION": 0, "TEXCOORD_0": 1}, "mode": 0}]}]
        }));
        let default_material = Arc::new(MaterialAsset::default());
        let meshes = MeshBuilder::new(&document, &buffers, None, &[], &default_material).build_meshes();
        let primitive = &meshes[0].primitives[0];
        assert_eq!(primitive.mode, PrimitiveAssetMode::Points);
        assert!(primitive.attributes.tex_coord.is_empty());
        // Points get no synthesized normals
        assert!(primitive.attributes.normal.is_empty());
    }

    #[test]
    fn test_tex_coord_sets_keep_slots() {
        let (document, buffers) = triangle_document(json!({
            "accessors": [
                {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3"},
                {"bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC3"},
                {"bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC2"}
            ],
            "meshes": [{"primitives": [
                {"attributes": {"POSITION": 0, "TEXCOORD_0": 1, "TEXCOORD_1": 2}},
                {"attributes": {"POSITION": 0, "TEXCOORD_0": 2, "TEXCOORD_1": 2}}
            ]}]
        }));
        let default_material = Arc::new(MaterialAsset::default());
        let meshes = MeshBuilder::new(&document, &buffers, None, &[], &default_material).build_meshes();
        // A valid second set is not moved into the first slot
        assert!(meshes[0].primitives[0].attributes.tex_coord.is_empty());
        let tex_coord = &meshes[0].primitives[1].attributes.tex_coord;
        assert_eq!(tex_coord.len(), 2);
        assert_eq!(tex_coord[1][0], [1.0, 0.0]);
    }

    struct Quad;

    impl DecodedGeometry for Quad {
        fn point_count(&self) -> usize {
            4
        }

        fn attribute(&self, unique_id: u32) -> Option<Vec<f32>> {
            match unique_id {
                7 => Some(vec![
                    0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0,
                ]),
                _ => None,
            }
        }

        fn face_indices(&self) -> Vec<u32> {
            vec![0, 1, 2, 0, 2, 3]
        }
    }

    struct QuadDecoder {
        fail: bool,
    }

    impl CompressedMeshDecoder for QuadDecoder {
        fn decode_buffer(&self, data: &[u8]) -> Result<Box<dyn DecodedGeometry>, DecodeError> {
            if self.fail || data.is_empty() {
                Err(DecodeError::Malformed("test".to_string()))
            } else {
                Ok(Box::new(Quad))
            }
        }
    }

    fn compressed_document() -> (Document, Vec<Vec<u8>>) {
        triangle_document(json!({
            "meshes": [{"primitives": [{
                "attributes": {"POSITION": 0},
                "extensions": {
                    "KHR_draco_mesh_compression": {"bufferView": 1, "attributes": {"POSITION": 7}}
                }
            }]}]
        }))
    }

    #[test]
    fn test_compressed_primitive() {
        let (document, buffers) = compressed_document();
        let default_material = Arc::new(MaterialAsset::default());
        let decoder = QuadDecoder { fail: false };
        let meshes = MeshBuilder::new(&document, &buffers, Some(&decoder), &[], &default_material)
            .build_meshes();
        let primitive = &meshes[0].primitives[0];
        assert_eq!(primitive.attributes.vertex_count(), 4);
        assert_eq!(
            primitive.indices,
            Some(PrimitiveIndices::U16(vec![0, 1, 2, 0, 2, 3]))
        );
        assert_eq!(primitive.attributes.normal.len(), 4);
    }

    #[test]
    fn test_compressed_fallbacks() {
        let (document, buffers) = compressed_document();
        let default_material = Arc::new(MaterialAsset::default());

        // Decoder failure leaves the primitive empty
        let decoder = QuadDecoder { fail: true };
        let meshes = MeshBuilder::new(&document, &buffers, Some(&decoder), &[], &default_material)
            .build_meshes();
        let primitive = &meshes[0].primitives[0];
        assert_eq!(primitive.attributes.vertex_count(), 0);
        assert!(primitive.indices.is_none());

        // Without a decoder the accessors are read directly
        let meshes = MeshBuilder::new(&document, &buffers, None, &[], &default_material).build_meshes();
        assert_eq!(meshes[0].primitives[0].attributes.vertex_count(), 3);
    }

    #[test]
    fn test_pack_indices() {
        assert_eq!(pack_indices(vec![0, 1], 2), PrimitiveIndices::U16(vec![0, 1]));
        assert_eq!(
            pack_indices(vec![0, 70000], 70001),
            PrimitiveIndices::U32(vec![0, 70000])
        );
    }
}
