use std::fmt::{self, Display, Formatter};

use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::asset::node::DecomposedTransform;

use super::NodeId;

/// Morph weights of one mesh instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MorphInstance {
    weights: Vec<f32>,
}

impl MorphInstance {
    pub fn new(weights: Vec<f32>) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn weight(&self, index: usize) -> f32 {
        self.weights.get(index).copied().unwrap_or(0.0)
    }

    /// Set one weight, growing the weight list with zeros when needed.
    pub fn set_weight(&mut self, index: usize, weight: f32) {
        if index >= self.weights.len() {
            self.weights.resize(index + 1, 0.0);
        }
        self.weights[index] = weight;
    }
}

/// One primitive of a mesh placed on a node.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshInstance {
    /// Index into the model's meshes.
    pub mesh: usize,
    /// Index into the primitives of that mesh.
    pub primitive: usize,
    pub morph: Option<MorphInstance>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkinInstance {
    /// Index into the model's skins.
    pub skin: usize,
    pub joints: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    id: NodeId,
    name: Option<String>,
    transform: DecomposedTransform,
    pub(super) parent: Option<NodeId>,
    pub(super) children: Vec<NodeId>,
    pub mesh_instances: Vec<MeshInstance>,
    pub skin: Option<SkinInstance>,
}

impl SceneNode {
    pub(super) fn new(id: NodeId, name: Option<String>, transform: DecomposedTransform) -> Self {
        Self {
            id,
            name,
            transform,
            parent: None,
            children: Vec::new(),
            mesh_instances: Vec::new(),
            skin: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn transform(&self) -> &DecomposedTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: DecomposedTransform) {
        self.transform = transform;
    }

    pub fn local_matrix(&self) -> Mat4 {
        self.transform.into()
    }

    pub fn local_position(&self) -> Vec3 {
        self.transform.translation
    }

    pub fn set_local_position(&mut self, position: Vec3) {
        self.transform.translation = position;
    }

    pub fn local_rotation(&self) -> Quat {
        self.transform.rotation
    }

    pub fn set_local_rotation(&mut self, rotation: Quat) {
        self.transform.rotation = rotation.normalize();
    }

    pub fn local_scale(&self) -> Vec3 {
        self.transform.scale
    }

    pub fn set_local_scale(&mut self, scale: Vec3) {
        self.transform.scale = scale;
    }

    /// Local rotation as XYZ Euler angles in degrees.
    pub fn local_euler_angles(&self) -> Vec3 {
        let (x, y, z) = self.transform.rotation.to_euler(EulerRot::XYZ);
        Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
    }

    pub fn set_local_euler_angles(&mut self, degrees: Vec3) {
        self.transform.rotation = Quat::from_euler(
            EulerRot::XYZ,
            degrees.x.to_radians(),
            degrees.y.to_radians(),
            degrees.z.to_radians(),
        );
    }

    pub fn morph_instances_mut(&mut self) -> impl Iterator<Item = &mut MorphInstance> {
        self.mesh_instances
            .iter_mut()
            .filter_map(|instance| instance.morph.as_mut())
    }
}

impl Display for SceneNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({})", self.id, name),
            None => write!(f, "{}", self.id),
        }
    }
}
