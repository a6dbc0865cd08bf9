use std::{
    collections::HashMap,
    fmt::{self, Display, Formatter},
};

use glam::{Quat, Vec3};
use log::{trace, warn};

use crate::scene::{NodeId, SceneGraph};

use super::keyable::{Interpolate, KeyableValue};

/// Node property a curve writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetPath {
    LocalPosition,
    LocalRotation,
    LocalScale,
    /// Rotation viewed as XYZ Euler angles in degrees.
    LocalEulerAngles,
    Weights,
}

impl TargetPath {
    /// Map a glTF channel path.
    pub fn from_gltf(path: &str) -> Option<Self> {
        match path {
            "translation" => Some(TargetPath::LocalPosition),
            "rotation" => Some(TargetPath::LocalRotation),
            "scale" => Some(TargetPath::LocalScale),
            "weights" => Some(TargetPath::Weights),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TargetPath::LocalPosition => "localPosition",
            TargetPath::LocalRotation => "localRotation",
            TargetPath::LocalScale => "localScale",
            TargetPath::LocalEulerAngles => "localEulerAngles",
            TargetPath::Weights => "weights",
        }
    }
}

impl Display for TargetPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Component of a property a curve writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubProperty {
    X,
    Y,
    Z,
    W,
    /// Weight of one morph target.
    Morph(usize),
}

impl SubProperty {
    fn axis(self) -> Option<usize> {
        match self {
            SubProperty::X => Some(0),
            SubProperty::Y => Some(1),
            SubProperty::Z => Some(2),
            SubProperty::W => Some(3),
            SubProperty::Morph(_) => None,
        }
    }
}

impl Display for SubProperty {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SubProperty::X => f.write_str("x"),
            SubProperty::Y => f.write_str("y"),
            SubProperty::Z => f.write_str("z"),
            SubProperty::W => f.write_str("w"),
            SubProperty::Morph(index) => write!(f, "{}", index),
        }
    }
}

/// Binding of a curve to one node property.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationTarget {
    node: NodeId,
    path: TargetPath,
    sub_property: Option<SubProperty>,
    retarget_scale: Option<Vec3>,
}

impl AnimationTarget {
    pub fn new(node: NodeId, path: TargetPath) -> Self {
        Self {
            node,
            path,
            sub_property: None,
            retarget_scale: None,
        }
    }

    pub fn with_sub_property(node: NodeId, path: TargetPath, sub_property: SubProperty) -> Self {
        Self {
            sub_property: Some(sub_property),
            ..Self::new(node, path)
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn set_node(&mut self, node: NodeId) {
        self.node = node;
    }

    pub fn path(&self) -> TargetPath {
        self.path
    }

    pub fn sub_property(&self) -> Option<SubProperty> {
        self.sub_property
    }

    pub fn retarget_scale(&self) -> Option<Vec3> {
        self.retarget_scale
    }

    pub fn set_retarget_scale(&mut self, scale: Option<Vec3>) {
        self.retarget_scale = scale;
    }

    /// Write `value` onto the bound property.
    pub fn update_to_target(&self, value: &KeyableValue, scene: &mut SceneGraph) {
        self.write(value, 1.0, scene)
    }

    /// Blend the bound property towards `value` by `p`. Weights outside
    /// `(0, 1]` leave the property untouched.
    pub fn blend_to_target(&self, value: &KeyableValue, p: f32, scene: &mut SceneGraph) {
        if !(p > 0.0 && p <= 1.0) {
            return;
        }
        self.write(value, p, scene)
    }

    fn scaled(&self, value: KeyableValue) -> KeyableValue {
        let (TargetPath::LocalPosition, Some(scale)) = (self.path, self.retarget_scale) else {
            return value;
        };
        match (value, self.sub_property.and_then(SubProperty::axis)) {
            (KeyableValue::Vec(position), None) => KeyableValue::Vec(position * scale),
            (KeyableValue::Num(component), Some(axis)) if axis < 3 => {
                KeyableValue::Num(component * scale[axis])
            }
            (value, _) => value,
        }
    }

    fn write(&self, value: &KeyableValue, p: f32, scene: &mut SceneGraph) {
        let value = self.scaled(*value);
        let Some(node) = scene.node_mut(self.node) else {
            warn!("Animation target node {} not found", self.node);
            return;
        };
        trace!("Write {:?} to {}.{}", value, self.node, self.path);

        let written = match self.path {
            TargetPath::LocalPosition => blend_vec3(node.local_position(), value, self.sub_property, p)
                .map(|position| node.set_local_position(position)),
            TargetPath::LocalScale => blend_vec3(node.local_scale(), value, self.sub_property, p)
                .map(|scale| node.set_local_scale(scale)),
            TargetPath::LocalEulerAngles => {
                blend_vec3(node.local_euler_angles(), value, self.sub_property, p)
                    .map(|angles| node.set_local_euler_angles(angles))
            }
            TargetPath::LocalRotation => {
                blend_quat(node.local_rotation(), value, self.sub_property, p)
                    .map(|rotation| node.set_local_rotation(rotation))
            }
            TargetPath::Weights => match (self.sub_property, value) {
                (Some(SubProperty::Morph(index)), KeyableValue::Num(weight)) => {
                    for morph in node.morph_instances_mut() {
                        let current = morph.weight(index);
                        morph.set_weight(index, Interpolate::linear(current, weight, p));
                    }
                    Some(())
                }
                _ => None,
            },
        };
        if written.is_none() {
            warn!(
                "Cannot write {} value to {}.{}{}",
                value.keyable_type(),
                self.node,
                self.path,
                self.sub_property
                    .map(|sub| format!(".{}", sub))
                    .unwrap_or_default()
            );
        }
    }
}

fn blend_vec3(
    current: Vec3,
    value: KeyableValue,
    sub_property: Option<SubProperty>,
    p: f32,
) -> Option<Vec3> {
    match (value, sub_property.map(SubProperty::axis)) {
        (KeyableValue::Vec(value), None) => Some(current.lerp(value, p)),
        (KeyableValue::Num(value), Some(Some(axis))) if axis < 3 => {
            let mut result = current;
            result[axis] = Interpolate::linear(current[axis], value, p);
            Some(result)
        }
        _ => None,
    }
}

fn blend_quat(
    current: Quat,
    value: KeyableValue,
    sub_property: Option<SubProperty>,
    p: f32,
) -> Option<Quat> {
    match (value, sub_property.map(SubProperty::axis)) {
        (KeyableValue::Quat(value), None) => Some(current.slerp(value, p)),
        (KeyableValue::Num(value), Some(Some(axis))) => {
            let mut components = current.to_array();
            components[axis] = Interpolate::linear(components[axis], value, p);
            Some(Quat::from_array(components))
        }
        _ => None,
    }
}

/// Named nodes under `root` with the product of local scales from `root`
/// down to each of them. The first node with a given name wins.
pub fn retarget_table(scene: &SceneGraph, root: NodeId) -> HashMap<String, (NodeId, Vec3)> {
    let mut table = HashMap::new();
    let mut stack = match scene.node(root) {
        Some(node) => vec![(root, node.local_scale())],
        None => Vec::new(),
    };
    while let Some((id, scale)) = stack.pop() {
        let Some(node) = scene.node(id) else {
            continue;
        };
        if let Some(name) = node.name() {
            table.entry(name.to_string()).or_insert((id, scale));
        }
        for child in node.children().iter().rev() {
            if let Some(child_node) = scene.node(*child) {
                stack.push((*child, scale * child_node.local_scale()));
            }
        }
    }
    table
}
