use log::{debug, warn};

use crate::{
    animation::{
        clip::AnimationClip,
        curve::{AnimationCurve, InterpolationType},
        keyable::{AnimationKeyable, KeyableType, KeyableValue},
        target::{AnimationTarget, SubProperty, TargetPath},
    },
    scene::{NodeId, SceneGraph},
};

use super::{
    accessor::decode_accessor,
    document::{Animation, AnimationChannel, Document},
    error::ParseError,
};

/// Key values of one channel, one chunk of `components` floats per value.
struct ChannelData {
    times: Vec<f32>,
    values: Vec<f32>,
    components: usize,
    interpolation: InterpolationType,
}

impl ChannelData {
    fn spline(&self) -> bool {
        self.interpolation == InterpolationType::CubicSplineGltf
    }

    /// In tangent, value and out tangent of key `key`, each the `width`
    /// components starting at `offset` within a value.
    fn key(&self, key: usize, offset: usize, width: usize) -> Option<[&[f32]; 3]> {
        let slice = |element: usize| {
            let start = element * self.components + offset;
            self.values.get(start..start + width)
        };
        if self.spline() {
            Some([slice(key * 3)?, slice(key * 3 + 1)?, slice(key * 3 + 2)?])
        } else {
            let value = slice(key)?;
            Some([value, value, value])
        }
    }

    fn curve(&self, name: String, keyable_type: KeyableType, offset: usize) -> AnimationCurve {
        let mut curve = AnimationCurve::new(name, keyable_type, self.interpolation);
        let width = keyable_type.components();
        for (key, time) in self.times.iter().enumerate() {
            let Some([in_tangent, value, out_tangent]) = self.key(key, offset, width) else {
                warn!("Curve {} is missing the value of key {}", curve.name(), key);
                break;
            };
            let Some(value) = KeyableValue::from_slice(keyable_type, value) else {
                break;
            };
            let keyable = if self.spline() {
                match (
                    KeyableValue::from_slice(keyable_type, in_tangent),
                    KeyableValue::from_slice(keyable_type, out_tangent),
                ) {
                    (Some(in_tangent), Some(out_tangent)) => {
                        AnimationKeyable::with_tangents(*time, value, in_tangent, out_tangent)
                    }
                    _ => AnimationKeyable::new(*time, value),
                }
            } else {
                AnimationKeyable::new(*time, value)
            };
            curve.insert_keyable(keyable);
        }
        curve
    }
}

fn path_type(path: TargetPath) -> KeyableType {
    match path {
        TargetPath::LocalRotation => KeyableType::Quat,
        TargetPath::Weights => KeyableType::Num,
        _ => KeyableType::Vec,
    }
}

pub(crate) struct AnimationTranslator<'a> {
    document: &'a Document,
    buffers: &'a [Vec<u8>],
    scene: &'a SceneGraph,
    nodes: &'a [NodeId],
}

impl<'a> AnimationTranslator<'a> {
    pub(crate) fn new(
        document: &'a Document,
        buffers: &'a [Vec<u8>],
        scene: &'a SceneGraph,
        nodes: &'a [NodeId],
    ) -> Self {
        Self {
            document,
            buffers,
            scene,
            nodes,
        }
    }

    fn channel_data(
        &self,
        animation: &Animation,
        channel: &AnimationChannel,
    ) -> Option<ChannelData> {
        let Some(sampler) = animation.samplers.get(channel.sampler) else {
            warn!("Animation sampler #{} not found", channel.sampler);
            return None;
        };
        let interpolation = match sampler.interpolation.as_deref() {
            None => InterpolationType::Linear,
            Some(name) => InterpolationType::from_gltf(name).unwrap_or_else(|| {
                warn!("Unknown interpolation {}, using LINEAR", name);
                InterpolationType::Linear
            }),
        };
        let times = decode_accessor(self.document, self.buffers, sampler.input)?.to_f32();
        let values = decode_accessor(self.document, self.buffers, sampler.output)?.to_f32();
        if times.is_empty() {
            warn!("Animation sampler #{} has no keys", channel.sampler);
            return None;
        }
        let mut components = values.len() / times.len();
        if interpolation == InterpolationType::CubicSplineGltf {
            components /= 3;
        }
        if components == 0 {
            warn!("Animation sampler #{} has no values", channel.sampler);
            return None;
        }
        Some(ChannelData {
            times,
            values,
            components,
            interpolation,
        })
    }

    fn node_label(&self, node: NodeId) -> String {
        self.scene
            .node(node)
            .and_then(|node| node.name())
            .map(str::to_string)
            .unwrap_or_else(|| node.index().to_string())
    }

    /// Curves of one channel. Morph weights fan out into one curve per
    /// target.
    fn channel_curves(
        &self,
        animation: &Animation,
        channel: &AnimationChannel,
        node: NodeId,
        path: TargetPath,
    ) -> Vec<AnimationCurve> {
        let Some(data) = self.channel_data(animation, channel) else {
            return Vec::new();
        };
        let label = self.node_label(node);

        if path == TargetPath::Weights {
            return (0..data.components)
                .map(|morph| {
                    let mut curve = data.curve(
                        format!("{}.{}.{}", label, path, SubProperty::Morph(morph)),
                        KeyableType::Num,
                        morph,
                    );
                    curve.add_target(AnimationTarget::with_sub_property(
                        node,
                        path,
                        SubProperty::Morph(morph),
                    ));
                    curve
                })
                .collect();
        }

        let detected = KeyableType::from_components(data.components).unwrap_or_else(|| {
            warn!(
                "Unexpected {} components per key on {}.{}, reading as numbers",
                data.components, label, path
            );
            KeyableType::Num
        });
        let keyable_type = path_type(path);
        if detected != keyable_type {
            warn!(
                "Channel {}.{} has {} keys, reading as {}",
                label, path, detected, keyable_type
            );
        }
        let mut curve = data.curve(format!("{}.{}", label, path), keyable_type, 0);
        curve.add_target(AnimationTarget::new(node, path));
        vec![curve]
    }

    pub(crate) fn load_animation(
        &self,
        index: usize,
        animation: &Animation,
    ) -> Result<AnimationClip, ParseError> {
        let name = animation
            .name
            .clone()
            .unwrap_or_else(|| format!("animation_{}", index));
        let mut clip = AnimationClip::new(name);
        for channel in &animation.channels {
            let Some(node_index) = channel.target.node else {
                warn!("Skipping channel without a node in {}", clip.name());
                continue;
            };
            let Some(node) = self.nodes.get(node_index).copied() else {
                return Err(ParseError::MissingNode {
                    context: format!("animation {}", clip.name()),
                    node: node_index,
                });
            };
            let Some(path) = TargetPath::from_gltf(&channel.target.path) else {
                warn!(
                    "Skipping channel with unsupported path {} in {}",
                    channel.target.path,
                    clip.name()
                );
                continue;
            };
            for curve in self.channel_curves(animation, channel, node, path) {
                clip.add_curve(curve);
            }
        }
        debug!(
            "Loaded animation {} with {} curves over {}s",
            clip.name(),
            clip.curves().len(),
            clip.duration()
        );
        Ok(clip)
    }

    pub(crate) fn load_animations(&self) -> Result<Vec<AnimationClip>, ParseError> {
        self.document
            .animations
            .iter()
            .enumerate()
            .map(|(index, animation)| self.load_animation(index, animation))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use glam::{Quat, Vec3};
    use serde_json::json;

    use crate::asset::node::DecomposedTransform;

    use super::*;

    fn floats(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|value| value.to_le_bytes()).collect()
    }

    fn setup(interpolation: &str, output: &[f32], path: &str) -> (Document, Vec<Vec<u8>>) {
        let mut buffer = floats(&[0.0, 1.0]);
        buffer.extend(floats(output));
        let document = serde_json::from_value(json!({
            "bufferViews": [
                {"buffer": 0, "byteLength": 8},
                {"buffer": 0, "byteOffset": 8, "byteLength": output.len() * 4}
            ],
            "accessors": [
                {"bufferView": 0, "componentType": 5126, "count": 2, "type": "SCALAR"},
                {"bufferView": 1, "componentType": 5126, "count": output.len(), "type": "SCALAR"}
            ],
            "animations": [{
                "channels": [{"sampler": 0, "target": {"node": 0, "path": path}}],
                "samplers": [{"input": 0, "output": 1, "interpolation": interpolation}]
            }]
        }))
        .unwrap();
        (document, vec![buffer])
    }

    fn scene() -> (SceneGraph, Vec<NodeId>) {
        let mut scene = SceneGraph::new();
        let node = scene.add_node(Some("hips".to_string()), DecomposedTransform::default());
        (scene, vec![node])
    }

    #[test]
    fn test_translation_channel() {
        let (document, buffers) = setup("LINEAR", &[0.0, 0.0, 0.0, 2.0, 4.0, 6.0], "translation");
        let (scene, nodes) = scene();
        let clips = AnimationTranslator::new(&document, &buffers, &scene, &nodes)
            .load_animations()
            .unwrap();
        let clip = &clips[0];
        assert_eq!(clip.name(), "animation_0");
        assert_eq!(clip.duration(), 1.0);
        let curve = clip.curve("hips.localPosition").unwrap();
        assert_eq!(curve.keyable_type(), KeyableType::Vec);
        assert_eq!(curve.targets()[0].path(), TargetPath::LocalPosition);
        let value = curve.eval(0.5).unwrap().value;
        assert_eq!(value, KeyableValue::Vec(Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_rotation_step_channel() {
        let half = std::f32::consts::FRAC_1_SQRT_2;
        let (document, buffers) = setup(
            "STEP",
            &[0.0, 0.0, 0.0, 1.0, 0.0, half, 0.0, half],
            "rotation",
        );
        let (scene, nodes) = scene();
        let clips = AnimationTranslator::new(&document, &buffers, &scene, &nodes)
            .load_animations()
            .unwrap();
        let curve = clips[0].curve("hips.localRotation").unwrap();
        assert_eq!(curve.interpolation(), InterpolationType::Step);
        assert_eq!(curve.eval(0.9).unwrap().value, KeyableValue::Quat(Quat::IDENTITY));
    }

    #[test]
    fn test_spline_weights_channel() {
        // Two morph targets, CUBICSPLINE: [in, value, out] per key
        let (document, buffers) = setup(
            "CUBICSPLINE",
            &[
                0.0, 0.0, 0.1, 0.2, 0.0, 0.0, //
                0.0, 0.0, 0.7, 0.8, 0.0, 0.0,
            ],
            "weights",
        );
        let (scene, nodes) = scene();
        let clips = AnimationTranslator::new(&document, &buffers, &scene, &nodes)
            .load_animations()
            .unwrap();
        let clip = &clips[0];
        assert_eq!(clip.curves().len(), 2);
        let second = clip.curve("hips.weights.1").unwrap();
        assert_eq!(
            second.targets()[0].sub_property(),
            Some(SubProperty::Morph(1))
        );
        assert_eq!(second.keys()[0].value, KeyableValue::Num(0.2));
        assert_eq!(second.keys()[1].value, KeyableValue::Num(0.8));
        assert_eq!(second.keys()[1].in_tangent, Some(KeyableValue::Num(0.0)));
        assert_eq!(second.eval(1.0).unwrap().value, KeyableValue::Num(0.8));
    }

    #[test]
    fn test_channel_node_rules() {
        let (mut document, buffers) = setup("LINEAR", &[0.0; 6], "scale");
        document.animations[0].channels[0].target.node = None;
        let (scene, nodes) = scene();
        let clips = AnimationTranslator::new(&document, &buffers, &scene, &nodes)
            .load_animations()
            .unwrap();
        assert!(clips[0].curves().is_empty());

        document.animations[0].channels[0].target.node = Some(5);
        assert!(matches!(
            AnimationTranslator::new(&document, &buffers, &scene, &nodes).load_animations(),
            Err(ParseError::MissingNode { node: 5, .. })
        ));
    }
}
