use log::{debug, warn};

use crate::scene::{NodeId, SceneGraph};

use super::{
    curve::{AnimationCurve, InterpolationType},
    keyable::{AnimationKeyable, KeyableType, KeyableValue},
    target::{retarget_table, AnimationTarget, TargetPath},
};

/// Last resolved key index of every curve of a playable.
#[derive(Debug, Clone, Default)]
pub struct EvalCache {
    cursors: Vec<usize>,
}

impl EvalCache {
    pub fn cursor(&mut self, curve: usize) -> &mut usize {
        if curve >= self.cursors.len() {
            self.cursors.resize(curve + 1, 0);
        }
        &mut self.cursors[curve]
    }

    pub fn reset(&mut self) {
        self.cursors.clear();
    }
}

/// Values of every curve of a playable at one time, indexed like its curves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipSnapshot {
    pub time: f32,
    pub keyables: Vec<Option<AnimationKeyable>>,
}

impl ClipSnapshot {
    pub fn get(&self, curve: usize) -> Option<&AnimationKeyable> {
        self.keyables.get(curve).and_then(Option::as_ref)
    }
}

/// Evaluate `curves` into `snapshot`, reusing its storage.
pub(crate) fn eval_curves_into(
    curves: &[AnimationCurve],
    time: f32,
    cache: &mut EvalCache,
    snapshot: &mut ClipSnapshot,
) {
    snapshot.time = time;
    snapshot.keyables.clear();
    snapshot.keyables.extend(
        curves
            .iter()
            .enumerate()
            .map(|(index, curve)| curve.eval_cached(time, cache.cursor(index))),
    );
}

/// Write a snapshot through the targets of `curves`. With a weight, values
/// are blended, and step curves only switch once the weight reaches one half.
pub(crate) fn write_snapshot(
    curves: &[AnimationCurve],
    snapshot: &ClipSnapshot,
    weight: Option<f32>,
    scene: &mut SceneGraph,
) {
    for (curve, keyable) in curves.iter().zip(&snapshot.keyables) {
        let Some(keyable) = keyable else {
            continue;
        };
        match weight {
            None => curve.update_to_target(keyable, scene),
            Some(p) if curve.interpolation() == InterpolationType::Step => {
                if p >= 0.5 {
                    curve.update_to_target(keyable, scene);
                }
            }
            Some(p) => curve.blend_to_target(keyable, p, scene),
        }
    }
}

/// Blend the values of `other` into `base` by `p`, matching curves by name.
/// A step curve takes the other value outright once `p` passes one half.
pub fn linear_blend_except_step(
    base_curves: &[AnimationCurve],
    base: &mut ClipSnapshot,
    other_curves: &[AnimationCurve],
    other: &ClipSnapshot,
    p: f32,
) {
    for (index, curve) in base_curves.iter().enumerate() {
        let Some(other_index) = other_curves
            .iter()
            .position(|other_curve| other_curve.name() == curve.name())
        else {
            continue;
        };
        let (Some(Some(value)), Some(blend)) =
            (base.keyables.get(index), other.get(other_index))
        else {
            continue;
        };
        let blended = if curve.interpolation() == InterpolationType::Step {
            if p > 0.5 {
                Some(*blend)
            } else {
                Some(*value)
            }
        } else {
            AnimationKeyable::linear_blend(value, blend, p)
        };
        if let Some(blended) = blended {
            base.keyables[index] = Some(blended);
        }
    }
}

/// A named set of curves played together.
#[derive(Debug, Clone)]
pub struct AnimationClip {
    name: String,
    duration: f32,
    curves: Vec<AnimationCurve>,
    root: Option<NodeId>,
    looping: bool,
    speed: f32,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            duration: 0.0,
            curves: Vec::new(),
            root: None,
            looping: true,
            speed: 1.0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn curves(&self) -> &[AnimationCurve] {
        &self.curves
    }

    pub fn curve(&self, name: &str) -> Option<&AnimationCurve> {
        self.curves.iter().find(|curve| curve.name() == name)
    }

    pub fn curve_mut(&mut self, name: &str) -> Option<&mut AnimationCurve> {
        self.curves.iter_mut().find(|curve| curve.name() == name)
    }

    /// Node the targets of this clip were resolved under.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, root: Option<NodeId>) {
        self.root = root;
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    /// Add a curve, replacing a curve with the same name.
    pub fn add_curve(&mut self, curve: AnimationCurve) {
        match self.curve_mut(curve.name()) {
            Some(existing) => *existing = curve,
            None => self.curves.push(curve),
        }
        self.update_duration();
    }

    pub fn remove_curve(&mut self, name: &str) -> Option<AnimationCurve> {
        let index = self.curves.iter().position(|curve| curve.name() == name)?;
        let curve = self.curves.remove(index);
        self.update_duration();
        Some(curve)
    }

    pub fn remove_all_curves(&mut self) {
        self.curves.clear();
        self.update_duration();
    }

    pub fn update_duration(&mut self) {
        self.duration = self
            .curves
            .iter()
            .map(AnimationCurve::duration)
            .fold(0.0, f32::max);
    }

    pub fn set_interpolation(&mut self, interpolation: InterpolationType) {
        self.curves
            .iter_mut()
            .for_each(|curve| curve.set_interpolation(interpolation));
    }

    pub fn targets(&self) -> impl Iterator<Item = &AnimationTarget> {
        self.curves.iter().flat_map(|curve| curve.targets())
    }

    pub fn eval(&self, time: f32) -> ClipSnapshot {
        let mut snapshot = ClipSnapshot::default();
        self.eval_cached(time, &mut EvalCache::default(), &mut snapshot);
        snapshot
    }

    pub fn eval_cached(&self, time: f32, cache: &mut EvalCache, snapshot: &mut ClipSnapshot) {
        eval_curves_into(&self.curves, time, cache, snapshot)
    }

    /// Copy of the clip between `begin` and `end`, shifted to start at zero.
    pub fn sub_clip(&self, begin: f32, end: f32) -> Self {
        let mut clip = Self {
            curves: self
                .curves
                .iter()
                .map(|curve| curve.sub_curve(begin, end))
                .collect(),
            ..self.clone()
        };
        clip.update_duration();
        clip
    }

    pub fn update_to_target(&self, snapshot: &ClipSnapshot, scene: &mut SceneGraph) {
        write_snapshot(&self.curves, snapshot, None, scene)
    }

    pub fn blend_to_target(&self, snapshot: &ClipSnapshot, p: f32, scene: &mut SceneGraph) {
        write_snapshot(&self.curves, snapshot, Some(p), scene)
    }

    /// Rebind every target to the node with the same name under `root`, and
    /// scale position writes by the accumulated scale of the new node.
    /// Targets whose node has no name match keep their binding.
    pub fn transfer_to_root(&mut self, scene: &SceneGraph, root: NodeId) {
        let table = retarget_table(scene, root);
        let mut rebound = 0;
        for curve in &mut self.curves {
            for target in curve.targets_mut() {
                let name = scene.node(target.node()).and_then(|node| node.name());
                let Some((node, scale)) = name.and_then(|name| table.get(name)) else {
                    warn!(
                        "No node under {} matches the target {} of clip {}",
                        root,
                        target.node(),
                        self.name
                    );
                    continue;
                };
                target.set_node(*node);
                target.set_retarget_scale(Some(*scale));
                rebound += 1;
            }
        }
        self.root = Some(root);
        debug!("Transferred {} targets of clip {} to {}", rebound, self.name, root);
    }

    /// Capture the current pose of every node under `root` as a one-key clip.
    pub fn from_root(name: impl Into<String>, scene: &SceneGraph, root: NodeId) -> Self {
        let mut clip = Self::new(name);
        for id in scene.descendants(root) {
            let Some(node) = scene.node(id) else {
                continue;
            };
            let label = node
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| id.index().to_string());
            let channels: [(TargetPath, KeyableType, KeyableValue); 3] = [
                (TargetPath::LocalPosition, KeyableType::Vec, node.local_position().into()),
                (TargetPath::LocalRotation, KeyableType::Quat, node.local_rotation().into()),
                (TargetPath::LocalScale, KeyableType::Vec, node.local_scale().into()),
            ];
            for (path, keyable_type, value) in channels {
                let mut curve = AnimationCurve::new(
                    format!("{}.{}", label, path),
                    keyable_type,
                    InterpolationType::Linear,
                );
                curve.insert_key(0.0, value);
                curve.add_target(AnimationTarget::new(id, path));
                clip.add_curve(curve);
            }
        }
        clip.root = Some(root);
        clip
    }
}
