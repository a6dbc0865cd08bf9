use std::fmt::{self, Display, Formatter};

use log::warn;

use crate::scene::SceneGraph;

use super::{
    keyable::{AnimationKeyable, KeyableType, KeyableValue},
    target::AnimationTarget,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InterpolationType {
    #[default]
    Linear,
    Step,
    /// Cardinal spline through the keys.
    Cubic,
    /// Hermite spline with explicit tangents, as stored by glTF.
    CubicSplineGltf,
}

impl InterpolationType {
    /// Map a glTF sampler interpolation.
    pub fn from_gltf(interpolation: &str) -> Option<Self> {
        match interpolation {
            "LINEAR" => Some(InterpolationType::Linear),
            "STEP" => Some(InterpolationType::Step),
            "CUBICSPLINE" => Some(InterpolationType::CubicSplineGltf),
            _ => None,
        }
    }
}

impl Display for InterpolationType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            InterpolationType::Linear => "linear",
            InterpolationType::Step => "step",
            InterpolationType::Cubic => "cubic",
            InterpolationType::CubicSplineGltf => "cubicspline",
        };
        f.write_str(name)
    }
}

/// Where a sample time falls among the keys of a curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeySpan {
    Exact(usize),
    /// Before the first or after the last key.
    Clamp(usize),
    Between(usize, usize),
}

/// Keys of one typed value over time and the node properties it drives.
#[derive(Debug, Clone)]
pub struct AnimationCurve {
    name: String,
    interpolation: InterpolationType,
    keyable_type: KeyableType,
    tension: f32,
    duration: f32,
    keys: Vec<AnimationKeyable>,
    targets: Vec<AnimationTarget>,
}

impl AnimationCurve {
    pub fn new(
        name: impl Into<String>,
        keyable_type: KeyableType,
        interpolation: InterpolationType,
    ) -> Self {
        Self {
            name: name.into(),
            interpolation,
            keyable_type,
            tension: 0.5,
            duration: 0.0,
            keys: Vec::new(),
            targets: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn interpolation(&self) -> InterpolationType {
        self.interpolation
    }

    pub fn set_interpolation(&mut self, interpolation: InterpolationType) {
        self.interpolation = interpolation;
    }

    pub fn keyable_type(&self) -> KeyableType {
        self.keyable_type
    }

    /// Tension of the cardinal spline used by [`InterpolationType::Cubic`].
    pub fn tension(&self) -> f32 {
        self.tension
    }

    pub fn set_tension(&mut self, tension: f32) {
        self.tension = tension.clamp(0.0, 1.0);
    }

    /// Time of the last key.
    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn keys(&self) -> &[AnimationKeyable] {
        &self.keys
    }

    pub fn targets(&self) -> &[AnimationTarget] {
        &self.targets
    }

    pub fn targets_mut(&mut self) -> &mut [AnimationTarget] {
        &mut self.targets
    }

    pub fn add_target(&mut self, target: AnimationTarget) {
        self.targets.push(target);
    }

    /// Replace every target with `target`.
    pub fn set_target(&mut self, target: AnimationTarget) {
        self.targets.clear();
        self.targets.push(target);
    }

    pub fn clear_targets(&mut self) {
        self.targets.clear();
    }

    pub fn insert_key(&mut self, time: f32, value: impl Into<KeyableValue>) -> bool {
        self.insert_keyable(AnimationKeyable::new(time, value))
    }

    /// Insert a key in time order, replacing a key at the same time. Keys of
    /// another type are rejected.
    pub fn insert_keyable(&mut self, keyable: AnimationKeyable) -> bool {
        if keyable.keyable_type() != self.keyable_type {
            warn!(
                "Rejected {} key on {} curve {}",
                keyable.keyable_type(),
                self.keyable_type,
                self.name
            );
            return false;
        }
        if keyable.time.is_nan() {
            warn!("Rejected key without a valid time on curve {}", self.name);
            return false;
        }
        match self
            .keys
            .binary_search_by(|key| key.time.total_cmp(&keyable.time))
        {
            Ok(index) => self.keys[index] = keyable,
            Err(index) => self.keys.insert(index, keyable),
        }
        self.update_duration();
        true
    }

    pub fn remove_key(&mut self, index: usize) -> Option<AnimationKeyable> {
        if index >= self.keys.len() {
            return None;
        }
        let key = self.keys.remove(index);
        self.update_duration();
        Some(key)
    }

    pub fn remove_all_keys(&mut self) {
        self.keys.clear();
        self.update_duration();
    }

    pub fn shift_key_time(&mut self, delta: f32) {
        self.keys.iter_mut().for_each(|key| key.time += delta);
        self.update_duration();
    }

    /// Copy of the curve between `begin` and `end`, shifted to start at zero.
    /// Boundary keys are sampled so the copy keeps the original shape.
    pub fn sub_curve(&self, begin: f32, end: f32) -> Self {
        let mut curve = Self {
            keys: Vec::new(),
            duration: 0.0,
            ..self.clone()
        };
        if self.keys.is_empty() || end < begin {
            return curve;
        }
        let mut keys: Vec<AnimationKeyable> = self
            .keys
            .iter()
            .filter(|key| key.time >= begin && key.time <= end)
            .copied()
            .collect();
        for boundary in [begin, end] {
            if !keys.iter().any(|key| key.time == boundary) {
                if let Some(key) = self.eval(boundary) {
                    keys.push(key.at(boundary));
                }
            }
        }
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        curve.keys = keys.into_iter().map(|key| key.at(key.time - begin)).collect();
        curve.update_duration();
        curve
    }

    fn update_duration(&mut self) {
        self.duration = self.keys.last().map(|key| key.time).unwrap_or(0.0);
    }

    /// Locate `time` among the keys, walking outward from `cursor`. The
    /// cursor is left on the key at or before `time`.
    fn locate(&self, time: f32, cursor: &mut usize) -> Option<KeySpan> {
        let last = self.keys.len().checked_sub(1)?;
        if time.is_nan() {
            return None;
        }
        if last == 0 || time <= self.keys[0].time {
            *cursor = 0;
            return Some(if time == self.keys[0].time {
                KeySpan::Exact(0)
            } else {
                KeySpan::Clamp(0)
            });
        }
        if time >= self.keys[last].time {
            *cursor = last;
            return Some(if time == self.keys[last].time {
                KeySpan::Exact(last)
            } else {
                KeySpan::Clamp(last)
            });
        }

        // keys[0].time < time < keys[last].time
        let mut index = (*cursor).min(last);
        if self.keys[index].time <= time {
            while self.keys[index + 1].time <= time {
                index += 1;
            }
        } else {
            while self.keys[index].time > time {
                index -= 1;
            }
        }
        *cursor = index;
        Some(if self.keys[index].time == time {
            KeySpan::Exact(index)
        } else {
            KeySpan::Between(index, index + 1)
        })
    }

    /// Sample the curve at `time`.
    pub fn eval(&self, time: f32) -> Option<AnimationKeyable> {
        let mut cursor = 0;
        self.eval_cached(time, &mut cursor)
    }

    /// Sample the curve at `time`, starting the key search at `cursor` and
    /// leaving it on the key found. Consecutive samples close in time then
    /// resolve in a step or two.
    pub fn eval_cached(&self, time: f32, cursor: &mut usize) -> Option<AnimationKeyable> {
        let span = self.locate(time, cursor)?;
        let keyable = match span {
            KeySpan::Exact(index) => self.keys[index],
            KeySpan::Clamp(index) => self.keys[index].at(time),
            KeySpan::Between(first, second) => match self.interpolation {
                InterpolationType::Step => self.keys[first].at(time),
                InterpolationType::Linear => self.eval_linear(time, first, second),
                InterpolationType::Cubic => self.eval_cubic(time, first, second),
                InterpolationType::CubicSplineGltf => self.eval_cubic_spline(time, first, second),
            },
        };
        Some(keyable)
    }

    fn progress(&self, time: f32, first: usize, second: usize) -> f32 {
        let (begin, end) = (self.keys[first].time, self.keys[second].time);
        if end > begin {
            ((time - begin) / (end - begin)).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    fn eval_linear(&self, time: f32, first: usize, second: usize) -> AnimationKeyable {
        let p = self.progress(time, first, second);
        let (k1, k2) = (&self.keys[first], &self.keys[second]);
        let value = k1.value.lerp(&k2.value, p).unwrap_or(k1.value);
        AnimationKeyable::new(time, value)
    }

    /// Slope of the cardinal spline at key `index`, per unit of time.
    fn cardinal_tangent(&self, index: usize) -> Option<KeyableValue> {
        let previous = index.checked_sub(1).unwrap_or(index);
        let next = (index + 1).min(self.keys.len() - 1);
        let (prev_key, next_key) = (&self.keys[previous], &self.keys[next]);
        let span = next_key.time - prev_key.time;
        if span <= 0.0 {
            return Some(KeyableValue::zero(self.keyable_type));
        }
        let delta = next_key.value.minus(&prev_key.value)?;
        Some(delta.mul(2.0 * self.tension / span))
    }

    fn eval_cubic(&self, time: f32, first: usize, second: usize) -> AnimationKeyable {
        if self.keyable_type == KeyableType::Quat {
            return self.eval_linear(time, first, second);
        }
        let p = self.progress(time, first, second);
        let (k1, k2) = (&self.keys[first], &self.keys[second]);
        let g = k2.time - k1.time;
        let value = self
            .cardinal_tangent(first)
            .zip(self.cardinal_tangent(second))
            .and_then(|(m1, m2)| k1.value.hermite(&m1, &k2.value, &m2, p, g));
        match value {
            Some(value) => AnimationKeyable::new(time, value),
            None => self.eval_linear(time, first, second),
        }
    }

    fn eval_cubic_spline(&self, time: f32, first: usize, second: usize) -> AnimationKeyable {
        let p = self.progress(time, first, second);
        let (k1, k2) = (&self.keys[first], &self.keys[second]);
        let g = k2.time - k1.time;
        let zero = KeyableValue::zero(self.keyable_type);
        let out_tangent = k1.out_tangent.unwrap_or(zero);
        let in_tangent = k2.in_tangent.unwrap_or(zero);
        match k1.value.hermite(&out_tangent, &k2.value, &in_tangent, p, g) {
            Some(value) => AnimationKeyable::new(time, value),
            None => self.eval_linear(time, first, second),
        }
    }

    pub fn update_to_target(&self, keyable: &AnimationKeyable, scene: &mut SceneGraph) {
        for target in &self.targets {
            target.update_to_target(&keyable.value, scene);
        }
    }

    pub fn blend_to_target(&self, keyable: &AnimationKeyable, p: f32, scene: &mut SceneGraph) {
        for target in &self.targets {
            target.blend_to_target(&keyable.value, p, scene);
        }
    }
}

#[cfg(test)]
mod test {
    use glam::{Quat, Vec3};

    use super::*;

    fn num_curve(interpolation: InterpolationType, keys: &[(f32, f32)]) -> AnimationCurve {
        let mut curve = AnimationCurve::new("curve", KeyableType::Num, interpolation);
        for (time, value) in keys {
            assert!(curve.insert_key(*time, *value));
        }
        curve
    }

    fn value_at(curve: &AnimationCurve, time: f32) -> f32 {
        curve.eval(time).unwrap().value.as_num().unwrap()
    }

    #[test]
    fn test_linear() {
        let curve = num_curve(InterpolationType::Linear, &[(0.0, 0.0), (1.0, 10.0), (3.0, 30.0)]);
        assert_eq!(curve.duration(), 3.0);
        assert_eq!(value_at(&curve, 1.0), 10.0);
        assert_eq!(value_at(&curve, 0.5), 5.0);
        assert_eq!(value_at(&curve, 2.0), 20.0);
        // Clamped outside the key range
        assert_eq!(value_at(&curve, -1.0), 0.0);
        assert_eq!(value_at(&curve, 5.0), 30.0);
        assert_eq!(curve.eval(0.5).unwrap().time, 0.5);
    }

    #[test]
    fn test_step_values_come_from_keys() {
        let curve = num_curve(InterpolationType::Step, &[(0.0, 1.0), (1.0, 2.0), (2.0, 3.0)]);
        for step in 0..=25 {
            let time = step as f32 * 0.1 - 0.2;
            let value = value_at(&curve, time);
            assert!([1.0, 2.0, 3.0].contains(&value), "{} at {}", value, time);
        }
        assert_eq!(value_at(&curve, 0.99), 1.0);
        assert_eq!(value_at(&curve, 1.0), 2.0);
        assert_eq!(value_at(&curve, 1.5), 2.0);
    }

    #[test]
    fn test_cubic_passes_through_keys() {
        let curve = num_curve(
            InterpolationType::Cubic,
            &[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0), (3.0, 1.0)],
        );
        for time in [0.0, 1.0, 2.0, 3.0] {
            assert_eq!(value_at(&curve, time), time as u32 as f32 % 2.0);
        }
        // Flat tangents at both ends of the span mirror the curve around it
        let a = value_at(&curve, 1.25);
        let b = value_at(&curve, 1.75);
        assert!((a + b - 1.0).abs() < 1e-5);
        assert!(a > 0.5 && a < 1.0);
    }

    #[test]
    fn test_cubic_spline_gltf() {
        let mut curve =
            AnimationCurve::new("curve", KeyableType::Num, InterpolationType::CubicSplineGltf);
        let zero = KeyableValue::Num(0.0);
        curve.insert_keyable(AnimationKeyable::with_tangents(0.0, KeyableValue::Num(1.0), zero, zero));
        curve.insert_keyable(AnimationKeyable::with_tangents(2.0, KeyableValue::Num(3.0), zero, zero));
        assert_eq!(value_at(&curve, 0.0), 1.0);
        assert_eq!(value_at(&curve, 2.0), 3.0);
        assert_eq!(value_at(&curve, 1.0), 2.0);
    }

    #[test]
    fn test_cubic_spline_quat_is_normalized() {
        let mut curve =
            AnimationCurve::new("curve", KeyableType::Quat, InterpolationType::CubicSplineGltf);
        let zero = KeyableValue::Quat(Quat::from_xyzw(0.0, 0.0, 0.0, 0.0));
        curve.insert_keyable(AnimationKeyable::with_tangents(
            0.0,
            Quat::IDENTITY.into(),
            zero,
            zero,
        ));
        curve.insert_keyable(AnimationKeyable::with_tangents(
            1.0,
            Quat::from_rotation_y(1.0).into(),
            zero,
            zero,
        ));
        let value = curve.eval(0.3).unwrap().value.as_quat().unwrap();
        assert!(value.is_normalized());
    }

    #[test]
    fn test_quat_linear_slerps() {
        let mut curve = AnimationCurve::new("curve", KeyableType::Quat, InterpolationType::Linear);
        curve.insert_key(0.0, Quat::IDENTITY);
        curve.insert_key(1.0, Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        let value = curve.eval(0.5).unwrap().value.as_quat().unwrap();
        assert!(value.abs_diff_eq(Quat::from_rotation_z(std::f32::consts::FRAC_PI_4), 1e-5));
    }

    #[test]
    fn test_cached_matches_uncached() {
        let curve = num_curve(
            InterpolationType::Linear,
            &[(0.0, 0.0), (0.5, 4.0), (1.0, -1.0), (2.0, 3.0), (4.0, 0.0)],
        );
        let mut cursor = 0;
        let times = [0.1, 0.7, 3.5, 0.2, 4.5, -1.0, 2.0, 1.9, 0.5];
        for time in times {
            assert_eq!(
                curve.eval_cached(time, &mut cursor),
                curve.eval(time),
                "time {}",
                time
            );
        }
    }

    #[test]
    fn test_editing() {
        let mut curve = num_curve(InterpolationType::Linear, &[(1.0, 1.0), (0.0, 0.0)]);
        assert_eq!(curve.keys()[0].time, 0.0);
        assert!(!curve.insert_key(0.5, Vec3::ONE));
        assert!(curve.insert_key(1.0, 5.0));
        assert_eq!(curve.keys().len(), 2);
        assert_eq!(value_at(&curve, 1.0), 5.0);

        curve.shift_key_time(2.0);
        assert_eq!(curve.duration(), 3.0);
        assert_eq!(curve.remove_key(1).unwrap().time, 3.0);
        assert_eq!(curve.duration(), 2.0);
        curve.remove_all_keys();
        assert_eq!(curve.duration(), 0.0);
        assert!(curve.eval(0.0).is_none());
    }

    #[test]
    fn test_sub_curve() {
        let curve = num_curve(InterpolationType::Linear, &[(0.0, 0.0), (2.0, 20.0), (4.0, 40.0)]);
        let sub = curve.sub_curve(1.0, 3.0);
        assert_eq!(sub.duration(), 2.0);
        assert_eq!(sub.keys().len(), 3);
        assert_eq!(value_at(&sub, 0.0), 10.0);
        assert_eq!(value_at(&sub, 1.0), 20.0);
        assert_eq!(value_at(&sub, 2.0), 30.0);
    }
}
