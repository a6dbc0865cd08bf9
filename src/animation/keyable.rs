use std::{
    fmt::{self, Display, Formatter},
    ops::{Add, Mul},
};

use glam::{Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyableType {
    #[default]
    Num,
    Vec,
    Quat,
}

impl KeyableType {
    /// Keyable type of a value with `components` floats.
    pub fn from_components(components: usize) -> Option<Self> {
        match components {
            1 => Some(KeyableType::Num),
            3 => Some(KeyableType::Vec),
            4 => Some(KeyableType::Quat),
            _ => None,
        }
    }

    pub fn components(self) -> usize {
        match self {
            KeyableType::Num => 1,
            KeyableType::Vec => 3,
            KeyableType::Quat => 4,
        }
    }
}

impl Display for KeyableType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyableType::Num => "num",
            KeyableType::Vec => "vec",
            KeyableType::Quat => "quat",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyableValue {
    Num(f32),
    Vec(Vec3),
    Quat(Quat),
}

impl KeyableValue {
    pub fn zero(keyable_type: KeyableType) -> Self {
        match keyable_type {
            KeyableType::Num => KeyableValue::Num(0.0),
            KeyableType::Vec => KeyableValue::Vec(Vec3::ZERO),
            KeyableType::Quat => KeyableValue::Quat(Quat::IDENTITY),
        }
    }

    /// Build a value from raw floats. Quaternions are read as `[x, y, z, w]`.
    pub fn from_slice(keyable_type: KeyableType, data: &[f32]) -> Option<Self> {
        Some(match (keyable_type, data) {
            (KeyableType::Num, [x, ..]) => KeyableValue::Num(*x),
            (KeyableType::Vec, [x, y, z, ..]) => KeyableValue::Vec(Vec3::new(*x, *y, *z)),
            (KeyableType::Quat, [x, y, z, w, ..]) => {
                KeyableValue::Quat(Quat::from_xyzw(*x, *y, *z, *w))
            }
            _ => return None,
        })
    }

    pub fn keyable_type(&self) -> KeyableType {
        match self {
            KeyableValue::Num(_) => KeyableType::Num,
            KeyableValue::Vec(_) => KeyableType::Vec,
            KeyableValue::Quat(_) => KeyableType::Quat,
        }
    }

    pub fn as_num(&self) -> Option<f32> {
        match self {
            KeyableValue::Num(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_vec(&self) -> Option<Vec3> {
        match self {
            KeyableValue::Vec(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_quat(&self) -> Option<Quat> {
        match self {
            KeyableValue::Quat(value) => Some(*value),
            _ => None,
        }
    }

    /// Add two values. Quaternions compose by multiplication.
    pub fn sum(&self, other: &Self) -> Option<Self> {
        Some(match (self, other) {
            (KeyableValue::Num(a), KeyableValue::Num(b)) => KeyableValue::Num(a + b),
            (KeyableValue::Vec(a), KeyableValue::Vec(b)) => KeyableValue::Vec(*a + *b),
            (KeyableValue::Quat(a), KeyableValue::Quat(b)) => KeyableValue::Quat(*a * *b),
            _ => return None,
        })
    }

    /// Inverse of [`KeyableValue::sum`].
    pub fn minus(&self, other: &Self) -> Option<Self> {
        Some(match (self, other) {
            (KeyableValue::Num(a), KeyableValue::Num(b)) => KeyableValue::Num(a - b),
            (KeyableValue::Vec(a), KeyableValue::Vec(b)) => KeyableValue::Vec(*a - *b),
            (KeyableValue::Quat(a), KeyableValue::Quat(b)) => {
                KeyableValue::Quat(*a * b.inverse())
            }
            _ => return None,
        })
    }

    /// Scale every component.
    pub fn mul(&self, coefficient: f32) -> Self {
        match self {
            KeyableValue::Num(value) => KeyableValue::Num(value * coefficient),
            KeyableValue::Vec(value) => KeyableValue::Vec(*value * coefficient),
            KeyableValue::Quat(value) => KeyableValue::Quat(*value * coefficient),
        }
    }

    /// Lerp numbers and vectors, slerp quaternions.
    pub fn lerp(&self, other: &Self, p: f32) -> Option<Self> {
        Some(match (self, other) {
            (KeyableValue::Num(a), KeyableValue::Num(b)) => {
                KeyableValue::Num(Interpolate::linear(*a, *b, p))
            }
            (KeyableValue::Vec(a), KeyableValue::Vec(b)) => KeyableValue::Vec(a.lerp(*b, p)),
            (KeyableValue::Quat(a), KeyableValue::Quat(b)) => KeyableValue::Quat(a.slerp(*b, p)),
            _ => return None,
        })
    }

    /// Hermite interpolation between `self` and `next` with the tangents
    /// `out` (leaving `self`) and `incoming` (arriving at `next`), both given
    /// per unit of time over a span of `td` seconds. Quaternion results are
    /// renormalized.
    pub fn hermite(
        &self,
        out: &Self,
        next: &Self,
        incoming: &Self,
        p: f32,
        td: f32,
    ) -> Option<Self> {
        Some(match (self, out, next, incoming) {
            (
                KeyableValue::Num(vk),
                KeyableValue::Num(bk),
                KeyableValue::Num(vk_1),
                KeyableValue::Num(ak_1),
            ) => KeyableValue::Num(Interpolate::cubic_spline(*vk, *bk, *vk_1, *ak_1, p, td)),
            (
                KeyableValue::Vec(vk),
                KeyableValue::Vec(bk),
                KeyableValue::Vec(vk_1),
                KeyableValue::Vec(ak_1),
            ) => KeyableValue::Vec(Interpolate::cubic_spline(*vk, *bk, *vk_1, *ak_1, p, td)),
            (
                KeyableValue::Quat(vk),
                KeyableValue::Quat(bk),
                KeyableValue::Quat(vk_1),
                KeyableValue::Quat(ak_1),
            ) => KeyableValue::Quat(
                Interpolate::cubic_spline(*vk, *bk, *vk_1, *ak_1, p, td).normalize(),
            ),
            _ => return None,
        })
    }
}

impl From<f32> for KeyableValue {
    fn from(value: f32) -> Self {
        KeyableValue::Num(value)
    }
}

impl From<Vec3> for KeyableValue {
    fn from(value: Vec3) -> Self {
        KeyableValue::Vec(value)
    }
}

impl From<Quat> for KeyableValue {
    fn from(value: Quat) -> Self {
        KeyableValue::Quat(value)
    }
}

/// A keyframe: a typed value at a time, with optional Hermite tangents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationKeyable {
    pub time: f32,
    pub value: KeyableValue,
    pub in_tangent: Option<KeyableValue>,
    pub out_tangent: Option<KeyableValue>,
}

impl AnimationKeyable {
    pub fn new(time: f32, value: impl Into<KeyableValue>) -> Self {
        Self {
            time,
            value: value.into(),
            in_tangent: None,
            out_tangent: None,
        }
    }

    pub fn with_tangents(
        time: f32,
        value: KeyableValue,
        in_tangent: KeyableValue,
        out_tangent: KeyableValue,
    ) -> Self {
        Self {
            time,
            value,
            in_tangent: Some(in_tangent),
            out_tangent: Some(out_tangent),
        }
    }

    pub fn keyable_type(&self) -> KeyableType {
        self.value.keyable_type()
    }

    /// Copy of this keyable stamped with another time.
    pub fn at(&self, time: f32) -> Self {
        Self { time, ..*self }
    }

    /// Blend two keyables of the same type. `p == 0` returns `a` and `p == 1`
    /// returns `b` unchanged, tangents included.
    pub fn linear_blend(a: &Self, b: &Self, p: f32) -> Option<Self> {
        if a.keyable_type() != b.keyable_type() {
            return None;
        }
        if p == 0.0 {
            return Some(*a);
        }
        if p == 1.0 {
            return Some(*b);
        }
        Some(Self {
            time: Interpolate::linear(a.time, b.time, p),
            value: a.value.lerp(&b.value, p)?,
            in_tangent: None,
            out_tangent: None,
        })
    }

    pub fn sum(a: &Self, b: &Self) -> Option<Self> {
        Some(Self::new(a.time, a.value.sum(&b.value)?))
    }

    pub fn minus(a: &Self, b: &Self) -> Option<Self> {
        Some(Self::new(a.time, a.value.minus(&b.value)?))
    }

    pub fn mul(a: &Self, coefficient: f32) -> Self {
        Self::new(a.time, a.value.mul(coefficient))
    }
}

pub trait Interpolate {
    fn linear(a: Self, b: Self, t: f32) -> Self;
    fn cubic_spline(vk: Self, bk: Self, vk_1: Self, ak_1: Self, t: f32, td: f32) -> Self;
}

impl<T> Interpolate for T
where
    T: Mul<f32, Output = T> + Add<T, Output = T>,
{
    fn linear(a: Self, b: Self, t: f32) -> Self {
        a * (1.0 - t) + b * t
    }

    fn cubic_spline(vk: Self, bk: Self, vk_1: Self, ak_1: Self, t: f32, td: f32) -> Self {
        let t3 = t.powi(3);
        let t2 = t.powi(2);
        let first = vk * (2.0 * t3 - 3.0 * t2 + 1.0);
        let second = bk * (td * (t3 - 2.0 * t2 + t));
        let third = vk_1 * (-2.0 * t3 + 3.0 * t2);
        let forth = ak_1 * (td * (t3 - t2));
        first + second + third + forth
    }
}
