//! Keyframe animation engine.
//!
//! [`curve::AnimationCurve`]s hold typed keys and write through
//! [`target::AnimationTarget`]s onto scene nodes. Curves are grouped into
//! [`clip::AnimationClip`]s, played by [`session::AnimationSession`]s with
//! loop, fade, blend and event handling, and managed per model by an
//! [`component::AnimationComponent`]. Sessions that want frame callbacks
//! register with a shared [`tick::TickSource`].
pub mod clip;
pub mod component;
pub mod curve;
pub mod event;
pub mod keyable;
pub mod session;
pub mod target;
pub mod tick;

pub use clip::AnimationClip;
pub use component::AnimationComponent;
pub use curve::{AnimationCurve, InterpolationType};
pub use keyable::{AnimationKeyable, KeyableType, KeyableValue};
pub use session::{AnimationSession, Playable};
pub use target::{AnimationTarget, SubProperty, TargetPath};
pub use tick::TickSource;
