use std::rc::Rc;

use log::{debug, warn};

use crate::scene::SceneGraph;

use super::{
    clip::AnimationClip,
    session::{AnimationSession, Blendable, Playable},
    tick::TickSource,
};

#[derive(Debug)]
struct ClipEntry {
    clip: Rc<AnimationClip>,
    session: AnimationSession,
}

/// Named clips of one model, one session per clip, and the clip currently
/// in front.
#[derive(Debug)]
pub struct AnimationComponent {
    tick: TickSource,
    entries: Vec<ClipEntry>,
    current: Option<usize>,
}

impl AnimationComponent {
    pub fn new(tick: TickSource) -> Self {
        Self {
            tick,
            entries: Vec::new(),
            current: None,
        }
    }

    pub fn tick_source(&self) -> &TickSource {
        &self.tick
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.clip.name() == name)
    }

    /// Add a clip, replacing and stopping a clip with the same name.
    pub fn add_clip(&mut self, clip: impl Into<Rc<AnimationClip>>) {
        let clip = clip.into();
        let session = AnimationSession::with_playable(self.tick.clone(), clip.clone());
        match self.position(clip.name()) {
            Some(index) => {
                self.entries[index].session.stop();
                self.entries[index] = ClipEntry { clip, session };
            }
            None => self.entries.push(ClipEntry { clip, session }),
        }
    }

    pub fn remove_clip(&mut self, name: &str) -> Option<Rc<AnimationClip>> {
        let index = self.position(name)?;
        let mut entry = self.entries.remove(index);
        entry.session.stop();
        self.current = match self.current {
            Some(current) if current == index => None,
            Some(current) if current > index => Some(current - 1),
            current => current,
        };
        Some(entry.clip)
    }

    pub fn clip(&self, name: &str) -> Option<&Rc<AnimationClip>> {
        self.position(name).map(|index| &self.entries[index].clip)
    }

    pub fn clip_at(&self, index: usize) -> Option<&Rc<AnimationClip>> {
        self.entries.get(index).map(|entry| &entry.clip)
    }

    pub fn clip_count(&self) -> usize {
        self.entries.len()
    }

    pub fn clips(&self) -> impl Iterator<Item = &Rc<AnimationClip>> {
        self.entries.iter().map(|entry| &entry.clip)
    }

    pub fn current_clip(&self) -> Option<&Rc<AnimationClip>> {
        self.current.map(|index| &self.entries[index].clip)
    }

    pub fn session(&self, name: &str) -> Option<&AnimationSession> {
        self.position(name).map(|index| &self.entries[index].session)
    }

    pub fn session_mut(&mut self, name: &str) -> Option<&mut AnimationSession> {
        let index = self.position(name)?;
        Some(&mut self.entries[index].session)
    }

    fn current_session_mut(&mut self) -> Option<&mut AnimationSession> {
        let index = self.current?;
        Some(&mut self.entries[index].session)
    }

    /// Play a clip from its start, stopping the previous current clip.
    pub fn play(&mut self, name: &str) -> bool {
        let Some(index) = self.position(name) else {
            warn!("No animation clip named {}", name);
            return false;
        };
        if let Some(current) = self.current.filter(|current| *current != index) {
            self.entries[current].session.stop();
        }
        let entry = &mut self.entries[index];
        entry.session.play(Some(Playable::Clip(entry.clip.clone())));
        self.current = Some(index);
        debug!("Playing animation clip {}", name);
        true
    }

    pub fn pause(&mut self) {
        if let Some(session) = self.current_session_mut() {
            session.pause();
        }
    }

    pub fn resume(&mut self) {
        if let Some(session) = self.current_session_mut() {
            session.resume();
        }
    }

    pub fn stop(&mut self) {
        if let Some(session) = self.current_session_mut() {
            session.stop();
        }
        self.current = None;
    }

    /// Fade the current clip out and `name` in over `duration` seconds.
    pub fn cross_fade_to(&mut self, name: &str, duration: f32) -> bool {
        let Some(index) = self.position(name) else {
            warn!("No animation clip named {}", name);
            return false;
        };
        match self.current {
            Some(current) if current != index => self.entries[current].session.fade_out(duration),
            _ => {}
        }
        let entry = &mut self.entries[index];
        entry
            .session
            .fade_in(duration, Some(Playable::Clip(entry.clip.clone())));
        self.current = Some(index);
        debug!("Cross fading to animation clip {} over {}s", name, duration);
        true
    }

    /// Blend `value` on top of the current clip.
    pub fn set_blend(&mut self, value: impl Into<Blendable>, weight: f32, curve_name: Option<&str>) {
        match self.current_session_mut() {
            Some(session) => session.set_blend(value, weight, curve_name),
            None => warn!("No current animation clip to blend into"),
        }
    }

    pub fn unset_blend(&mut self, curve_name: Option<&str>) -> bool {
        self.current_session_mut()
            .map(|session| session.unset_blend(curve_name))
            .unwrap_or(false)
    }

    /// Advance every session registered with the tick source.
    pub fn update(&mut self, dt: f32, scene: &mut SceneGraph) {
        for entry in &mut self.entries {
            if self.tick.is_registered(entry.session.id()) {
                entry.session.on_timer(dt, scene);
            }
        }
    }

    /// Stop every session and drop all clips.
    pub fn destroy(&mut self) {
        for entry in &mut self.entries {
            entry.session.stop();
        }
        self.entries.clear();
        self.current = None;
    }
}

#[cfg(test)]
mod test {
    use glam::Vec3;

    use crate::{
        animation::{
            curve::{AnimationCurve, InterpolationType},
            keyable::KeyableType,
            session::SessionState,
            target::{AnimationTarget, TargetPath},
        },
        asset::node::DecomposedTransform,
        scene::NodeId,
    };

    use super::*;

    fn hold(node: NodeId, name: &str, x: f32) -> AnimationClip {
        let mut curve =
            AnimationCurve::new("node.localPosition", KeyableType::Vec, InterpolationType::Linear);
        curve.insert_key(0.0, Vec3::new(x, 0.0, 0.0));
        curve.insert_key(1.0, Vec3::new(x, 0.0, 0.0));
        curve.add_target(AnimationTarget::new(node, TargetPath::LocalPosition));
        let mut clip = AnimationClip::new(name);
        clip.add_curve(curve);
        clip
    }

    fn setup() -> (SceneGraph, NodeId, AnimationComponent) {
        let mut scene = SceneGraph::new();
        let node = scene.add_node(Some("node".to_string()), DecomposedTransform::default());
        let mut component = AnimationComponent::new(TickSource::new());
        component.add_clip(hold(node, "idle", 1.0));
        component.add_clip(hold(node, "run", 5.0));
        (scene, node, component)
    }

    #[test]
    fn test_clip_bookkeeping() {
        let (_, node, mut component) = setup();
        assert_eq!(component.clip_count(), 2);
        assert_eq!(component.clip_at(1).unwrap().name(), "run");
        component.add_clip(hold(node, "run", 7.0));
        assert_eq!(component.clip_count(), 2);
        assert!(component.play("run"));
        assert!(component.remove_clip("idle").is_some());
        assert_eq!(component.current_clip().unwrap().name(), "run");
        assert!(component.remove_clip("idle").is_none());
        assert!(!component.play("idle"));
    }

    #[test]
    fn test_play_and_update() {
        let (mut scene, node, mut component) = setup();
        component.play("idle");
        component.update(0.1, &mut scene);
        assert_eq!(scene.node(node).unwrap().local_position().x, 1.0);

        component.play("run");
        assert_eq!(component.session("idle").unwrap().state(), SessionState::Stopped);
        component.update(0.1, &mut scene);
        assert_eq!(scene.node(node).unwrap().local_position().x, 5.0);

        component.pause();
        scene.node_mut(node).unwrap().set_local_position(Vec3::ZERO);
        component.update(0.1, &mut scene);
        assert_eq!(scene.node(node).unwrap().local_position().x, 0.0);
        component.resume();
        component.update(0.1, &mut scene);
        assert_eq!(scene.node(node).unwrap().local_position().x, 5.0);
    }

    #[test]
    fn test_cross_fade() {
        let (mut scene, node, mut component) = setup();
        component.play("idle");
        component.update(0.1, &mut scene);
        assert!(component.cross_fade_to("run", 0.5));
        assert_eq!(component.current_clip().unwrap().name(), "run");
        assert_eq!(component.session("idle").unwrap().state(), SessionState::FadingOut);
        assert_eq!(component.session("run").unwrap().state(), SessionState::FadingIn);

        for _ in 0..7 {
            component.update(0.1, &mut scene);
        }
        assert_eq!(component.session("idle").unwrap().state(), SessionState::Stopped);
        assert_eq!(component.session("run").unwrap().state(), SessionState::Playing);
        assert_eq!(scene.node(node).unwrap().local_position().x, 5.0);
    }

    #[test]
    fn test_destroy_unregisters() {
        let (mut scene, _, mut component) = setup();
        component.play("idle");
        component.cross_fade_to("run", 1.0);
        component.update(0.1, &mut scene);
        assert_eq!(component.tick_source().listener_count(), 2);
        component.destroy();
        assert_eq!(component.tick_source().listener_count(), 0);
        assert_eq!(component.clip_count(), 0);
    }

    #[test]
    fn test_blend_through_component() {
        let (mut scene, node, mut component) = setup();
        component.set_blend(Vec3::ZERO, 0.5, Some("node.localPosition"));
        component.play("run");
        component.set_blend(Vec3::new(1.0, 0.0, 0.0), 0.5, Some("node.localPosition"));
        component.update(0.1, &mut scene);
        assert_eq!(scene.node(node).unwrap().local_position().x, 3.0);
        assert!(component.unset_blend(Some("node.localPosition")));
    }
}
