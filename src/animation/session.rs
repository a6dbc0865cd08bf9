use std::{collections::BTreeMap, rc::Rc};

use glam::{Quat, Vec3};
use log::{debug, trace, warn};

use crate::scene::SceneGraph;

use super::{
    clip::{
        eval_curves_into, linear_blend_except_step, write_snapshot, AnimationClip, ClipSnapshot,
        EvalCache,
    },
    curve::AnimationCurve,
    event::{EventCallback, EventQueue, STOP_EVENT},
    keyable::{AnimationKeyable, KeyableValue},
    tick::{SessionId, TickSource},
};

/// Blend slot used for clip blendables added without a name.
pub const DEFAULT_BLEND_NAME: &str = "__default__";

/// Something a session can play.
#[derive(Debug, Clone)]
pub enum Playable {
    Curve(Rc<AnimationCurve>),
    Clip(Rc<AnimationClip>),
}

impl Playable {
    pub fn name(&self) -> &str {
        match self {
            Playable::Curve(curve) => curve.name(),
            Playable::Clip(clip) => clip.name(),
        }
    }

    pub fn duration(&self) -> f32 {
        match self {
            Playable::Curve(curve) => curve.duration(),
            Playable::Clip(clip) => clip.duration(),
        }
    }

    /// Curves of the playable; a single curve plays as a one-curve clip.
    pub fn curves(&self) -> &[AnimationCurve] {
        match self {
            Playable::Curve(curve) => std::slice::from_ref(curve.as_ref()),
            Playable::Clip(clip) => clip.curves(),
        }
    }

    pub fn looping(&self) -> bool {
        match self {
            Playable::Curve(_) => true,
            Playable::Clip(clip) => clip.looping(),
        }
    }

    pub fn speed(&self) -> f32 {
        match self {
            Playable::Curve(_) => 1.0,
            Playable::Clip(clip) => clip.speed(),
        }
    }
}

impl From<AnimationClip> for Playable {
    fn from(value: AnimationClip) -> Self {
        Playable::Clip(Rc::new(value))
    }
}

impl From<Rc<AnimationClip>> for Playable {
    fn from(value: Rc<AnimationClip>) -> Self {
        Playable::Clip(value)
    }
}

impl From<AnimationCurve> for Playable {
    fn from(value: AnimationCurve) -> Self {
        Playable::Curve(Rc::new(value))
    }
}

impl From<Rc<AnimationCurve>> for Playable {
    fn from(value: Rc<AnimationCurve>) -> Self {
        Playable::Curve(value)
    }
}

/// Something blended on top of the playable.
#[derive(Debug, Clone)]
pub enum Blendable {
    Clip(Rc<AnimationClip>),
    Curve(Rc<AnimationCurve>),
    Value(KeyableValue),
}

impl From<AnimationClip> for Blendable {
    fn from(value: AnimationClip) -> Self {
        Blendable::Clip(Rc::new(value))
    }
}

impl From<Rc<AnimationClip>> for Blendable {
    fn from(value: Rc<AnimationClip>) -> Self {
        Blendable::Clip(value)
    }
}

impl From<Rc<AnimationCurve>> for Blendable {
    fn from(value: Rc<AnimationCurve>) -> Self {
        Blendable::Curve(value)
    }
}

impl From<AnimationCurve> for Blendable {
    fn from(value: AnimationCurve) -> Self {
        Blendable::Curve(Rc::new(value))
    }
}

impl From<KeyableValue> for Blendable {
    fn from(value: KeyableValue) -> Self {
        Blendable::Value(value)
    }
}

impl From<f32> for Blendable {
    fn from(value: f32) -> Self {
        Blendable::Value(value.into())
    }
}

impl From<Vec3> for Blendable {
    fn from(value: Vec3) -> Self {
        Blendable::Value(value.into())
    }
}

impl From<Quat> for Blendable {
    fn from(value: Quat) -> Self {
        Blendable::Value(value.into())
    }
}

#[derive(Debug, Clone)]
struct BlendEntry {
    blendable: Blendable,
    weight: f32,
    cache: EvalCache,
    snapshot: ClipSnapshot,
}

/// Fade timer. `time` runs on unscaled frame time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Fade {
    #[default]
    None,
    In {
        begin: f32,
        end: f32,
        time: f32,
    },
    Out {
        begin: f32,
        end: f32,
        time: f32,
        /// Weight the fade-out starts from.
        speed: f32,
    },
}

impl Fade {
    /// Blend weight at the current fade time, `None` when not fading or
    /// outside the fade window.
    pub fn weight(&self) -> Option<f32> {
        let progress = |begin: f32, end: f32, time: f32| {
            if time < begin || time > end {
                None
            } else if end > begin {
                Some((time - begin) / (end - begin))
            } else {
                Some(1.0)
            }
        };
        match *self {
            Fade::None => None,
            Fade::In { begin, end, time } => progress(begin, end, time),
            Fade::Out {
                begin,
                end,
                time,
                speed,
            } => progress(begin, end, time).map(|p| (1.0 - p) * speed.min(1.0)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Stopped,
    Playing,
    FadingIn,
    FadingOut,
}

/// Playback state of one playable: time range, speed, loop, fades, blends
/// and events.
#[derive(Debug)]
pub struct AnimationSession {
    id: SessionId,
    tick: TickSource,
    playable: Option<Playable>,
    begin_time: f32,
    end_time: f32,
    cur_time: f32,
    acc_time: f32,
    speed: f32,
    looping: bool,
    playing: bool,
    fade: Fade,
    blendables: BTreeMap<String, BlendEntry>,
    events: EventQueue,
    cache: EvalCache,
    snapshot: ClipSnapshot,
}

impl AnimationSession {
    pub fn new(tick: TickSource) -> Self {
        Self {
            id: SessionId::next(),
            tick,
            playable: None,
            begin_time: 0.0,
            end_time: 0.0,
            cur_time: 0.0,
            acc_time: 0.0,
            speed: 1.0,
            looping: true,
            playing: false,
            fade: Fade::None,
            blendables: BTreeMap::new(),
            events: EventQueue::default(),
            cache: EvalCache::default(),
            snapshot: ClipSnapshot::default(),
        }
    }

    pub fn with_playable(tick: TickSource, playable: impl Into<Playable>) -> Self {
        let mut session = Self::new(tick);
        session.setup(playable.into());
        session
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn playable(&self) -> Option<&Playable> {
        self.playable.as_ref()
    }

    /// Set the playable without touching the play state.
    pub fn setup(&mut self, playable: Playable) {
        self.playable = Some(playable);
        self.cache.reset();
        self.snapshot = ClipSnapshot::default();
    }

    pub fn state(&self) -> SessionState {
        match (self.playing, self.fade) {
            (false, _) => SessionState::Stopped,
            (true, Fade::None) => SessionState::Playing,
            (true, Fade::In { .. }) => SessionState::FadingIn,
            (true, Fade::Out { .. }) => SessionState::FadingOut,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn fade(&self) -> Fade {
        self.fade
    }

    /// Weight a fade-out started from, one when not fading out.
    pub fn fade_speed(&self) -> f32 {
        match self.fade {
            Fade::Out { speed, .. } => speed,
            _ => 1.0,
        }
    }

    pub fn begin_time(&self) -> f32 {
        self.begin_time
    }

    pub fn end_time(&self) -> f32 {
        self.end_time
    }

    pub fn cur_time(&self) -> f32 {
        self.cur_time
    }

    /// Time played since the last start, unwrapped by loops.
    pub fn acc_time(&self) -> f32 {
        self.acc_time
    }

    /// Restrict playback to `[begin, end]` of the playable.
    pub fn set_time_range(&mut self, begin: f32, end: f32) {
        self.begin_time = begin;
        self.end_time = end.max(begin);
        self.cur_time = self.cur_time.clamp(self.begin_time, self.end_time);
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    pub fn on(&mut self, name: impl Into<String>, time: f32, callback: EventCallback) {
        self.events.on(name, time, callback)
    }

    pub fn off(&mut self, name: &str, time: Option<f32>) -> usize {
        self.events.off(name, time)
    }

    pub fn remove_all_events(&mut self) {
        self.events.clear()
    }

    pub fn invoke_by_name(&mut self, name: &str) -> usize {
        self.events.invoke_by_name(name)
    }

    /// Start playing from the beginning. A given playable replaces the
    /// current one and its speed and loop settings are adopted. Playing an
    /// already playing session only swaps the playable.
    pub fn play(&mut self, playable: Option<Playable>) {
        if let Some(playable) = playable {
            self.speed = playable.speed();
            self.looping = playable.looping();
            self.setup(playable);
        }
        let Some(playable) = &self.playable else {
            warn!("{} has nothing to play", self.id);
            return;
        };
        if self.playing {
            return;
        }

        debug!("{} plays {}", self.id, playable.name());
        self.begin_time = 0.0;
        self.end_time = playable.duration();
        self.cur_time = 0.0;
        self.acc_time = 0.0;
        self.playing = true;
        self.fade = Fade::None;
        self.events.rearm();
        self.tick.register(self.id);
    }

    pub fn pause(&mut self) {
        if self.playing {
            self.playing = false;
            self.tick.unregister(self.id);
        }
    }

    pub fn resume(&mut self) {
        if !self.playing && self.playable.is_some() {
            self.playing = true;
            self.tick.register(self.id);
        }
    }

    pub fn stop(&mut self) {
        self.tick.unregister(self.id);
        if self.playing {
            debug!("{} stopped", self.id);
        }
        self.playing = false;
        self.cur_time = 0.0;
        self.fade = Fade::None;
    }

    /// Fade the current playback out over `duration` seconds. Called during
    /// a fade-in, the fade-out starts from the weight reached so far.
    pub fn fade_out(&mut self, duration: f32) {
        let speed = match self.fade {
            Fade::None => 1.0,
            Fade::In { .. } => self.fade.weight().unwrap_or(1.0),
            Fade::Out { .. } => return,
        };
        let begin = self.cur_time;
        self.fade = Fade::Out {
            begin,
            end: begin + duration,
            time: begin,
            speed,
        };
    }

    /// Restart playback and fade it in over `duration` seconds.
    pub fn fade_in(&mut self, duration: f32, playable: Option<Playable>) {
        if self.playing {
            self.stop();
        }
        self.play(playable);
        let begin = self.cur_time;
        self.fade = Fade::In {
            begin,
            end: begin + duration,
            time: begin,
        };
    }

    /// Fade this session out and return a new session fading `playable` in.
    pub fn fade_to(&mut self, playable: impl Into<Playable>, duration: f32) -> AnimationSession {
        self.fade_out(duration);
        let mut session = AnimationSession::new(self.tick.clone());
        session.fade_in(duration, Some(playable.into()));
        session
    }

    /// Restart this session with a fade-in while a copy of it fades out from
    /// where it was. The returned copy must keep receiving timer callbacks
    /// until it stops.
    pub fn fade_to_self(&mut self, duration: f32) -> AnimationSession {
        let mut old = self.clone();
        old.fade_out(duration);
        self.stop();
        self.fade_in(duration, None);
        old
    }

    /// Blend `value` on top of the playable with `weight`. Clips may go
    /// unnamed; curves and plain values name the curve they blend into.
    pub fn set_blend(&mut self, value: impl Into<Blendable>, weight: f32, curve_name: Option<&str>) {
        let blendable = value.into();
        let name = match (curve_name, &blendable) {
            (Some(name), _) => name.to_string(),
            (None, Blendable::Clip(_)) => DEFAULT_BLEND_NAME.to_string(),
            (None, _) => {
                warn!("{}: a curve or value blend needs a curve name", self.id);
                return;
            }
        };
        self.blendables.insert(
            name,
            BlendEntry {
                blendable,
                weight,
                cache: EvalCache::default(),
                snapshot: ClipSnapshot::default(),
            },
        );
    }

    pub fn unset_blend(&mut self, name: Option<&str>) -> bool {
        self.blendables
            .remove(name.unwrap_or(DEFAULT_BLEND_NAME))
            .is_some()
    }

    pub fn blend_count(&self) -> usize {
        self.blendables.len()
    }

    /// Advance playback by `dt` seconds and write the result to `scene`.
    pub fn on_timer(&mut self, dt: f32, scene: &mut SceneGraph) {
        if !self.playing || self.playable.is_none() {
            return;
        }
        let delta = self.speed * dt;
        self.cur_time += delta;
        self.acc_time += delta;
        trace!("{} at {:.03}s", self.id, self.cur_time);

        let out_of_range = self.cur_time < self.begin_time || self.cur_time > self.end_time;
        if !self.looping && out_of_range {
            self.events.invoke_by_time(self.cur_time);
            self.stop();
            self.events.invoke_by_name(STOP_EVENT);
            return;
        }
        if out_of_range {
            if self.cur_time > self.end_time {
                self.events.invoke_by_time(self.cur_time);
            }
            let duration = self.end_time - self.begin_time;
            self.cur_time = if duration > 0.0 {
                self.begin_time + (self.cur_time - self.begin_time).rem_euclid(duration)
            } else {
                self.begin_time
            };
            self.events.rearm();
        }

        match &mut self.fade {
            Fade::None => {}
            Fade::In { end, time, .. } => {
                *time += dt;
                if *time >= *end {
                    self.fade = Fade::None;
                }
            }
            Fade::Out { end, time, .. } => {
                *time += dt;
                if *time >= *end {
                    self.stop();
                    return;
                }
            }
        }

        self.show_at(scene);
        self.events.invoke_by_time(self.cur_time);
    }

    /// Evaluate at the current time, apply blends, and write to `scene`.
    pub fn show_at(&mut self, scene: &mut SceneGraph) {
        let Some(playable) = &self.playable else {
            return;
        };
        let curves = playable.curves();
        eval_curves_into(curves, self.cur_time, &mut self.cache, &mut self.snapshot);

        for entry in self.blendables.values_mut() {
            let Blendable::Clip(clip) = &entry.blendable else {
                continue;
            };
            clip.eval_cached(
                wrap_time(self.acc_time, clip.duration()),
                &mut entry.cache,
                &mut entry.snapshot,
            );
            linear_blend_except_step(
                curves,
                &mut self.snapshot,
                clip.curves(),
                &entry.snapshot,
                entry.weight,
            );
        }

        for (name, entry) in self.blendables.iter_mut() {
            let blend = match &entry.blendable {
                Blendable::Clip(_) => continue,
                Blendable::Curve(curve) => curve.eval_cached(
                    wrap_time(self.acc_time, curve.duration()),
                    entry.cache.cursor(0),
                ),
                Blendable::Value(value) => Some(AnimationKeyable::new(self.cur_time, *value)),
            };
            let Some(index) = curves.iter().position(|curve| curve.name() == name) else {
                continue;
            };
            let (Some(Some(base)), Some(blend)) = (self.snapshot.keyables.get(index), blend) else {
                continue;
            };
            match AnimationKeyable::linear_blend(base, &blend, entry.weight) {
                Some(blended) => self.snapshot.keyables[index] = Some(blended),
                None => warn!("{}: blend into {} has a mismatched type", self.id, name),
            }
        }

        write_snapshot(curves, &self.snapshot, self.fade.weight(), scene);
    }
}

fn wrap_time(time: f32, duration: f32) -> f32 {
    if duration > 0.0 {
        time.rem_euclid(duration)
    } else {
        0.0
    }
}

impl Clone for AnimationSession {
    /// The copy shares the playable and event callbacks under a new id, and
    /// is registered for timer callbacks when the original is playing.
    fn clone(&self) -> Self {
        let session = Self {
            id: SessionId::next(),
            tick: self.tick.clone(),
            playable: self.playable.clone(),
            begin_time: self.begin_time,
            end_time: self.end_time,
            cur_time: self.cur_time,
            acc_time: self.acc_time,
            speed: self.speed,
            looping: self.looping,
            playing: self.playing,
            fade: self.fade,
            blendables: self.blendables.clone(),
            events: self.events.clone(),
            cache: self.cache.clone(),
            snapshot: self.snapshot.clone(),
        };
        if session.playing {
            session.tick.register(session.id);
        }
        session
    }
}

impl Drop for AnimationSession {
    fn drop(&mut self) {
        self.tick.unregister(self.id);
    }
}

#[cfg(test)]
mod test {
    use std::{cell::RefCell, rc::Rc};

    use crate::{
        animation::{
            curve::InterpolationType,
            keyable::KeyableType,
            target::{AnimationTarget, TargetPath},
        },
        asset::node::DecomposedTransform,
        scene::NodeId,
    };

    use super::*;

    fn setup() -> (SceneGraph, NodeId, TickSource) {
        let mut scene = SceneGraph::new();
        let node = scene.add_node(Some("node".to_string()), DecomposedTransform::default());
        (scene, node, TickSource::new())
    }

    fn slide(node: NodeId, name: &str, from: f32, to: f32) -> AnimationClip {
        let mut curve = AnimationCurve::new("node.localPosition", KeyableType::Vec, InterpolationType::Linear);
        curve.insert_key(0.0, Vec3::new(from, 0.0, 0.0));
        curve.insert_key(1.0, Vec3::new(to, 0.0, 0.0));
        curve.add_target(AnimationTarget::new(node, TargetPath::LocalPosition));
        let mut clip = AnimationClip::new(name);
        clip.add_curve(curve);
        clip
    }

    fn x(scene: &SceneGraph, node: NodeId) -> f32 {
        scene.node(node).unwrap().local_position().x
    }

    #[test]
    fn test_play_writes_to_scene() {
        let (mut scene, node, tick) = setup();
        let mut session = AnimationSession::with_playable(tick.clone(), slide(node, "a", 0.0, 10.0));
        session.play(None);
        assert!(tick.is_registered(session.id()));
        session.on_timer(0.25, &mut scene);
        assert_eq!(x(&scene, node), 2.5);
        assert_eq!(session.state(), SessionState::Playing);
    }

    #[test]
    fn test_play_pause_stop_idempotent() {
        let (mut scene, node, tick) = setup();
        let mut session = AnimationSession::new(tick.clone());
        session.play(Some(slide(node, "a", 0.0, 10.0).into()));
        session.on_timer(0.5, &mut scene);
        session.play(None);
        assert_eq!(session.cur_time(), 0.5);

        session.pause();
        session.pause();
        assert!(!tick.is_registered(session.id()));
        session.on_timer(0.25, &mut scene);
        assert_eq!(session.cur_time(), 0.5);

        session.resume();
        session.resume();
        assert_eq!(tick.listener_count(), 1);

        session.stop();
        session.stop();
        assert_eq!(session.state(), SessionState::Stopped);
        assert_eq!(tick.listener_count(), 0);
    }

    #[test]
    fn test_loop_wraps_and_rearms_events() {
        let (mut scene, node, tick) = setup();
        let fired = Rc::new(RefCell::new(0));
        let counter = fired.clone();
        let mut session = AnimationSession::with_playable(tick, slide(node, "a", 0.0, 10.0));
        session.on("mark", 0.5, Rc::new(move |_: &str, _: f32| *counter.borrow_mut() += 1));
        session.play(None);

        session.on_timer(0.75, &mut scene);
        assert_eq!(*fired.borrow(), 1);
        session.on_timer(0.5, &mut scene);
        assert!((session.cur_time() - 0.25).abs() < 1e-6);
        assert!((x(&scene, node) - 2.5).abs() < 1e-4);
        session.on_timer(0.5, &mut scene);
        assert_eq!(*fired.borrow(), 2);
        assert!(session.is_playing());
    }

    #[test]
    fn test_non_looping_stops_with_event() {
        let (mut scene, node, tick) = setup();
        let mut clip = slide(node, "a", 0.0, 10.0);
        clip.set_looping(false);
        let stopped = Rc::new(RefCell::new(false));
        let flag = stopped.clone();
        let mut session = AnimationSession::with_playable(tick.clone(), clip.clone());
        session.on(STOP_EVENT, 0.0, Rc::new(move |_: &str, _: f32| *flag.borrow_mut() = true));
        session.play(Some(clip.into()));
        session.on_timer(0.5, &mut scene);
        assert!(!*stopped.borrow());
        session.on_timer(0.75, &mut scene);
        assert!(*stopped.borrow());
        assert_eq!(session.state(), SessionState::Stopped);
        assert!(!tick.is_registered(session.id()));
    }

    #[test]
    fn test_fade_out_mid_fade_in() {
        let (mut scene, node, tick) = setup();
        let mut session = AnimationSession::new(tick);
        session.fade_in(1.0, Some(slide(node, "a", 0.0, 10.0).into()));
        assert_eq!(session.state(), SessionState::FadingIn);
        session.on_timer(0.4, &mut scene);
        session.fade_out(1.0);
        assert_eq!(session.state(), SessionState::FadingOut);
        let speed = session.fade_speed();
        assert!(speed > 0.0 && speed < 1.0, "{}", speed);
        assert!((speed - 0.4).abs() < 1e-5);

        // Already fading out
        session.fade_out(5.0);
        assert_eq!(session.fade_speed(), speed);

        session.on_timer(1.1, &mut scene);
        assert_eq!(session.state(), SessionState::Stopped);
    }

    #[test]
    fn test_fade_in_blends_towards_clip() {
        let (mut scene, node, tick) = setup();
        scene.node_mut(node).unwrap().set_local_position(Vec3::new(100.0, 0.0, 0.0));
        let mut session = AnimationSession::new(tick);
        session.fade_in(1.0, Some(slide(node, "a", 0.0, 0.0).into()));
        session.on_timer(0.5, &mut scene);
        assert!((x(&scene, node) - 50.0).abs() < 1e-4);
        session.on_timer(0.6, &mut scene);
        assert_eq!(session.state(), SessionState::Playing);
        assert_eq!(x(&scene, node), 0.0);
    }

    #[test]
    fn test_fade_to() {
        let (mut scene, node, tick) = setup();
        let mut first = AnimationSession::with_playable(tick.clone(), slide(node, "a", 0.0, 0.0));
        first.play(None);
        let mut second = first.fade_to(slide(node, "b", 10.0, 10.0), 0.5);
        assert_eq!(first.state(), SessionState::FadingOut);
        assert_eq!(second.state(), SessionState::FadingIn);
        assert_eq!(tick.listener_count(), 2);
        for _ in 0..6 {
            first.on_timer(0.1, &mut scene);
            second.on_timer(0.1, &mut scene);
        }
        assert_eq!(first.state(), SessionState::Stopped);
        assert_eq!(second.state(), SessionState::Playing);
        assert_eq!(tick.listener_count(), 1);
        assert_eq!(x(&scene, node), 10.0);
    }

    #[test]
    fn test_fade_to_self_keeps_old_pose_fading() {
        let (mut scene, node, tick) = setup();
        let mut session = AnimationSession::with_playable(tick.clone(), slide(node, "a", 0.0, 10.0));
        session.play(None);
        session.on_timer(0.5, &mut scene);
        let old = session.fade_to_self(0.5);
        assert_eq!(old.cur_time(), 0.5);
        assert_eq!(old.state(), SessionState::FadingOut);
        assert_eq!(session.cur_time(), 0.0);
        assert_eq!(session.state(), SessionState::FadingIn);
        assert_eq!(tick.listener_count(), 2);
        drop(old);
        assert_eq!(tick.listener_count(), 1);
    }

    #[test]
    fn test_value_and_clip_blends() {
        let (mut scene, node, tick) = setup();
        let mut session = AnimationSession::with_playable(tick, slide(node, "a", 0.0, 0.0));
        session.play(None);

        session.set_blend(Vec3::new(8.0, 0.0, 0.0), 0.5, Some("node.localPosition"));
        session.on_timer(0.1, &mut scene);
        assert_eq!(x(&scene, node), 4.0);

        // Values need a curve name
        session.set_blend(1.0f32, 0.5, None);
        assert_eq!(session.blend_count(), 1);
        assert!(session.unset_blend(Some("node.localPosition")));

        session.set_blend(slide(node, "b", 4.0, 4.0), 0.25, None);
        session.on_timer(0.1, &mut scene);
        assert_eq!(x(&scene, node), 1.0);
        assert!(session.unset_blend(None));
        session.on_timer(0.1, &mut scene);
        assert_eq!(x(&scene, node), 0.0);
    }

    #[test]
    fn test_clone_shares_callbacks() {
        let (mut scene, node, tick) = setup();
        let fired = Rc::new(RefCell::new(0));
        let counter = fired.clone();
        let mut session = AnimationSession::with_playable(tick.clone(), slide(node, "a", 0.0, 1.0));
        session.on("half", 0.5, Rc::new(move |_: &str, _: f32| *counter.borrow_mut() += 1));
        let mut copy = session.clone();
        assert_ne!(copy.id(), session.id());
        copy.play(None);
        copy.on_timer(0.6, &mut scene);
        assert_eq!(*fired.borrow(), 1);
        assert!(!tick.is_registered(session.id()));
    }
}
