use std::{
    fmt::{self, Debug, Formatter},
    rc::Rc,
};

use log::trace;

/// Event fired when a non-looping session runs off its time range. It only
/// fires by name, never by time.
pub const STOP_EVENT: &str = "stop";

/// Called with the event name and its trigger time.
pub type EventCallback = Rc<dyn Fn(&str, f32)>;

#[derive(Clone)]
pub struct AnimationEvent {
    name: String,
    trigger_time: f32,
    callback: EventCallback,
    triggered: bool,
}

impl Debug for AnimationEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationEvent")
            .field("name", &self.name)
            .field("trigger_time", &self.trigger_time)
            .field("triggered", &self.triggered)
            .finish_non_exhaustive()
    }
}

impl AnimationEvent {
    pub fn new(name: impl Into<String>, trigger_time: f32, callback: EventCallback) -> Self {
        Self {
            name: name.into(),
            trigger_time,
            callback,
            triggered: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trigger_time(&self) -> f32 {
        self.trigger_time
    }

    pub fn triggered(&self) -> bool {
        self.triggered
    }

    pub fn invoke(&mut self) {
        trace!("Invoke animation event {} at {}", self.name, self.trigger_time);
        self.triggered = true;
        (self.callback)(&self.name, self.trigger_time);
    }
}

/// Events of a session, kept in trigger time order.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Vec<AnimationEvent>,
}

impl EventQueue {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnimationEvent> {
        self.events.iter()
    }

    /// Add an event after every event with the same or an earlier time.
    pub fn on(&mut self, name: impl Into<String>, trigger_time: f32, callback: EventCallback) {
        let index = self
            .events
            .partition_point(|event| event.trigger_time <= trigger_time);
        self.events
            .insert(index, AnimationEvent::new(name, trigger_time, callback));
    }

    /// Remove events named `name`, only those at `trigger_time` when given.
    /// Returns the number of removed events.
    pub fn off(&mut self, name: &str, trigger_time: Option<f32>) -> usize {
        let before = self.events.len();
        self.events.retain(|event| {
            event.name != name || trigger_time.is_some_and(|time| event.trigger_time != time)
        });
        before - self.events.len()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Fire every pending event due at `time`, earliest first. Each event
    /// fires once until [`EventQueue::rearm`].
    pub fn invoke_by_time(&mut self, time: f32) -> usize {
        let mut fired = 0;
        for event in &mut self.events {
            if event.trigger_time > time {
                break;
            }
            if !event.triggered && event.name != STOP_EVENT {
                event.invoke();
                fired += 1;
            }
        }
        fired
    }

    /// Fire every event named `name`, regardless of its time.
    pub fn invoke_by_name(&mut self, name: &str) -> usize {
        let mut fired = 0;
        for event in self.events.iter_mut().filter(|event| event.name == name) {
            event.invoke();
            fired += 1;
        }
        fired
    }

    pub fn rearm(&mut self) {
        self.events.iter_mut().for_each(|event| event.triggered = false);
    }
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;

    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<String>>>, EventCallback) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let callback: EventCallback = Rc::new(move |name: &str, time: f32| {
            sink.borrow_mut().push(format!("{}@{}", name, time))
        });
        (log, callback)
    }

    #[test]
    fn test_fires_in_order_once() {
        let (log, callback) = recorder();
        let mut queue = EventQueue::default();
        queue.on("b", 2.0, callback.clone());
        queue.on("a", 1.0, callback.clone());
        queue.on("c", 3.0, callback);

        assert_eq!(queue.invoke_by_time(2.5), 2);
        assert_eq!(queue.invoke_by_time(2.5), 0);
        assert_eq!(*log.borrow(), vec!["a@1", "b@2"]);

        queue.rearm();
        assert_eq!(queue.invoke_by_time(1.0), 1);
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn test_off() {
        let (_, callback) = recorder();
        let mut queue = EventQueue::default();
        queue.on("hit", 1.0, callback.clone());
        queue.on("hit", 2.0, callback.clone());
        queue.on("stop", 0.0, callback);
        assert_eq!(queue.off("hit", Some(2.0)), 1);
        assert_eq!(queue.off("hit", None), 1);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_invoke_by_name() {
        let (log, callback) = recorder();
        let mut queue = EventQueue::default();
        queue.on(STOP_EVENT, 0.0, callback);
        assert_eq!(queue.invoke_by_time(1.0), 0);
        assert_eq!(queue.invoke_by_name(STOP_EVENT), 1);
        assert_eq!(queue.invoke_by_name("missing"), 0);
        assert_eq!(*log.borrow(), vec!["stop@0"]);
    }
}
