use std::{
    cell::RefCell,
    collections::BTreeSet,
    fmt::{self, Display, Formatter},
    rc::Rc,
    sync::atomic::{AtomicUsize, Ordering},
};

use log::trace;

static SESSION_ID_COUNTER: AtomicUsize = AtomicUsize::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(usize);

impl SessionId {
    pub(crate) fn next() -> Self {
        Self(SESSION_ID_COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "session #{}", self.0)
    }
}

/// Registry of the sessions that want a timer callback every frame.
///
/// Handles are cheap clones sharing one registry. A session registers itself
/// when it starts playing and unregisters when it stops or pauses, and the
/// frame driver only ticks registered sessions.
#[derive(Debug, Clone, Default)]
pub struct TickSource {
    listeners: Rc<RefCell<BTreeSet<SessionId>>>,
}

impl TickSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: SessionId) -> bool {
        let inserted = self.listeners.borrow_mut().insert(id);
        if inserted {
            trace!("Register {} for timer callbacks", id);
        }
        inserted
    }

    pub fn unregister(&self, id: SessionId) -> bool {
        let removed = self.listeners.borrow_mut().remove(&id);
        if removed {
            trace!("Unregister {} from timer callbacks", id);
        }
        removed
    }

    pub fn is_registered(&self, id: SessionId) -> bool {
        self.listeners.borrow().contains(&id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn listeners(&self) -> Vec<SessionId> {
        self.listeners.borrow().iter().copied().collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_shared_registry() {
        let tick = TickSource::new();
        let other = tick.clone();
        let id = SessionId::next();
        assert!(tick.register(id));
        assert!(!other.register(id));
        assert!(other.is_registered(id));
        assert_eq!(tick.listener_count(), 1);
        assert!(other.unregister(id));
        assert!(!tick.is_registered(id));
    }
}
