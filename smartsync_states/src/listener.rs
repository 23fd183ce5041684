//! Observers of a replicated object
use smartsync_core::id::{ObjectId, PeerId};
use smartsync_core::state::MotionState;
use std::sync::{Arc, Weak};
use tracing::trace;

/// Receives the state and authority changes of a replicated object.
///
/// Callbacks are fired synchronously, within the call that caused the change.
pub trait SyncListener: Send + Sync {
    fn on_state_changed(&self, object: ObjectId, old: MotionState, new: MotionState) {}

    fn on_authority_changed(&self, object: ObjectId, old: PeerId, new: PeerId) {}
}

/// Set of weakly-held listeners, in registration order.
///
/// Registering the same listener twice is a no-op. Listeners that were dropped are pruned
/// the next time an event is fired.
#[derive(Default)]
pub struct ListenerSet {
    listeners: Vec<Weak<dyn SyncListener>>,
}

impl core::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("len", &self.listeners.len())
            .finish()
    }
}

impl ListenerSet {
    /// Returns false if the listener was already registered
    pub fn add(&mut self, listener: &Arc<dyn SyncListener>) -> bool {
        let weak = Arc::downgrade(listener);
        if self.listeners.iter().any(|l| Weak::ptr_eq(l, &weak)) {
            return false;
        }
        self.listeners.push(weak);
        true
    }

    /// Returns false if the listener was not registered
    pub fn remove(&mut self, listener: &Arc<dyn SyncListener>) -> bool {
        let weak = Arc::downgrade(listener);
        let len = self.listeners.len();
        self.listeners.retain(|l| !Weak::ptr_eq(l, &weak));
        self.listeners.len() != len
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn notify_state_changed(&mut self, object: ObjectId, old: MotionState, new: MotionState) {
        self.for_each(|listener| listener.on_state_changed(object, old, new));
    }

    pub fn notify_authority_changed(&mut self, object: ObjectId, old: PeerId, new: PeerId) {
        self.for_each(|listener| listener.on_authority_changed(object, old, new));
    }

    fn for_each(&mut self, mut f: impl FnMut(&dyn SyncListener)) {
        let len = self.listeners.len();
        self.listeners.retain(|weak| match weak.upgrade() {
            Some(listener) => {
                f(listener.as_ref());
                true
            }
            None => false,
        });
        if self.listeners.len() != len {
            trace!(pruned = len - self.listeners.len(), "pruned dropped listeners");
        }
    }
}
