//! User-defined motion states
//!
//! Custom states are registered on the object before it starts ticking and are addressed
//! by their index in the [`CustomStateTable`]. They are replicated as [`MotionState::Custom`].
//!
//! [`MotionState::Custom`]: smartsync_core::state::MotionState::Custom
use crate::error::CustomStateError;
use crate::object::ReplicatedObject;

pub type HookResult<T = ()> = core::result::Result<T, CustomStateError>;

/// The lifecycle hooks of a custom state.
///
/// Every hook receives the object it is attached to. The default implementations behave like a
/// free-flying object whose pose is expressed in world space.
pub trait CustomState: Send + Sync {
    fn on_enter(&mut self, object: &mut ReplicatedObject) -> HookResult {
        Ok(())
    }

    fn on_exit(&mut self, object: &mut ReplicatedObject) -> HookResult {
        Ok(())
    }

    /// Capture the snapshot that will be published (only called on the authority)
    fn on_serialize(&mut self, object: &mut ReplicatedObject) -> HookResult {
        object.capture_snapshot();
        Ok(())
    }

    fn on_interpolation_start(&mut self, object: &mut ReplicatedObject) -> HookResult {
        Ok(())
    }

    /// `t` is the interpolation fraction in `[0, 1]`
    fn on_interpolate_step(&mut self, object: &mut ReplicatedObject, t: f32) -> HookResult {
        if !object.is_local_authority() {
            object.follow_hermite(t);
        }
        Ok(())
    }

    /// Return true to keep the interpolation loop running
    fn on_interpolation_end(&mut self, object: &mut ReplicatedObject) -> HookResult<bool> {
        if !object.is_local_authority() {
            object.apply_synced_velocity();
        }
        Ok(false)
    }
}

/// Arena of custom states. Indices are stable once registered.
#[derive(Default)]
pub struct CustomStateTable {
    slots: Vec<Option<Box<dyn CustomState>>>,
}

impl core::fmt::Debug for CustomStateTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CustomStateTable")
            .field("len", &self.slots.len())
            .finish()
    }
}

impl CustomStateTable {
    /// Register a state and return its index
    pub fn register(&mut self, state: Box<dyn CustomState>) -> usize {
        self.slots.push(Some(state));
        self.slots.len() - 1
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_registered(&self, index: usize) -> bool {
        index < self.slots.len()
    }

    /// Take the state out of its slot while one of its hooks runs.
    ///
    /// Returns `None` if the index is invalid or if the state is already running a hook.
    pub(crate) fn take(&mut self, index: usize) -> Option<Box<dyn CustomState>> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    pub(crate) fn restore(&mut self, index: usize, state: Box<dyn CustomState>) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Some(state);
        }
    }
}
