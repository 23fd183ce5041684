//! Behaviour of each motion state.
//!
//! Every state implements the same six hooks:
//! - `enter` / `exit`: run on every peer when the state changes
//! - `serialize`: run on the authority to capture the snapshot to publish
//! - `interpolation_start`: run when the interpolation is (re)started
//! - `interpolate_step(t)`: run once per frame while the interpolation loop is active
//! - `interpolation_end`: run when the interpolation window is over; returns true to keep
//!   the loop running
//!
//! Built-in states are dispatched statically; custom states go through the
//! [`CustomStateTable`](crate::custom::CustomStateTable).
use crate::custom::{CustomState, HookResult};
use crate::error::{Result, SyncError};
use crate::object::ReplicatedObject;
use smartsync_core::state::MotionState;
use tracing::trace;

mod attached;
mod free;
mod sleeping;
mod teleporting;
mod world_locked;

impl ReplicatedObject {
    pub(crate) fn run_enter(&mut self) -> Result<()> {
        match self.state {
            MotionState::Sleeping => self.sleeping_enter(),
            MotionState::Teleporting => self.teleporting_enter(),
            MotionState::Interpolating | MotionState::Falling => self.free_enter(),
            MotionState::HeldLeftHand
            | MotionState::HeldRightHand
            | MotionState::HeldNoHand
            | MotionState::AttachedToPlayspace
            | MotionState::AttachedToBone(_) => self.attached_enter(),
            MotionState::WorldLocked => self.world_locked_enter(),
            MotionState::Custom(index) => {
                return self.with_custom_state(index, |state, object| state.on_enter(object));
            }
        }
        Ok(())
    }

    pub(crate) fn run_exit(&mut self) -> Result<()> {
        match self.state {
            MotionState::Custom(index) => {
                self.with_custom_state(index, |state, object| state.on_exit(object))
            }
            MotionState::HeldLeftHand
            | MotionState::HeldRightHand
            | MotionState::HeldNoHand
            | MotionState::AttachedToPlayspace
            | MotionState::AttachedToBone(_) => {
                self.attached_exit();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn run_serialize(&mut self) -> Result<()> {
        match self.state {
            MotionState::Sleeping => self.sleeping_serialize(),
            MotionState::HeldLeftHand
            | MotionState::HeldRightHand
            | MotionState::HeldNoHand
            | MotionState::AttachedToPlayspace
            | MotionState::AttachedToBone(_) => self.attached_serialize(),
            MotionState::WorldLocked => self.world_locked_serialize(),
            MotionState::Teleporting | MotionState::Interpolating | MotionState::Falling => {
                self.capture_snapshot();
            }
            MotionState::Custom(index) => {
                return self.with_custom_state(index, |state, object| state.on_serialize(object));
            }
        }
        Ok(())
    }

    pub(crate) fn run_interpolation_start(&mut self) -> Result<()> {
        match self.state {
            MotionState::Teleporting => self.teleporting_interpolation_start(),
            MotionState::Falling => self.falling_interpolation_start(),
            MotionState::Custom(index) => {
                return self.with_custom_state(index, |state, object| {
                    state.on_interpolation_start(object)
                });
            }
            _ => {}
        }
        Ok(())
    }

    pub(crate) fn run_interpolate_step(&mut self, t: f32) -> Result<()> {
        match self.state {
            MotionState::Sleeping => self.sleeping_step(t),
            MotionState::Teleporting => self.teleporting_snap(),
            MotionState::Interpolating => self.free_step(t),
            MotionState::Falling => self.falling_step(t),
            MotionState::HeldLeftHand
            | MotionState::HeldRightHand
            | MotionState::HeldNoHand
            | MotionState::AttachedToPlayspace
            | MotionState::AttachedToBone(_) => self.attached_step(t)?,
            MotionState::WorldLocked => self.world_locked_step(t),
            MotionState::Custom(index) => {
                return self.with_custom_state(index, |state, object| {
                    state.on_interpolate_step(object, t)
                });
            }
        }
        Ok(())
    }

    pub(crate) fn run_interpolation_end(&mut self) -> Result<bool> {
        match self.state {
            MotionState::Sleeping => Ok(self.sleeping_end()),
            MotionState::Teleporting => Ok(false),
            MotionState::Interpolating | MotionState::Falling => self.free_end(),
            MotionState::HeldLeftHand
            | MotionState::HeldRightHand
            | MotionState::HeldNoHand
            | MotionState::AttachedToPlayspace
            | MotionState::AttachedToBone(_)
            | MotionState::WorldLocked => Ok(true),
            MotionState::Custom(index) => {
                self.with_custom_state(index, |state, object| state.on_interpolation_end(object))
            }
        }
    }

    /// Run a hook of the custom state `index`.
    ///
    /// The state is taken out of the table while its hook runs. A hook that re-enters its own
    /// state (for example by changing state from `on_interpolation_end`) skips the nested call.
    fn with_custom_state<T: Default>(
        &mut self,
        index: usize,
        hook: impl FnOnce(&mut dyn CustomState, &mut ReplicatedObject) -> HookResult<T>,
    ) -> Result<T> {
        let Some(mut state) = self.custom_states.take(index) else {
            if self.custom_states.is_registered(index) {
                trace!(object = ?self.id, index, "custom state hook is already running");
                return Ok(T::default());
            }
            return Err(SyncError::InvalidCustomState(index));
        };
        let result = hook(state.as_mut(), self);
        self.custom_states.restore(index, state);
        Ok(result?)
    }
}
