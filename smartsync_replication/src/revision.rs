//! Ordering of replicated updates
//!
//! Updates travel over an unreliable unordered transport, so the receiver needs a way to tell
//! whether an update is newer than what it already applied. Every update carries a [`Revision`]:
//! a state-change counter plus a publish sequence number.
use serde::{Deserialize, Serialize};
use smartsync_core::state::MotionState;

/// Version of a replicated object.
///
/// Compared lexicographically: a new state change always wins over any number of
/// publishes of the previous state.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Revision {
    /// Incremented by the authority on every local state change
    pub change: u32,
    /// Incremented by the authority on every publish
    pub sequence: u32,
}

impl Revision {
    pub fn new(change: u32, sequence: u32) -> Self {
        Self { change, sequence }
    }

    /// Revision after a local state change
    #[must_use]
    pub fn next_change(self) -> Self {
        Self {
            change: self.change.wrapping_add(1),
            sequence: self.sequence,
        }
    }

    /// Revision of the next publish
    #[must_use]
    pub fn next_sequence(self) -> Self {
        Self {
            change: self.change,
            sequence: self.sequence.wrapping_add(1),
        }
    }
}

/// Remembers the latest revision that was applied (or published) locally
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevisionTracker {
    last: Option<Revision>,
}

impl RevisionTracker {
    pub fn last(&self) -> Option<Revision> {
        self.last
    }

    pub fn is_newer(&self, revision: Revision) -> bool {
        self.last.is_none_or(|last| revision > last)
    }

    /// Returns true (and records the revision) if the revision is strictly newer than
    /// every revision seen so far. Stale and duplicate revisions are rejected.
    pub fn accept(&mut self, revision: Revision) -> bool {
        if !self.is_newer(revision) {
            return false;
        }
        self.last = Some(revision);
        true
    }

    /// Record a revision without comparing it, for example one that we published ourselves
    pub fn observe(&mut self, revision: Revision) {
        self.last = Some(self.last.map_or(revision, |last| last.max(revision)));
    }
}

/// Legacy compact encoding of a state id and its change counter into a single integer:
/// `state * 10 ± (counter % 10)`, where the counter digit carries the sign of the state id.
///
/// Only useful for hosts that must stay wire-compatible with peers using this packing;
/// [`Revision`] should be preferred otherwise since one digit of counter wraps very quickly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateCode(pub i32);

impl StateCode {
    /// Returns `None` if the wire id of the state is too large to be packed
    pub fn pack(state: MotionState, counter: u32) -> Option<Self> {
        let id = state.wire_id()?.checked_mul(10)?;
        let digit = (counter % 10) as i32;
        let code = if id < 0 {
            id.checked_sub(digit)?
        } else {
            id.checked_add(digit)?
        };
        Some(Self(code))
    }

    /// Legacy wire id of the state
    pub fn state_id(self) -> i32 {
        self.0 / 10
    }

    pub fn state(self) -> Option<MotionState> {
        MotionState::from_wire_id(self.state_id())
    }

    /// Change counter modulo 10
    pub fn counter(self) -> u32 {
        (self.0 % 10).unsigned_abs()
    }

    /// A packed update is new if the state or the counter digit differ from the last applied one
    pub fn differs_from(self, last: StateCode) -> bool {
        self != last
    }
}
