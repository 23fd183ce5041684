//! Deferred work of a replicated object
//!
//! Nothing in the state machine blocks or relies on engine timers: work that has to happen later
//! (the next interpolation pass, the second half of a drop, a resync request...) is pushed as a
//! [`Continuation`] keyed by frame count or by time, and drained at the start of each tick.
use core::time::Duration;
use smartsync_core::state::MotionState;
use smartsync_utils::ready_buffer::ReadyBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// Run one pass of the interpolation loop
    Interpolate,
    /// Demote a dropped object, unless it was picked up again in the meantime (hand swap)
    ConfirmDrop { state: MotionState, revision: u32 },
    /// Release the world lock set while taking authority of a held object
    ReleaseWorldLock { revision: u32 },
    /// Retry a publish that was rejected by the transport
    RetryPublish,
    /// Ask the authority for its state
    ResyncRequest,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    by_frame: ReadyBuffer<u64, Continuation>,
    by_time: ReadyBuffer<Duration, Continuation>,
}

impl Scheduler {
    /// Run the continuation once the frame counter reaches `frame`
    pub fn at_frame(&mut self, frame: u64, continuation: Continuation) {
        self.by_frame.push(frame, continuation);
    }

    /// Run the continuation on the first tick at or after `time`
    pub fn at_time(&mut self, time: Duration, continuation: Continuation) {
        self.by_time.push(time, continuation);
    }

    /// Pop every continuation that is ready. Frame-keyed continuations come first.
    pub fn drain_ready(&mut self, frame: u64, now: Duration) -> Vec<Continuation> {
        self.by_frame
            .drain_until(&frame)
            .into_iter()
            .map(|(_, continuation)| continuation)
            .chain(
                self.by_time
                    .drain_until(&now)
                    .into_iter()
                    .map(|(_, continuation)| continuation),
            )
            .collect()
    }

    pub fn contains(&self, mut predicate: impl FnMut(&Continuation) -> bool) -> bool {
        self.by_frame.contains(&mut predicate) || self.by_time.contains(&mut predicate)
    }

    pub fn count(&self, mut predicate: impl FnMut(&Continuation) -> bool) -> usize {
        self.by_frame.count(&mut predicate) + self.by_time.count(&mut predicate)
    }

    /// Remove every scheduled continuation matching the predicate
    pub fn cancel(&mut self, mut predicate: impl FnMut(&Continuation) -> bool) {
        self.by_frame.retain(|c| !predicate(c));
        self.by_time.retain(|c| !predicate(c));
    }

    pub fn len(&self) -> usize {
        self.by_frame.len() + self.by_time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_frame.is_empty() && self.by_time.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_frame.clear();
        self.by_time.clear();
    }
}
