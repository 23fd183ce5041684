//! # Smartsync Attachment
//!
//! Objects that are held or attached to a player replicate their pose as an offset from a
//! moving parent frame (a hand bone, or the player's root). This crate resolves that frame
//! from the host's avatar rig, and detects when the authority's local offset drifted away
//! from the last published one.

pub mod drift;
pub mod resolver;

/// Commonly used items for attachments.
pub mod prelude {
    pub use crate::drift::{DriftMonitor, DriftThresholds};
    pub use crate::resolver::{ResolvedFrame, compute_parent_frame};
}
