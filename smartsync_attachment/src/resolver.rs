use smartsync_core::frame::Frame;
use smartsync_core::host::PlayerRig;
use smartsync_core::id::PeerId;
use smartsync_core::state::AttachmentTarget;
use tracing::debug;

/// The frame a state's pose is expressed in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedFrame {
    pub frame: Frame,
    /// The requested bone or player was missing and a coarser frame was used instead
    pub fallback: bool,
}

impl ResolvedFrame {
    fn exact(frame: Frame) -> Self {
        Self {
            frame,
            fallback: false,
        }
    }

    fn fallback(frame: Frame) -> Self {
        Self {
            frame,
            fallback: true,
        }
    }
}

/// Resolve the parent frame of `target` for an object owned by `owner`.
///
/// - unattached states use the world origin
/// - playspace attachments use the player's root
/// - hand/bone attachments use the bone pose, falling back to the player's root when the avatar
///   doesn't have the bone (missing, or reported at the zero position)
///
/// Missing data is never an error: the worst case is the world origin.
pub fn compute_parent_frame(
    target: AttachmentTarget,
    owner: PeerId,
    rig: &dyn PlayerRig,
) -> ResolvedFrame {
    match target {
        AttachmentTarget::World => ResolvedFrame::exact(Frame::WORLD),
        AttachmentTarget::PlayerRoot => root_frame(owner, rig),
        AttachmentTarget::Bone(bone) => match rig.bone(owner, bone) {
            Some(frame) if !frame.is_degenerate() => ResolvedFrame::exact(frame),
            _ => {
                debug!(?owner, ?bone, "bone not available, falling back to the player root");
                ResolvedFrame {
                    fallback: true,
                    ..root_frame(owner, rig)
                }
            }
        },
    }
}

fn root_frame(owner: PeerId, rig: &dyn PlayerRig) -> ResolvedFrame {
    match rig.root(owner) {
        Some(frame) => ResolvedFrame::exact(frame),
        None => {
            debug!(?owner, "player root not available, using the world origin");
            ResolvedFrame::fallback(Frame::WORLD)
        }
    }
}
