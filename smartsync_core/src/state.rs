//! The motion states an object can be in, and their legacy wire ids
use serde::{Deserialize, Serialize};

/// Humanoid bones an object can be attached to.
///
/// The discriminants follow the usual humanoid rig ordering so that the legacy
/// negative state ids (`-1 - bone`) stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Bone {
    Hips = 0,
    LeftUpperLeg = 1,
    RightUpperLeg = 2,
    LeftLowerLeg = 3,
    RightLowerLeg = 4,
    LeftFoot = 5,
    RightFoot = 6,
    Spine = 7,
    Chest = 8,
    Neck = 9,
    Head = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftUpperArm = 13,
    RightUpperArm = 14,
    LeftLowerArm = 15,
    RightLowerArm = 16,
    LeftHand = 17,
    RightHand = 18,
}

impl Bone {
    const ALL: [Bone; 19] = [
        Bone::Hips,
        Bone::LeftUpperLeg,
        Bone::RightUpperLeg,
        Bone::LeftLowerLeg,
        Bone::RightLowerLeg,
        Bone::LeftFoot,
        Bone::RightFoot,
        Bone::Spine,
        Bone::Chest,
        Bone::Neck,
        Bone::Head,
        Bone::LeftShoulder,
        Bone::RightShoulder,
        Bone::LeftUpperArm,
        Bone::RightUpperArm,
        Bone::LeftLowerArm,
        Bone::RightLowerArm,
        Bone::LeftHand,
        Bone::RightHand,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }
}

/// Which hand of the local player is holding an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub fn bone(self) -> Bone {
        match self {
            Hand::Left => Bone::LeftHand,
            Hand::Right => Bone::RightHand,
        }
    }

    pub fn held_state(self) -> MotionState {
        match self {
            Hand::Left => MotionState::HeldLeftHand,
            Hand::Right => MotionState::HeldRightHand,
        }
    }
}

/// What a state's pose is expressed relative to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentTarget {
    World,
    PlayerRoot,
    Bone(Bone),
}

/// The motion state of a replicated object.
///
/// Only the authority of the object changes it; the other peers learn about it through replication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MotionState {
    /// Settled at the target pose, rigid body asleep
    Sleeping,
    /// Snapped to the target pose without interpolation
    #[default]
    Teleporting,
    /// Free flight driven by physics on the authority
    Interpolating,
    /// Projectile motion; receivers detect bounces
    Falling,
    HeldLeftHand,
    HeldRightHand,
    /// Held by a player whose avatar has no hand bone; follows the player root
    HeldNoHand,
    AttachedToPlayspace,
    /// Pinned in world space during an ownership handover
    WorldLocked,
    AttachedToBone(Bone),
    /// Index into the registered custom state table
    Custom(usize),
}

/// First legacy wire id used by custom states
pub const CUSTOM_STATE_OFFSET: i32 = 9;

impl MotionState {
    /// Legacy wire id: built-in states are `0..=8`, custom states `9 + index`,
    /// bone attachments are negative (`-1 - bone`).
    ///
    /// Returns `None` for custom indices that don't fit in an `i32`.
    pub fn wire_id(self) -> Option<i32> {
        Some(match self {
            MotionState::Sleeping => 0,
            MotionState::Teleporting => 1,
            MotionState::Interpolating => 2,
            MotionState::Falling => 3,
            MotionState::HeldLeftHand => 4,
            MotionState::HeldRightHand => 5,
            MotionState::HeldNoHand => 6,
            MotionState::AttachedToPlayspace => 7,
            MotionState::WorldLocked => 8,
            MotionState::AttachedToBone(bone) => -1 - bone.index() as i32,
            MotionState::Custom(index) => {
                CUSTOM_STATE_OFFSET.checked_add(i32::try_from(index).ok()?)?
            }
        })
    }

    pub fn from_wire_id(id: i32) -> Option<Self> {
        Some(match id {
            0 => MotionState::Sleeping,
            1 => MotionState::Teleporting,
            2 => MotionState::Interpolating,
            3 => MotionState::Falling,
            4 => MotionState::HeldLeftHand,
            5 => MotionState::HeldRightHand,
            6 => MotionState::HeldNoHand,
            7 => MotionState::AttachedToPlayspace,
            8 => MotionState::WorldLocked,
            id if id < 0 => {
                let bone = u8::try_from(-1 - id).ok()?;
                MotionState::AttachedToBone(Bone::from_index(bone)?)
            }
            id => MotionState::Custom((id - CUSTOM_STATE_OFFSET) as usize),
        })
    }

    pub fn is_held(self) -> bool {
        matches!(
            self,
            MotionState::HeldLeftHand | MotionState::HeldRightHand | MotionState::HeldNoHand
        )
    }

    /// States that follow a player (held or attached)
    pub fn follows_player(self) -> bool {
        self.is_held()
            || matches!(
                self,
                MotionState::AttachedToPlayspace | MotionState::AttachedToBone(_)
            )
    }

    /// States in which physics drives the object on the authority
    pub fn is_free(self) -> bool {
        matches!(self, MotionState::Interpolating | MotionState::Falling)
    }

    /// States in which the local player may not keep holding the object
    pub fn forbids_pickup(self) -> bool {
        matches!(
            self,
            MotionState::AttachedToPlayspace | MotionState::AttachedToBone(_)
        )
    }

    /// Frame the replicated pose is expressed in. Custom states are expressed in world space.
    pub fn attachment_target(self) -> AttachmentTarget {
        match self {
            MotionState::HeldLeftHand => AttachmentTarget::Bone(Bone::LeftHand),
            MotionState::HeldRightHand => AttachmentTarget::Bone(Bone::RightHand),
            MotionState::AttachedToBone(bone) => AttachmentTarget::Bone(bone),
            MotionState::HeldNoHand | MotionState::AttachedToPlayspace => {
                AttachmentTarget::PlayerRoot
            }
            _ => AttachmentTarget::World,
        }
    }
}
