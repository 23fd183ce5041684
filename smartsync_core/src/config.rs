//! Per-object sync configuration
use bevy_math::Vec3;
use core::time::Duration;
use serde::{Deserialize, Serialize};

/// Config that controls how a replicated object publishes, interpolates and arbitrates ownership
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// The authority respawns the object when it falls to or below this height
    pub respawn_height: f32,
    /// Gravity of the physics world, used to detect bounces of falling objects
    pub gravity: Vec3,
    /// Duration of one physics step
    pub fixed_timestep: Duration,
    /// Offset drift (in units) above which the authority resyncs an attached object
    pub resync_position_threshold: f32,
    /// Rotation similarity (absolute quaternion dot product) under which the authority resyncs
    pub resync_rotation_threshold: f32,
    /// Minimum interval between two periodic publishes of a moving object
    pub publish_interval: Duration,
    /// Upper bound of the random delay added before retrying a rejected publish
    pub retry_jitter: Duration,
    /// If set, the authority pins a held object back onto its last synced offset
    /// once this grace period elapsed after the last publish
    pub held_jitter_grace: Option<Duration>,
    /// Keep forcing the pose of a sleeping object that physics failed to settle
    pub prevent_sleep_jitter: bool,
    /// Take ownership of the objects we collide with
    pub take_ownership_on_collision: bool,
    /// Let other peers take ownership of this object when they collide with it
    pub allow_takeover_on_collision: bool,
    /// Seed of the jitter generator. `None` seeds from the OS.
    pub rng_seed: Option<u64>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            respawn_height: -100.0,
            gravity: Vec3::new(0.0, -9.81, 0.0),
            fixed_timestep: Duration::from_millis(20),
            resync_position_threshold: 0.015,
            resync_rotation_threshold: 0.995,
            publish_interval: Duration::from_millis(250),
            retry_jitter: Duration::from_millis(250),
            held_jitter_grace: None,
            prevent_sleep_jitter: true,
            take_ownership_on_collision: true,
            allow_takeover_on_collision: true,
            rng_seed: None,
        }
    }
}

impl SyncConfig {
    pub fn with_respawn_height(mut self, respawn_height: f32) -> Self {
        self.respawn_height = respawn_height;
        self
    }

    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_fixed_timestep(mut self, fixed_timestep: Duration) -> Self {
        self.fixed_timestep = fixed_timestep;
        self
    }

    pub fn with_publish_interval(mut self, publish_interval: Duration) -> Self {
        self.publish_interval = publish_interval;
        self
    }

    pub fn with_retry_jitter(mut self, retry_jitter: Duration) -> Self {
        self.retry_jitter = retry_jitter;
        self
    }

    pub fn with_held_jitter_grace(mut self, grace: Duration) -> Self {
        self.held_jitter_grace = Some(grace);
        self
    }

    pub fn with_prevent_sleep_jitter(mut self, prevent_sleep_jitter: bool) -> Self {
        self.prevent_sleep_jitter = prevent_sleep_jitter;
        self
    }

    pub fn with_collision_takeover(mut self, take: bool, allow: bool) -> Self {
        self.take_ownership_on_collision = take;
        self.allow_takeover_on_collision = allow;
        self
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }
}
