//! Block components and the per-block stabilization sub-state.

use bevy::prelude::*;

/// Tag for any surface a new block may be placed on (base platform and all
/// blocks). Pick raycasts and support probes ignore anything without it.
#[derive(Component)]
pub struct Platform;

/// The immobile platform every tower stands on. Exactly one exists per tower.
#[derive(Component)]
pub struct BasePlatform;

/// The foundation block spawned with the tower; it never scores and carries
/// no stabilization sub-state.
#[derive(Component)]
pub struct InitialBlock;

/// A stacked block. The rigid body lives in the physics state; this holds the
/// half extents the placement and stability logic need.
#[derive(Component)]
pub struct Block {
    pub half_extents: Vec3,
}

impl Block {
    /// Full footprint width, the larger of the two horizontal extents.
    pub fn footprint(&self) -> f32 {
        self.half_extents.x.max(self.half_extents.z) * 2.0
    }
}

/// Per-block stabilization state, ticked on the physics clock for a bounded
/// window after placement.
#[derive(Component)]
pub struct Stabilizer {
    /// Seconds (physics-scaled) since the block was placed.
    pub time_alive: f32,
    pub last_position: Vec3,
    pub last_rotation: Quat,
    /// Set once; a stable block got its settling mass bump.
    pub is_stable: bool,
    /// The first-contact nudge fires at most once.
    pub contact_jitter_done: bool,
}

impl Stabilizer {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self {
            time_alive: 0.0,
            last_position: position,
            last_rotation: rotation,
            is_stable: false,
            contact_jitter_done: false,
        }
    }

    /// Compare the current pose against the previous tick's and record it.
    /// Returns true exactly once, on the tick the block first counts as
    /// still.
    pub fn observe(
        &mut self,
        position: Vec3,
        rotation: Quat,
        position_epsilon: f32,
        rotation_epsilon_deg: f32,
    ) -> bool {
        let position_delta = position.distance(self.last_position);
        let rotation_delta = rotation.angle_between(self.last_rotation).to_degrees();
        self.last_position = position;
        self.last_rotation = rotation;

        if self.is_stable {
            return false;
        }
        if position_delta < position_epsilon && rotation_delta < rotation_epsilon_deg {
            self.is_stable = true;
            return true;
        }
        false
    }
}
