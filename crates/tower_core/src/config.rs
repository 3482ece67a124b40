//! Tuning constants for the whole game, collected in one resource.
//!
//! These are gameplay-feel parameters, not structural invariants. The
//! defaults are the values the game was tuned with; change them here rather
//! than re-deriving "intended" values in the systems that consume them.

use bevy::prelude::*;

#[derive(Resource, Debug, Clone)]
pub struct GameConfig {
    // --- Placement ---
    /// Maximum horizontal distance from the tower axis a block may spawn at.
    /// Candidates beyond it are clamped onto the boundary circle.
    pub max_placement_radius: f32,
    /// Vertical gap between a hit block's top surface and the spawn point.
    pub spawn_clearance: f32,
    /// Vertical offset used when the hit surface exposes no extents.
    pub fallback_offset: f32,
    /// Distance from a block's center to its top surface plus a small margin,
    /// used when deriving tower height from a placement.
    pub top_offset: f32,
    /// Maximum length of the pick ray cast from the camera.
    pub pick_ray_distance: f32,

    // --- Block bodies ---
    /// Half height of every block (blocks are thin slabs).
    pub block_half_height: f32,
    /// Random footprint range for placed blocks (full width, uniform).
    pub min_footprint: f32,
    pub max_footprint: f32,
    pub block_mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// The initial block is heavier and more damped so the tower has a calm
    /// foundation.
    pub initial_footprint: f32,
    pub initial_mass: f32,
    pub initial_linear_damping: f32,
    /// Surface friction for all platforms and blocks (averaging combine rule).
    pub friction: f32,
    pub restitution: f32,
    /// Half extents of the immobile base platform.
    pub base_half_extents: Vec3,

    // --- Stability evaluation ---
    /// Seconds to let physics settle first contact before probing support.
    pub settle_delay: f32,
    /// Seconds between a failed support check and the collapse trigger.
    pub confirm_delay: f32,
    /// Reach of the downward support probes.
    pub probe_distance: f32,
    /// Lateral center-to-center distance from the previous block beyond which
    /// the tower is doomed even with partial support.
    pub offset_threshold: f32,
    /// Blocks falling below this height trip the collapse fail-safe.
    pub fallen_y: f32,

    // --- Stabilization ---
    /// Upward force per unit of downward speed while a block is fresh.
    pub stabilization_force: f32,
    /// Cap on the tilt-correction torque.
    pub max_stabilization_torque: f32,
    /// Torque per degree of tilt below the cap.
    pub tilt_torque_gain: f32,
    /// Tilt (degrees) below which no correction is applied.
    pub tilt_threshold_deg: f32,
    /// Downward speed below which fall damping stays off.
    pub fall_speed_threshold: f32,
    /// Seconds after spawn during which tilt correction and fall damping run.
    pub early_window: f32,
    /// Seconds after spawn during which the first platform contact triggers a
    /// small random nudge to break symmetric stacking.
    pub contact_window: f32,
    /// Magnitude bound of that nudge impulse.
    pub jitter_impulse: f32,
    /// Seconds before stillness detection starts judging a block.
    pub stillness_delay: f32,
    /// Position delta per tick below which a block counts as still.
    pub position_epsilon: f32,
    /// Rotation delta (degrees) per tick below which a block counts as still.
    pub rotation_epsilon_deg: f32,
    /// Mass multiplier applied once when a block is marked stable.
    pub stable_mass_factor: f32,

    // --- Sway ---
    /// Peak lateral acceleration of the height-based sway.
    pub sway_force: f32,
    /// Height above which sway starts.
    pub sway_height_start: f32,
    /// Height span over which sway ramps to full strength.
    pub sway_height_range: f32,
    /// Sway oscillation rate (radians per second).
    pub sway_frequency: f32,

    // --- Collapse ---
    /// Physics time scale during the slow-motion collapse.
    pub slow_motion_scale: f32,
    /// Nominal collapse duration in unscaled seconds; the game-over screen
    /// appears after `slow_motion_duration * slow_motion_scale` real seconds.
    pub slow_motion_duration: f32,
    /// Magnitude of the randomized horizontal impulse given to each block.
    pub collapse_impulse: f32,
    /// Magnitude of the randomized torque impulse given to each block.
    pub collapse_torque: f32,
    /// Damping the whole tower drops to so the collapse looks chaotic.
    pub collapse_damping: f32,

    // --- Camera ---
    pub camera_follow_speed: f32,
    pub camera_height_offset: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_placement_radius: 2.0,
            spawn_clearance: 0.3,
            fallback_offset: 0.5,
            top_offset: 0.3,
            pick_ray_distance: 100.0,

            block_half_height: 0.25,
            min_footprint: 0.8,
            max_footprint: 1.0,
            block_mass: 1.0,
            linear_damping: 2.0,
            angular_damping: 10.0,
            initial_footprint: 1.0,
            initial_mass: 5.0,
            initial_linear_damping: 5.0,
            friction: 0.8,
            restitution: 0.1,
            base_half_extents: Vec3::new(2.5, 0.1, 2.5),

            settle_delay: 0.1,
            confirm_delay: 0.2,
            probe_distance: 0.6,
            offset_threshold: 1.2,
            fallen_y: -1.0,

            stabilization_force: 10.0,
            max_stabilization_torque: 5.0,
            tilt_torque_gain: 0.1,
            tilt_threshold_deg: 5.0,
            fall_speed_threshold: 0.1,
            early_window: 1.5,
            contact_window: 0.5,
            jitter_impulse: 0.1,
            stillness_delay: 2.0,
            position_epsilon: 0.001,
            rotation_epsilon_deg: 0.1,
            stable_mass_factor: 1.2,

            sway_force: 0.2,
            sway_height_start: 10.0,
            sway_height_range: 20.0,
            sway_frequency: 0.5,

            slow_motion_scale: 0.3,
            slow_motion_duration: 3.0,
            collapse_impulse: 2.0,
            collapse_torque: 2.0,
            collapse_damping: 0.1,

            camera_follow_speed: 2.0,
            camera_height_offset: 5.0,
        }
    }
}
