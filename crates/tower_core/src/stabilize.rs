//! Per-block corrective forces that keep fresh placements from looking
//! glitchy, plus the height-based tower sway.
//!
//! Runs on the physics clock, right before the step that integrates the
//! applied impulses. Rapier's `add_force` persists across steps, so every
//! continuous force here is applied as an impulse scaled by the tick's dt.

use bevy::prelude::*;
use rand::Rng;
use tower_physics::{to_na, PhysicsState, RigidBodyLink};

use crate::block::{Block, Platform, Stabilizer};
use crate::config::GameConfig;
use crate::session::{GamePhase, GameSession};

/// Corrective torque around the cross-product axis when the block's up axis
/// strays beyond the tilt threshold. Magnitude is proportional to the tilt
/// angle and capped at `max_torque`.
pub fn tilt_correction_torque(
    up: Vec3,
    tilt_threshold_deg: f32,
    gain: f32,
    max_torque: f32,
) -> Option<Vec3> {
    let tilt_deg = up.angle_between(Vec3::Y).to_degrees();
    if tilt_deg <= tilt_threshold_deg {
        return None;
    }
    let axis = up.cross(Vec3::Y);
    if axis.length_squared() < 1e-8 {
        // Upside down exactly; no unique correction axis.
        return None;
    }
    Some(axis.normalize() * max_torque.min(tilt_deg * gain))
}

/// Upward force proportional to downward speed, preventing slams while a
/// block is fresh. `None` below the speed threshold.
pub fn fall_damping_force(vertical_velocity: f32, threshold: f32, strength: f32) -> Option<Vec3> {
    if vertical_velocity < -threshold {
        Some(Vec3::Y * strength * vertical_velocity.abs())
    } else {
        None
    }
}

/// Tick every block's stabilization window: stillness detection with the
/// one-time mass bump, tilt correction, fall damping, and the first-contact
/// jitter nudge.
pub fn stabilize_blocks(
    time: Res<Time>,
    config: Res<GameConfig>,
    session: Res<GameSession>,
    mut physics: ResMut<PhysicsState>,
    platforms: Query<(), With<Platform>>,
    mut blocks: Query<(Entity, &RigidBodyLink, &mut Stabilizer)>,
) {
    if session.phase != GamePhase::Playing {
        return;
    }
    let dt = time.delta_secs() * session.time_scale;
    if dt <= 0.0 {
        return;
    }
    let mut rng = rand::thread_rng();

    for (entity, link, mut stab) in blocks.iter_mut() {
        stab.time_alive += dt;

        let Some((position, rotation)) = physics.body_pose(link.0) else {
            continue;
        };

        let became_stable = stab.time_alive > config.stillness_delay
            && stab.observe(
                position,
                rotation,
                config.position_epsilon,
                config.rotation_epsilon_deg,
            );

        let mut torque = None;
        let mut damping = None;
        if stab.time_alive < config.early_window {
            torque = tilt_correction_torque(
                rotation * Vec3::Y,
                config.tilt_threshold_deg,
                config.tilt_torque_gain,
                config.max_stabilization_torque,
            );
            if let Some(body) = physics.body(link.0) {
                damping = fall_damping_force(
                    body.linvel().y,
                    config.fall_speed_threshold,
                    config.stabilization_force,
                );
            }
        }

        let mut jitter = None;
        if !stab.contact_jitter_done && stab.time_alive < config.contact_window {
            let touching = physics.touching_entities(link.0);
            if touching
                .iter()
                .any(|other| *other != entity && platforms.contains(*other))
            {
                stab.contact_jitter_done = true;
                let j = config.jitter_impulse;
                jitter = Some(Vec3::new(rng.gen_range(-j..j), 0.0, rng.gen_range(-j..j)));
            }
        }

        let Some(body) = physics.body_mut(link.0) else {
            continue;
        };
        if became_stable {
            let mass = body.mass();
            body.set_additional_mass(mass * config.stable_mass_factor, true);
        }
        if let Some(torque) = torque {
            body.apply_torque_impulse(to_na(torque * dt), true);
        }
        if let Some(force) = damping {
            body.apply_impulse(to_na(force * dt), true);
        }
        if let Some(impulse) = jitter {
            body.apply_impulse(to_na(impulse), true);
        }
    }
}

/// Height-based sway: blocks well above the base get a small sinusoidal
/// lateral acceleration so tall towers feel precarious.
pub fn apply_sway(
    time: Res<Time>,
    config: Res<GameConfig>,
    session: Res<GameSession>,
    mut physics: ResMut<PhysicsState>,
    blocks: Query<&RigidBodyLink, With<Block>>,
) {
    if session.phase != GamePhase::Playing {
        return;
    }
    let dt = time.delta_secs() * session.time_scale;
    if dt <= 0.0 {
        return;
    }
    let sway = (time.elapsed_secs() * config.sway_frequency).sin() * config.sway_force;

    for link in blocks.iter() {
        let Some(body) = physics.body_mut(link.0) else {
            continue;
        };
        if !body.is_dynamic() {
            continue;
        }
        let height = body.translation().y;
        if height <= config.sway_height_start {
            continue;
        }
        let height_factor = (height - config.sway_height_start) / config.sway_height_range;
        // Acceleration-mode force: scale by mass so every block sways alike.
        let impulse = sway * height_factor * body.mass() * dt;
        body.apply_impulse(to_na(Vec3::new(impulse, 0.0, 0.0)), true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_torque_when_upright() {
        assert!(tilt_correction_torque(Vec3::Y, 5.0, 0.1, 5.0).is_none());
    }

    #[test]
    fn small_tilt_is_left_alone() {
        // 3 degrees, below the 5 degree threshold.
        let up = Quat::from_rotation_x(3.0_f32.to_radians()) * Vec3::Y;
        assert!(tilt_correction_torque(up, 5.0, 0.1, 5.0).is_none());
    }

    #[test]
    fn torque_is_proportional_and_capped() {
        let up = Quat::from_rotation_x(10.0_f32.to_radians()) * Vec3::Y;
        let torque = tilt_correction_torque(up, 5.0, 0.1, 5.0).unwrap();
        assert!((torque.length() - 1.0).abs() < 1e-3, "10 deg * 0.1 gain");

        let up = Quat::from_rotation_x(80.0_f32.to_radians()) * Vec3::Y;
        let torque = tilt_correction_torque(up, 5.0, 0.1, 5.0).unwrap();
        assert!((torque.length() - 5.0).abs() < 1e-3, "capped at max torque");
    }

    #[test]
    fn torque_axis_rights_the_block() {
        // Tilted around +X: up leans toward +Z... the correction axis must be
        // perpendicular to both up and world up.
        let up = Quat::from_rotation_x(20.0_f32.to_radians()) * Vec3::Y;
        let torque = tilt_correction_torque(up, 5.0, 0.1, 5.0).unwrap();
        assert!(torque.dot(up).abs() < 1e-4);
        assert!(torque.dot(Vec3::Y).abs() < 1e-4);
    }

    #[test]
    fn fall_damping_kicks_in_above_threshold() {
        assert!(fall_damping_force(-0.05, 0.1, 10.0).is_none());
        assert!(fall_damping_force(0.5, 0.1, 10.0).is_none(), "rising block");
        let force = fall_damping_force(-2.0, 0.1, 10.0).unwrap();
        assert_eq!(force, Vec3::Y * 20.0);
    }
}
