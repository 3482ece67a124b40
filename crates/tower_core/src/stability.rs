//! Stability evaluation for freshly placed blocks.
//!
//! Each placement schedules a deferred check: after a short settle delay the
//! evaluator probes for support under the block and measures its lateral
//! offset from the previously placed block. A failed check waits one more
//! short delay (so the just-applied forces read naturally) and then triggers
//! the collapse. Checks are stamped with the session epoch and dropped when
//! the tower they belong to is gone.

use bevy::prelude::*;
use tower_physics::{PhysicsState, RigidBodyLink};

use crate::block::{Block, Platform};
use crate::config::GameConfig;
use crate::messages::CollapseTower;
use crate::session::{GamePhase, GameSession};

/// Five sample points under a block: its center and four footprint-relative
/// corners at one third of the footprint.
pub fn support_probe_points(center: Vec3, footprint: f32) -> [Vec3; 5] {
    let off = footprint / 3.0;
    [
        center,
        center + Vec3::new(off, 0.0, off),
        center + Vec3::new(-off, 0.0, off),
        center + Vec3::new(off, 0.0, -off),
        center + Vec3::new(-off, 0.0, -off),
    ]
}

/// Horizontal-plane center-to-center distance, ignoring vertical separation.
pub fn lateral_distance(a: Vec3, b: Vec3) -> f32 {
    Vec2::new(a.x - b.x, a.z - b.z).length()
}

/// The collapse rule: no support at all, or gross lateral misalignment.
/// Partial overhangs inside the threshold are tolerated.
pub fn should_collapse(supported: bool, lateral_distance: f32, offset_threshold: f32) -> bool {
    !supported || lateral_distance > offset_threshold
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckPhase {
    /// Waiting out the settle delay before probing.
    Settling,
    /// Support failed; waiting out the confirm delay before collapsing.
    Confirming,
}

/// A deferred stability check for one placed block.
pub struct PendingCheck {
    pub block: Entity,
    /// The block placed immediately before this one, for the lateral
    /// comparison. Identifier only, never dereferenced after teardown.
    pub previous: Option<Entity>,
    /// Session epoch at scheduling time; a mismatch means the tower was
    /// rebuilt and the check is stale.
    pub epoch: u32,
    pub timer: Timer,
    pub phase: CheckPhase,
}

#[derive(Resource, Default)]
pub struct StabilityChecks(pub Vec<PendingCheck>);

/// Tick deferred checks, probe for support when they come due, and trigger
/// the collapse transition when the rule fails.
pub fn run_stability_checks(
    time: Res<Time>,
    config: Res<GameConfig>,
    session: Res<GameSession>,
    physics: Res<PhysicsState>,
    mut checks: ResMut<StabilityChecks>,
    blocks: Query<(&Block, &RigidBodyLink)>,
    platforms: Query<(), With<Platform>>,
    mut collapse: MessageWriter<CollapseTower>,
) {
    if checks.0.is_empty() {
        return;
    }
    let delta = time.delta();

    checks.0.retain_mut(|check| {
        // Cancellation-on-teardown: stale epoch, ended game, or a block that
        // no longer exists all abandon the check silently.
        if check.epoch != session.epoch || session.phase != GamePhase::Playing {
            return false;
        }
        let Ok((block, link)) = blocks.get(check.block) else {
            return false;
        };
        if !check.timer.tick(delta).just_finished() {
            return true;
        }

        match check.phase {
            CheckPhase::Settling => {
                let Some((position, _)) = physics.body_pose(link.0) else {
                    return false;
                };

                let mut supported = false;
                for probe in support_probe_points(position, block.footprint()) {
                    let Some(hit) =
                        physics.cast_ray(probe, Vec3::NEG_Y, config.probe_distance, Some(link.0))
                    else {
                        continue;
                    };
                    if platforms.contains(hit.entity) {
                        supported = true;
                        break;
                    }
                }

                let lateral = check
                    .previous
                    .filter(|previous| *previous != check.block)
                    .and_then(|previous| blocks.get(previous).ok())
                    .and_then(|(_, prev_link)| physics.body_pose(prev_link.0))
                    .map(|(prev_pos, _)| lateral_distance(position, prev_pos))
                    .unwrap_or(0.0);

                if should_collapse(supported, lateral, config.offset_threshold) {
                    check.phase = CheckPhase::Confirming;
                    check.timer = Timer::from_seconds(config.confirm_delay, TimerMode::Once);
                    true
                } else {
                    false
                }
            }
            CheckPhase::Confirming => {
                collapse.write(CollapseTower);
                false
            }
        }
    });
}
