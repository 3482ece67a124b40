//! Camera easing toward the tower top, and the snap back on replay.

use bevy::prelude::*;

use crate::config::GameConfig;
use crate::messages::TowerRebuilt;
use crate::session::GameSession;

/// The camera that follows the tower. Remembers where it started so replay
/// can snap it back.
#[derive(Component)]
pub struct GameCamera {
    pub initial_position: Vec3,
}

impl GameCamera {
    pub fn new(initial_position: Vec3) -> Self {
        Self { initial_position }
    }
}

/// Ease the camera upward as the tower grows, keeping the tower top in view.
/// The camera never follows back down.
pub fn follow_tower(
    time: Res<Time>,
    config: Res<GameConfig>,
    session: Res<GameSession>,
    mut cameras: Query<(&GameCamera, &mut Transform)>,
) {
    if session.is_game_over() {
        return;
    }
    let Ok((camera, mut transform)) = cameras.single_mut() else {
        return;
    };
    let target_y = camera.initial_position.y + session.tower_height;
    if target_y <= camera.initial_position.y {
        return;
    }
    let goal = target_y + config.camera_height_offset;
    let t = (time.delta_secs() * config.camera_follow_speed).min(1.0);
    transform.translation.y += (goal - transform.translation.y) * t;
    let look_at = Vec3::new(0.0, session.tower_height, 0.0);
    transform.look_at(look_at, Vec3::Y);
}

/// Snap back to the initial pose when the tower is rebuilt.
pub fn reset_camera(
    mut rebuilt: MessageReader<TowerRebuilt>,
    mut cameras: Query<(&GameCamera, &mut Transform)>,
) {
    if rebuilt.is_empty() {
        return;
    }
    rebuilt.clear();
    let Ok((camera, mut transform)) = cameras.single_mut() else {
        return;
    };
    transform.translation = camera.initial_position;
    transform.look_at(Vec3::ZERO, Vec3::Y);
}
