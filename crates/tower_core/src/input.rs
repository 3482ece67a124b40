//! Pointer input translation and pick resolution.
//!
//! Mouse presses and touch begins become `PointerPick` messages; the camera
//! projects each into a `PickRay`; resolution casts the ray into the scene,
//! filters to platform-tagged surfaces, and emits a clamped `BlockPlacement`.
//! Rays that hit nothing (or something untagged) are simply ignored. The
//! projection step is the only camera-dependent piece, so the resolver runs
//! headless.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use tower_physics::PhysicsState;

use crate::block::{BasePlatform, Block, InitialBlock, Platform};
use crate::camera::GameCamera;
use crate::config::GameConfig;
use crate::messages::{BlockPlacement, PickRay, PointerPick};
use crate::placement::{compute_spawn_position, PickSurface};
use crate::session::GameSession;

/// Poll mouse and touch for a new press and forward its screen point.
pub fn read_pointer_input(
    mouse: Res<ButtonInput<MouseButton>>,
    touches: Res<Touches>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut picks: MessageWriter<PointerPick>,
) {
    if mouse.just_pressed(MouseButton::Left) {
        if let Ok(window) = windows.single() {
            if let Some(position) = window.cursor_position() {
                picks.write(PointerPick {
                    screen_point: position,
                });
            }
        }
    }
    for touch in touches.iter_just_pressed() {
        picks.write(PointerPick {
            screen_point: touch.position(),
        });
    }
}

/// Project each screen-point pick through the camera into a world ray.
pub fn project_picks(
    mut picks: MessageReader<PointerPick>,
    cameras: Query<(&Camera, &GlobalTransform), With<GameCamera>>,
    mut rays: MessageWriter<PickRay>,
) {
    for pick in picks.read() {
        let Ok((camera, camera_transform)) = cameras.single() else {
            continue;
        };
        let Ok(ray) = camera.viewport_to_world(camera_transform, pick.screen_point) else {
            continue;
        };
        rays.write(PickRay {
            origin: ray.origin,
            direction: *ray.direction,
        });
    }
}

/// Cast each pick ray and turn platform-tagged hits into placement
/// candidates. Misses and untagged hits produce no placement and leave the
/// session untouched.
pub fn resolve_picks(
    mut rays: MessageReader<PickRay>,
    config: Res<GameConfig>,
    session: Res<GameSession>,
    physics: Res<PhysicsState>,
    platforms: Query<(), With<Platform>>,
    blocks: Query<&Block>,
    initial: Query<(), With<InitialBlock>>,
    bases: Query<(), With<BasePlatform>>,
    transforms: Query<&Transform>,
    mut placements: MessageWriter<BlockPlacement>,
) {
    for ray in rays.read() {
        if session.is_game_over() {
            continue;
        }
        let Some(hit) =
            physics.cast_ray(ray.origin, ray.direction, config.pick_ray_distance, None)
        else {
            continue;
        };
        if !platforms.contains(hit.entity) {
            continue;
        }

        let on_existing_block = blocks.contains(hit.entity)
            && !initial.contains(hit.entity)
            && !bases.contains(hit.entity);
        let surface = if on_existing_block {
            let center_y = transforms
                .get(hit.entity)
                .map(|t| t.translation.y)
                .unwrap_or(hit.point.y);
            PickSurface::Block {
                center_y,
                half_height: blocks.get(hit.entity).ok().map(|b| b.half_extents.y),
            }
        } else {
            PickSurface::Ground
        };

        let position = compute_spawn_position(
            hit.point,
            surface,
            session.tower_height,
            Vec2::ZERO,
            config.max_placement_radius,
            config.spawn_clearance,
            config.fallback_offset,
        );
        placements.write(BlockPlacement { position });
    }
}
