//! Core game logic and presentation for the tower stacking game.
//!
//! This crate provides:
//! - The placement planner (pick point -> clamped spawn position)
//! - The stability evaluator (support probes + lateral offset rule)
//! - The per-block stabilization controller (anti-jitter forces)
//! - The tower/game state machine (score, collapse, slow motion, replay)
//! - Presentation bindings (input, follow camera, score/replay UI, visuals)
//!
//! `GameLogicPlugin` is headless-safe and is what the integration tests
//! drive; `PresentationPlugin` layers input, camera, UI and meshes on top.

use bevy::prelude::*;
use tower_physics::PhysicsPlugin;

pub mod block;
pub mod camera;
pub mod config;
pub mod input;
pub mod messages;
pub mod placement;
pub mod session;
pub mod stability;
pub mod stabilize;
pub mod ui;
pub mod visuals;

pub use block::{BasePlatform, Block, InitialBlock, Platform, Stabilizer};
pub use camera::{follow_tower, reset_camera, GameCamera};
pub use config::GameConfig;
pub use messages::{
    BlockPlacement, CollapseTower, PickRay, PointerPick, ReplayRequested, TowerRebuilt,
};
pub use placement::{clamp_to_radius, compute_spawn_position, PickSurface};
pub use session::{GameOverCountdown, GamePhase, GameSession};
pub use stability::{
    lateral_distance, should_collapse, support_probe_points, CheckPhase, PendingCheck,
    StabilityChecks,
};
pub use stabilize::{fall_damping_force, tilt_correction_torque};
pub use ui::{ReplayButton, ScoreText};
pub use visuals::BlockAssets;

/// The stability/placement/collapse core and its state machine. Requires
/// only `MinimalPlugins`; physics is pulled in automatically.
pub struct GameLogicPlugin;

impl Plugin for GameLogicPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<PhysicsPlugin>() {
            app.add_plugins(PhysicsPlugin);
        }
        app.init_resource::<GameConfig>()
            .init_resource::<GameSession>()
            .init_resource::<StabilityChecks>()
            .add_message::<PointerPick>()
            .add_message::<PickRay>()
            .add_message::<BlockPlacement>()
            .add_message::<CollapseTower>()
            .add_message::<ReplayRequested>()
            .add_message::<TowerRebuilt>()
            .add_systems(Startup, session::setup_tower)
            .add_systems(
                Update,
                (
                    input::resolve_picks,
                    session::apply_placements,
                    stability::run_stability_checks,
                    session::check_fallen_blocks,
                    session::collapse_tower,
                    session::game_over_countdown,
                    session::handle_replay,
                )
                    .chain(),
            )
            .add_systems(
                FixedUpdate,
                (
                    stabilize::apply_sway,
                    stabilize::stabilize_blocks,
                    session::step_physics,
                )
                    .chain()
                    .before(tower_physics::sync_transforms),
            );
    }
}

/// Input translation, follow camera, score/replay UI, and block visuals.
pub struct PresentationPlugin;

impl Plugin for PresentationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (ui::setup_ui, visuals::setup_block_assets))
            .add_systems(
                Update,
                (
                    (input::read_pointer_input, input::project_picks).chain(),
                    visuals::dress_tower_entities,
                    camera::follow_tower,
                    camera::reset_camera,
                    ui::update_score_text,
                    ui::update_replay_visibility,
                    ui::replay_button_clicks,
                ),
            );
    }
}
