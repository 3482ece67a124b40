//! End-to-end exercises of the headless game core: placement scoring,
//! collapse, the fallen-block fail-safe, and replay.
//!
//! The tests drive the state machine through `BlockPlacement` messages (the
//! seam between pick resolution and the core) and let real time pass for the
//! settle/confirm/slow-motion windows.

use std::time::{Duration, Instant};

use bevy::prelude::*;
use tower_core::{
    BasePlatform, Block, BlockPlacement, CollapseTower, GameLogicPlugin, GamePhase, GameSession,
    PickRay, ReplayRequested,
};
use tower_physics::PhysicsState;

fn game_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(GameLogicPlugin);
    // Run Startup so the base platform and initial block exist.
    app.update();
    app
}

fn run_for(app: &mut App, seconds: f32) {
    let start = Instant::now();
    while start.elapsed().as_secs_f32() < seconds {
        app.update();
        std::thread::sleep(Duration::from_millis(8));
    }
    app.update();
}

fn session(app: &App) -> &GameSession {
    app.world().resource::<GameSession>()
}

fn place(app: &mut App, position: Vec3) {
    app.world_mut().write_message(BlockPlacement { position });
    app.update();
}

fn count<F: bevy::ecs::query::QueryFilter>(app: &mut App) -> usize {
    app.world_mut()
        .query_filtered::<Entity, F>()
        .iter(app.world())
        .count()
}

#[test]
fn supported_placements_score_and_raise_the_tower() {
    let mut app = game_app();

    let initial_height = session(&app).tower_height;
    assert_eq!(session(&app).score, 0);
    assert!(initial_height > 0.0, "initial block sets the tower height");
    assert_eq!(count::<With<Block>>(&mut app), 1);
    assert_eq!(count::<With<BasePlatform>>(&mut app), 1);

    // Straight on top of the initial block, fully supported.
    place(&mut app, Vec3::new(0.0, 1.05, 0.0));
    assert_eq!(session(&app).score, 1);
    assert!(session(&app).tower_height >= initial_height);
    assert_eq!(count::<With<Block>>(&mut app), 2);

    // Let the settle + confirm windows pass; a supported, aligned block must
    // never collapse the tower.
    run_for(&mut app, 0.6);
    assert_eq!(session(&app).phase, GamePhase::Playing);

    // Slightly offset but still fully supported.
    let height = session(&app).tower_height;
    place(&mut app, Vec3::new(0.05, height + 0.55, 0.05));
    assert_eq!(session(&app).score, 2);
    assert!(session(&app).tower_height >= height);

    run_for(&mut app, 0.6);
    assert_eq!(session(&app).phase, GamePhase::Playing);
}

#[test]
fn unsupported_offset_placement_collapses_then_replay_resets() {
    let mut app = game_app();
    let initial_height = session(&app).tower_height;

    // One good block first.
    place(&mut app, Vec3::new(0.0, 1.05, 0.0));
    run_for(&mut app, 0.4);
    assert_eq!(session(&app).phase, GamePhase::Playing);

    // A block way off axis: clamped placement would sit at the radius
    // boundary with nothing under its probes and a lateral offset well past
    // the threshold.
    let doomed = tower_core::clamp_to_radius(Vec3::new(5.0, 2.0, 5.0), Vec2::ZERO, 2.0);
    place(&mut app, doomed);

    // Settle (0.1 s) + confirm (0.2 s) with margin.
    run_for(&mut app, 0.5);
    assert!(session(&app).is_game_over(), "evaluator must doom the tower");
    assert_eq!(session(&app).phase, GamePhase::Collapsing);
    let slow = session(&app).time_scale;
    assert!(slow < 1.0, "collapse engages slow motion, got {slow}");

    // A second trigger in the same window must not double-transition.
    app.world_mut().write_message(CollapseTower);
    app.update();
    assert_eq!(session(&app).phase, GamePhase::Collapsing);

    // Placements during the collapse are ignored.
    let score = session(&app).score;
    place(&mut app, Vec3::new(0.0, 3.0, 0.0));
    assert_eq!(session(&app).score, score);

    // Slow-motion window is 3.0 s * 0.3 = 0.9 s of real time.
    run_for(&mut app, 1.2);
    assert_eq!(session(&app).phase, GamePhase::GameOver);
    assert_eq!(session(&app).time_scale, 1.0);

    // Replay rebuilds the tower from scratch.
    let old_epoch = session(&app).epoch;
    app.world_mut().write_message(ReplayRequested);
    app.update();
    let s = session(&app);
    assert_eq!(s.phase, GamePhase::Playing);
    assert_eq!(s.score, 0);
    assert_eq!(s.time_scale, 1.0);
    assert_eq!(s.epoch, old_epoch + 1);
    assert!((s.tower_height - initial_height).abs() < 1e-5);
    assert_eq!(count::<With<Block>>(&mut app), 1);
    assert_eq!(count::<With<BasePlatform>>(&mut app), 1);

    // Deferred work from the old tower must stay dead: nothing collapses the
    // fresh session.
    run_for(&mut app, 0.6);
    assert_eq!(session(&app).phase, GamePhase::Playing);
}

#[test]
fn replay_is_ignored_while_playing() {
    let mut app = game_app();
    app.world_mut().write_message(ReplayRequested);
    app.update();
    let s = session(&app);
    assert_eq!(s.phase, GamePhase::Playing);
    assert_eq!(s.epoch, 0);
    assert_eq!(count::<With<BasePlatform>>(&mut app), 1);
}

#[test]
fn picks_that_hit_nothing_placeable_are_ignored() {
    let mut app = game_app();
    // A few fixed ticks so the query pipeline sees the startup bodies.
    run_for(&mut app, 0.1);

    // A ray into empty sky hits nothing.
    app.world_mut().write_message(PickRay {
        origin: Vec3::new(0.0, 10.0, 0.0),
        direction: Vec3::Y,
    });
    app.update();
    assert_eq!(session(&app).score, 0);
    assert_eq!(count::<With<Block>>(&mut app), 1);

    // A body without the platform tag: the ray lands but nothing is placed.
    let stray = app
        .world_mut()
        .spawn((Transform::from_xyz(10.0, 5.0, 0.0), Visibility::default()))
        .id();
    app.world_mut().resource_mut::<PhysicsState>().insert_platform(
        stray,
        Vec3::new(10.0, 5.0, 0.0),
        Vec3::splat(0.25),
        0.8,
    );
    run_for(&mut app, 0.1);
    app.world_mut().write_message(PickRay {
        origin: Vec3::new(10.0, 8.0, 0.0),
        direction: Vec3::NEG_Y,
    });
    app.update();
    assert_eq!(session(&app).score, 0);
    assert_eq!(count::<With<Block>>(&mut app), 1);

    // The same resolver does place when the ray lands on the tower.
    app.world_mut().write_message(PickRay {
        origin: Vec3::new(0.0, 10.0, 0.0),
        direction: Vec3::NEG_Y,
    });
    app.update();
    assert_eq!(session(&app).score, 1);
    assert_eq!(count::<With<Block>>(&mut app), 2);
}

#[test]
fn fallen_block_failsafe_collapses_the_tower() {
    let mut app = game_app();

    // Spawn a block already below the fallen threshold; the every-frame scan
    // must doom the tower without waiting for any stability check.
    place(&mut app, Vec3::new(0.0, -2.0, 0.0));
    app.update();
    app.update();
    assert!(session(&app).is_game_over());
}
