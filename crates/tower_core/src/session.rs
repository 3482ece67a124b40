//! The tower/game state machine: session state, spawning, collapse, and
//! replay.
//!
//! `GameSession` is the single owner of score, tower height, game phase and
//! the physics time scale. Only the transitions in this module write the
//! time scale, and only the physics step consumes it. Every deferred piece
//! of work carries the session epoch so a rebuilt tower silently drops work
//! scheduled against its predecessor.

use bevy::prelude::*;
use rand::Rng;
use tower_physics::{BlockBodyProps, PhysicsState, RigidBodyLink};

use crate::block::{BasePlatform, Block, InitialBlock, Platform, Stabilizer};
use crate::config::GameConfig;
use crate::messages::{BlockPlacement, CollapseTower, ReplayRequested, TowerRebuilt};
use crate::stability::{CheckPhase, PendingCheck, StabilityChecks};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Playing,
    /// Collapse forces applied, slow motion engaged, waiting for the
    /// game-over display.
    Collapsing,
    GameOver,
}

#[derive(Resource, Debug)]
pub struct GameSession {
    pub phase: GamePhase,
    /// Successfully placed non-initial blocks this session.
    pub score: u32,
    /// Highest block top surface so far; monotonically non-decreasing while
    /// playing.
    pub tower_height: f32,
    /// Bumped on every replay; deferred work from older epochs is stale.
    pub epoch: u32,
    /// The most recently placed block, for the lateral-offset comparison.
    /// Identifier only; never owns the block.
    pub last_placed: Option<Entity>,
    /// Physics time scale. 1.0 in normal play, lowered during collapse.
    pub time_scale: f32,
}

impl GameSession {
    pub fn new() -> Self {
        Self {
            phase: GamePhase::Playing,
            score: 0,
            tower_height: 0.0,
            epoch: 0,
            last_placed: None,
            time_scale: 1.0,
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.phase != GamePhase::Playing
    }

    /// Record a scored placement: bump the score and raise the tower height
    /// to the new block's top surface (never lowering it).
    pub fn record_placement(&mut self, block: Entity, top_y: f32) {
        self.score += 1;
        self.tower_height = self.tower_height.max(top_y);
        self.last_placed = Some(block);
    }

    /// Enter `Collapsing`. Returns false if the game already left `Playing`,
    /// making the transition idempotent across duplicate triggers.
    pub fn begin_collapse(&mut self) -> bool {
        if self.phase != GamePhase::Playing {
            return false;
        }
        self.phase = GamePhase::Collapsing;
        true
    }

    /// Enter `GameOver` after the slow-motion window, restoring normal time.
    pub fn finish_collapse(&mut self) {
        if self.phase == GamePhase::Collapsing {
            self.phase = GamePhase::GameOver;
            self.time_scale = 1.0;
        }
    }

    /// Restore the pristine playing state and invalidate deferred work from
    /// the previous tower.
    pub fn reset(&mut self) {
        self.phase = GamePhase::Playing;
        self.score = 0;
        self.tower_height = 0.0;
        self.last_placed = None;
        self.time_scale = 1.0;
        self.epoch += 1;
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Delayed game-over display, running on the real-time clock while the
/// physics plays the collapse in slow motion.
#[derive(Resource)]
pub struct GameOverCountdown {
    pub timer: Timer,
    pub epoch: u32,
}

/// Spawn the base platform and the initial block at session start and on
/// every replay.
pub fn setup_tower(
    mut commands: Commands,
    config: Res<GameConfig>,
    mut session: ResMut<GameSession>,
    mut physics: ResMut<PhysicsState>,
) {
    spawn_base_platform(&mut commands, &config, &mut physics);
    spawn_initial_block(&mut commands, &config, &mut session, &mut physics);
}

fn spawn_base_platform(
    commands: &mut Commands,
    config: &GameConfig,
    physics: &mut PhysicsState,
) -> Entity {
    let entity = commands
        .spawn((
            Transform::from_translation(Vec3::ZERO),
            Visibility::default(),
            Platform,
            BasePlatform,
        ))
        .id();
    let handle = physics.insert_platform(entity, Vec3::ZERO, config.base_half_extents, config.friction);
    commands.entity(entity).insert(RigidBodyLink(handle));
    entity
}

fn spawn_initial_block(
    commands: &mut Commands,
    config: &GameConfig,
    session: &mut GameSession,
    physics: &mut PhysicsState,
) -> Entity {
    let position = Vec3::new(0.0, 2.0 * config.block_half_height, 0.0);
    let half_extents = Vec3::new(
        config.initial_footprint * 0.5,
        config.block_half_height,
        config.initial_footprint * 0.5,
    );
    let entity = commands
        .spawn((
            Transform::from_translation(position),
            Visibility::default(),
            Block { half_extents },
            Platform,
            InitialBlock,
        ))
        .id();
    let props = BlockBodyProps {
        mass: config.initial_mass,
        linear_damping: config.initial_linear_damping,
        angular_damping: config.angular_damping,
        lock_rotations: true,
        friction: config.friction,
        restitution: config.restitution,
    };
    let handle = physics.insert_block(entity, position, half_extents, &props);
    commands.entity(entity).insert(RigidBodyLink(handle));

    session.last_placed = Some(entity);
    session.tower_height = position.y + config.top_offset;
    entity
}

/// Spawn a block for each resolved placement, score it, and schedule its
/// stability check.
pub fn apply_placements(
    mut placements: MessageReader<BlockPlacement>,
    mut commands: Commands,
    config: Res<GameConfig>,
    mut session: ResMut<GameSession>,
    mut physics: ResMut<PhysicsState>,
    mut checks: ResMut<StabilityChecks>,
) {
    for placement in placements.read() {
        if session.is_game_over() {
            continue;
        }
        let mut rng = rand::thread_rng();
        let footprint = rng.gen_range(config.min_footprint..config.max_footprint);
        let half_extents = Vec3::new(footprint * 0.5, config.block_half_height, footprint * 0.5);
        let position = placement.position;

        let entity = commands
            .spawn((
                Transform::from_translation(position),
                Visibility::default(),
                Block { half_extents },
                Platform,
                Stabilizer::new(position, Quat::IDENTITY),
            ))
            .id();
        let props = BlockBodyProps {
            mass: config.block_mass,
            linear_damping: config.linear_damping,
            angular_damping: config.angular_damping,
            lock_rotations: true,
            friction: config.friction,
            restitution: config.restitution,
        };
        let handle = physics.insert_block(entity, position, half_extents, &props);
        commands.entity(entity).insert(RigidBodyLink(handle));

        let previous = session.last_placed;
        session.record_placement(entity, position.y + config.top_offset);
        checks.0.push(PendingCheck {
            block: entity,
            previous,
            epoch: session.epoch,
            timer: Timer::from_seconds(config.settle_delay, TimerMode::Once),
            phase: CheckPhase::Settling,
        });
        info!(
            "Placed block {} at ({:.2}, {:.2}, {:.2})",
            session.score, position.x, position.y, position.z
        );
    }
}

/// Fail-safe scan: any block falling below the threshold dooms the tower,
/// independent of the placement-triggered check.
pub fn check_fallen_blocks(
    config: Res<GameConfig>,
    session: Res<GameSession>,
    blocks: Query<&Transform, With<Block>>,
    mut collapse: MessageWriter<CollapseTower>,
) {
    if session.is_game_over() {
        return;
    }
    for transform in blocks.iter() {
        if transform.translation.y < config.fallen_y {
            collapse.write(CollapseTower);
            break;
        }
    }
}

/// The collapse transition: unlock every block, kick it with randomized
/// impulses, drop tower-wide damping, and engage slow motion for a fixed
/// real-time window.
pub fn collapse_tower(
    mut triggers: MessageReader<CollapseTower>,
    mut commands: Commands,
    config: Res<GameConfig>,
    mut session: ResMut<GameSession>,
    mut physics: ResMut<PhysicsState>,
    blocks: Query<&RigidBodyLink, With<Block>>,
) {
    if triggers.is_empty() {
        return;
    }
    triggers.clear();
    if !session.begin_collapse() {
        return;
    }
    info!("Tower is collapsing");

    let mut rng = rand::thread_rng();
    for link in blocks.iter() {
        let Some(body) = physics.body_mut(link.0) else {
            continue;
        };
        body.set_enabled_rotations(true, true, true, true);
        body.set_linear_damping(config.collapse_damping);
        body.set_angular_damping(config.collapse_damping);
        let impulse = Vec3::new(rng.gen_range(-1.0_f32..1.0), 0.0, rng.gen_range(-1.0_f32..1.0))
            * config.collapse_impulse;
        body.apply_impulse(tower_physics::to_na(impulse), true);
        let torque = Vec3::new(
            rng.gen_range(-1.0_f32..1.0),
            rng.gen_range(-1.0_f32..1.0),
            rng.gen_range(-1.0_f32..1.0),
        ) * config.collapse_torque;
        body.apply_torque_impulse(tower_physics::to_na(torque), true);
    }

    session.time_scale = config.slow_motion_scale;
    commands.insert_resource(GameOverCountdown {
        timer: Timer::from_seconds(
            config.slow_motion_duration * config.slow_motion_scale,
            TimerMode::Once,
        ),
        epoch: session.epoch,
    });
}

/// Tick the game-over display delay on the real-time clock; when it fires,
/// restore normal time and show the replay control.
pub fn game_over_countdown(
    time: Res<Time>,
    countdown: Option<ResMut<GameOverCountdown>>,
    mut commands: Commands,
    mut session: ResMut<GameSession>,
) {
    let Some(mut countdown) = countdown else {
        return;
    };
    if countdown.epoch != session.epoch {
        commands.remove_resource::<GameOverCountdown>();
        return;
    }
    if countdown.timer.tick(time.delta()).just_finished() {
        session.finish_collapse();
        commands.remove_resource::<GameOverCountdown>();
        info!("Game over; replay available");
    }
}

/// Replay: tear the whole tower down, reset the session, and build a fresh
/// base and initial block. Ignored unless the game is over.
pub fn handle_replay(
    mut requests: MessageReader<ReplayRequested>,
    mut commands: Commands,
    config: Res<GameConfig>,
    mut session: ResMut<GameSession>,
    mut physics: ResMut<PhysicsState>,
    mut checks: ResMut<StabilityChecks>,
    tower: Query<(Entity, Option<&RigidBodyLink>), Or<(With<Block>, With<BasePlatform>)>>,
    mut rebuilt: MessageWriter<TowerRebuilt>,
) {
    if requests.is_empty() {
        return;
    }
    requests.clear();
    if session.phase != GamePhase::GameOver {
        return;
    }
    info!("Game reset");

    for (entity, link) in tower.iter() {
        if let Some(link) = link {
            physics.remove_body(link.0);
        }
        commands.entity(entity).despawn();
    }
    checks.0.clear();
    commands.remove_resource::<GameOverCountdown>();
    session.reset();

    spawn_base_platform(&mut commands, &config, &mut physics);
    spawn_initial_block(&mut commands, &config, &mut session, &mut physics);
    rebuilt.write(TowerRebuilt);
}

/// Advance the physics collaborator by one fixed tick, scaled by the
/// session's time scale. This is the time scale's only consumer.
pub fn step_physics(
    time: Res<Time>,
    session: Res<GameSession>,
    mut physics: ResMut<PhysicsState>,
) {
    physics.step(time.delta_secs() * session.time_scale);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn an_entity() -> Entity {
        World::new().spawn_empty().id()
    }

    #[test]
    fn new_session_is_pristine() {
        let session = GameSession::new();
        assert_eq!(session.phase, GamePhase::Playing);
        assert_eq!(session.score, 0);
        assert_eq!(session.tower_height, 0.0);
        assert_eq!(session.time_scale, 1.0);
        assert!(session.last_placed.is_none());
    }

    #[test]
    fn placements_score_and_never_lower_the_tower() {
        let mut session = GameSession::new();
        let block = an_entity();
        session.record_placement(block, 0.8);
        assert_eq!(session.score, 1);
        assert_eq!(session.tower_height, 0.8);
        // A lower placement still scores but the height stays.
        session.record_placement(block, 0.5);
        assert_eq!(session.score, 2);
        assert_eq!(session.tower_height, 0.8);
        session.record_placement(block, 1.4);
        assert_eq!(session.tower_height, 1.4);
    }

    #[test]
    fn collapse_is_idempotent() {
        let mut session = GameSession::new();
        assert!(session.begin_collapse());
        assert!(!session.begin_collapse());
        assert_eq!(session.phase, GamePhase::Collapsing);
        session.finish_collapse();
        assert!(!session.begin_collapse());
        assert_eq!(session.phase, GamePhase::GameOver);
    }

    #[test]
    fn finish_collapse_restores_time_scale() {
        let mut session = GameSession::new();
        session.begin_collapse();
        session.time_scale = 0.3;
        session.finish_collapse();
        assert_eq!(session.phase, GamePhase::GameOver);
        assert_eq!(session.time_scale, 1.0);
    }

    #[test]
    fn finish_collapse_requires_collapsing() {
        let mut session = GameSession::new();
        session.finish_collapse();
        assert_eq!(session.phase, GamePhase::Playing);
    }

    #[test]
    fn reset_restores_everything_and_bumps_epoch() {
        let mut session = GameSession::new();
        session.record_placement(an_entity(), 3.0);
        session.begin_collapse();
        session.time_scale = 0.3;
        session.finish_collapse();

        let old_epoch = session.epoch;
        session.reset();
        assert_eq!(session.phase, GamePhase::Playing);
        assert_eq!(session.score, 0);
        assert_eq!(session.tower_height, 0.0);
        assert_eq!(session.time_scale, 1.0);
        assert!(session.last_placed.is_none());
        assert_eq!(session.epoch, old_epoch + 1);
    }
}
