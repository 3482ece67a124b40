//! Visual dressing for logic-spawned tower entities.
//!
//! The state machine spawns bare entities; this module attaches meshes and
//! materials when they appear, so the core runs headless in tests. Block
//! visuals share one unit cube mesh scaled per block; the physics sync only
//! writes translation and rotation, so the scale sticks.

use bevy::prelude::*;
use rand::Rng;

use crate::block::{BasePlatform, Block};
use crate::config::GameConfig;

/// Shared render assets for spawned tower pieces. Created once at startup;
/// if it is missing, blocks still simulate but cannot be displayed.
#[derive(Resource)]
pub struct BlockAssets {
    pub unit_cube: Handle<Mesh>,
    pub base_material: Handle<StandardMaterial>,
}

pub fn setup_block_assets(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.insert_resource(BlockAssets {
        unit_cube: meshes.add(Cuboid::new(1.0, 1.0, 1.0)),
        base_material: materials.add(Color::srgb(0.45, 0.45, 0.5)),
    });
}

/// Attach meshes and a random saturated color to newly spawned blocks, and
/// the fixed gray slab look to a new base platform.
pub fn dress_tower_entities(
    mut commands: Commands,
    assets: Option<Res<BlockAssets>>,
    config: Res<GameConfig>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut missing_reported: Local<bool>,
    mut new_blocks: Query<(Entity, &Block, &mut Transform), Added<Block>>,
    mut new_bases: Query<(Entity, &mut Transform), (Added<BasePlatform>, Without<Block>)>,
) {
    if new_blocks.is_empty() && new_bases.is_empty() {
        return;
    }
    let Some(assets) = assets else {
        if !*missing_reported {
            *missing_reported = true;
            error!("Block assets missing; spawned tower pieces will be invisible");
        }
        return;
    };
    let mut rng = rand::thread_rng();

    for (entity, block, mut transform) in new_blocks.iter_mut() {
        transform.scale = block.half_extents * 2.0;
        let color = Color::hsl(
            rng.gen_range(0.0..360.0),
            rng.gen_range(0.5..1.0),
            rng.gen_range(0.35..0.6),
        );
        commands.entity(entity).insert((
            Mesh3d(assets.unit_cube.clone()),
            MeshMaterial3d(materials.add(color)),
        ));
    }

    for (entity, mut transform) in new_bases.iter_mut() {
        transform.scale = config.base_half_extents * 2.0;
        commands.entity(entity).insert((
            Mesh3d(assets.unit_cube.clone()),
            MeshMaterial3d(assets.base_material.clone()),
        ));
    }
}
