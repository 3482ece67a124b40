//! Rapier-backed physics collaborator for the tower game.
//!
//! The game logic never talks to rapier directly; it goes through
//! [`PhysicsState`], which owns the rigid-body and collider sets and is
//! stepped manually once per fixed tick. Raycasts are served by a
//! [`QueryPipeline`](rapier3d::prelude::QueryPipeline) that the step keeps
//! current.

use std::collections::HashMap;

use bevy::prelude::*;
use rapier3d::prelude as rapier;
use rapier::nalgebra::{Point3, Vector3};

pub struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(PhysicsState::new())
            .add_systems(FixedUpdate, sync_transforms);
    }
}

/// Links a Bevy entity to a Rapier rigid body.
#[derive(Component)]
pub struct RigidBodyLink(pub rapier::RigidBodyHandle);

/// Result of a raycast against the physics scene.
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    /// Entity that owns the hit collider.
    pub entity: Entity,
    /// World-space hit point.
    pub point: Vec3,
}

/// Properties for a dynamic block body.
#[derive(Debug, Clone, Copy)]
pub struct BlockBodyProps {
    pub mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// Freeze rotation until the tower collapses.
    pub lock_rotations: bool,
    pub friction: f32,
    pub restitution: f32,
}

#[derive(Resource)]
pub struct PhysicsState {
    pub gravity: Vector3<f32>,
    pub integration_parameters: rapier::IntegrationParameters,
    pub physics_pipeline: rapier::PhysicsPipeline,
    pub island_manager: rapier::IslandManager,
    pub broad_phase: rapier::DefaultBroadPhase,
    pub narrow_phase: rapier::NarrowPhase,
    pub rigid_body_set: rapier::RigidBodySet,
    pub collider_set: rapier::ColliderSet,
    pub impulse_joint_set: rapier::ImpulseJointSet,
    pub multibody_joint_set: rapier::MultibodyJointSet,
    pub ccd_solver: rapier::CCDSolver,
    pub query_pipeline: rapier::QueryPipeline,
    /// Maps each collider back to the entity that owns it, for raycast hits
    /// and contact queries.
    collider_entities: HashMap<rapier::ColliderHandle, Entity>,
}

impl PhysicsState {
    pub fn new() -> Self {
        Self {
            gravity: Vector3::new(0.0, -9.81, 0.0),
            integration_parameters: rapier::IntegrationParameters::default(),
            physics_pipeline: rapier::PhysicsPipeline::new(),
            island_manager: rapier::IslandManager::new(),
            broad_phase: rapier::DefaultBroadPhase::new(),
            narrow_phase: rapier::NarrowPhase::new(),
            rigid_body_set: rapier::RigidBodySet::new(),
            collider_set: rapier::ColliderSet::new(),
            impulse_joint_set: rapier::ImpulseJointSet::new(),
            multibody_joint_set: rapier::MultibodyJointSet::new(),
            ccd_solver: rapier::CCDSolver::new(),
            query_pipeline: rapier::QueryPipeline::new(),
            collider_entities: HashMap::new(),
        }
    }

    /// Advance the simulation by `dt` seconds. The caller applies any
    /// slow-motion scaling before passing `dt` in; a non-positive `dt` is a
    /// no-op so a fully stopped clock never inverts the integrator.
    pub fn step(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Insert a fixed cuboid body (ground platform) owned by `entity`.
    pub fn insert_platform(
        &mut self,
        entity: Entity,
        position: Vec3,
        half_extents: Vec3,
        friction: f32,
    ) -> rapier::RigidBodyHandle {
        let body = rapier::RigidBodyBuilder::fixed().translation(to_na(position));
        let handle = self.rigid_body_set.insert(body);
        let collider = rapier::ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .friction(friction)
            .friction_combine_rule(rapier::CoefficientCombineRule::Average);
        let collider_handle = self
            .collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        self.collider_entities.insert(collider_handle, entity);
        handle
    }

    /// Insert a dynamic cuboid body for a block owned by `entity`.
    ///
    /// Mass is carried entirely by `additional_mass` (the collider has zero
    /// density) so the settle-time mass bump is a plain setter call later.
    pub fn insert_block(
        &mut self,
        entity: Entity,
        position: Vec3,
        half_extents: Vec3,
        props: &BlockBodyProps,
    ) -> rapier::RigidBodyHandle {
        let mut body = rapier::RigidBodyBuilder::dynamic()
            .translation(to_na(position))
            .linear_damping(props.linear_damping)
            .angular_damping(props.angular_damping)
            .additional_mass(props.mass);
        if props.lock_rotations {
            body = body.lock_rotations();
        }
        let handle = self.rigid_body_set.insert(body);
        let collider = rapier::ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .density(0.0)
            .friction(props.friction)
            .friction_combine_rule(rapier::CoefficientCombineRule::Average)
            .restitution(props.restitution)
            .restitution_combine_rule(rapier::CoefficientCombineRule::Average);
        let collider_handle = self
            .collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        self.collider_entities.insert(collider_handle, entity);
        handle
    }

    /// Remove a body and its colliders. Safe to call with a stale handle.
    pub fn remove_body(&mut self, handle: rapier::RigidBodyHandle) {
        if let Some(rb) = self.rigid_body_set.get(handle) {
            for collider in rb.colliders() {
                self.collider_entities.remove(collider);
            }
        }
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }

    pub fn body(&self, handle: rapier::RigidBodyHandle) -> Option<&rapier::RigidBody> {
        self.rigid_body_set.get(handle)
    }

    pub fn body_mut(&mut self, handle: rapier::RigidBodyHandle) -> Option<&mut rapier::RigidBody> {
        self.rigid_body_set.get_mut(handle)
    }

    /// Entity that owns a collider.
    pub fn collider_entity(&self, handle: rapier::ColliderHandle) -> Option<Entity> {
        self.collider_entities.get(&handle).copied()
    }

    /// Cast a ray and return the nearest hit, if any. `exclude` removes one
    /// rigid body (typically the caster itself) from consideration.
    pub fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        exclude: Option<rapier::RigidBodyHandle>,
    ) -> Option<RayHit> {
        let ray = rapier::Ray::new(
            Point3::new(origin.x, origin.y, origin.z),
            to_na(direction),
        );
        let mut filter = rapier::QueryFilter::default();
        if let Some(body) = exclude {
            filter = filter.exclude_rigid_body(body);
        }
        let (collider, toi) = self.query_pipeline.cast_ray(
            &self.rigid_body_set,
            &self.collider_set,
            &ray,
            max_distance,
            true,
            filter,
        )?;
        let entity = self.collider_entity(collider)?;
        let point = ray.point_at(toi);
        Some(RayHit {
            entity,
            point: Vec3::new(point.x, point.y, point.z),
        })
    }

    /// Entities whose colliders are currently in active contact with `body`.
    pub fn touching_entities(&self, body: rapier::RigidBodyHandle) -> Vec<Entity> {
        let mut touching = Vec::new();
        let Some(rb) = self.rigid_body_set.get(body) else {
            return touching;
        };
        for &collider in rb.colliders() {
            for pair in self.narrow_phase.contact_pairs_with(collider) {
                if !pair.has_any_active_contact {
                    continue;
                }
                let other = if pair.collider1 == collider {
                    pair.collider2
                } else {
                    pair.collider1
                };
                if let Some(entity) = self.collider_entity(other) {
                    touching.push(entity);
                }
            }
        }
        touching
    }

    /// Body position and orientation in Bevy types.
    pub fn body_pose(&self, handle: rapier::RigidBodyHandle) -> Option<(Vec3, Quat)> {
        let body = self.rigid_body_set.get(handle)?;
        let pos = body.translation();
        let rot = body.rotation();
        Some((
            Vec3::new(pos.x, pos.y, pos.z),
            Quat::from_xyzw(rot.i, rot.j, rot.k, rot.w),
        ))
    }
}

impl Default for PhysicsState {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy body poses back onto the linked entities' transforms.
pub fn sync_transforms(
    physics: Res<PhysicsState>,
    mut query: Query<(&RigidBodyLink, &mut Transform)>,
) {
    for (link, mut transform) in query.iter_mut() {
        if let Some((pos, rot)) = physics.body_pose(link.0) {
            transform.translation = pos;
            transform.rotation = rot;
        }
    }
}

pub fn to_na(v: Vec3) -> Vector3<f32> {
    Vector3::new(v.x, v.y, v.z)
}
