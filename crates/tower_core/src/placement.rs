//! Placement planning: turning a picked point on the tower into a clamped,
//! supported spawn position.
//!
//! Pure math, no ECS. The pick systems gather the inputs and feed them in.

use bevy::prelude::*;

/// What the pick ray landed on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickSurface {
    /// A previously stacked block. `half_height` is `None` when the hit
    /// entity exposes no extents, in which case the spawn falls back to a
    /// fixed offset above the hit point.
    Block {
        center_y: f32,
        half_height: Option<f32>,
    },
    /// The base platform or the initial block; spawn at tower height.
    Ground,
}

/// Compute where a new block spawns for a pick at `pick_point`.
///
/// The horizontal position is the pick's, clamped onto the circle of
/// `max_radius` around `tower_center` (same direction, vertical component
/// preserved). The vertical position clears the hit block's top surface by
/// `clearance`, or sits at `tower_height` for ground picks.
#[allow(clippy::too_many_arguments)]
pub fn compute_spawn_position(
    pick_point: Vec3,
    surface: PickSurface,
    tower_height: f32,
    tower_center: Vec2,
    max_radius: f32,
    clearance: f32,
    fallback_offset: f32,
) -> Vec3 {
    let candidate = match surface {
        PickSurface::Block {
            center_y,
            half_height: Some(half_height),
        } => Vec3::new(pick_point.x, center_y + half_height + clearance, pick_point.z),
        PickSurface::Block {
            half_height: None, ..
        } => Vec3::new(pick_point.x, pick_point.y + fallback_offset, pick_point.z),
        PickSurface::Ground => Vec3::new(pick_point.x, tower_height, pick_point.z),
    };
    clamp_to_radius(candidate, tower_center, max_radius)
}

/// Project `position` onto the XZ plane and clamp it onto the boundary
/// circle when it lies outside, keeping the direction from the center and
/// the vertical component.
pub fn clamp_to_radius(position: Vec3, center: Vec2, max_radius: f32) -> Vec3 {
    let offset = Vec2::new(position.x, position.z) - center;
    let distance = offset.length();
    if distance <= max_radius || distance <= f32::EPSILON {
        return position;
    }
    let clamped = center + offset * (max_radius / distance);
    Vec3::new(clamped.x, position.y, clamped.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RADIUS: f32 = 2.0;
    const CLEARANCE: f32 = 0.3;
    const FALLBACK: f32 = 0.5;

    fn spawn_at(pick: Vec3, surface: PickSurface, tower_height: f32) -> Vec3 {
        compute_spawn_position(
            pick,
            surface,
            tower_height,
            Vec2::ZERO,
            RADIUS,
            CLEARANCE,
            FALLBACK,
        )
    }

    #[test]
    fn inside_radius_is_untouched() {
        let pos = clamp_to_radius(Vec3::new(1.0, 3.0, 1.0), Vec2::ZERO, RADIUS);
        assert_eq!(pos, Vec3::new(1.0, 3.0, 1.0));
    }

    #[test]
    fn outside_radius_lands_exactly_on_boundary_same_angle() {
        let pos = clamp_to_radius(Vec3::new(5.0, 3.0, 5.0), Vec2::ZERO, RADIUS);
        let horizontal = Vec2::new(pos.x, pos.z);
        assert!((horizontal.length() - RADIUS).abs() < 1e-5);
        // Same direction as the original offset.
        let angle = horizontal.angle_to(Vec2::new(5.0, 5.0));
        assert!(angle.abs() < 1e-5);
        // Vertical component preserved.
        assert_eq!(pos.y, 3.0);
    }

    #[test]
    fn exactly_on_radius_is_untouched() {
        let pos = clamp_to_radius(Vec3::new(RADIUS, 1.0, 0.0), Vec2::ZERO, RADIUS);
        assert_eq!(pos, Vec3::new(RADIUS, 1.0, 0.0));
    }

    #[test]
    fn block_hit_spawns_above_its_top_surface() {
        let surface = PickSurface::Block {
            center_y: 2.0,
            half_height: Some(0.25),
        };
        let pos = spawn_at(Vec3::new(0.4, 2.2, -0.3), surface, 5.0);
        assert_eq!(pos, Vec3::new(0.4, 2.0 + 0.25 + CLEARANCE, -0.3));
    }

    #[test]
    fn block_hit_without_extents_falls_back_to_hit_point_offset() {
        let surface = PickSurface::Block {
            center_y: 2.0,
            half_height: None,
        };
        let pos = spawn_at(Vec3::new(0.4, 2.2, -0.3), surface, 5.0);
        assert_eq!(pos, Vec3::new(0.4, 2.2 + FALLBACK, -0.3));
    }

    #[test]
    fn ground_hit_spawns_at_tower_height() {
        let pos = spawn_at(Vec3::new(0.5, 0.1, 0.5), PickSurface::Ground, 1.8);
        assert_eq!(pos, Vec3::new(0.5, 1.8, 0.5));
    }

    #[test]
    fn far_pick_is_clamped_with_height_kept() {
        let surface = PickSurface::Block {
            center_y: 1.0,
            half_height: Some(0.25),
        };
        let pos = spawn_at(Vec3::new(5.0, 1.2, 5.0), surface, 3.0);
        assert!((Vec2::new(pos.x, pos.z).length() - RADIUS).abs() < 1e-5);
        assert!((pos.y - (1.0 + 0.25 + CLEARANCE)).abs() < 1e-6);
    }
}
