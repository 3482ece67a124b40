//! Buffered messages connecting input, game logic, and presentation.

use bevy::prelude::*;

/// A press/touch began at this screen point. Fired at most once per press.
#[derive(Message)]
pub struct PointerPick {
    pub screen_point: Vec2,
}

/// A pick projected through the camera into a world-space ray. Consumed by
/// pick resolution; rays that hit nothing placeable produce nothing.
#[derive(Message, Debug, Clone, Copy)]
pub struct PickRay {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// A resolved, clamped spawn position for a new block. Written by pick
/// resolution, consumed by placement; tests drive the core through this.
#[derive(Message, Debug, Clone, Copy)]
pub struct BlockPlacement {
    pub position: Vec3,
}

/// Request the collapse transition. Idempotent: duplicates within a frame
/// cause exactly one transition.
#[derive(Message)]
pub struct CollapseTower;

/// The replay control was activated.
#[derive(Message)]
pub struct ReplayRequested;

/// The tower was torn down and recreated; presentation state (camera) snaps
/// back to its initial pose.
#[derive(Message)]
pub struct TowerRebuilt;
