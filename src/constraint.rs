//! Keeps furniture bounds inside the room footprint.
//!
//! All coordinates are room-local. Only X and Z are ever corrected; the
//! height a node was placed at is left alone.

use glam::{Mat4, Quat, Vec3};

use crate::math::AABB;
use crate::types::RoomConfig;

/// Usable floor rectangle: `±half_width` by `±half_depth`, shrunk by `padding`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomFootprint {
    pub half_width: f32,
    pub half_depth: f32,
    pub padding: f32,
}

impl RoomFootprint {
    pub fn new(width: f32, depth: f32, padding: f32) -> Self {
        Self {
            half_width: width / 2.0,
            half_depth: depth / 2.0,
            padding,
        }
    }

    pub fn from_config(config: &RoomConfig, padding: f32) -> Self {
        Self::new(config.width, config.depth, padding)
    }

    /// Largest allowed `|x|` and `|z|` for any bounding box face
    pub fn limits(&self) -> (f32, f32) {
        (self.half_width - self.padding, self.half_depth - self.padding)
    }

    pub fn contains(&self, bounds: &AABB) -> bool {
        const TOLERANCE: f32 = 1e-4;
        let (max_x, max_z) = self.limits();
        bounds.min.x >= -max_x - TOLERANCE
            && bounds.max.x <= max_x + TOLERANCE
            && bounds.min.z >= -max_z - TOLERANCE
            && bounds.max.z <= max_z + TOLERANCE
    }
}

/// Model-to-room transform of a furniture node
pub fn node_transform(position: Vec3, yaw: f32) -> Mat4 {
    Mat4::from_rotation_translation(Quat::from_rotation_y(yaw), position)
}

/// Room-space box around a node whose model-space bounds are `local`
pub fn world_bounds(local: &AABB, position: Vec3, yaw: f32) -> AABB {
    local.transformed(&node_transform(position, yaw))
}

/// Position that pulls the node's bounds back inside the footprint.
///
/// Each overflowing face moves the node by exactly its overflow. Both faces
/// of an axis are judged against the unmoved box.
pub fn clamp_to_room(local: &AABB, position: Vec3, yaw: f32, footprint: &RoomFootprint) -> Vec3 {
    let bounds = world_bounds(local, position, yaw);
    let (max_x, max_z) = footprint.limits();
    let mut clamped = position;

    if bounds.min.x < -max_x {
        clamped.x += -max_x - bounds.min.x;
    }
    if bounds.max.x > max_x {
        clamped.x -= bounds.max.x - max_x;
    }
    if bounds.min.z < -max_z {
        clamped.z += -max_z - bounds.min.z;
    }
    if bounds.max.z > max_z {
        clamped.z -= bounds.max.z - max_z;
    }

    clamped
}
