mod aabb;
mod color;
mod ray;
mod triangle;

pub use aabb::AABB;
pub use color::{parse_hex_color, rgb_from_u32};
pub use ray::{intersect_aabb, Plane, Ray};
pub use triangle::{moller_trumbore_intersect, nearest_triangle_hit, TriangleHit};

use std::f32::consts::TAU;

/// Wraps an angle into `[0, 2π)`
pub fn normalize_radians(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Whole degrees in `[0, 360)` for display
pub fn display_degrees(angle: f32) -> u32 {
    (angle.to_degrees().rem_euclid(360.0).round() as u32) % 360
}

/// Smallest absolute difference between two angles
pub fn angular_distance(a: f32, b: f32) -> f32 {
    let d = normalize_radians(a - b);
    d.min(TAU - d)
}
