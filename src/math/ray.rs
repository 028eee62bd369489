use glam::{Mat4, Vec3};

use super::AABB;

/// Half-line used for picking and drag projection
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Direction is normalized on construction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Ray expressed in the space described by `transform`.
    /// Rigid transforms keep distances, so hit `t` values stay comparable.
    pub fn transformed(&self, transform: &Mat4) -> Ray {
        Ray {
            origin: transform.transform_point3(self.origin),
            direction: transform.transform_vector3(self.direction).normalize_or_zero(),
        }
    }

    pub fn translated(&self, offset: Vec3) -> Ray {
        Ray {
            origin: self.origin + offset,
            direction: self.direction,
        }
    }

    pub fn intersect_plane(&self, plane: &Plane) -> Option<Vec3> {
        plane.intersect(self)
    }
}

/// Plane as `normal · p + constant = 0`
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub constant: f32,
}

impl Plane {
    pub fn from_normal_and_point(normal: Vec3, point: Vec3) -> Self {
        let normal = normal.normalize();
        Self {
            normal,
            constant: -normal.dot(point),
        }
    }

    /// Horizontal plane at height `y`
    pub fn horizontal(y: f32) -> Self {
        Self::from_normal_and_point(Vec3::Y, Vec3::new(0.0, y, 0.0))
    }

    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.constant
    }

    /// Forward intersection only; parallel rays miss
    pub fn intersect(&self, ray: &Ray) -> Option<Vec3> {
        const EPSILON: f32 = 1e-8;

        let denom = self.normal.dot(ray.direction);
        if denom.abs() < EPSILON {
            return if self.distance_to_point(ray.origin).abs() < EPSILON {
                Some(ray.origin)
            } else {
                None
            };
        }

        let t = -self.distance_to_point(ray.origin) / denom;
        (t >= 0.0).then(|| ray.at(t))
    }
}

/// Slab test. Returns the distance to the first hit in front of the origin.
pub fn intersect_aabb(ray_origin: Vec3, ray_dir: Vec3, bounds: &AABB) -> Option<f32> {
    const EPSILON: f32 = 1e-8;

    // Near-zero components clamp to a huge inverse instead of dividing by zero
    let inv_dir = Vec3::new(
        if ray_dir.x.abs() < EPSILON { 1.0 / EPSILON.copysign(ray_dir.x) } else { 1.0 / ray_dir.x },
        if ray_dir.y.abs() < EPSILON { 1.0 / EPSILON.copysign(ray_dir.y) } else { 1.0 / ray_dir.y },
        if ray_dir.z.abs() < EPSILON { 1.0 / EPSILON.copysign(ray_dir.z) } else { 1.0 / ray_dir.z },
    );

    let t_min = (bounds.min - ray_origin) * inv_dir;
    let t_max = (bounds.max - ray_origin) * inv_dir;

    let t1 = t_min.min(t_max);
    let t2 = t_min.max(t_max);

    let t_near = t1.x.max(t1.y).max(t1.z);
    let t_far = t2.x.min(t2.y).min(t2.z);

    if t_near > t_far || t_far < 0.0 {
        return None;
    }

    if t_near < 0.0 {
        // Origin inside the box
        Some(0.0)
    } else {
        Some(t_near)
    }
}
