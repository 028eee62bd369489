use glam::Vec3;

use super::Ray;

/// Hit on a single triangle
#[derive(Debug, Clone, Copy)]
pub struct TriangleHit {
    pub t: f32,
    pub u: f32,
    pub v: f32,
}

/// Möller-Trumbore ray-triangle intersection, double sided
pub fn moller_trumbore_intersect(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<TriangleHit> {
    const EPSILON: f32 = 1e-6;

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);

    // Parallel or degenerate
    if a.abs() < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    if t < EPSILON {
        return None;
    }

    Some(TriangleHit { t, u, v })
}

/// Closest hit over a triangle soup
pub fn nearest_triangle_hit<I>(ray: &Ray, triangles: I) -> Option<f32>
where
    I: IntoIterator<Item = [Vec3; 3]>,
{
    triangles
        .into_iter()
        .filter_map(|[a, b, c]| moller_trumbore_intersect(ray, a, b, c))
        .map(|hit| hit.t)
        .min_by(|a, b| a.total_cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_triangle() -> (Vec3, Vec3, Vec3) {
        (
            Vec3::new(-1.0, 0.0, -5.0),
            Vec3::new(1.0, 0.0, -5.0),
            Vec3::new(0.0, 1.0, -5.0),
        )
    }

    #[test]
    fn test_moller_trumbore_hit() {
        let (v0, v1, v2) = create_test_triangle();
        let ray = Ray::new(Vec3::new(0.0, 0.1, 0.0), Vec3::NEG_Z);

        let hit = moller_trumbore_intersect(&ray, v0, v1, v2).unwrap();
        assert!((hit.t - 5.0).abs() < 1e-4);
        assert!(hit.u + hit.v <= 1.0);
    }

    #[test]
    fn test_moller_trumbore_miss() {
        let (v0, v1, v2) = create_test_triangle();
        let ray = Ray::new(Vec3::ZERO, Vec3::new(5.0, 0.0, -1.0));
        assert!(moller_trumbore_intersect(&ray, v0, v1, v2).is_none());
    }

    #[test]
    fn test_behind_ray() {
        let (v0, v1, v2) = create_test_triangle();
        let ray = Ray::new(Vec3::new(0.0, 0.1, 0.0), Vec3::Z);
        assert!(moller_trumbore_intersect(&ray, v0, v1, v2).is_none());
    }

    #[test]
    fn test_edge_case_parallel_ray() {
        let (v0, v1, v2) = create_test_triangle();
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::X);
        assert!(moller_trumbore_intersect(&ray, v0, v1, v2).is_none());
    }

    #[test]
    fn test_nearest_picks_closer_triangle() {
        let near = [
            Vec3::new(-1.0, -1.0, -2.0),
            Vec3::new(1.0, -1.0, -2.0),
            Vec3::new(0.0, 1.0, -2.0),
        ];
        let far = [
            Vec3::new(-1.0, -1.0, -6.0),
            Vec3::new(1.0, -1.0, -6.0),
            Vec3::new(0.0, 1.0, -6.0),
        ];
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let t = nearest_triangle_hit(&ray, [far, near]).unwrap();
        assert!((t - 2.0).abs() < 1e-4);
    }
}
