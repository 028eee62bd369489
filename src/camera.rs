use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

use crate::math::Ray;

pub const CAMERA_TARGET: Vec3 = Vec3::new(0.0, 1.0, 0.0);
pub const OUTSIDE_POSITION: Vec3 = Vec3::new(7.0, 4.0, 8.0);
pub const INSIDE_POSITION: Vec3 = Vec3::new(0.0, 1.0, 0.0);

pub const FOV_Y_DEGREES: f32 = 60.0;
pub const NEAR: f32 = 0.1;
pub const FAR: f32 = 1000.0;
pub const DAMPING_FACTOR: f32 = 0.05;

/// Per-notch dolly factor
const ZOOM_SCALE: f32 = 0.95;
/// Keeps the polar angle off the poles
const POLAR_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraMode {
    #[default]
    Outside,
    Inside,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitLimits {
    pub min_distance: f32,
    pub max_distance: f32,
    pub max_polar: f32,
}

impl CameraMode {
    pub fn limits(&self) -> OrbitLimits {
        match self {
            CameraMode::Outside => OrbitLimits {
                min_distance: 5.0,
                max_distance: 20.0,
                max_polar: FRAC_PI_2,
            },
            CameraMode::Inside => OrbitLimits {
                min_distance: 0.5,
                max_distance: 4.0,
                max_polar: PI,
            },
        }
    }

    pub fn home_position(&self) -> Vec3 {
        match self {
            CameraMode::Outside => OUTSIDE_POSITION,
            CameraMode::Inside => INSIDE_POSITION,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            CameraMode::Outside => CameraMode::Inside,
            CameraMode::Inside => CameraMode::Outside,
        }
    }
}

/// Radius, polar angle from +Y, azimuth around +Y measured from +Z
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f32,
    phi: f32,
    theta: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self {
                radius: 0.0,
                phi: 0.0,
                theta: 0.0,
            };
        }
        Self {
            radius,
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            theta: offset.x.atan2(offset.z),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi = self.phi.sin();
        Vec3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }
}

/// Damped orbit camera around a fixed target.
///
/// Input accumulates into a pending rotation and dolly; `update` applies a
/// damped share of it each frame and re-derives the position.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    position: Vec3,
    target: Vec3,
    mode: CameraMode,
    limits: OrbitLimits,
    aspect: f32,
    pending_theta: f32,
    pending_phi: f32,
    pending_scale: f32,
    drag_anchor: Option<Vec2>,
    /// Orbit by pointer drag
    pub enabled: bool,
    /// Dolly by wheel
    pub enable_zoom: bool,
}

impl OrbitCamera {
    pub fn new(aspect: f32) -> Self {
        let mode = CameraMode::Outside;
        let mut camera = Self {
            position: mode.home_position(),
            target: CAMERA_TARGET,
            mode,
            limits: mode.limits(),
            aspect,
            pending_theta: 0.0,
            pending_phi: 0.0,
            pending_scale: 1.0,
            drag_anchor: None,
            enabled: true,
            enable_zoom: true,
        };
        camera.update();
        camera
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn limits(&self) -> OrbitLimits {
        self.limits
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn distance(&self) -> f32 {
        (self.position - self.target).length()
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    /// Jump to a mode's home position and limits. Pending motion is dropped.
    pub fn set_mode(&mut self, mode: CameraMode) {
        self.mode = mode;
        self.position = mode.home_position();
        self.target = CAMERA_TARGET;
        self.limits = mode.limits();
        self.pending_theta = 0.0;
        self.pending_phi = 0.0;
        self.pending_scale = 1.0;
        self.update();
    }

    pub fn toggle_mode(&mut self) -> CameraMode {
        self.set_mode(self.mode.toggled());
        self.mode
    }

    /// Queue a rotation in radians, applied over the next frames
    pub fn orbit_by(&mut self, delta_theta: f32, delta_phi: f32) {
        self.pending_theta += delta_theta;
        self.pending_phi += delta_phi;
    }

    pub fn begin_orbit(&mut self, screen: Vec2) {
        if self.enabled {
            self.drag_anchor = Some(screen);
        }
    }

    /// Pointer drag: a full viewport height of travel is one full turn
    pub fn orbit_to(&mut self, screen: Vec2, viewport_height: f32) {
        if !self.enabled {
            self.drag_anchor = None;
            return;
        }
        let Some(anchor) = self.drag_anchor else {
            return;
        };
        let delta = screen - anchor;
        let height = viewport_height.max(1.0);
        self.orbit_by(-TAU * delta.x / height, -TAU * delta.y / height);
        self.drag_anchor = Some(screen);
    }

    pub fn end_orbit(&mut self) {
        self.drag_anchor = None;
    }

    pub fn is_orbiting(&self) -> bool {
        self.drag_anchor.is_some()
    }

    /// Wheel dolly; negative `delta_y` moves closer. Returns whether it applied.
    pub fn zoom(&mut self, delta_y: f32) -> bool {
        if !self.enable_zoom || delta_y == 0.0 {
            return false;
        }
        if delta_y < 0.0 {
            self.pending_scale *= ZOOM_SCALE;
        } else {
            self.pending_scale /= ZOOM_SCALE;
        }
        true
    }

    /// Apply damped motion and limits; call once per frame
    pub fn update(&mut self) {
        let mut spherical = Spherical::from_offset(self.position - self.target);

        spherical.theta += self.pending_theta * DAMPING_FACTOR;
        spherical.phi += self.pending_phi * DAMPING_FACTOR;
        spherical.phi = spherical
            .phi
            .clamp(0.0, self.limits.max_polar)
            .clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        spherical.radius =
            (spherical.radius * self.pending_scale).clamp(self.limits.min_distance, self.limits.max_distance);

        self.position = self.target + spherical.to_offset();

        self.pending_theta *= 1.0 - DAMPING_FACTOR;
        self.pending_phi *= 1.0 - DAMPING_FACTOR;
        self.pending_scale = 1.0;
    }

    pub fn clamp_height(&mut self, min_y: f32) {
        if self.position.y < min_y {
            self.position.y = min_y;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(FOV_Y_DEGREES.to_radians(), self.aspect, NEAR, FAR)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// World-space picking ray through a point in normalized device coordinates
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_projection().inverse();
        let far = inverse * ndc.extend(1.0).extend(1.0);
        let far = far.xyz() / far.w;
        Ray::new(self.position, far - self.position)
    }

    /// Projects a world point to normalized device coordinates
    pub fn world_to_ndc(&self, point: Vec3) -> Vec3 {
        self.view_projection().project_point3(point)
    }
}
