//! Pointer state machine for selecting, dragging, rotating and deleting
//! furniture.
//!
//! Mouse and single-finger touch arrive here already unified. Rays are in
//! world space. While a node is held the camera's orbit and zoom are
//! switched off so the two never act on the same gesture.

use glam::Vec3;

use crate::camera::OrbitCamera;
use crate::math::{Plane, Ray};
use crate::scene::SceneStore;
use crate::types::NodeId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionState {
    Idle,
    /// `plane` and `offset` are room-local
    Dragging { node: NodeId, plane: Plane, offset: Vec3 },
}

/// Pointer cursor the host should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorHint {
    #[default]
    Default,
    Grab,
    Grabbing,
}

/// Outcome of one input event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Response {
    /// The camera must not see this event
    pub consumed: bool,
    /// The scene changed and should be persisted
    pub save: bool,
}

impl Response {
    pub const IGNORED: Response = Response {
        consumed: false,
        save: false,
    };
    pub const CONSUMED: Response = Response {
        consumed: true,
        save: false,
    };
    pub const SAVE: Response = Response {
        consumed: true,
        save: true,
    };
}

#[derive(Debug, Clone)]
pub struct InteractionController {
    state: InteractionState,
    cursor: CursorHint,
    rotation_step: f32,
}

impl InteractionController {
    pub fn new(rotation_step_degrees: f32) -> Self {
        Self {
            state: InteractionState::Idle,
            cursor: CursorHint::Default,
            rotation_step: rotation_step_degrees.to_radians(),
        }
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn cursor(&self) -> CursorHint {
        self.cursor
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, InteractionState::Dragging { .. })
    }

    /// Primary press: grab the node under the pointer, or deselect
    pub fn pointer_down(&mut self, ray: &Ray, scene: &mut SceneStore, camera: &mut OrbitCamera) -> Response {
        let Some(id) = scene.pick(ray) else {
            Self::deselect(scene, camera);
            self.cursor = CursorHint::Default;
            return Response::IGNORED;
        };
        let Some(position) = scene.node(id).map(|node| node.position()) else {
            return Response::IGNORED;
        };

        scene.select(id);
        camera.enabled = false;
        camera.enable_zoom = false;
        camera.end_orbit();

        let plane = Plane::horizontal(position.y);
        let offset = plane
            .intersect(&scene.room_ray(ray))
            .map(|hit| position - hit)
            .unwrap_or(Vec3::ZERO);

        log::debug!("Grabbed {} (offset {:?})", id, offset);
        self.state = InteractionState::Dragging { node: id, plane, offset };
        self.cursor = CursorHint::Grabbing;
        Response::CONSUMED
    }

    /// Drag the held node across its plane, or update the hover cursor
    pub fn pointer_move(&mut self, ray: &Ray, scene: &mut SceneStore) -> Response {
        let InteractionState::Dragging { node, plane, offset } = self.state else {
            self.cursor = if scene.pick(ray).is_some() {
                CursorHint::Grab
            } else {
                CursorHint::Default
            };
            return Response::IGNORED;
        };

        if let Some(hit) = plane.intersect(&scene.room_ray(ray)) {
            let target = hit + offset;
            if let Some(held) = scene.node_mut(node) {
                let y = held.position().y;
                held.set_position(Vec3::new(target.x, y, target.z));
            }
            scene.clamp_node(node);
            scene.refresh_selection();
        }
        Response::CONSUMED
    }

    /// Release a drag; orbit comes back and the new position is saved
    pub fn pointer_up(&mut self, scene: &SceneStore, camera: &mut OrbitCamera) -> Response {
        if !self.is_dragging() {
            return Response::IGNORED;
        }
        self.state = InteractionState::Idle;
        camera.enabled = true;
        self.cursor = if scene.selected().is_some() {
            CursorHint::Grab
        } else {
            CursorHint::Default
        };
        Response::SAVE
    }

    /// One wheel notch rotates the selection by the configured step
    pub fn wheel(&mut self, delta_y: f32, scene: &mut SceneStore) -> Response {
        let Some(id) = scene.selected() else {
            return Response::IGNORED;
        };
        if self.is_dragging() || delta_y == 0.0 || !delta_y.is_finite() {
            return Response::CONSUMED;
        }

        let direction = delta_y.signum();
        if let Some(node) = scene.node_mut(id) {
            let yaw = node.yaw() + direction * self.rotation_step;
            node.set_yaw(yaw);
        }
        scene.clamp_node(id);
        scene.refresh_selection();
        Response::SAVE
    }

    /// Absolute rotation from the slider, in degrees
    pub fn set_rotation_degrees(&mut self, degrees: f32, scene: &mut SceneStore) -> Response {
        let Some(id) = scene.selected() else {
            return Response::IGNORED;
        };
        if !degrees.is_finite() {
            return Response::IGNORED;
        }

        let degrees = degrees.clamp(0.0, 360.0).rem_euclid(360.0);
        if let Some(node) = scene.node_mut(id) {
            node.set_yaw(degrees.to_radians());
        }
        scene.clamp_node(id);
        scene.refresh_selection();
        Response::SAVE
    }

    /// Middle button removes whatever is under the pointer
    pub fn middle_click(&mut self, ray: &Ray, scene: &mut SceneStore, camera: &mut OrbitCamera) -> Response {
        let Some(id) = scene.pick(ray) else {
            return Response::IGNORED;
        };
        self.remove(id, scene, camera);
        Response::SAVE
    }

    pub fn delete_selected(&mut self, scene: &mut SceneStore, camera: &mut OrbitCamera) -> Response {
        let Some(id) = scene.selected() else {
            return Response::IGNORED;
        };
        self.remove(id, scene, camera);
        Response::SAVE
    }

    /// Forget any gesture in progress, e.g. when the room is torn down
    pub fn reset(&mut self, camera: &mut OrbitCamera) {
        self.state = InteractionState::Idle;
        self.cursor = CursorHint::Default;
        camera.enabled = true;
        camera.enable_zoom = true;
    }

    fn remove(&mut self, id: NodeId, scene: &mut SceneStore, camera: &mut OrbitCamera) {
        if matches!(self.state, InteractionState::Dragging { node, .. } if node == id) {
            self.state = InteractionState::Idle;
            camera.enabled = true;
        }
        if scene.selected() == Some(id) {
            Self::deselect(scene, camera);
        }
        scene.remove(id);
        self.cursor = CursorHint::Default;
    }

    fn deselect(scene: &mut SceneStore, camera: &mut OrbitCamera) {
        scene.deselect();
        camera.enable_zoom = true;
    }
}
