use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use glam::{Mat4, Vec3};

use crate::camera::OrbitCamera;
use crate::core::{EveryNTicks, Viewport};
use crate::scene::SceneStore;

/// The camera never dips below this height
pub const MIN_CAMERA_HEIGHT: f32 = 0.1;

#[derive(Debug, Default)]
struct TrackerState {
    next_id: u64,
    live: BTreeMap<u64, String>,
    allocated: u64,
    released: u64,
}

/// Hands out GPU resource handles and counts their release.
///
/// Clones share the same bookkeeping, so a test can keep one and watch
/// what the scene store frees.
#[derive(Debug, Clone, Default)]
pub struct ResourceTracker {
    state: Rc<RefCell<TrackerState>>,
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&self, label: impl Into<String>) -> GpuResource {
        let label = label.into();
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state.allocated += 1;
        state.live.insert(id, label.clone());
        log::trace!("gpu: allocate #{} {}", id, label);

        GpuResource {
            id,
            label,
            state: Rc::clone(&self.state),
        }
    }

    pub fn live_count(&self) -> usize {
        self.state.borrow().live.len()
    }

    pub fn allocated_count(&self) -> u64 {
        self.state.borrow().allocated
    }

    pub fn released_count(&self) -> u64 {
        self.state.borrow().released
    }

    pub fn is_live(&self, id: u64) -> bool {
        self.state.borrow().live.contains_key(&id)
    }
}

/// Geometry and material buffers for one node. Released when dropped.
#[derive(Debug)]
pub struct GpuResource {
    id: u64,
    label: String,
    state: Rc<RefCell<TrackerState>>,
}

impl GpuResource {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Drop for GpuResource {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        if state.live.remove(&self.id).is_some() {
            state.released += 1;
            log::trace!("gpu: release #{} {}", self.id, self.label);
        } else {
            log::error!("gpu: resource #{} {} released twice", self.id, self.label);
        }
    }
}

/// Frame timing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    pub number: u64,
    pub time: f32,
    pub delta: f32,
}

/// Everything a renderer needs to draw one frame
pub struct FrameView<'a> {
    pub frame: FrameInfo,
    pub view: Mat4,
    pub projection: Mat4,
    pub camera_position: Vec3,
    pub scene: &'a SceneStore,
}

/// Draws the scene. Implementations own their GPU context.
pub trait SceneRenderer {
    fn resize(&mut self, viewport: Viewport);

    fn render(&mut self, frame: &FrameView<'_>);
}

impl<R: SceneRenderer + ?Sized> SceneRenderer for Rc<RefCell<R>> {
    fn resize(&mut self, viewport: Viewport) {
        self.borrow_mut().resize(viewport);
    }

    fn render(&mut self, frame: &FrameView<'_>) {
        self.borrow_mut().render(frame);
    }
}

/// Renderer with no output surface. Counts draw calls and logs stats.
#[derive(Debug)]
pub struct HeadlessRenderer {
    viewport: Viewport,
    frames_rendered: u64,
    last_draw_calls: usize,
    last_camera_position: Vec3,
    stats_timer: EveryNTicks,
}

impl HeadlessRenderer {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            frames_rendered: 0,
            last_draw_calls: 0,
            last_camera_position: Vec3::ZERO,
            stats_timer: EveryNTicks::new(300),
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Meshes submitted in the last frame
    pub fn last_draw_calls(&self) -> usize {
        self.last_draw_calls
    }

    pub fn last_camera_position(&self) -> Vec3 {
        self.last_camera_position
    }
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

impl SceneRenderer for HeadlessRenderer {
    fn resize(&mut self, viewport: Viewport) {
        log::debug!("Headless renderer resized to {}x{}", viewport.width, viewport.height);
        self.viewport = viewport;
    }

    fn render(&mut self, frame: &FrameView<'_>) {
        self.frames_rendered += 1;
        self.last_draw_calls = frame.scene.draw_call_count();
        self.last_camera_position = frame.camera_position;

        if self.stats_timer.tick() {
            log::debug!(
                "frame {} t={:.1}s: {} draw calls, {} furniture nodes",
                frame.frame.number,
                frame.frame.time,
                self.last_draw_calls,
                frame.scene.nodes().len()
            );
        }
    }
}

/// Continuously repeating frame scheduler
#[derive(Debug, Clone, Default)]
pub struct RenderLoop {
    running: bool,
    frames: u64,
    time: f32,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        if !self.running {
            log::debug!("Render loop started");
        }
        self.running = true;
    }

    pub fn stop(&mut self) {
        if self.running {
            log::debug!("Render loop stopped after {} frames", self.frames);
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Advance orbit damping, keep the camera above the floor and draw.
    /// Returns false when the loop is stopped.
    pub fn frame(
        &mut self,
        delta: f32,
        camera: &mut OrbitCamera,
        scene: &SceneStore,
        renderer: &mut dyn SceneRenderer,
    ) -> bool {
        if !self.running {
            return false;
        }

        camera.update();
        camera.clamp_height(MIN_CAMERA_HEIGHT);

        self.frames += 1;
        self.time += delta;

        let view = FrameView {
            frame: FrameInfo {
                number: self.frames,
                time: self.time,
                delta,
            },
            view: camera.view_matrix(),
            projection: camera.projection_matrix(),
            camera_position: camera.position(),
            scene,
        };
        renderer.render(&view);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropping_a_handle_releases_once() {
        let tracker = ResourceTracker::new();
        let a = tracker.allocate("sofa");
        let b = tracker.allocate("lamp");
        assert_eq!(tracker.live_count(), 2);
        assert!(tracker.is_live(a.id()));

        drop(a);
        assert_eq!(tracker.live_count(), 1);
        assert_eq!(tracker.released_count(), 1);

        drop(b);
        assert_eq!(tracker.released_count(), 2);
        assert_eq!(tracker.allocated_count(), 2);
    }

    #[test]
    fn stopped_loop_does_not_render() {
        let mut render_loop = RenderLoop::new();
        let mut camera = OrbitCamera::new(Viewport::default().aspect());
        let scene = SceneStore::new(ResourceTracker::new());
        let mut renderer = HeadlessRenderer::default();

        assert!(!render_loop.frame(0.016, &mut camera, &scene, &mut renderer));
        assert_eq!(renderer.frames_rendered(), 0);

        render_loop.start();
        assert!(render_loop.frame(0.016, &mut camera, &scene, &mut renderer));
        assert!(render_loop.frame(0.016, &mut camera, &scene, &mut renderer));
        assert_eq!(renderer.frames_rendered(), 2);
        assert_eq!(render_loop.frames(), 2);

        render_loop.stop();
        assert!(!render_loop.is_running());
        assert!(!render_loop.frame(0.016, &mut camera, &scene, &mut renderer));
    }

    #[test]
    fn frame_keeps_camera_above_floor() {
        let mut render_loop = RenderLoop::new();
        render_loop.start();
        let mut camera = OrbitCamera::new(1.0);
        camera.toggle_mode();
        // Inside view allows the full polar range; swing the eye under the target
        for _ in 0..40 {
            camera.zoom(100.0);
            camera.update();
        }
        camera.orbit_by(0.0, 3.0);
        let scene = SceneStore::new(ResourceTracker::new());
        let mut renderer = HeadlessRenderer::default();

        for _ in 0..200 {
            render_loop.frame(0.016, &mut camera, &scene, &mut renderer);
        }
        assert!(camera.position().y >= MIN_CAMERA_HEIGHT - 1e-5);
        assert!(renderer.last_camera_position().y >= MIN_CAMERA_HEIGHT - 1e-5);
    }
}
