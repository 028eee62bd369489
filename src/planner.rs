//! One room-planner session: owns the scene, camera, interaction state,
//! pending asset loads and the save debounce, and exposes the operations a
//! host page calls.
//!
//! The host drives everything from its frame callback with [`RoomPlanner::tick`].
//! Nothing here blocks; asset loads run on a local executor pumped by
//! [`RoomPlanner::advance`], and results from a torn-down session are dropped
//! by comparing generations.

use std::collections::VecDeque;
use std::rc::Rc;

use glam::{Vec2, Vec3};

use crate::camera::{CameraMode, OrbitCamera};
use crate::catalog::{CartLine, CartSink};
use crate::core::{InputEvent, PointerButton, PointerInput, Viewport};
use crate::error::ConfigError;
use crate::interaction::{CursorHint, InteractionController, Response};
use crate::loaders::{AssetLoader, AssetSource, LoadQueue, LoadResult};
use crate::math::Ray;
use crate::persistence::{FurnitureSnapshot, PersistedRoom, PersistenceBridge, PersistenceSink, SavedRoom};
use crate::render::{RenderLoop, ResourceTracker, SceneRenderer};
use crate::scene::{FixtureKind, FurnitureMeta, SceneStore};
use crate::settings::PlannerSettings;
use crate::types::{CatalogItem, FloorFinish, LoaderKind, RoomConfig};

/// Who the session belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerContext {
    pub user_id: String,
    pub shop_id: String,
}

impl PlannerContext {
    pub fn new(user_id: impl Into<String>, shop_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            shop_id: shop_id.into(),
        }
    }
}

/// Services the planner talks to
pub struct PlannerCollaborators {
    pub assets: Rc<dyn AssetSource>,
    pub sink: Rc<dyn PersistenceSink>,
    pub cart: Rc<dyn CartSink>,
    pub renderer: Box<dyn SceneRenderer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerPhase {
    /// No room yet; the host should show the configuration step
    AwaitingConfiguration,
    Active,
}

/// Notifications for the host page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannerEvent {
    ViewCart { shop_id: String },
    ReturnToStore { shop_id: String },
    RoomCleared,
}

#[derive(Debug, Clone, Copy)]
enum Placement {
    /// Fresh from the catalog: stand on the floor at this room-local point, then clamp
    Spawn(Vec3),
    /// From a saved room: exact transform, no clamp
    Restore { position: Vec3, yaw: f32 },
}

enum LoadTicket {
    Fixture {
        generation: u64,
        kind: FixtureKind,
    },
    Furniture {
        generation: u64,
        meta: FurnitureMeta,
        placement: Placement,
    },
}

impl LoadTicket {
    fn generation(&self) -> u64 {
        match self {
            LoadTicket::Fixture { generation, .. } | LoadTicket::Furniture { generation, .. } => *generation,
        }
    }
}

pub struct RoomPlanner {
    context: PlannerContext,
    settings: PlannerSettings,
    loader: AssetLoader,
    bridge: PersistenceBridge,
    cart: Rc<dyn CartSink>,
    renderer: Box<dyn SceneRenderer>,
    scene: SceneStore,
    camera: OrbitCamera,
    interaction: InteractionController,
    render_loop: RenderLoop,
    loads: LoadQueue<LoadTicket>,
    pending_restore: Vec<FurnitureSnapshot>,
    viewport: Viewport,
    phase: PlannerPhase,
    generation: u64,
    events: VecDeque<PlannerEvent>,
}

impl RoomPlanner {
    pub fn new(context: PlannerContext, settings: PlannerSettings, collaborators: PlannerCollaborators) -> Self {
        let viewport = Viewport::default();
        let PlannerCollaborators {
            assets,
            sink,
            cart,
            mut renderer,
        } = collaborators;
        renderer.resize(viewport);

        Self {
            loader: AssetLoader::new(assets, settings.point_format_product_ids.clone()),
            bridge: PersistenceBridge::new(sink, settings.debounce_seconds),
            cart,
            renderer,
            scene: SceneStore::with_settings(ResourceTracker::new(), &settings),
            camera: OrbitCamera::new(viewport.aspect()),
            interaction: InteractionController::new(settings.rotation_step_degrees),
            render_loop: RenderLoop::new(),
            loads: LoadQueue::new(),
            pending_restore: Vec::new(),
            viewport,
            phase: PlannerPhase::AwaitingConfiguration,
            generation: 0,
            events: VecDeque::new(),
            context,
            settings,
        }
    }

    /// Restore the user's saved room if there is one. Returns false when the
    /// host should show the configuration step instead.
    pub fn mount(&mut self) -> bool {
        log::info!(
            "Mounting room planner for user {} in shop {}",
            self.context.user_id,
            self.context.shop_id
        );
        match self.bridge.load(&self.context.user_id) {
            Some(blob) => self.restore(&blob),
            None => {
                log::info!("No saved room, waiting for configuration");
                false
            }
        }
    }

    /// Build a fresh room. Any existing furniture is released.
    pub fn configure(&mut self, config: RoomConfig) -> Result<(), ConfigError> {
        let config = config.validated()?;
        self.start_session(&config)?;
        self.trigger_save();
        Ok(())
    }

    /// Rebuild the room from a saved blob and queue its furniture.
    /// A corrupt blob leaves the planner waiting for configuration.
    pub fn restore(&mut self, blob: &str) -> bool {
        let saved = match SavedRoom::parse(blob) {
            Ok(saved) => saved,
            Err(err) => {
                log::warn!("Ignoring saved room: {}", err);
                self.await_configuration();
                return false;
            }
        };

        let base = self.scene.config().cloned().unwrap_or_default();
        let config = match saved.merge_into(&base).validated() {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Ignoring saved room: {}", err);
                self.await_configuration();
                return false;
            }
        };
        if let Err(err) = self.start_session(&config) {
            log::warn!("Ignoring saved room: {}", err);
            self.await_configuration();
            return false;
        }

        self.pending_restore = saved.placeable_objects();
        log::info!("Restoring room with {} furniture items", self.pending_restore.len());
        true
    }

    /// Forget the saved room and go back to the configuration step
    pub fn clear(&mut self) {
        log::info!("Clearing room for user {}", self.context.user_id);
        self.bridge.forget(&self.context.user_id);
        self.await_configuration();
        self.events.push_back(PlannerEvent::RoomCleared);
    }

    /// Tear down the live room without touching the stored blob
    fn await_configuration(&mut self) {
        self.bridge.cancel();
        self.render_loop.stop();
        self.interaction.reset(&mut self.camera);
        self.scene.clear();
        self.pending_restore.clear();
        self.generation += 1;
        self.phase = PlannerPhase::AwaitingConfiguration;
    }

    fn start_session(&mut self, config: &RoomConfig) -> Result<(), ConfigError> {
        self.scene.rebuild(config)?;
        self.interaction.reset(&mut self.camera);
        self.pending_restore.clear();
        self.generation += 1;
        self.phase = PlannerPhase::Active;
        self.request_fixtures();
        self.render_loop.start();
        self.renderer.resize(self.viewport);
        Ok(())
    }

    fn request_fixtures(&mut self) {
        let fixtures = [
            (FixtureKind::Door, self.settings.door_model.clone()),
            (FixtureKind::Window, self.settings.window_model.clone()),
        ];
        for (kind, path) in fixtures {
            if let Some(path) = path {
                let load = self.loader.load(&path, LoaderKind::MeshFormat);
                self.loads.request(
                    LoadTicket::Fixture {
                        generation: self.generation,
                        kind,
                    },
                    load,
                );
            }
        }
    }

    pub fn set_wall_color(&mut self, color: &str) -> Result<(), ConfigError> {
        self.scene.set_wall_color(color)?;
        self.trigger_save();
        Ok(())
    }

    pub fn set_floor_color(&mut self, color: &str) -> Result<(), ConfigError> {
        self.scene.set_floor_color(color)?;
        self.trigger_save();
        Ok(())
    }

    pub fn set_floor_finish(&mut self, finish: FloorFinish) -> Result<(), ConfigError> {
        self.scene.set_floor_finish(finish)?;
        self.trigger_save();
        Ok(())
    }

    pub fn toggle_camera_view(&mut self) -> CameraMode {
        let mode = self.camera.toggle_mode();
        log::debug!("Camera view: {:?}", mode);
        mode
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = Viewport::new(width, height);
        self.camera.set_aspect(self.viewport.aspect());
        self.renderer.resize(self.viewport);
    }

    /// Route one host event. Pointer input the interaction controller does
    /// not consume drives the orbit camera.
    pub fn handle_input(&mut self, event: InputEvent) -> Response {
        match event {
            InputEvent::Pointer(input) => self.handle_pointer(input),
            InputEvent::DeleteSelection => {
                if self.delete_selected() {
                    Response::SAVE
                } else {
                    Response::IGNORED
                }
            }
            InputEvent::ToggleCameraView => {
                self.toggle_camera_view();
                Response::CONSUMED
            }
            InputEvent::Resized { width, height } => {
                self.resize(width, height);
                Response::IGNORED
            }
        }
    }

    fn handle_pointer(&mut self, input: PointerInput) -> Response {
        if self.phase != PlannerPhase::Active {
            return Response::IGNORED;
        }
        let Some(input) = input.unify() else {
            return Response::IGNORED;
        };

        let response = match input {
            PointerInput::Down {
                position,
                button: PointerButton::Primary,
            } => {
                let ray = self.ray_at(position);
                let response = self.interaction.pointer_down(&ray, &mut self.scene, &mut self.camera);
                if !response.consumed {
                    self.camera.begin_orbit(position);
                }
                response
            }
            PointerInput::Down {
                position,
                button: PointerButton::Middle,
            } => {
                let ray = self.ray_at(position);
                self.interaction.middle_click(&ray, &mut self.scene, &mut self.camera)
            }
            PointerInput::Move { position } => {
                let ray = self.ray_at(position);
                let response = self.interaction.pointer_move(&ray, &mut self.scene);
                if !response.consumed {
                    self.camera.orbit_to(position, self.viewport.height as f32);
                }
                response
            }
            PointerInput::Up {
                button: PointerButton::Primary,
                ..
            } => {
                self.camera.end_orbit();
                self.interaction.pointer_up(&self.scene, &mut self.camera)
            }
            PointerInput::Wheel { delta_y, .. } => {
                let response = self.interaction.wheel(delta_y, &mut self.scene);
                if !response.consumed {
                    self.camera.zoom(delta_y);
                }
                response
            }
            _ => Response::IGNORED,
        };

        if response.save {
            self.trigger_save();
        }
        response
    }

    /// World ray under a screen point
    fn ray_at(&self, screen: Vec2) -> Ray {
        self.camera.ray_from_ndc(self.viewport.to_ndc(screen))
    }

    pub fn delete_selected(&mut self) -> bool {
        let response = self.interaction.delete_selected(&mut self.scene, &mut self.camera);
        if response.save {
            self.trigger_save();
        }
        response.save
    }

    /// Rotation slider, in degrees
    pub fn set_selected_rotation(&mut self, degrees: f32) -> bool {
        let response = self.interaction.set_rotation_degrees(degrees, &mut self.scene);
        if response.save {
            self.trigger_save();
        }
        response.save
    }

    /// Whole degrees shown for the selection
    pub fn selected_rotation(&self) -> Option<u32> {
        self.scene.selection().map(|selection| selection.rotation_degrees)
    }

    /// Catalog click: the item lands in the middle of the room
    pub fn add_catalog_item(&mut self, item: &CatalogItem) -> bool {
        self.spawn(item, Vec3::ZERO)
    }

    /// Catalog drop at a screen point; ignored off the render surface
    pub fn drop_catalog_item(&mut self, screen: Vec2, item: &CatalogItem) -> bool {
        if !self.viewport.contains(screen) {
            log::debug!("Drop at {:?} is outside the viewport", screen);
            return false;
        }
        let ray = self.ray_at(screen);
        match self.scene.floor_point(&ray) {
            Some(point) => self.spawn(item, point),
            None => {
                log::debug!("Drop at {:?} does not reach the floor", screen);
                false
            }
        }
    }

    /// Drop carrying the catalog list's JSON payload
    pub fn drop_payload(&mut self, screen: Vec2, payload: &str) -> bool {
        match serde_json::from_str::<CatalogItem>(payload) {
            Ok(item) => self.drop_catalog_item(screen, &item),
            Err(err) => {
                log::warn!("Ignoring drop with unreadable payload: {}", err);
                false
            }
        }
    }

    fn spawn(&mut self, item: &CatalogItem, point: Vec3) -> bool {
        if self.phase != PlannerPhase::Active {
            return false;
        }
        let (path, kind) = self.loader.resolve(item);
        log::info!("Placing '{}' from {} ({})", item.display_name, path, kind);

        let load = self.loader.load(&path, kind);
        let meta = FurnitureMeta::from_catalog(item, path, kind);
        self.loads.request(
            LoadTicket::Furniture {
                generation: self.generation,
                meta,
                placement: Placement::Spawn(point),
            },
            load,
        );
        true
    }

    /// Request queued restores and splice finished loads into the scene
    pub fn advance(&mut self) {
        for snapshot in std::mem::take(&mut self.pending_restore) {
            let load = self.loader.load(&snapshot.path, snapshot.loader_type);
            self.loads.request(
                LoadTicket::Furniture {
                    generation: self.generation,
                    meta: snapshot.meta(),
                    placement: Placement::Restore {
                        position: snapshot.position(),
                        yaw: snapshot.rotation_y,
                    },
                },
                load,
            );
        }

        for (ticket, result) in self.loads.poll() {
            self.splice(ticket, result);
        }
    }

    fn splice(&mut self, ticket: LoadTicket, result: LoadResult) {
        if ticket.generation() != self.generation {
            log::debug!("Discarding load from a previous room");
            return;
        }
        let model = match result {
            Ok(model) => model,
            Err(err) => {
                log::warn!("Skipping asset: {}", err);
                return;
            }
        };

        match ticket {
            LoadTicket::Fixture { kind, .. } => {
                self.scene.add_fixture(kind, model);
            }
            LoadTicket::Furniture { meta, placement, .. } => match placement {
                Placement::Spawn(point) => {
                    let floor_y = self.scene.config().map(RoomConfig::floor_y).unwrap_or(point.y);
                    let id = self.scene.add(meta, model, Vec3::new(point.x, floor_y, point.z), 0.0);
                    self.scene.clamp_node(id);
                    self.trigger_save();
                }
                Placement::Restore { position, yaw } => {
                    self.scene.add(meta, model, position, yaw);
                }
            },
        }
    }

    /// Draw one frame; false while the render loop is stopped
    pub fn render_frame(&mut self, delta: f32) -> bool {
        self.render_loop
            .frame(delta, &mut self.camera, &self.scene, self.renderer.as_mut())
    }

    /// Everything a host frame callback does: the save debounce, loads, a frame
    pub fn tick(&mut self, delta: f32) {
        // Saves triggered by this frame's splices start counting next frame
        if self.bridge.tick(delta) {
            self.flush_save();
        }
        self.advance();
        self.render_frame(delta);
    }

    /// Saved-room JSON for the current scene; `None` before configuration
    pub fn serialize(&self) -> Option<String> {
        PersistedRoom::capture(&self.scene).map(|room| room.to_json())
    }

    /// Restart the save debounce. Does nothing before configuration.
    pub fn trigger_save(&mut self) {
        if self.phase == PlannerPhase::Active {
            self.bridge.trigger();
        }
    }

    fn flush_save(&mut self) {
        if let Some(blob) = self.serialize() {
            self.bridge.persist(&self.context.user_id, &blob);
        }
    }

    /// Push every placed product into the cart and hand off to the cart page
    pub fn view_cart(&mut self) -> usize {
        let mut added = 0;
        for node in self.scene.nodes() {
            let meta = &node.meta;
            if meta.product_id.is_empty() {
                continue;
            }
            self.cart.add(CartLine {
                id: meta.product_id.clone(),
                name: meta.display_name.clone(),
                price: meta.price,
                image: meta.image_url.clone(),
            });
            added += 1;
        }
        log::info!("Added {} items to the cart", added);
        self.events.push_back(PlannerEvent::ViewCart {
            shop_id: self.context.shop_id.clone(),
        });
        added
    }

    pub fn return_to_store(&mut self) {
        self.events.push_back(PlannerEvent::ReturnToStore {
            shop_id: self.context.shop_id.clone(),
        });
    }

    pub fn drain_events(&mut self) -> Vec<PlannerEvent> {
        self.events.drain(..).collect()
    }

    pub fn phase(&self) -> PlannerPhase {
        self.phase
    }

    pub fn context(&self) -> &PlannerContext {
        &self.context
    }

    pub fn settings(&self) -> &PlannerSettings {
        &self.settings
    }

    pub fn scene(&self) -> &SceneStore {
        &self.scene
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn cursor(&self) -> CursorHint {
        self.interaction.cursor()
    }

    pub fn is_running(&self) -> bool {
        self.render_loop.is_running()
    }

    /// Loads requested or queued but not yet in the scene
    pub fn pending_loads(&self) -> usize {
        self.loads.in_flight() + self.pending_restore.len()
    }

    pub fn is_save_pending(&self) -> bool {
        self.bridge.is_pending()
    }

    /// Screen point where a room-local position appears
    pub fn screen_point(&self, room_point: Vec3) -> Vec2 {
        let ndc = self.camera.world_to_ndc(room_point + crate::scene::ROOM_ORIGIN);
        self.viewport.from_ndc(ndc.truncate())
    }
}
