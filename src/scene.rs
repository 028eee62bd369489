//! Live scene: room shell, door and window fixtures, furniture nodes and
//! the selection slot.
//!
//! Everything here is in room-local coordinates. The room group sits at
//! [`ROOM_ORIGIN`] in the world; [`SceneStore::room_ray`] converts picking
//! rays on the way in.

use std::collections::BTreeSet;
use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Mat4, Vec2, Vec3};

use crate::constraint::{clamp_to_room, node_transform, world_bounds, RoomFootprint};
use crate::error::ConfigError;
use crate::loaders::LoadedModel;
use crate::math::{display_degrees, intersect_aabb, nearest_triangle_hit, normalize_radians, Plane, Ray, AABB};
use crate::render::{GpuResource, ResourceTracker};
use crate::settings::PlannerSettings;
use crate::types::{validate_color, CatalogItem, FloorFinish, LoaderKind, NodeId, RoomConfig};

/// World position of the room's centre
pub const ROOM_ORIGIN: Vec3 = Vec3::new(0.0, 1.0, 0.0);

/// Floor plane sits just above the wall box bottom to avoid z-fighting
const FLOOR_LIFT: f32 = 0.01;
const FLOOR_TEXTURE_REPEAT: [f32; 2] = [4.0, 4.0];
const DOOR_SCALE: f32 = 0.6;
const WINDOW_HEIGHT_FRACTION: f32 = 0.3;

#[derive(Debug, Clone, PartialEq)]
pub struct FloorTexture {
    pub path: String,
    pub repeat: [f32; 2],
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceMaterial {
    pub color: [f32; 3],
    pub texture: Option<FloorTexture>,
}

impl SurfaceMaterial {
    fn solid(color: [f32; 3]) -> Self {
        Self { color, texture: None }
    }
}

/// Static room shell: an inward-facing wall box and a floor plane
#[derive(Debug)]
pub struct RoomGeometry {
    pub config: RoomConfig,
    pub walls: AABB,
    pub floor_size: Vec2,
    pub floor_y: f32,
    pub wall_material: SurfaceMaterial,
    pub floor_material: SurfaceMaterial,
    _gpu: [GpuResource; 2],
}

impl RoomGeometry {
    fn build(
        config: &RoomConfig,
        wall_thickness: f32,
        texture_dir: &str,
        tracker: &ResourceTracker,
    ) -> Result<Self, ConfigError> {
        let half = Vec3::new(config.width, config.height, config.depth) / 2.0;
        let wall_color = validate_color(&config.wall_color)?;
        let floor_color = validate_color(&config.floor_color)?;

        Ok(Self {
            config: config.clone(),
            walls: AABB::new(-half, half),
            floor_size: Vec2::new(
                (config.width - wall_thickness).max(0.0),
                (config.depth - wall_thickness).max(0.0),
            ),
            floor_y: config.floor_y() + FLOOR_LIFT,
            wall_material: SurfaceMaterial::solid(wall_color),
            floor_material: floor_material(config.floor_finish, floor_color, texture_dir),
            _gpu: [tracker.allocate("room walls"), tracker.allocate("room floor")],
        })
    }
}

fn floor_material(finish: FloorFinish, floor_color: [f32; 3], texture_dir: &str) -> SurfaceMaterial {
    match finish.texture_name() {
        None => SurfaceMaterial::solid(floor_color),
        // Texture shows unaltered over a white base
        Some(name) => SurfaceMaterial {
            color: [1.0, 1.0, 1.0],
            texture: Some(FloorTexture {
                path: format!("{}/{}.jpg", texture_dir.trim_end_matches('/'), name),
                repeat: FLOOR_TEXTURE_REPEAT,
            }),
        },
    }
}

/// Catalog metadata stamped onto a placed node and carried into the saved blob
#[derive(Debug, Clone, PartialEq)]
pub struct FurnitureMeta {
    pub name: String,
    pub display_name: String,
    pub path: String,
    pub loader_kind: LoaderKind,
    pub product_id: String,
    pub price: f64,
    pub image_url: String,
    pub categories: BTreeSet<String>,
}

impl FurnitureMeta {
    /// `path` and `kind` are the resolved asset location, which may differ
    /// from the catalog listing
    pub fn from_catalog(item: &CatalogItem, path: String, kind: LoaderKind) -> Self {
        Self {
            name: item.name.clone(),
            display_name: item.display_name.clone(),
            path,
            loader_kind: kind,
            product_id: item.product_id.clone(),
            price: item.price,
            image_url: item.image_url.clone(),
            categories: item.categories.clone(),
        }
    }
}

/// A placed, movable instance of a catalog item
#[derive(Debug)]
pub struct FurnitureNode {
    id: NodeId,
    pub meta: FurnitureMeta,
    position: Vec3,
    yaw: f32,
    model: LoadedModel,
    gpu: GpuResource,
}

impl FurnitureNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Yaw in `[0, 2π)`
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        self.yaw = normalize_radians(yaw);
    }

    pub fn model(&self) -> &LoadedModel {
        &self.model
    }

    pub fn gpu_handle(&self) -> u64 {
        self.gpu.id()
    }

    pub fn transform(&self) -> Mat4 {
        node_transform(self.position, self.yaw)
    }

    /// Room-space bounding box
    pub fn world_bounds(&self) -> AABB {
        world_bounds(&self.model.bounds, self.position, self.yaw)
    }

    /// Nearest hit distance of a room-space ray against the model's triangles
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        let local = ray.transformed(&self.transform().inverse());
        intersect_aabb(local.origin, local.direction, &self.model.bounds)?;
        nearest_triangle_hit(&local, self.model.triangles())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureKind {
    Door,
    Window,
}

impl FixtureKind {
    /// Placement against the walls, facing into the room
    fn placement(&self, config: &RoomConfig) -> (Vec3, f32, f32) {
        match self {
            FixtureKind::Door => (Vec3::new(0.0, config.floor_y(), config.half_depth()), PI, DOOR_SCALE),
            FixtureKind::Window => (
                Vec3::new(
                    -config.half_width(),
                    config.floor_y() + config.height * WINDOW_HEIGHT_FRACTION,
                    0.0,
                ),
                FRAC_PI_2,
                1.0,
            ),
        }
    }
}

/// Static, never selectable room decoration
#[derive(Debug)]
pub struct RoomFixture {
    pub kind: FixtureKind,
    pub position: Vec3,
    pub yaw: f32,
    pub scale: f32,
    model: LoadedModel,
    _gpu: GpuResource,
}

impl RoomFixture {
    pub fn model(&self) -> &LoadedModel {
        &self.model
    }
}

/// The one selected node plus what the UI shows for it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub node: NodeId,
    pub indicator: AABB,
    pub rotation_degrees: u32,
}

/// Owns the room, its fixtures and every furniture node
#[derive(Debug)]
pub struct SceneStore {
    tracker: ResourceTracker,
    room: Option<RoomGeometry>,
    fixtures: Vec<RoomFixture>,
    nodes: Vec<FurnitureNode>,
    selection: Option<Selection>,
    next_id: u64,
    padding: f32,
    wall_thickness: f32,
    texture_dir: String,
}

impl SceneStore {
    pub fn new(tracker: ResourceTracker) -> Self {
        Self::with_settings(tracker, &PlannerSettings::default())
    }

    pub fn with_settings(tracker: ResourceTracker, settings: &PlannerSettings) -> Self {
        Self {
            tracker,
            room: None,
            fixtures: Vec::new(),
            nodes: Vec::new(),
            selection: None,
            next_id: 1,
            padding: settings.room_padding,
            wall_thickness: settings.wall_thickness,
            texture_dir: settings.texture_dir.clone(),
        }
    }

    pub fn tracker(&self) -> &ResourceTracker {
        &self.tracker
    }

    /// Replace the room. Every furniture node and fixture is released.
    pub fn rebuild(&mut self, config: &RoomConfig) -> Result<(), ConfigError> {
        let room = RoomGeometry::build(config, self.wall_thickness, &self.texture_dir, &self.tracker)?;
        self.clear();
        log::info!(
            "Room rebuilt: {}x{}x{} ({:?}, floor {:?})",
            config.width,
            config.height,
            config.depth,
            config.shape,
            config.floor_finish
        );
        self.room = Some(room);
        Ok(())
    }

    /// Back to an empty, unconfigured scene
    pub fn clear(&mut self) {
        self.selection = None;
        let released = self.nodes.len();
        self.nodes.clear();
        self.fixtures.clear();
        self.room = None;
        if released > 0 {
            log::debug!("Released {} furniture nodes", released);
        }
    }

    pub fn room(&self) -> Option<&RoomGeometry> {
        self.room.as_ref()
    }

    pub fn config(&self) -> Option<&RoomConfig> {
        self.room.as_ref().map(|room| &room.config)
    }

    fn room_mut(&mut self) -> Result<&mut RoomGeometry, ConfigError> {
        self.room.as_mut().ok_or(ConfigError::NotConfigured)
    }

    /// Material swap only; geometry is kept
    pub fn set_wall_color(&mut self, color: &str) -> Result<(), ConfigError> {
        let rgb = validate_color(color)?;
        let room = self.room_mut()?;
        room.wall_material.color = rgb;
        room.config.wall_color = color.to_string();
        Ok(())
    }

    pub fn set_floor_color(&mut self, color: &str) -> Result<(), ConfigError> {
        let rgb = validate_color(color)?;
        let room = self.room_mut()?;
        room.config.floor_color = color.to_string();
        // A textured floor keeps its white base
        if room.floor_material.texture.is_none() {
            room.floor_material.color = rgb;
        }
        Ok(())
    }

    pub fn set_floor_finish(&mut self, finish: FloorFinish) -> Result<(), ConfigError> {
        let texture_dir = self.texture_dir.clone();
        let room = self.room_mut()?;
        let floor_color = validate_color(&room.config.floor_color)?;
        room.config.floor_finish = finish;
        room.floor_material = floor_material(finish, floor_color, &texture_dir);
        Ok(())
    }

    pub fn footprint(&self) -> Option<RoomFootprint> {
        self.config().map(|config| RoomFootprint::from_config(config, self.padding))
    }

    /// Insert a loaded model as a furniture node
    pub fn add(&mut self, meta: FurnitureMeta, model: LoadedModel, position: Vec3, yaw: f32) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        let gpu = self.tracker.allocate(format!("{} {}", id, meta.name));
        log::debug!("Added {} '{}' at {:?}", id, meta.display_name, position);

        self.nodes.push(FurnitureNode {
            id,
            meta,
            position,
            yaw: normalize_radians(yaw),
            model,
            gpu,
        });
        id
    }

    /// Place a fixture model against its wall
    pub fn add_fixture(&mut self, kind: FixtureKind, model: LoadedModel) -> bool {
        let Some(config) = self.config() else {
            return false;
        };
        let (position, yaw, scale) = kind.placement(config);
        let gpu = self.tracker.allocate(format!("{:?} fixture", kind));
        self.fixtures.push(RoomFixture {
            kind,
            position,
            yaw,
            scale,
            model,
            _gpu: gpu,
        });
        true
    }

    pub fn fixtures(&self) -> &[RoomFixture] {
        &self.fixtures
    }

    /// Remove a node, clearing the selection if it was selected
    pub fn remove(&mut self, id: NodeId) -> bool {
        let Some(index) = self.nodes.iter().position(|node| node.id == id) else {
            return false;
        };
        if self.selected() == Some(id) {
            self.deselect();
        }
        let node = self.nodes.remove(index);
        log::debug!("Removed {} '{}'", id, node.meta.display_name);
        true
    }

    pub fn node(&self, id: NodeId) -> Option<&FurnitureNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut FurnitureNode> {
        self.nodes.iter_mut().find(|node| node.id == id)
    }

    /// Furniture in insertion order
    pub fn nodes(&self) -> &[FurnitureNode] {
        &self.nodes
    }

    /// Pull a node back inside the room; returns whether it moved
    pub fn clamp_node(&mut self, id: NodeId) -> bool {
        let Some(footprint) = self.footprint() else {
            return false;
        };
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        let clamped = clamp_to_room(&node.model.bounds, node.position, node.yaw, &footprint);
        let moved = clamped != node.position;
        node.position = clamped;
        if moved {
            self.refresh_selection();
        }
        moved
    }

    pub fn select(&mut self, id: NodeId) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        self.selection = Some(Selection {
            node: id,
            indicator: node.world_bounds(),
            rotation_degrees: display_degrees(node.yaw),
        });
        true
    }

    pub fn deselect(&mut self) {
        self.selection = None;
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selection.map(|selection| selection.node)
    }

    /// Recompute the indicator box and displayed angle after a transform change
    pub fn refresh_selection(&mut self) {
        if let Some(id) = self.selected() {
            if !self.select(id) {
                self.selection = None;
            }
        }
    }

    /// World ray expressed in room-local space
    pub fn room_ray(&self, world: &Ray) -> Ray {
        world.translated(-ROOM_ORIGIN)
    }

    /// Nearest furniture node under a world-space ray
    pub fn pick(&self, world: &Ray) -> Option<NodeId> {
        let ray = self.room_ray(world);
        self.nodes
            .iter()
            .filter_map(|node| node.intersect(&ray).map(|t| (t, node.id)))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, id)| id)
    }

    /// Room-local point where a world ray meets the floor level
    pub fn floor_point(&self, world: &Ray) -> Option<Vec3> {
        let config = self.config()?;
        Plane::horizontal(config.floor_y()).intersect(&self.room_ray(world))
    }

    /// Meshes a renderer would submit this frame
    pub fn draw_call_count(&self) -> usize {
        let room = if self.room.is_some() { 2 } else { 0 };
        let fixtures: usize = self.fixtures.iter().map(|f| f.model.meshes.len()).sum();
        let furniture: usize = self.nodes.iter().map(|n| n.model.meshes.len()).sum();
        let indicator = usize::from(self.selection.is_some());
        room + fixtures + furniture + indicator
    }
}
