//! Saved-room blob format, persistence backends and the debounced save bridge.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::Countdown;
use crate::error::{PersistBlobParseError, PersistSinkError};
use crate::scene::{FurnitureMeta, FurnitureNode, SceneStore};
use crate::types::{FloorFinish, LoaderKind, RoomConfig, RoomShape};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionSnapshot {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3> for PositionSnapshot {
    fn from(v: Vec3) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

impl From<PositionSnapshot> for Vec3 {
    fn from(p: PositionSnapshot) -> Self {
        Vec3::new(p.x, p.y, p.z)
    }
}

/// One furniture node as stored. Missing fields read as their defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FurnitureSnapshot {
    pub name: String,
    pub display_name: String,
    pub path: String,
    pub loader_type: LoaderKind,
    pub product_id: String,
    pub price: f64,
    pub image_url: String,
    pub categories: BTreeSet<String>,
    pub position: PositionSnapshot,
    pub rotation_y: f32,
}

impl FurnitureSnapshot {
    pub fn capture(node: &FurnitureNode) -> Self {
        let meta = &node.meta;
        Self {
            name: meta.name.clone(),
            display_name: meta.display_name.clone(),
            path: meta.path.clone(),
            loader_type: meta.loader_kind,
            product_id: meta.product_id.clone(),
            price: meta.price,
            image_url: meta.image_url.clone(),
            categories: meta.categories.clone(),
            position: node.position().into(),
            rotation_y: node.yaw(),
        }
    }

    pub fn meta(&self) -> FurnitureMeta {
        FurnitureMeta {
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            path: self.path.clone(),
            loader_kind: self.loader_type,
            product_id: self.product_id.clone(),
            price: self.price,
            image_url: self.image_url.clone(),
            categories: self.categories.clone(),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position.into()
    }

    /// Out-of-range numbers parse as infinities, which cannot be written back
    pub fn has_finite_transform(&self) -> bool {
        self.position().is_finite() && self.rotation_y.is_finite()
    }
}

/// Complete saved room, as written
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRoom {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    pub wall_color: String,
    pub floor_texture: FloorFinish,
    pub floor_color: String,
    pub objects: Vec<FurnitureSnapshot>,
}

impl PersistedRoom {
    /// `None` before the room is configured
    pub fn capture(scene: &SceneStore) -> Option<Self> {
        let config = scene.config()?;
        Some(Self {
            width: config.width,
            height: config.height,
            depth: config.depth,
            wall_color: config.wall_color.clone(),
            floor_texture: config.floor_finish,
            floor_color: config.floor_color.clone(),
            objects: scene.nodes().iter().map(FurnitureSnapshot::capture).collect(),
        })
    }

    pub fn to_json(&self) -> String {
        // Plain data with string keys; serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Saved room as read back. Absent keys leave the current value alone.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRoom {
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub depth: Option<f32>,
    pub wall_color: Option<String>,
    pub floor_texture: Option<FloorFinish>,
    pub floor_color: Option<String>,
    pub objects: Option<Vec<FurnitureSnapshot>>,
}

impl SavedRoom {
    pub fn parse(blob: &str) -> Result<Self, PersistBlobParseError> {
        Ok(serde_json::from_str(blob)?)
    }

    /// `base` with every present field applied
    pub fn merge_into(&self, base: &RoomConfig) -> RoomConfig {
        let mut config = base.clone();
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(depth) = self.depth {
            config.depth = depth;
        }
        if let Some(wall_color) = &self.wall_color {
            config.wall_color = wall_color.clone();
        }
        if let Some(finish) = self.floor_texture {
            config.floor_finish = finish;
        }
        if let Some(floor_color) = &self.floor_color {
            config.floor_color = floor_color.clone();
        }
        // Shape is not stored; unequal sides can only come from a rectangle
        if config.width != config.depth {
            config.shape = RoomShape::Rectangle;
        }
        config
    }

    pub fn objects(&self) -> &[FurnitureSnapshot] {
        self.objects.as_deref().unwrap_or_default()
    }

    /// Objects that can be placed; ones with a non-finite transform are skipped
    pub fn placeable_objects(&self) -> Vec<FurnitureSnapshot> {
        self.objects()
            .iter()
            .filter(|snapshot| {
                let finite = snapshot.has_finite_transform();
                if !finite {
                    log::warn!("Skipping saved item {} with a non-finite transform", snapshot.name);
                }
                finite
            })
            .cloned()
            .collect()
    }
}

/// Backend that stores one opaque blob per user
pub trait PersistenceSink {
    fn save(&self, user: &str, blob: &str) -> Result<(), PersistSinkError>;

    fn load(&self, user: &str) -> Result<Option<String>, PersistSinkError>;

    fn clear(&self, user: &str) -> Result<(), PersistSinkError>;
}

/// In-memory sink that records every save
#[derive(Debug, Default)]
pub struct MemorySink {
    blobs: RefCell<HashMap<String, String>>,
    saves: RefCell<Vec<(String, String)>>,
    clears: Cell<usize>,
    failing: Cell<bool>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(self, user: impl Into<String>, blob: impl Into<String>) -> Self {
        self.blobs.borrow_mut().insert(user.into(), blob.into());
        self
    }

    /// Every save so far, oldest first
    pub fn saves(&self) -> Vec<(String, String)> {
        self.saves.borrow().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.borrow().len()
    }

    pub fn last_blob(&self) -> Option<String> {
        self.saves.borrow().last().map(|(_, blob)| blob.clone())
    }

    pub fn clear_count(&self) -> usize {
        self.clears.get()
    }

    pub fn stored(&self, user: &str) -> Option<String> {
        self.blobs.borrow().get(user).cloned()
    }

    /// Make every subsequent request fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    fn check(&self) -> Result<(), PersistSinkError> {
        if self.failing.get() {
            Err(PersistSinkError::Rejected("memory sink set to fail".into()))
        } else {
            Ok(())
        }
    }
}

impl PersistenceSink for MemorySink {
    fn save(&self, user: &str, blob: &str) -> Result<(), PersistSinkError> {
        self.check()?;
        self.blobs.borrow_mut().insert(user.to_string(), blob.to_string());
        self.saves.borrow_mut().push((user.to_string(), blob.to_string()));
        Ok(())
    }

    fn load(&self, user: &str) -> Result<Option<String>, PersistSinkError> {
        self.check()?;
        Ok(self.stored(user))
    }

    fn clear(&self, user: &str) -> Result<(), PersistSinkError> {
        self.check()?;
        self.blobs.borrow_mut().remove(user);
        self.clears.set(self.clears.get() + 1);
        Ok(())
    }
}

/// One `<user>.json` file per user under a directory
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, user: &str) -> PathBuf {
        let safe: String = user
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }

    fn io_error(user: &str, source: std::io::Error) -> PersistSinkError {
        PersistSinkError::Io {
            user: user.to_string(),
            source,
        }
    }
}

impl PersistenceSink for FileSink {
    fn save(&self, user: &str, blob: &str) -> Result<(), PersistSinkError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| Self::io_error(user, e))?;
        std::fs::write(self.path_for(user), blob).map_err(|e| Self::io_error(user, e))
    }

    fn load(&self, user: &str) -> Result<Option<String>, PersistSinkError> {
        match std::fs::read_to_string(self.path_for(user)) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(user, e)),
        }
    }

    fn clear(&self, user: &str) -> Result<(), PersistSinkError> {
        match std::fs::remove_file(self.path_for(user)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error(user, e)),
        }
    }
}

/// Debounces save requests in front of a [`PersistenceSink`].
///
/// Sink failures are logged and swallowed; the session carries on with
/// whatever is in memory.
pub struct PersistenceBridge {
    sink: Rc<dyn PersistenceSink>,
    debounce: Countdown,
}

impl PersistenceBridge {
    pub fn new(sink: Rc<dyn PersistenceSink>, debounce_seconds: f32) -> Self {
        Self {
            sink,
            debounce: Countdown::new(debounce_seconds),
        }
    }

    /// Restart the quiet window
    pub fn trigger(&mut self) {
        self.debounce.start();
    }

    pub fn cancel(&mut self) {
        self.debounce.cancel();
    }

    pub fn is_pending(&self) -> bool {
        self.debounce.is_active()
    }

    /// True on the tick the quiet window runs out
    pub fn tick(&mut self, delta: f32) -> bool {
        self.debounce.tick(delta)
    }

    pub fn persist(&self, user: &str, blob: &str) -> bool {
        match self.sink.save(user, blob) {
            Ok(()) => {
                log::info!("Saved room for {} ({} bytes)", user, blob.len());
                true
            }
            Err(err) => {
                log::warn!("Saving room for {} failed: {}", user, err);
                false
            }
        }
    }

    pub fn load(&self, user: &str) -> Option<String> {
        match self.sink.load(user) {
            Ok(blob) => blob,
            Err(err) => {
                log::warn!("Loading saved room for {} failed: {}", user, err);
                None
            }
        }
    }

    /// Drop any pending save and ask the sink to forget the user's room
    pub fn forget(&mut self, user: &str) {
        self.debounce.cancel();
        if let Err(err) = self.sink.clear(user) {
            log::warn!("Clearing saved room for {} failed: {}", user, err);
        }
    }
}
