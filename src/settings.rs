use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Product whose model ships as a PLY point cloud
pub const DEFAULT_POINT_FORMAT_PRODUCT: &str = "69a308c3ea78ee8f8426f76a";

/// Tunables for a planner session. Every field has a default, so a
/// settings file only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerSettings {
    /// Quiet time after the last mutation before the room is saved
    pub debounce_seconds: f32,
    /// Gap kept between furniture bounds and the walls
    pub room_padding: f32,
    /// Rotation applied per scroll notch
    pub rotation_step_degrees: f32,
    /// Wall thickness, subtracted from the floor plane size
    pub wall_thickness: f32,
    /// Product ids whose assets decode through the point-format path
    pub point_format_product_ids: BTreeSet<String>,
    pub door_model: Option<String>,
    pub window_model: Option<String>,
    pub texture_dir: String,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            debounce_seconds: 1.5,
            room_padding: 0.1,
            rotation_step_degrees: 15.0,
            wall_thickness: 0.2,
            point_format_product_ids: BTreeSet::from([DEFAULT_POINT_FORMAT_PRODUCT.to_string()]),
            door_model: Some("assets/models/door.glb".to_string()),
            window_model: Some("assets/models/window.glb".to_string()),
            texture_dir: "assets/textures".to_string(),
        }
    }
}

impl PlannerSettings {
    /// Settings without the door and window fixtures
    pub fn without_fixtures(mut self) -> Self {
        self.door_model = None;
        self.window_model = None;
        self
    }

    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {:?}", path))?;
        Self::from_json_str(&text).with_context(|| format!("Invalid settings file: {:?}", path))
    }
}
