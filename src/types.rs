use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::math::parse_hex_color;

pub const DEFAULT_WALL_COLOR: &str = "#c0e0ff";
pub const DEFAULT_FLOOR_COLOR: &str = "#f2f2f2";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomShape {
    #[default]
    Rectangle,
    Square,
}

/// Floor surface. Everything except `PlainColor` maps to a tiled texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FloorFinish {
    #[default]
    #[serde(rename = "color")]
    PlainColor,
    Wood,
    Tile,
    Concrete,
    Carpet,
}

impl FloorFinish {
    /// Texture basename, `None` for a plain color floor
    pub fn texture_name(&self) -> Option<&'static str> {
        match self {
            FloorFinish::PlainColor => None,
            FloorFinish::Wood => Some("wood"),
            FloorFinish::Tile => Some("tile"),
            FloorFinish::Concrete => Some("concrete"),
            FloorFinish::Carpet => Some("carpet"),
        }
    }
}

/// Room dimensions in meters plus wall and floor finish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomConfig {
    #[serde(default)]
    pub shape: RoomShape,
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    pub wall_color: String,
    #[serde(rename = "floorTexture", default)]
    pub floor_finish: FloorFinish,
    pub floor_color: String,
}

impl RoomConfig {
    pub fn rectangle(width: f32, height: f32, depth: f32) -> Self {
        Self {
            shape: RoomShape::Rectangle,
            width,
            height,
            depth,
            ..Self::default()
        }
    }

    pub fn square(side: f32, height: f32) -> Self {
        Self {
            shape: RoomShape::Square,
            width: side,
            height,
            depth: side,
            ..Self::default()
        }
    }

    pub fn with_finish(mut self, finish: FloorFinish) -> Self {
        self.floor_finish = finish;
        self
    }

    pub fn with_colors(mut self, wall: impl Into<String>, floor: impl Into<String>) -> Self {
        self.wall_color = wall.into();
        self.floor_color = floor.into();
        self
    }

    /// Checks dimensions and colors and enforces `depth == width` for squares
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        if self.shape == RoomShape::Square {
            self.depth = self.width;
        }

        for (axis, value) in [("width", self.width), ("height", self.height), ("depth", self.depth)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidDimension { axis, value });
            }
        }

        validate_color(&self.wall_color)?;
        validate_color(&self.floor_color)?;
        Ok(self)
    }

    pub fn half_width(&self) -> f32 {
        self.width / 2.0
    }

    pub fn half_depth(&self) -> f32 {
        self.depth / 2.0
    }

    /// Room-local height of the floor; the room box is centred on its origin
    pub fn floor_y(&self) -> f32 {
        -self.height / 2.0
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            shape: RoomShape::Rectangle,
            width: 6.0,
            height: 3.0,
            depth: 5.0,
            wall_color: DEFAULT_WALL_COLOR.to_string(),
            floor_finish: FloorFinish::PlainColor,
            floor_color: DEFAULT_FLOOR_COLOR.to_string(),
        }
    }
}

pub fn validate_color(value: &str) -> Result<[f32; 3], ConfigError> {
    parse_hex_color(value).ok_or_else(|| ConfigError::InvalidColor(value.to_string()))
}

/// Which decode path an asset takes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoaderKind {
    /// Hierarchical scene/mesh format (glTF)
    #[default]
    #[serde(alias = "gltf")]
    MeshFormat,
    /// Raw point/triangle cloud (PLY)
    #[serde(alias = "ply")]
    PointFormat,
}

impl fmt::Display for LoaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderKind::MeshFormat => f.write_str("meshFormat"),
            LoaderKind::PointFormat => f.write_str("pointFormat"),
        }
    }
}

/// A purchasable model as listed by the catalog; also the drag-and-drop payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub name: String,
    pub display_name: String,
    pub path: String,
    #[serde(default)]
    pub image_url: String,
    pub product_id: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub categories: BTreeSet<String>,
}

/// Identity of a furniture node inside one scene store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_forces_depth_to_width() {
        let mut config = RoomConfig::square(4.0, 2.5);
        config.depth = 9.0;
        let config = config.validated().unwrap();
        assert_eq!(config.depth, config.width);
    }

    #[test]
    fn rectangle_keeps_depth() {
        let config = RoomConfig::rectangle(6.0, 3.0, 5.0).validated().unwrap();
        assert_eq!(config.depth, 5.0);
    }

    #[test]
    fn rejects_non_positive_dimension() {
        let err = RoomConfig::rectangle(0.0, 3.0, 5.0).validated().unwrap_err();
        assert_eq!(err, ConfigError::InvalidDimension { axis: "width", value: 0.0 });

        let err = RoomConfig::rectangle(6.0, f32::NAN, 5.0).validated().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDimension { axis: "height", .. }));
    }

    #[test]
    fn rejects_bad_color() {
        let err = RoomConfig::default().with_colors("blue", "#ffffff").validated().unwrap_err();
        assert_eq!(err, ConfigError::InvalidColor("blue".into()));
    }

    #[test]
    fn floor_finish_wire_names() {
        assert_eq!(serde_json::to_string(&FloorFinish::PlainColor).unwrap(), "\"color\"");
        assert_eq!(serde_json::to_string(&FloorFinish::Carpet).unwrap(), "\"carpet\"");
        let wood: FloorFinish = serde_json::from_str("\"wood\"").unwrap();
        assert_eq!(wood, FloorFinish::Wood);
    }

    #[test]
    fn loader_kind_accepts_legacy_names() {
        let kind: LoaderKind = serde_json::from_str("\"ply\"").unwrap();
        assert_eq!(kind, LoaderKind::PointFormat);
        let kind: LoaderKind = serde_json::from_str("\"gltf\"").unwrap();
        assert_eq!(kind, LoaderKind::MeshFormat);
        assert_eq!(serde_json::to_string(&LoaderKind::PointFormat).unwrap(), "\"pointFormat\"");
    }

    #[test]
    fn catalog_item_from_drag_payload() {
        let json = r#"{"name":"p1","displayName":"Sofa","path":"m/p1/model.glb",
            "imageUrl":"i/p1.jpg","productId":"p1","price":899.99,"categories":["living","seating"]}"#;
        let item: CatalogItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.display_name, "Sofa");
        assert_eq!(item.price, 899.99);
        assert!(item.categories.contains("seating"));
    }

    #[test]
    fn room_config_modal_payload() {
        let json = r##"{"shape":"square","width":4,"height":2.5,"depth":7,
            "wallColor":"#E8D5B5","floorTexture":"wood","floorColor":"#D2B48C"}"##;
        let config: RoomConfig = serde_json::from_str(json).unwrap();
        let config = config.validated().unwrap();
        assert_eq!(config.shape, RoomShape::Square);
        assert_eq!(config.depth, 4.0);
        assert_eq!(config.floor_finish, FloorFinish::Wood);
    }
}
