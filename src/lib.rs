pub mod camera;
pub mod catalog;
pub mod cli;
pub mod constraint;
pub mod core;
pub mod error;
pub mod interaction;
pub mod loaders;
pub mod math;
pub mod persistence;
pub mod planner;
pub mod render;
pub mod scene;
pub mod settings;
pub mod types;

pub use error::{AssetLoadError, ConfigError, PersistBlobParseError, PersistSinkError};
pub use planner::{PlannerCollaborators, PlannerContext, PlannerEvent, PlannerPhase, RoomPlanner};
pub use types::{CatalogItem, FloorFinish, LoaderKind, NodeId, RoomConfig, RoomShape};
