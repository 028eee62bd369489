// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::types::{FloorFinish, RoomConfig, RoomShape, DEFAULT_FLOOR_COLOR, DEFAULT_WALL_COLOR};

#[derive(Parser, Debug, Clone)]
#[command(name = "room-planner")]
#[command(about = "Headless furniture room planner", long_about = None)]
pub struct Cli {
    /// User whose room is loaded and saved
    #[arg(long, default_value = "guest")]
    pub user: String,

    /// Shop the catalog and cart belong to
    #[arg(long, default_value = "default")]
    pub shop: String,

    /// Directory holding saved rooms, one JSON file per user
    #[arg(long = "store-dir", default_value = "rooms")]
    pub store_dir: PathBuf,

    /// Root directory asset paths are resolved against
    #[arg(long, default_value = ".")]
    pub assets: PathBuf,

    /// Optional JSON file overriding planner settings
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// JSON array of catalog items
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Pace frames with the wall clock instead of stepping as fast as possible
    #[arg(long, default_value = "false")]
    pub realtime: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Configure a new room and place catalog items in it
    New(NewRoom),
    /// Restore the saved room and print a summary
    Show,
    /// Restore the saved room and add its furniture to the cart
    Cart,
    /// Forget the saved room
    Clear,
}

#[derive(clap::Args, Debug, Clone)]
pub struct NewRoom {
    #[arg(long, value_enum, default_value_t = ShapeArg::Rectangle)]
    pub shape: ShapeArg,

    #[arg(long, default_value_t = 6.0)]
    pub width: f32,

    #[arg(long, default_value_t = 3.0)]
    pub height: f32,

    /// Ignored for square rooms
    #[arg(long, default_value_t = 5.0)]
    pub depth: f32,

    #[arg(long = "wall-color", default_value = DEFAULT_WALL_COLOR)]
    pub wall_color: String,

    #[arg(long, value_enum, default_value_t = FloorArg::Color)]
    pub floor: FloorArg,

    #[arg(long = "floor-color", default_value = DEFAULT_FLOOR_COLOR)]
    pub floor_color: String,

    /// Product ids to place, in order; each lands in the middle of the room
    #[arg(long = "place")]
    pub place: Vec<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeArg {
    Rectangle,
    Square,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloorArg {
    Color,
    Wood,
    Tile,
    Concrete,
    Carpet,
}

impl From<FloorArg> for FloorFinish {
    fn from(arg: FloorArg) -> Self {
        match arg {
            FloorArg::Color => FloorFinish::PlainColor,
            FloorArg::Wood => FloorFinish::Wood,
            FloorArg::Tile => FloorFinish::Tile,
            FloorArg::Concrete => FloorFinish::Concrete,
            FloorArg::Carpet => FloorFinish::Carpet,
        }
    }
}

impl NewRoom {
    /// Unvalidated room configuration from the flags
    pub fn room_config(&self) -> RoomConfig {
        let base = match self.shape {
            ShapeArg::Rectangle => RoomConfig::rectangle(self.width, self.height, self.depth),
            ShapeArg::Square => RoomConfig::square(self.width, self.height),
        };
        base.with_finish(self.floor.into())
            .with_colors(self.wall_color.clone(), self.floor_color.clone())
    }
}

impl ShapeArg {
    pub fn shape(&self) -> RoomShape {
        match self {
            ShapeArg::Rectangle => RoomShape::Rectangle,
            ShapeArg::Square => RoomShape::Square,
        }
    }
}
