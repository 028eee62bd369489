use thiserror::Error;

/// A 3D asset could not be fetched or decoded. The node is skipped.
#[derive(Debug, Error)]
pub enum AssetLoadError {
    #[error("asset not found: {path}")]
    NotFound { path: String },

    #[error("failed to read asset {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode glTF asset {path}")]
    Gltf {
        path: String,
        #[source]
        source: gltf::Error,
    },

    #[error("malformed PLY asset {path}: {reason}")]
    Ply { path: String, reason: String },

    #[error("asset {path} contains no triangle or point geometry")]
    Empty { path: String },

    #[error("asset request for {path} was dropped before completing")]
    Cancelled { path: String },
}

impl AssetLoadError {
    pub fn path(&self) -> &str {
        match self {
            AssetLoadError::NotFound { path }
            | AssetLoadError::Io { path, .. }
            | AssetLoadError::Gltf { path, .. }
            | AssetLoadError::Ply { path, .. }
            | AssetLoadError::Empty { path }
            | AssetLoadError::Cancelled { path } => path,
        }
    }
}

/// Saved room blob is corrupt or has an incompatible shape
#[derive(Debug, Error)]
#[error("saved room blob could not be parsed")]
pub struct PersistBlobParseError(#[from] pub serde_json::Error);

/// The persistence backend refused or failed a request
#[derive(Debug, Error)]
pub enum PersistSinkError {
    #[error("persistence i/o failed for user {user}")]
    Io {
        user: String,
        #[source]
        source: std::io::Error,
    },

    #[error("persistence backend rejected the request: {0}")]
    Rejected(String),
}

/// Invalid room configuration input
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("room {axis} must be a positive finite number, got {value}")]
    InvalidDimension { axis: &'static str, value: f32 },

    #[error("invalid color {0:?}, expected #rrggbb")]
    InvalidColor(String),

    #[error("room has not been configured yet")]
    NotConfigured,
}
