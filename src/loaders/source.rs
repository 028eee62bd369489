use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use futures::future::{FutureExt, LocalBoxFuture};

use crate::error::AssetLoadError;

/// Where asset bytes come from
pub trait AssetSource {
    /// Fetch the raw bytes behind an asset path
    fn fetch(&self, path: &str) -> LocalBoxFuture<'static, Result<Vec<u8>, AssetLoadError>>;

    /// Directory used to resolve external glTF buffers, if any
    fn base_dir(&self, _path: &str) -> Option<PathBuf> {
        None
    }
}

/// Assets on disk under a root directory
#[derive(Debug, Clone)]
pub struct FsAssetSource {
    root: PathBuf,
}

impl FsAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl AssetSource for FsAssetSource {
    fn fetch(&self, path: &str) -> LocalBoxFuture<'static, Result<Vec<u8>, AssetLoadError>> {
        let full = self.resolve(path);
        let path = path.to_string();
        async move {
            log::debug!("Reading asset {:?}", full);
            std::fs::read(&full).map_err(|source| match source.kind() {
                std::io::ErrorKind::NotFound => AssetLoadError::NotFound { path },
                _ => AssetLoadError::Io { path, source },
            })
        }
        .boxed_local()
    }

    fn base_dir(&self, path: &str) -> Option<PathBuf> {
        self.resolve(path).parent().map(Path::to_path_buf)
    }
}

/// In-memory assets, keyed by path
#[derive(Debug, Default)]
pub struct MemoryAssetSource {
    assets: RefCell<HashMap<String, Vec<u8>>>,
    requested: RefCell<Vec<String>>,
}

impl MemoryAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<String>, bytes: Vec<u8>) {
        self.assets.borrow_mut().insert(path.into(), bytes);
    }

    pub fn with(self, path: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(path, bytes);
        self
    }

    /// Every path fetched so far, in request order
    pub fn requested(&self) -> Vec<String> {
        self.requested.borrow().clone()
    }
}

impl AssetSource for MemoryAssetSource {
    fn fetch(&self, path: &str) -> LocalBoxFuture<'static, Result<Vec<u8>, AssetLoadError>> {
        self.requested.borrow_mut().push(path.to_string());
        let result = self
            .assets
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| AssetLoadError::NotFound { path: path.to_string() });
        futures::future::ready(result).boxed_local()
    }
}
