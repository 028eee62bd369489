pub mod gltf;
pub mod ply;
pub mod queue;
pub mod source;

use std::collections::BTreeSet;
use std::path::Path;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};
use glam::Vec3;

use crate::error::AssetLoadError;
use crate::math::AABB;
use crate::types::{CatalogItem, LoaderKind};

pub use self::gltf::decode_gltf;
pub use self::ply::decode_ply;
pub use self::queue::{LoadQueue, LoadResult};
pub use self::source::{AssetSource, FsAssetSource, MemoryAssetSource};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialDesc {
    pub base_color: [f32; 4],
    pub vertex_colors: bool,
}

/// One renderable triangle mesh in model space
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub colors: Option<Vec<[f32; 3]>>,
    /// Empty means consecutive vertex triplets
    pub indices: Vec<u32>,
    pub material: MaterialDesc,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl MeshData {
    pub fn triangles(&self) -> Box<dyn Iterator<Item = [Vec3; 3]> + '_> {
        if self.indices.is_empty() {
            Box::new(self.positions.chunks_exact(3).map(|c| [c[0], c[1], c[2]]))
        } else {
            Box::new(self.indices.chunks_exact(3).map(move |c| {
                [
                    self.positions[c[0] as usize],
                    self.positions[c[1] as usize],
                    self.positions[c[2] as usize],
                ]
            }))
        }
    }
}

/// Area-weighted vertex normals; degenerate vertices point up
pub fn compute_vertex_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];

    let mut accumulate = |a: usize, b: usize, c: usize| {
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    };

    if indices.is_empty() {
        for base in (0..positions.len() / 3).map(|t| t * 3) {
            accumulate(base, base + 1, base + 2);
        }
    } else {
        for tri in indices.chunks_exact(3) {
            accumulate(tri[0] as usize, tri[1] as usize, tri[2] as usize);
        }
    }

    normals
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y))
        .collect()
}

/// Decoded asset ready to be wrapped in a scene node
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedModel {
    pub meshes: Vec<MeshData>,
    /// Model-space bounds over every mesh
    pub bounds: AABB,
    pub kind: LoaderKind,
}

impl LoadedModel {
    pub fn new(kind: LoaderKind, meshes: Vec<MeshData>) -> Option<Self> {
        let bounds = AABB::from_points(meshes.iter().flat_map(|m| m.positions.iter().copied()))?;
        Some(Self { meshes, bounds, kind })
    }

    pub fn enable_shadows(&mut self) {
        for mesh in &mut self.meshes {
            mesh.cast_shadow = true;
            mesh.receive_shadow = true;
        }
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.meshes.iter().flat_map(MeshData::triangles)
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.positions.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles().count()
    }
}

/// Decodes asset bytes through the path selected by `kind`
pub fn decode(kind: LoaderKind, path: &str, bytes: &[u8], base: Option<&Path>) -> Result<LoadedModel, AssetLoadError> {
    let meshes = match kind {
        LoaderKind::MeshFormat => decode_gltf(path, bytes, base)?,
        LoaderKind::PointFormat => vec![decode_ply(path, bytes)?],
    };

    let mut model = LoadedModel::new(kind, meshes).ok_or_else(|| AssetLoadError::Empty { path: path.to_string() })?;
    model.enable_shadows();
    Ok(model)
}

/// Picks decode paths and produces load futures over an [`AssetSource`]
#[derive(Clone)]
pub struct AssetLoader {
    source: Rc<dyn AssetSource>,
    point_format_ids: BTreeSet<String>,
}

impl AssetLoader {
    pub fn new(source: Rc<dyn AssetSource>, point_format_ids: BTreeSet<String>) -> Self {
        Self {
            source,
            point_format_ids,
        }
    }

    pub fn kind_for(&self, product_id: &str) -> LoaderKind {
        if self.point_format_ids.contains(product_id) {
            LoaderKind::PointFormat
        } else {
            LoaderKind::MeshFormat
        }
    }

    /// Asset path and loader kind for a freshly placed catalog item.
    /// Point-format products ship `model.ply` next to the listed `model.glb`.
    pub fn resolve(&self, item: &CatalogItem) -> (String, LoaderKind) {
        match self.kind_for(&item.product_id) {
            LoaderKind::PointFormat => (item.path.replacen("model.glb", "model.ply", 1), LoaderKind::PointFormat),
            LoaderKind::MeshFormat => (item.path.clone(), LoaderKind::MeshFormat),
        }
    }

    pub fn load(&self, path: &str, kind: LoaderKind) -> LocalBoxFuture<'static, LoadResult> {
        let fetch = self.source.fetch(path);
        let base = self.source.base_dir(path);
        let path = path.to_string();

        async move {
            let bytes = fetch.await?;
            let model = decode(kind, &path, &bytes, base.as_deref())?;
            log::debug!(
                "Loaded {} ({}): {} meshes, {} vertices",
                path,
                kind,
                model.meshes.len(),
                model.vertex_count()
            );
            Ok(model)
        }
        .boxed_local()
    }
}
