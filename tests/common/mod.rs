//! Shared fixtures: in-memory GLB and PLY boxes, catalog items and a
//! planner wired to memory-backed collaborators.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use futures::channel::oneshot;
use futures::future::{FutureExt, LocalBoxFuture};
use glam::Vec3;
use serde_json::json;

use room_planner::catalog::MemoryCart;
use room_planner::error::AssetLoadError;
use room_planner::loaders::{AssetSource, MemoryAssetSource};
use room_planner::persistence::MemorySink;
use room_planner::planner::{PlannerCollaborators, PlannerContext, RoomPlanner};
use room_planner::render::HeadlessRenderer;
use room_planner::settings::PlannerSettings;
use room_planner::types::CatalogItem;

pub const STEP: f32 = 0.25;

/// Index bits: x = 1, y = 2, z = 4
const BOX_INDICES: [u32; 36] = [
    0, 2, 1, 1, 2, 3, 4, 5, 6, 5, 7, 6, 0, 4, 2, 2, 4, 6, 1, 3, 5, 3, 7, 5, 0, 1, 4, 1, 5, 4, 2, 6, 3, 3, 6, 7,
];

fn box_corners(half: Vec3) -> [Vec3; 8] {
    std::array::from_fn(|i| {
        Vec3::new(
            if i & 1 != 0 { half.x } else { -half.x },
            if i & 2 != 0 { 2.0 * half.y } else { 0.0 },
            if i & 4 != 0 { half.z } else { -half.z },
        )
    })
}

/// Binary glTF box of the given half extents, standing on y = 0
pub fn glb_box(half: Vec3) -> Vec<u8> {
    let corners = box_corners(half);
    let mut bin = Vec::new();
    for corner in &corners {
        for value in corner.to_array() {
            bin.extend_from_slice(&value.to_le_bytes());
        }
    }
    let positions_len = bin.len();
    for index in BOX_INDICES {
        bin.extend_from_slice(&index.to_le_bytes());
    }
    let indices_len = bin.len() - positions_len;

    let document = json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0 }],
        "meshes": [{
            "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 }]
        }],
        "materials": [{ "pbrMetallicRoughness": { "baseColorFactor": [0.8, 0.5, 0.3, 1.0] } }],
        "buffers": [{ "byteLength": bin.len() }],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": positions_len, "target": 34962 },
            { "buffer": 0, "byteOffset": positions_len, "byteLength": indices_len, "target": 34963 }
        ],
        "accessors": [
            {
                "bufferView": 0,
                "componentType": 5126,
                "count": 8,
                "type": "VEC3",
                "min": [-half.x, 0.0, -half.z],
                "max": [half.x, 2.0 * half.y, half.z]
            },
            { "bufferView": 1, "componentType": 5125, "count": 36, "type": "SCALAR" }
        ]
    });

    let mut json_chunk = serde_json::to_vec(&document).expect("serialize glTF json");
    while json_chunk.len() % 4 != 0 {
        json_chunk.push(b' ');
    }
    while bin.len() % 4 != 0 {
        bin.push(0);
    }

    let total = 12 + 8 + json_chunk.len() + 8 + bin.len();
    let mut glb = Vec::with_capacity(total);
    glb.extend_from_slice(b"glTF");
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&(total as u32).to_le_bytes());
    glb.extend_from_slice(&(json_chunk.len() as u32).to_le_bytes());
    glb.extend_from_slice(b"JSON");
    glb.extend_from_slice(&json_chunk);
    glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    glb.extend_from_slice(b"BIN\0");
    glb.extend_from_slice(&bin);
    glb
}

/// ASCII PLY box with per-vertex colors, standing on y = 0
pub fn ply_box(half: Vec3) -> Vec<u8> {
    let mut text = String::from(
        "ply\nformat ascii 1.0\ncomment test box\nelement vertex 8\nproperty float x\nproperty float y\nproperty float z\nproperty uchar red\nproperty uchar green\nproperty uchar blue\nelement face 12\nproperty list uchar int vertex_indices\nend_header\n",
    );
    for corner in box_corners(half) {
        text.push_str(&format!("{} {} {} 200 120 40\n", corner.x, corner.y, corner.z));
    }
    for face in BOX_INDICES.chunks(3) {
        text.push_str(&format!("3 {} {} {}\n", face[0], face[1], face[2]));
    }
    text.into_bytes()
}

pub fn catalog_item(product_id: &str, display_name: &str, price: f64) -> CatalogItem {
    CatalogItem {
        name: product_id.to_string(),
        display_name: display_name.to_string(),
        path: format!("/models/{}/model.glb", product_id),
        image_url: format!("/images/{}.png", product_id),
        product_id: product_id.to_string(),
        price,
        categories: BTreeSet::from(["living".to_string()]),
    }
}

/// Asset source whose fetches stay pending until released
#[derive(Default)]
pub struct GatedAssetSource {
    assets: HashMap<String, Vec<u8>>,
    gates: RefCell<Vec<(String, oneshot::Sender<Vec<u8>>)>>,
}

impl GatedAssetSource {
    pub fn with(mut self, path: &str, bytes: Vec<u8>) -> Self {
        self.assets.insert(path.to_string(), bytes);
        self
    }

    pub fn pending(&self) -> usize {
        self.gates.borrow().len()
    }

    /// Let every held fetch complete
    pub fn release_all(&self) {
        for (path, gate) in self.gates.borrow_mut().drain(..) {
            let bytes = self.assets.get(&path).cloned().unwrap_or_default();
            let _ = gate.send(bytes);
        }
    }
}

impl AssetSource for GatedAssetSource {
    fn fetch(&self, path: &str) -> LocalBoxFuture<'static, Result<Vec<u8>, AssetLoadError>> {
        let (tx, rx) = oneshot::channel();
        self.gates.borrow_mut().push((path.to_string(), tx));
        let path = path.to_string();
        async move { rx.await.map_err(|_| AssetLoadError::Cancelled { path }) }.boxed_local()
    }
}

pub struct TestPlanner {
    pub planner: RoomPlanner,
    pub sink: Rc<MemorySink>,
    pub cart: Rc<MemoryCart>,
}

pub fn settings() -> PlannerSettings {
    PlannerSettings::default().without_fixtures()
}

pub fn planner_with(assets: Rc<dyn AssetSource>, sink: MemorySink, settings: PlannerSettings) -> TestPlanner {
    let sink = Rc::new(sink);
    let cart = Rc::new(MemoryCart::new());
    let planner = RoomPlanner::new(
        PlannerContext::new("user-1", "shop-1"),
        settings,
        PlannerCollaborators {
            assets,
            sink: sink.clone(),
            cart: cart.clone(),
            renderer: Box::new(HeadlessRenderer::default()),
        },
    );
    TestPlanner { planner, sink, cart }
}

/// Memory assets holding a GLB box for each product id
pub fn glb_assets(products: &[(&str, Vec3)]) -> Rc<MemoryAssetSource> {
    let source = MemoryAssetSource::new();
    for (product_id, half) in products {
        source.insert(format!("/models/{}/model.glb", product_id), glb_box(*half));
    }
    Rc::new(source)
}

pub fn run(planner: &mut RoomPlanner, seconds: f32) {
    for _ in 0..(seconds / STEP).round() as usize {
        planner.tick(STEP);
    }
}
