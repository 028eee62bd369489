mod common;

use std::collections::BTreeSet;
use std::rc::Rc;

use futures::executor::block_on;
use glam::Vec3;
use room_planner::error::AssetLoadError;
use room_planner::loaders::{AssetLoader, MemoryAssetSource};
use room_planner::math::AABB;
use room_planner::settings::DEFAULT_POINT_FORMAT_PRODUCT;
use room_planner::LoaderKind;

use common::*;

fn loader(source: MemoryAssetSource) -> AssetLoader {
    AssetLoader::new(
        Rc::new(source),
        BTreeSet::from([DEFAULT_POINT_FORMAT_PRODUCT.to_string()]),
    )
}

#[cfg(test)]
mod asset_loader_tests {
    use super::*;

    #[test]
    fn test_glb_box_decodes_with_material_and_shadows() {
        let half = Vec3::new(1.0, 0.4, 0.5);
        let loader = loader(MemoryAssetSource::new().with("/m/sofa/model.glb", glb_box(half)));

        let model = block_on(loader.load("/m/sofa/model.glb", LoaderKind::MeshFormat)).unwrap();
        assert_eq!(model.kind, LoaderKind::MeshFormat);
        assert_eq!(model.triangle_count(), 12);
        assert_eq!(model.vertex_count(), 8);
        assert_eq!(
            model.bounds,
            AABB::new(Vec3::new(-1.0, 0.0, -0.5), Vec3::new(1.0, 0.8, 0.5))
        );

        let mesh = &model.meshes[0];
        assert_eq!(mesh.material.base_color, [0.8, 0.5, 0.3, 1.0]);
        assert!(mesh.colors.is_none());
        assert_eq!(mesh.normals.len(), mesh.positions.len());
        assert!(mesh.cast_shadow && mesh.receive_shadow);
    }

    #[test]
    fn test_ply_box_keeps_vertex_colors() {
        let loader = loader(MemoryAssetSource::new().with("/m/heater/model.ply", ply_box(Vec3::splat(0.25))));

        let model = block_on(loader.load("/m/heater/model.ply", LoaderKind::PointFormat)).unwrap();
        assert_eq!(model.kind, LoaderKind::PointFormat);
        assert_eq!(model.triangle_count(), 12);

        let mesh = &model.meshes[0];
        assert!(mesh.material.vertex_colors);
        let colors = mesh.colors.as_ref().unwrap();
        assert!((colors[0][0] - 200.0 / 255.0).abs() < 1e-6);
        assert!((colors[0][2] - 40.0 / 255.0).abs() < 1e-6);
        assert!(mesh.cast_shadow);
    }

    #[test]
    fn test_point_format_product_resolves_to_ply() {
        let loader = loader(MemoryAssetSource::new());
        let mut item = catalog_item(DEFAULT_POINT_FORMAT_PRODUCT, "Heater", 120.0);
        let (path, kind) = loader.resolve(&item);
        assert_eq!(kind, LoaderKind::PointFormat);
        assert!(path.ends_with("/model.ply"));

        item.product_id = "sofa-1".into();
        let (path, kind) = loader.resolve(&item);
        assert_eq!(kind, LoaderKind::MeshFormat);
        assert_eq!(path, item.path);
    }

    #[test]
    fn test_missing_and_corrupt_assets_fail() {
        let loader = loader(MemoryAssetSource::new().with("/m/broken/model.glb", b"not a model".to_vec()));

        let missing = block_on(loader.load("/m/none/model.glb", LoaderKind::MeshFormat)).unwrap_err();
        assert!(matches!(missing, AssetLoadError::NotFound { .. }));
        assert_eq!(missing.path(), "/m/none/model.glb");

        let corrupt = block_on(loader.load("/m/broken/model.glb", LoaderKind::MeshFormat)).unwrap_err();
        assert!(matches!(corrupt, AssetLoadError::Gltf { .. }));

        let wrong_format = block_on(loader.load("/m/broken/model.glb", LoaderKind::PointFormat)).unwrap_err();
        assert!(matches!(wrong_format, AssetLoadError::Ply { .. }));
    }
}
