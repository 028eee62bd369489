use std::path::Path;

use glam::{Mat3, Mat4, Vec3};

use super::{compute_vertex_normals, MaterialDesc, MeshData};
use crate::error::AssetLoadError;

/// Decodes a glTF document (binary `.glb` or JSON `.gltf`) into flat meshes
/// with every node transform baked into the vertices
pub fn decode_gltf(path: &str, bytes: &[u8], base: Option<&Path>) -> Result<Vec<MeshData>, AssetLoadError> {
    let gltf_error = |source| AssetLoadError::Gltf {
        path: path.to_string(),
        source,
    };

    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes).map_err(gltf_error)?;
    let buffers = gltf::import_buffers(&document, base, blob).map_err(gltf_error)?;

    log::debug!(
        "glTF {}: {} scenes, {} nodes, {} meshes",
        path,
        document.scenes().count(),
        document.nodes().count(),
        document.meshes().count()
    );

    let mut meshes = Vec::new();

    // Fall back to the first scene when no default is declared
    if let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) {
        for node in scene.nodes() {
            process_node(path, &node, &buffers, &Mat4::IDENTITY, &mut meshes);
        }
    }

    Ok(meshes)
}

/// Recursively processes glTF nodes
fn process_node(
    path: &str,
    node: &gltf::Node,
    buffers: &[gltf::buffer::Data],
    parent_transform: &Mat4,
    meshes: &mut Vec<MeshData>,
) {
    let local_transform = Mat4::from_cols_array_2d(&node.transform().matrix());
    let global_transform = *parent_transform * local_transform;

    if let Some(mesh) = node.mesh() {
        process_mesh(path, &mesh, buffers, &global_transform, meshes);
    }

    for child in node.children() {
        process_node(path, &child, buffers, &global_transform, meshes);
    }
}

fn process_mesh(
    path: &str,
    mesh: &gltf::Mesh,
    buffers: &[gltf::buffer::Data],
    transform: &Mat4,
    meshes: &mut Vec<MeshData>,
) {
    let normal_matrix = Mat3::from_mat4(*transform).inverse().transpose();

    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            log::debug!("{}: skipping {:?} primitive in mesh {:?}", path, primitive.mode(), mesh.name());
            continue;
        }

        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

        let Some(positions) = reader.read_positions() else {
            log::warn!("{}: mesh {:?} primitive has no positions", path, mesh.name());
            continue;
        };

        let positions: Vec<Vec3> = positions
            .map(|pos| transform.transform_point3(Vec3::from_array(pos)))
            .collect();

        if positions.is_empty() {
            continue;
        }

        let indices: Vec<u32> = reader
            .read_indices()
            .map(|indices| indices.into_u32().collect())
            .unwrap_or_default();

        if indices.iter().any(|&i| i as usize >= positions.len()) {
            log::warn!("{}: mesh {:?} has out-of-range indices, skipped", path, mesh.name());
            continue;
        }

        let normals = match reader.read_normals() {
            Some(normals) => normals
                .map(|n| (normal_matrix * Vec3::from_array(n)).normalize_or_zero())
                .collect(),
            None => compute_vertex_normals(&positions, &indices),
        };

        let colors: Option<Vec<[f32; 3]>> = reader.read_colors(0).map(|colors| colors.into_rgb_f32().collect());

        let base_color = primitive.material().pbr_metallic_roughness().base_color_factor();

        meshes.push(MeshData {
            material: MaterialDesc {
                base_color,
                vertex_colors: colors.is_some(),
            },
            positions,
            normals,
            colors,
            indices,
            cast_shadow: false,
            receive_shadow: false,
        });
    }
}
