// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! glTF 2.0 import, for both `.gltf` (JSON + external or embedded buffers)
//! and binary `.glb` files.

use super::{GeometryImporter, ImportedGeometryData};
use crate::material_lane::{decode_image, DecodedImage};
use base64::Engine;
use glam::{Mat3, Mat4, Vec2, Vec3};
use gltf::{mesh::Mode, Gltf, Node};
use prism_core::ImportError;
use prism_data::gpu::{GpuPbrMaterial, VertexPbr, NO_TEXTURE};
use std::path::{Path, PathBuf};

/// Imports glTF assets with the `gltf` crate.
///
/// All mesh primitives reachable from the default scene are flattened into
/// one vertex/index list with node transforms applied. Only triangle-list
/// primitives are kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct GltfImporter;

/// Import state for one document.
struct DocumentImport<'a> {
    path: &'a Path,
    buffers: Vec<Vec<u8>>,
    data: ImportedGeometryData,
    default_material: Option<u32>,
}

impl GeometryImporter for GltfImporter {
    fn import(&self, path: &Path) -> Result<ImportedGeometryData, ImportError> {
        let bytes = std::fs::read(path).map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let gltf = Gltf::from_slice(&bytes).map_err(|e| gltf_error(path, e))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

        let mut import = DocumentImport {
            path,
            buffers: load_buffers(&gltf, base_dir, path)?,
            data: ImportedGeometryData::default(),
            default_material: None,
        };
        import.data.materials = gltf.materials().map(|m| convert_material(&m)).collect();

        match gltf.default_scene().or_else(|| gltf.scenes().next()) {
            Some(scene) => {
                for node in scene.nodes() {
                    import.visit_node(&node, Mat4::IDENTITY)?;
                }
            }
            None => {
                for mesh in gltf.meshes() {
                    import.append_mesh(&mesh, Mat4::IDENTITY)?;
                }
            }
        }

        for image in gltf.images() {
            let decoded = import.load_image(&image, base_dir)?;
            import.data.images.push(decoded);
        }

        log::info!(
            "GltfImporter: '{}' -> {} vertices, {} indices, {} materials, {} images",
            path.display(),
            import.data.geometry.vertices.len(),
            import.data.geometry.indices.len(),
            import.data.materials.len(),
            import.data.images.len()
        );
        Ok(import.data)
    }
}

fn gltf_error(path: &Path, message: impl ToString) -> ImportError {
    ImportError::Gltf {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

fn read_relative(base_dir: &Path, uri: &str) -> Result<Vec<u8>, ImportError> {
    let file: PathBuf = base_dir.join(uri);
    std::fs::read(&file).map_err(|source| ImportError::Io { path: file, source })
}

/// Decodes a base64 `data:` URI, whatever its media type.
fn decode_data_uri(uri: &str) -> Option<Result<Vec<u8>, base64::DecodeError>> {
    let rest = uri.strip_prefix("data:")?;
    let (_, payload) = rest.split_once(";base64,")?;
    Some(base64::engine::general_purpose::STANDARD.decode(payload))
}

fn load_uri(uri: &str, base_dir: &Path, path: &Path) -> Result<Vec<u8>, ImportError> {
    if uri.starts_with("data:") {
        match decode_data_uri(uri) {
            Some(Ok(bytes)) => Ok(bytes),
            Some(Err(e)) => Err(gltf_error(path, format!("bad base64 data URI: {e}"))),
            None => Err(gltf_error(path, "unsupported data URI encoding")),
        }
    } else {
        read_relative(base_dir, uri)
    }
}

fn load_buffers(gltf: &Gltf, base_dir: &Path, path: &Path) -> Result<Vec<Vec<u8>>, ImportError> {
    let mut buffers = Vec::new();
    for buffer in gltf.buffers() {
        let data = match buffer.source() {
            gltf::buffer::Source::Bin => gltf
                .blob
                .clone()
                .ok_or_else(|| gltf_error(path, "GLB binary chunk is missing"))?,
            gltf::buffer::Source::Uri(uri) => load_uri(uri, base_dir, path)?,
        };
        if data.len() < buffer.length() {
            return Err(gltf_error(
                path,
                format!(
                    "buffer {} holds {} bytes, {} declared",
                    buffer.index(),
                    data.len(),
                    buffer.length()
                ),
            ));
        }
        buffers.push(data);
    }
    Ok(buffers)
}

fn convert_material(material: &gltf::Material<'_>) -> GpuPbrMaterial {
    let pbr = material.pbr_metallic_roughness();
    let texture_of = |info: Option<gltf::texture::Info<'_>>| {
        info.map_or(NO_TEXTURE, |i| i.texture().source().index() as u32)
    };
    GpuPbrMaterial {
        base_color_factor: pbr.base_color_factor(),
        base_color: texture_of(pbr.base_color_texture()),
        metallic_roughness: texture_of(pbr.metallic_roughness_texture()),
        normal: material
            .normal_texture()
            .map_or(NO_TEXTURE, |n| n.texture().source().index() as u32),
        metallic_factor: pbr.metallic_factor(),
        roughness_factor: pbr.roughness_factor(),
        ..Default::default()
    }
}

/// Area-weighted vertex normals for primitives that ship without any.
fn smooth_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| i as usize);
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    normals
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y))
        .collect()
}

impl DocumentImport<'_> {
    fn visit_node(&mut self, node: &Node<'_>, parent: Mat4) -> Result<(), ImportError> {
        let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
        if let Some(mesh) = node.mesh() {
            self.append_mesh(&mesh, world)?;
        }
        for child in node.children() {
            self.visit_node(&child, world)?;
        }
        Ok(())
    }

    fn append_mesh(&mut self, mesh: &gltf::Mesh<'_>, world: Mat4) -> Result<(), ImportError> {
        for primitive in mesh.primitives() {
            if primitive.mode() != Mode::Triangles {
                log::warn!(
                    "GltfImporter: skipping {:?} primitive in mesh {} of '{}'",
                    primitive.mode(),
                    mesh.index(),
                    self.path.display()
                );
                continue;
            }
            self.append_primitive(&primitive, world)?;
        }
        Ok(())
    }

    fn material_for(&mut self, primitive: &gltf::Primitive<'_>) -> u32 {
        if let Some(index) = primitive.material().index() {
            return index as u32;
        }
        *self.default_material.get_or_insert_with(|| {
            self.data.materials.push(GpuPbrMaterial::default());
            (self.data.materials.len() - 1) as u32
        })
    }

    fn append_primitive(&mut self, primitive: &gltf::Primitive<'_>, world: Mat4) -> Result<(), ImportError> {
        let buffers = &self.buffers;
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

        let positions: Vec<Vec3> = reader
            .read_positions()
            .ok_or_else(|| gltf_error(self.path, "primitive has no POSITION attribute"))?
            .map(Vec3::from_array)
            .collect();
        let count = positions.len() as u32;

        let mut indices: Vec<u32> = match reader.read_indices() {
            Some(iter) => iter.into_u32().collect(),
            None => (0..count).collect(),
        };
        if indices.len() % 3 != 0 {
            return Err(gltf_error(self.path, "triangle list index count is not a multiple of 3"));
        }
        if let Some(bad) = indices.iter().find(|&&i| i >= count) {
            return Err(gltf_error(
                self.path,
                format!("index {bad} out of range for {count} vertices"),
            ));
        }

        let normals: Vec<Vec3> = match reader.read_normals() {
            Some(iter) => iter.map(Vec3::from_array).collect(),
            None => smooth_normals(&positions, &indices),
        };
        let uvs: Vec<Vec2> = match reader.read_tex_coords(0) {
            Some(iter) => iter.into_f32().map(Vec2::from_array).collect(),
            None => vec![Vec2::ZERO; positions.len()],
        };
        drop(reader);

        let material_id = self.material_for(primitive);
        let normal_matrix = Mat3::from_mat4(world).inverse().transpose();
        // Mirroring transforms flip the winding.
        if world.determinant() < 0.0 {
            for tri in indices.chunks_exact_mut(3) {
                tri.swap(1, 2);
            }
        }

        let geometry = &mut self.data.geometry;
        let base = geometry.vertices.len() as u32;
        geometry
            .vertices
            .extend(positions.iter().enumerate().map(|(i, p)| VertexPbr {
                position: world.transform_point3(*p).to_array(),
                normal: (normal_matrix * normals.get(i).copied().unwrap_or(Vec3::Y))
                    .try_normalize()
                    .unwrap_or(Vec3::Y)
                    .to_array(),
                uv: uvs.get(i).copied().unwrap_or(Vec2::ZERO).to_array(),
                material_id,
            }));
        geometry.indices.extend(indices.into_iter().map(|i| i + base));
        Ok(())
    }

    fn load_image(&self, image: &gltf::Image<'_>, base_dir: &Path) -> Result<DecodedImage, ImportError> {
        match image.source() {
            gltf::image::Source::View { view, .. } => {
                let bytes = self
                    .buffers
                    .get(view.buffer().index())
                    .and_then(|b| b.get(view.offset()..view.offset() + view.length()))
                    .ok_or_else(|| gltf_error(self.path, "image buffer view out of range"))?;
                decode_image(bytes, self.path)
            }
            gltf::image::Source::Uri { uri, .. } => {
                let bytes = load_uri(uri, base_dir, self.path)?;
                if uri.starts_with("data:") {
                    decode_image(&bytes, self.path)
                } else {
                    decode_image(&bytes, &base_dir.join(uri))
                }
            }
        }
    }
}
