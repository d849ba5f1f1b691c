//! Mesh importers for the built-in host (glTF binary/text and Wavefront OBJ)

use crate::error::{RenderError, Result};
use glam::{DQuat, DVec3};
use std::f64::consts::FRAC_PI_2;
use std::path::Path;

const DEFAULT_COLOR: [f32; 3] = [0.8, 0.8, 0.8];

/// Triangle soup of one object. Colours are per triangle, normals per vertex.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub positions: Vec<DVec3>,
    /// Empty when the source has no vertex normals.
    pub normals: Vec<DVec3>,
    pub triangles: Vec<[usize; 3]>,
    pub triangle_colors: Vec<[f32; 3]>,
}

impl MeshData {
    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty() && self.normals.len() == self.positions.len()
    }

    /// Appends one primitive, re-basing its indices. Normals are dropped for the
    /// whole mesh as soon as one primitive lacks them.
    fn append(
        &mut self,
        positions: Vec<DVec3>,
        normals: Option<Vec<DVec3>>,
        indices: Vec<usize>,
        color: [f32; 3],
    ) {
        let base = self.positions.len();
        let keep_normals = match &normals {
            Some(n) => n.len() == positions.len() && (base == 0 || self.has_normals()),
            None => false,
        };

        if keep_normals {
            self.normals.extend(normals.unwrap_or_default());
        } else {
            self.normals.clear();
        }

        let vertex_count = positions.len();
        self.positions.extend(positions);

        for tri in indices.chunks_exact(3) {
            if tri.iter().any(|&i| i >= vertex_count) {
                continue;
            }
            self.triangles
                .push([base + tri[0], base + tri[1], base + tri[2]]);
            self.triangle_colors.push(color);
        }
    }
}

/// One imported node with its local transform and children.
#[derive(Debug, Clone)]
pub struct ImportedNode {
    pub name: String,
    pub translation: DVec3,
    pub rotation: DQuat,
    pub scale: DVec3,
    pub mesh: Option<MeshData>,
    pub children: Vec<ImportedNode>,
}

impl ImportedNode {
    fn with_mesh(name: String, mesh: MeshData) -> Self {
        Self {
            name,
            translation: DVec3::ZERO,
            rotation: DQuat::IDENTITY,
            scale: DVec3::ONE,
            mesh: Some(mesh),
            children: Vec::new(),
        }
    }

    /// Re-expresses a Y-up root in the host's Z-up world.
    fn into_z_up(mut self) -> Self {
        let axis_conversion = DQuat::from_rotation_x(FRAC_PI_2);
        self.translation = axis_conversion * self.translation;
        self.rotation = axis_conversion * self.rotation;
        self
    }
}

/// Imports a mesh file based on its extension.
pub fn import_file(path: &Path) -> Result<Vec<ImportedNode>> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let roots = match extension.as_str() {
        "glb" | "gltf" => load_gltf(path)?,
        "obj" => load_obj(path)?,
        _ => return Err(RenderError::UnsupportedFormat(path.to_path_buf())),
    };

    Ok(roots.into_iter().map(ImportedNode::into_z_up).collect())
}

fn load_gltf(path: &Path) -> Result<Vec<ImportedNode>> {
    let gltf_error = |source| RenderError::Gltf {
        path: path.to_path_buf(),
        source,
    };
    // Only buffers are resolved; textures are never sampled.
    let gltf::Gltf { document, blob } = gltf::Gltf::open(path).map_err(gltf_error)?;
    let buffers = gltf::import_buffers(&document, path.parent(), blob).map_err(gltf_error)?;

    let Some(scene) = document
        .default_scene()
        .or_else(|| document.scenes().next())
    else {
        log::warn!("glTF file {} has no scenes", path.display());
        return Ok(Vec::new());
    };

    Ok(scene
        .nodes()
        .map(|node| gltf_node(&node, &buffers))
        .collect())
}

fn gltf_node(node: &gltf::Node, buffers: &[gltf::buffer::Data]) -> ImportedNode {
    let (translation, rotation, scale) = node.transform().decomposed();

    let mesh = node.mesh().map(|mesh| {
        let mut data = MeshData::default();
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::debug!("Skipping non-triangle primitive in mesh {:?}", mesh.name());
                continue;
            }

            let reader = primitive.reader(|buffer| Some(buffers[buffer.index()].0.as_slice()));
            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let positions: Vec<DVec3> = positions.map(to_dvec3).collect();
            let normals = reader
                .read_normals()
                .map(|normals| normals.map(to_dvec3).collect());
            let indices: Vec<usize> = match reader.read_indices() {
                Some(indices) => indices.into_u32().map(|i| i as usize).collect(),
                None => (0..positions.len()).collect(),
            };

            let [r, g, b, _] = primitive
                .material()
                .pbr_metallic_roughness()
                .base_color_factor();
            data.append(positions, normals, indices, [r, g, b]);
        }
        data
    });

    ImportedNode {
        name: node
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("node{}", node.index())),
        translation: to_dvec3(translation),
        rotation: DQuat::from_xyzw(
            rotation[0] as f64,
            rotation[1] as f64,
            rotation[2] as f64,
            rotation[3] as f64,
        ),
        scale: to_dvec3(scale),
        mesh,
        children: node
            .children()
            .map(|child| gltf_node(&child, buffers))
            .collect(),
    }
}

fn load_obj(path: &Path) -> Result<Vec<ImportedNode>> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|source| RenderError::Obj {
        path: path.to_path_buf(),
        source,
    })?;

    let materials = materials.unwrap_or_else(|err| {
        log::debug!("No materials for {}: {}", path.display(), err);
        Vec::new()
    });

    Ok(models
        .into_iter()
        .map(|model| {
            let mesh = model.mesh;
            let color = mesh
                .material_id
                .and_then(|id| materials.get(id))
                .and_then(|material| material.diffuse)
                .unwrap_or(DEFAULT_COLOR);

            let positions: Vec<DVec3> = mesh
                .positions
                .chunks_exact(3)
                .map(|p| DVec3::new(p[0] as f64, p[1] as f64, p[2] as f64))
                .collect();
            let normals = (!mesh.normals.is_empty()).then(|| {
                mesh.normals
                    .chunks_exact(3)
                    .map(|n| DVec3::new(n[0] as f64, n[1] as f64, n[2] as f64))
                    .collect()
            });
            let indices = mesh.indices.iter().map(|&i| i as usize).collect();

            let mut data = MeshData::default();
            data.append(positions, normals, indices, color);
            ImportedNode::with_mesh(model.name, data)
        })
        .collect())
}

fn to_dvec3(v: [f32; 3]) -> DVec3 {
    DVec3::new(v[0] as f64, v[1] as f64, v[2] as f64)
}
