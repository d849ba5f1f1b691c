//! Built-in CPU scene host

pub mod import;
pub mod rasterizer;

use crate::bounds::Aabb;
use crate::camera::{CameraRig, track_to};
use crate::compositor::OutputGraph;
use crate::error::{RenderError, Result};
use crate::scene::{AreaLight, ObjectId, RenderTargets, RenderedFiles, SceneHost};
use crate::settings::Engine;
use constants::render_settings::{DEFAULT_LIGHT_NAME, RESOLUTION_X, RESOLUTION_Y};
use glam::{DMat4, DQuat, DVec3};
use import::{ImportedNode, MeshData};
use rasterizer::{LightSource, RasterCamera, Shading, WorldTriangle};
use std::collections::BTreeMap;
use std::path::Path;

// Placement of the camera and light in a fresh scene.
const DEFAULT_CAMERA_LOCATION: DVec3 = DVec3::new(7.3589, -6.9258, 4.9583);
const DEFAULT_LIGHT_LOCATION: DVec3 = DVec3::new(4.0762, 1.0055, 5.9039);

#[derive(Debug, Clone)]
pub enum ObjectKind {
    Mesh(MeshData),
    Empty,
    Camera,
    PointLight,
    AreaLight,
}

#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    pub kind: ObjectKind,
    pub parent: Option<ObjectId>,
    pub translation: DVec3,
    pub rotation: DQuat,
    pub scale: DVec3,
}

impl SceneObject {
    fn new(name: &str, kind: ObjectKind, translation: DVec3) -> Self {
        Self {
            name: name.to_string(),
            kind,
            parent: None,
            translation,
            rotation: DQuat::IDENTITY,
            scale: DVec3::ONE,
        }
    }

    fn local_matrix(&self) -> DMat4 {
        DMat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    fn is_light(&self) -> bool {
        matches!(
            self.kind,
            ObjectKind::PointLight | ObjectKind::AreaLight
        )
    }

    fn is_camera(&self) -> bool {
        matches!(self.kind, ObjectKind::Camera)
    }
}

pub struct RasterHost {
    shading: Shading,
    objects: BTreeMap<ObjectId, SceneObject>,
    next_id: ObjectId,
    camera: ObjectId,
    rig: CameraRig,
    track_target: Option<ObjectId>,
    /// Camera world matrix as of the last evaluation.
    camera_matrix: DMat4,
    outputs: Option<OutputGraph>,
}

impl RasterHost {
    pub fn new(engine: Engine) -> Self {
        let shading = match engine {
            Engine::Cycles => Shading::Smooth,
            Engine::Eevee => Shading::Flat,
        };

        let mut host = Self {
            shading,
            objects: BTreeMap::new(),
            next_id: 0,
            camera: 0,
            rig: CameraRig {
                focal_length_mm: 50.0,
                sensor_width_mm: 36.0,
                resolution: (RESOLUTION_X, RESOLUTION_Y),
            },
            track_target: None,
            camera_matrix: DMat4::IDENTITY,
            outputs: None,
        };

        let mut camera = SceneObject::new("Camera", ObjectKind::Camera, DEFAULT_CAMERA_LOCATION);
        camera.rotation = DQuat::from_rotation_z(0.8149) * DQuat::from_rotation_x(1.1093);
        host.camera = host.insert(camera);
        host.insert_default_light();
        host.update();
        host
    }

    fn insert(&mut self, object: SceneObject) -> ObjectId {
        let id = self.next_id;
        self.next_id += 1;
        self.objects.insert(id, object);
        id
    }

    fn insert_default_light(&mut self) -> ObjectId {
        self.insert(SceneObject::new(
            DEFAULT_LIGHT_NAME,
            ObjectKind::PointLight,
            DEFAULT_LIGHT_LOCATION,
        ))
    }

    fn insert_node(&mut self, node: ImportedNode, parent: Option<ObjectId>) -> ObjectId {
        let kind = match node.mesh {
            Some(mesh) => ObjectKind::Mesh(mesh),
            None => ObjectKind::Empty,
        };
        let id = self.insert(SceneObject {
            name: node.name,
            kind,
            parent,
            translation: node.translation,
            rotation: node.rotation,
            scale: node.scale,
        });
        for child in node.children {
            self.insert_node(child, Some(id));
        }
        id
    }

    fn object_mut(&mut self, id: ObjectId) -> Result<&mut SceneObject> {
        self.objects
            .get_mut(&id)
            .ok_or(RenderError::UnknownObject(id))
    }

    /// Composes local matrices up the parent chain.
    pub fn world_matrix(&self, id: ObjectId) -> DMat4 {
        let mut matrix = DMat4::IDENTITY;
        let mut current = Some(id);
        while let Some(object) = current.and_then(|id| self.objects.get(&id)) {
            matrix = object.local_matrix() * matrix;
            current = object.parent;
        }
        matrix
    }

    fn world_location(&self, id: ObjectId) -> DVec3 {
        self.world_matrix(id).w_axis.truncate()
    }

    fn world_triangles(&self) -> Vec<WorldTriangle> {
        let mut triangles = Vec::new();
        for (&id, object) in &self.objects {
            let ObjectKind::Mesh(mesh) = &object.kind else {
                continue;
            };
            let world = self.world_matrix(id);
            let normal_matrix = world.inverse().transpose();
            let positions: Vec<DVec3> = mesh
                .positions
                .iter()
                .map(|p| world.transform_point3(*p))
                .collect();
            let normals: Vec<DVec3> = if mesh.has_normals() {
                mesh.normals
                    .iter()
                    .map(|n| normal_matrix.transform_vector3(*n).normalize_or_zero())
                    .collect()
            } else {
                Vec::new()
            };

            for (tri, color) in mesh.triangles.iter().zip(&mesh.triangle_colors) {
                triangles.push(WorldTriangle {
                    vertices: tri.map(|i| positions[i]),
                    normals: (!normals.is_empty()).then(|| tri.map(|i| normals[i])),
                    color: *color,
                });
            }
        }
        triangles
    }

    fn light_sources(&self) -> Vec<LightSource> {
        self.objects
            .iter()
            .filter_map(|(&id, object)| match object.kind {
                ObjectKind::PointLight => Some(LightSource::Point {
                    location: self.world_location(id),
                }),
                ObjectKind::AreaLight => Some(LightSource::Area {
                    location: self.world_location(id),
                }),
                _ => None,
            })
            .collect()
    }

    fn remove_subtree(&mut self, id: ObjectId) {
        let children: Vec<ObjectId> = self
            .objects
            .iter()
            .filter(|(_, object)| object.parent == Some(id))
            .map(|(&child, _)| child)
            .collect();
        for child in children {
            self.remove_subtree(child);
        }
        self.objects.remove(&id);
    }
}

impl SceneHost for RasterHost {
    /// Drops meshes and empties. Lights added by an earlier asset are dropped too,
    /// leaving the camera and the default light of a fresh scene.
    fn reset(&mut self) -> Result<()> {
        let doomed: Vec<ObjectId> = self
            .objects
            .iter()
            .filter(|(_, object)| {
                !object.is_camera() && !(object.is_light() && object.name == DEFAULT_LIGHT_NAME)
            })
            .map(|(&id, _)| id)
            .collect();
        for id in doomed {
            self.objects.remove(&id);
        }
        for object in self.objects.values_mut() {
            object.parent = None;
        }

        if !self
            .objects
            .values()
            .any(|object| object.is_light() && object.name == DEFAULT_LIGHT_NAME)
        {
            self.insert_default_light();
        }

        self.track_target = None;
        self.update();
        log::debug!("Scene reset, {} objects kept", self.objects.len());
        Ok(())
    }

    fn import_mesh(&mut self, path: &Path) -> Result<Vec<ObjectId>> {
        let roots = import::import_file(path)?;
        let ids: Vec<ObjectId> = roots
            .into_iter()
            .map(|root| self.insert_node(root, None))
            .collect();
        log::debug!("Imported {} root objects from {}", ids.len(), path.display());
        Ok(ids)
    }

    fn mesh_world_bounds(&self) -> Option<Aabb> {
        let mut bounds = Aabb::new();
        for (&id, object) in &self.objects {
            if let ObjectKind::Mesh(mesh) = &object.kind {
                if mesh.positions.is_empty() {
                    continue;
                }
                let local = Aabb::from_points(mesh.positions.iter().copied());
                bounds.merge(&local.transformed(&self.world_matrix(id)));
            }
        }
        (!bounds.is_empty()).then_some(bounds)
    }

    /// Top-level content objects. The camera and lights are left out.
    fn root_objects(&self) -> Vec<ObjectId> {
        self.objects
            .iter()
            .filter(|(_, object)| {
                object.parent.is_none() && !object.is_camera() && !object.is_light()
            })
            .map(|(&id, _)| id)
            .collect()
    }

    /// Scales about the world origin, so the location scales with the object.
    fn scale_object(&mut self, id: ObjectId, factor: f64) -> Result<()> {
        let object = self.object_mut(id)?;
        object.scale *= factor;
        object.translation *= factor;
        Ok(())
    }

    fn translate_object(&mut self, id: ObjectId, offset: DVec3) -> Result<()> {
        self.object_mut(id)?.translation += offset;
        Ok(())
    }

    fn update(&mut self) {
        let location = self.world_location(self.camera);
        self.camera_matrix = match self.track_target {
            Some(target) if self.objects.contains_key(&target) => {
                track_to(location, self.world_location(target))
            }
            _ => self.world_matrix(self.camera),
        };
    }

    fn remove_default_light(&mut self) {
        let default_light = self
            .objects
            .iter()
            .find(|(_, object)| object.is_light() && object.name == DEFAULT_LIGHT_NAME)
            .map(|(&id, _)| id);
        if let Some(id) = default_light {
            self.remove_subtree(id);
        }
    }

    fn add_area_light(&mut self, light: AreaLight) -> ObjectId {
        let mut object = SceneObject::new("Area", ObjectKind::AreaLight, light.location);
        object.scale = DVec3::splat(light.scale);
        log::debug!(
            "Added area light ({} W) at {}",
            light.energy,
            light.location
        );
        self.insert(object)
    }

    fn add_empty(&mut self, name: &str, location: DVec3) -> ObjectId {
        self.insert(SceneObject::new(name, ObjectKind::Empty, location))
    }

    fn configure_camera(&mut self, rig: CameraRig, target: ObjectId) -> Result<()> {
        if !self.objects.contains_key(&target) {
            return Err(RenderError::UnknownObject(target));
        }
        self.rig = rig;
        self.track_target = Some(target);
        self.update();
        Ok(())
    }

    fn set_camera_location(&mut self, location: DVec3) {
        if let Some(camera) = self.objects.get_mut(&self.camera) {
            camera.translation = location;
        }
    }

    fn camera_world_matrix(&self) -> DMat4 {
        self.camera_matrix
    }

    fn configure_outputs(&mut self, graph: OutputGraph) {
        self.outputs = Some(graph);
    }

    fn render(&mut self, targets: &RenderTargets) -> Result<RenderedFiles> {
        let Some(graph) = self.outputs.as_ref() else {
            return Err(RenderError::OutputsNotConfigured);
        };
        let graph = graph.clone();

        self.update();
        let camera = RasterCamera {
            world: self.camera_matrix,
            intrinsics: self.rig.intrinsics(),
        };
        let buffers = rasterizer::rasterize(
            &self.world_triangles(),
            &camera,
            &self.light_sources(),
            self.shading,
        );

        graph.write_outputs(&buffers, targets)
    }
}
