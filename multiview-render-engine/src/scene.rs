//! Scene host abstraction the multi-view pipeline drives

use crate::bounds::Aabb;
use crate::camera::CameraRig;
use crate::compositor::OutputGraph;
use crate::error::Result;
use glam::{DMat4, DVec3};
use std::path::{Path, PathBuf};

pub type ObjectId = usize;

/// Rectangular light placed above the normalized object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaLight {
    /// Power in watts.
    pub energy: f64,
    pub location: DVec3,
    /// Uniform scale of the emitter.
    pub scale: f64,
}

/// Per-view output request: the colour image goes straight to `rgb_path`,
/// depth and mask go through the graph's file-output slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTargets {
    pub rgb_path: PathBuf,
    pub depth_slot: String,
    pub mask_slot: String,
}

/// Files a render actually produced, including any frame suffix the host appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFiles {
    pub rgb: PathBuf,
    pub depth: PathBuf,
    pub mask: PathBuf,
}

/// Explicit handle on a rendering backend's scene.
///
/// All state lives behind the host; the pipeline only issues calls in stage order.
pub trait SceneHost {
    /// Drop every object that is not a camera or a light.
    fn reset(&mut self) -> Result<()>;

    /// Import mesh geometry from a file, returning the new top-level objects.
    fn import_mesh(&mut self, path: &Path) -> Result<Vec<ObjectId>>;

    /// World-space bounds of all mesh geometry, `None` when there is none.
    fn mesh_world_bounds(&self) -> Option<Aabb>;

    /// Objects without a parent.
    fn root_objects(&self) -> Vec<ObjectId>;

    /// Multiply an object's scale uniformly.
    fn scale_object(&mut self, id: ObjectId, factor: f64) -> Result<()>;

    fn translate_object(&mut self, id: ObjectId, offset: DVec3) -> Result<()>;

    /// Force evaluation of transforms and constraints.
    fn update(&mut self);

    fn remove_default_light(&mut self);

    fn add_area_light(&mut self, light: AreaLight) -> ObjectId;

    /// Add an empty object, used as the camera tracking target.
    fn add_empty(&mut self, name: &str, location: DVec3) -> ObjectId;

    /// Apply lens settings and make the camera track `target`.
    fn configure_camera(&mut self, rig: CameraRig, target: ObjectId) -> Result<()>;

    fn set_camera_location(&mut self, location: DVec3);

    /// Camera world matrix as of the last `update`.
    fn camera_world_matrix(&self) -> DMat4;

    fn configure_outputs(&mut self, graph: OutputGraph);

    /// Render one frame through the configured output graph.
    fn render(&mut self, targets: &RenderTargets) -> Result<RenderedFiles>;
}
