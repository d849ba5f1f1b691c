//! Per-view camera records serialized next to the rendered images

use crate::camera::{Intrinsics, ViewPose, look_target, up_vector};
use crate::error::{RenderError, Result};
use constants::layout::CAMERAS_FILE;
use glam::{DMat4, DVec3};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRecord {
    pub view_id: usize,
    pub azimuth: f64,
    pub elevation: f64,
    pub camera_distance: f64,
    pub position: [f64; 3],
    pub target: [f64; 3],
    pub up: [f64; 3],
    pub focal_length: [f64; 2],
    pub principal_point: [f64; 2],
    pub image_size: [u32; 2],
    pub sensor_size: [f64; 2],
}

impl ViewRecord {
    /// Builds a record from the commanded position and the evaluated camera matrix.
    pub fn new(
        pose: &ViewPose,
        camera_distance: f64,
        position: DVec3,
        camera_matrix: &DMat4,
        intrinsics: &Intrinsics,
    ) -> Self {
        Self {
            view_id: pose.view_id,
            azimuth: pose.azimuth,
            elevation: pose.elevation,
            camera_distance,
            position: position.to_array(),
            target: look_target(camera_matrix).to_array(),
            up: up_vector(camera_matrix).to_array(),
            focal_length: intrinsics.focal_length,
            principal_point: intrinsics.principal_point,
            image_size: intrinsics.image_size,
            sensor_size: intrinsics.sensor_size,
        }
    }
}

/// Writes the ordered record list to `{views_dir}/cameras.json`.
pub fn write_cameras(views_dir: &Path, records: &[ViewRecord]) -> Result<PathBuf> {
    fs::create_dir_all(views_dir).map_err(|e| RenderError::io(views_dir, e))?;

    let path = views_dir.join(CAMERAS_FILE);
    let json = serde_json::to_string_pretty(records)?;
    fs::write(&path, json).map_err(|e| RenderError::io(&path, e))?;

    log::info!("Saved {} camera records to {}", records.len(), path.display());
    Ok(path)
}

pub fn read_cameras(views_dir: &Path) -> Result<Vec<ViewRecord>> {
    let path = views_dir.join(CAMERAS_FILE);
    let text = fs::read_to_string(&path).map_err(|e| RenderError::io(&path, e))?;
    Ok(serde_json::from_str(&text)?)
}
