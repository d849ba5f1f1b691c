//! Viewpoint table, camera pose and pinhole intrinsics for the fixed rig.

use constants::camera::{AZIMUTHS, ELEVATIONS, MAX_VIEWS};
use glam::{DMat4, DVec3, DVec4};

/// Position on a sphere of radius `distance` around the origin, Z up.
pub fn camera_position(azimuth: f64, elevation: f64, distance: f64) -> DVec3 {
    DVec3::new(
        distance * azimuth.cos() * elevation.cos(),
        distance * azimuth.sin() * elevation.cos(),
        distance * elevation.sin(),
    )
}

/// One preset viewpoint of the rig.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewPose {
    pub view_id: usize,
    pub azimuth: f64,
    pub elevation: f64,
}

impl ViewPose {
    pub fn position(&self, distance: f64) -> DVec3 {
        camera_position(self.azimuth, self.elevation, distance)
    }
}

/// The first `min(num_images, 16)` entries of the preset table.
pub fn view_poses(num_images: usize) -> Vec<ViewPose> {
    (0..num_images.min(MAX_VIEWS))
        .map(|view_id| ViewPose {
            view_id,
            azimuth: AZIMUTHS[view_id],
            elevation: ELEVATIONS[view_id],
        })
        .collect()
}

/// Camera lens and sensor description handed to the scene host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRig {
    pub focal_length_mm: f64,
    pub sensor_width_mm: f64,
    /// Output image size in pixels.
    pub resolution: (u32, u32),
}

impl CameraRig {
    pub fn intrinsics(&self) -> Intrinsics {
        Intrinsics::from_sensor(self.focal_length_mm, self.sensor_width_mm, self.resolution)
    }
}

/// Pixel-space pinhole model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intrinsics {
    /// Focal length in pixels (x, y).
    pub focal_length: [f64; 2],
    pub principal_point: [f64; 2],
    pub image_size: [u32; 2],
    /// Sensor size in millimetres; height follows the image aspect.
    pub sensor_size: [f64; 2],
}

impl Intrinsics {
    pub fn from_sensor(focal_length_mm: f64, sensor_width_mm: f64, resolution: (u32, u32)) -> Self {
        let (width, height) = (resolution.0 as f64, resolution.1 as f64);
        let sensor_height_mm = sensor_width_mm * (height / width);

        Self {
            focal_length: [
                focal_length_mm * width / sensor_width_mm,
                focal_length_mm * height / sensor_height_mm,
            ],
            principal_point: [width / 2.0, height / 2.0],
            image_size: [resolution.0, resolution.1],
            sensor_size: [sensor_width_mm, sensor_height_mm],
        }
    }
}

/// World matrix of a camera at `position` tracking `target`:
/// local -Z points at the target, local +Y stays as close to world +Z as possible.
pub fn track_to(position: DVec3, target: DVec3) -> DMat4 {
    let z_axis = (position - target).normalize_or_zero();
    if z_axis == DVec3::ZERO {
        return DMat4::from_translation(position);
    }

    // Looking straight up or down leaves world Y as the only usable up hint.
    let up_hint = if z_axis.cross(DVec3::Z).length_squared() < 1e-12 {
        DVec3::Y
    } else {
        DVec3::Z
    };
    let x_axis = up_hint.cross(z_axis).normalize();
    let y_axis = z_axis.cross(x_axis);

    DMat4::from_cols(
        x_axis.extend(0.0),
        y_axis.extend(0.0),
        z_axis.extend(0.0),
        DVec4::new(position.x, position.y, position.z, 1.0),
    )
}

/// Point one unit ahead of the camera along its local -Z.
pub fn look_target(camera_matrix: &DMat4) -> DVec3 {
    let origin = camera_matrix.w_axis.truncate();
    origin + (camera_matrix.transform_point3(DVec3::NEG_Z) - origin)
}

/// Camera local +Y expressed in world space.
pub fn up_vector(camera_matrix: &DMat4) -> DVec3 {
    camera_matrix.transform_point3(DVec3::Y) - camera_matrix.w_axis.truncate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use constants::camera::{DEFAULT_CAMERA_DISTANCE, FOCAL_LENGTH_MM, SENSOR_WIDTH_MM};

    #[test]
    fn first_view_sits_on_the_x_axis_ring() {
        let pose = view_poses(16)[0];
        let position = pose.position(DEFAULT_CAMERA_DISTANCE);

        assert_abs_diff_eq!(position.x, 1.299, epsilon = 1e-3);
        assert_abs_diff_eq!(position.y, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(position.z, 0.75, epsilon = 1e-6);
    }

    #[test]
    fn view_table_is_two_offset_rings() {
        let poses = view_poses(64);
        assert_eq!(poses.len(), 16);

        let step = std::f64::consts::FRAC_PI_4;
        for (i, pose) in poses.iter().enumerate() {
            let ring_offset = if i < 8 { 0.0 } else { step / 2.0 };
            let expected = ring_offset + (i % 8) as f64 * step;
            assert_eq!(pose.view_id, i);
            assert_abs_diff_eq!(pose.azimuth, expected, epsilon = 1e-6);
            assert_abs_diff_eq!(pose.elevation, std::f64::consts::FRAC_PI_6, epsilon = 1e-6);
        }
        assert_eq!(view_poses(3).len(), 3);
    }

    #[test]
    fn intrinsics_for_square_dataset_images() {
        let intrinsics = Intrinsics::from_sensor(FOCAL_LENGTH_MM, SENSOR_WIDTH_MM, (256, 256));

        assert_abs_diff_eq!(intrinsics.focal_length[0], 280.0);
        assert_abs_diff_eq!(intrinsics.focal_length[1], 280.0);
        assert_eq!(intrinsics.principal_point, [128.0, 128.0]);
        assert_eq!(intrinsics.sensor_size, [32.0, 32.0]);
    }

    #[test]
    fn intrinsics_follow_image_aspect() {
        let intrinsics = Intrinsics::from_sensor(35.0, 32.0, (512, 256));

        assert_abs_diff_eq!(intrinsics.sensor_size[1], 16.0);
        assert_abs_diff_eq!(intrinsics.focal_length[0], 560.0);
        assert_abs_diff_eq!(intrinsics.focal_length[1], 560.0);
        assert_eq!(intrinsics.principal_point, [256.0, 128.0]);
    }

    #[test]
    fn tracked_camera_faces_the_target() {
        let position = camera_position(1.2, 0.5, 1.5);
        let matrix = track_to(position, DVec3::ZERO);

        let forward = look_target(&matrix) - position;
        assert!(forward.abs_diff_eq(-position.normalize(), 1e-9));

        let up = up_vector(&matrix);
        assert_abs_diff_eq!(up.dot(forward), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(up.length(), 1.0, epsilon = 1e-9);
        assert!(up.z > 0.0);
    }

    #[test]
    fn tracking_from_straight_above_stays_finite() {
        let matrix = track_to(DVec3::new(0.0, 0.0, 2.0), DVec3::ZERO);

        let forward = look_target(&matrix) - DVec3::new(0.0, 0.0, 2.0);
        assert!(forward.abs_diff_eq(DVec3::NEG_Z, 1e-9));
        assert!(up_vector(&matrix).is_finite());
    }
}
