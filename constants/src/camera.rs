//! Fixed camera rig and viewpoint table used for every asset

/// Number of preset viewpoints per asset.
pub const MAX_VIEWS: usize = 16;

/// Azimuths in radians: two interleaved 8-point rings at 45° spacing,
/// the second offset by 22.5°. Values are the f32-rounded dataset constants.
pub const AZIMUTHS: [f64; MAX_VIEWS] = [
    0.0,
    0.7853981852531433,
    1.5707963705062866,
    2.356194496154785,
    3.1415927410125732,
    3.9269907474517822,
    4.71238899230957,
    5.497786998748779,
    0.39269909262657166,
    1.1780972480773926,
    1.9634954929351807,
    2.7488934993743896,
    3.5342917442321777,
    4.319689750671387,
    5.105088233947754,
    5.890486240386963,
];

/// Constant elevation (π/6) shared by all viewpoints.
pub const ELEVATION: f64 = 0.5235987901687622;

pub const ELEVATIONS: [f64; MAX_VIEWS] = [ELEVATION; MAX_VIEWS];

pub const DEFAULT_CAMERA_DISTANCE: f64 = 1.5;

/// Lens focal length in millimetres.
pub const FOCAL_LENGTH_MM: f64 = 35.0;

/// Horizontal sensor size in millimetres.
pub const SENSOR_WIDTH_MM: f64 = 32.0;

/// Requested view count when none is given on the command line.
pub const DEFAULT_NUM_IMAGES: usize = 64;
