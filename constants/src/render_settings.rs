//! Output image and lighting settings for dataset renders

pub const RESOLUTION_X: u32 = 256;
pub const RESOLUTION_Y: u32 = 256;

/// Quality for the lossy colour and mask outputs.
pub const JPEG_QUALITY: u8 = 90;

/// Area light placed above the normalized object.
pub const AREA_LIGHT_ENERGY: f64 = 30000.0;
pub const AREA_LIGHT_HEIGHT: f64 = 0.5;
pub const AREA_LIGHT_SCALE: f64 = 100.0;

/// Frame the host renders; file-output slots append it as `{frame:04}`.
pub const RENDER_FRAME: u32 = 1;

/// Name of the light every fresh host scene starts with.
pub const DEFAULT_LIGHT_NAME: &str = "Light";

/// Name of the tracking target placed at the world origin.
pub const TRACK_TARGET_NAME: &str = "Empty";
