//! On-disk naming of rendered output sets

/// Per-asset sub-directory holding all view artifacts.
pub const VIEWS_DIR: &str = "views";

pub const CAMERAS_FILE: &str = "cameras.json";

/// Extension counted by the completion check (the depth images).
pub const COMPLETION_IMAGE_EXTENSION: &str = "png";

pub const RGB_EXTENSION: &str = "jpg";
pub const DEPTH_EXTENSION: &str = "png";
pub const MASK_EXTENSION: &str = "jpg";

/// Base name (no extension) of a view artifact, e.g. `003_depth`.
pub fn view_stem(view_id: usize, kind: &str) -> String {
    format!("{:03}_{}", view_id, kind)
}

pub fn rgb_file_name(view_id: usize) -> String {
    format!("{}.{}", view_stem(view_id, "rgb"), RGB_EXTENSION)
}

pub fn depth_file_name(view_id: usize) -> String {
    format!("{}.{}", view_stem(view_id, "depth"), DEPTH_EXTENSION)
}

pub fn mask_file_name(view_id: usize) -> String {
    format!("{}.{}", view_stem(view_id, "mask"), MASK_EXTENSION)
}
