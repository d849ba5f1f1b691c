use clap::{Parser, ValueEnum};
use constants::camera::{DEFAULT_CAMERA_DISTANCE, DEFAULT_NUM_IMAGES};
use std::path::PathBuf;

/// Shading path of the built-in host.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Engine {
    /// Interpolated vertex normals
    #[default]
    #[value(name = "CYCLES")]
    Cycles,
    /// Flat face normals
    #[value(name = "BLENDER_EEVEE", alias = "EEVEE")]
    Eevee,
}

#[derive(Parser, Debug)]
#[command(name = "multiview-render-engine")]
#[command(about = "Renders 16 fixed views (rgb, depth, mask) and camera metadata for one asset")]
pub struct RenderArgs {
    /// Local mesh file or http(s) URL of a .glb
    #[arg(long = "object_path")]
    pub object_path: String,

    /// Root directory receiving `{uid}/views/`
    #[arg(long = "output_dir", env = "MVD_RENDERS_DIR", default_value = "./views")]
    pub output_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = Engine::Cycles)]
    pub engine: Engine,

    /// Requested views; at most 16 are rendered
    #[arg(long = "num_images", default_value_t = DEFAULT_NUM_IMAGES)]
    pub num_images: usize,

    /// Camera distance from the normalized object's center
    #[arg(long = "camera_dist", default_value_t = DEFAULT_CAMERA_DISTANCE)]
    pub camera_dist: f64,

    /// Scratch directory for downloaded objects
    #[arg(long = "download_dir", default_value = "tmp-objects")]
    pub download_dir: PathBuf,
}
