pub mod bounds;
pub mod camera;
pub mod compositor;
pub mod download;
pub mod error;
pub mod metadata;
pub mod pipeline;
pub mod raster;
pub mod scene;
pub mod settings;
