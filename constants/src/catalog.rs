//! Catalog source locations and subset selection rules

/// Remote object store holding every catalog asset.
pub const OBJAVERSE_BASE_URL: &str =
    "https://huggingface.co/datasets/allenai/objaverse/resolve/main";

/// Gzipped UID -> relative path table published next to the assets.
pub const OBJECT_PATHS_FILE: &str = "object-paths.json.gz";

/// Only binary glTF assets are kept.
pub const ACCEPTED_EXTENSION: &str = ".glb";

/// Path fragments that usually mark test, placeholder or primitive objects.
pub const EXCLUSION_TERMS: &[&str] = &[
    "test",
    "temp",
    "placeholder",
    "broken",
    "wip",
    "untextured",
    "lowpoly",
    "simple",
    "cube",
    "sphere",
    "plane",
    "default",
    "example",
];

/// Paths shorter than this are treated as degenerate objects.
pub const MIN_PATH_LENGTH: usize = 10;

pub const DEFAULT_SEED: u64 = 42;

pub const DEFAULT_SAMPLE_SIZE: usize = 1000;

/// Objects per download batch file.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

pub const DEFAULT_BATCH_DIR: &str = "download_batches";

pub const DEFAULT_BATCH_NAME: &str = "mvd_fusion";

/// Fraction of completed renders assigned to the train list.
pub const DEFAULT_TRAIN_RATIO: f64 = 0.9;
