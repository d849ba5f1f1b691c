use crate::catalog::Catalog;
use crate::error::{PreprocessError, Result};
use crate::uid_list::read_string_list;
use clap::{Args, Parser, Subcommand};
use constants::catalog::{
    DEFAULT_BATCH_DIR, DEFAULT_BATCH_NAME, DEFAULT_BATCH_SIZE, DEFAULT_SAMPLE_SIZE, DEFAULT_SEED,
    DEFAULT_TRAIN_RATIO, OBJAVERSE_BASE_URL,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "objaverse-pre-processing")]
#[command(about = "Catalog filtering, download batching and dataset splits for multi-view renders")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Where the UID -> path table comes from.
#[derive(Args, Debug, Clone)]
pub struct CatalogArgs {
    /// Local path table (`.json` or `.json.gz`)
    #[arg(long, env = "OBJAVERSE_CATALOG", conflicts_with = "remote")]
    pub catalog: Option<PathBuf>,

    /// Download the path table from the remote object store
    #[arg(long)]
    pub remote: bool,

    /// Remote object store root used for downloads and the remote table
    #[arg(long, env = "OBJAVERSE_BASE_URL", default_value = OBJAVERSE_BASE_URL)]
    pub base_url: String,
}

impl CatalogArgs {
    pub fn load(&self) -> Result<Catalog> {
        match (&self.catalog, self.remote) {
            (Some(path), _) => Catalog::load(path),
            (None, true) => Catalog::fetch(&self.base_url),
            (None, false) => Err(PreprocessError::InvalidSetting(
                "either --catalog or --remote is required".to_string(),
            )),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sample the catalog and keep UIDs with plausible asset paths
    Filter {
        #[command(flatten)]
        catalog: CatalogArgs,

        /// JSON list replacing the catalog's own UID order
        #[arg(long)]
        uids: Option<PathBuf>,

        #[arg(long, default_value_t = DEFAULT_SAMPLE_SIZE)]
        sample_size: usize,

        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        #[arg(long, default_value = "simple_filtered.json")]
        output_file: PathBuf,
    },

    /// Turn a filtered UID list into download URL batches
    Batch {
        #[command(flatten)]
        catalog: CatalogArgs,

        /// Filtered UID list produced by `filter`
        #[arg(long)]
        filtered_file: PathBuf,

        /// Base name for output batch files
        #[arg(long, default_value = DEFAULT_BATCH_NAME)]
        output_name: String,

        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        #[arg(long, default_value = DEFAULT_BATCH_DIR)]
        output_dir: PathBuf,

        /// Drop UIDs that already have a complete render set
        #[arg(long)]
        skip_completed: bool,

        #[arg(long, env = "MVD_RENDERS_DIR", default_value = "./views")]
        renders_dir: PathBuf,
    },

    /// Report UIDs whose render set is complete
    Scan {
        #[arg(long, env = "MVD_RENDERS_DIR", default_value = "./views")]
        renders_dir: PathBuf,

        /// Require every rgb/depth/mask triple and 16 camera records
        #[arg(long)]
        strict: bool,

        /// Write the completed UIDs to this JSON list
        #[arg(long)]
        output_file: Option<PathBuf>,
    },

    /// Split completed renders into train/test lists
    Split {
        #[arg(long, env = "MVD_RENDERS_DIR", default_value = "./views")]
        renders_dir: PathBuf,

        #[arg(long, env = "MVD_OUTPUT_DIR", default_value = "subset_list")]
        output_dir: PathBuf,

        #[arg(long, default_value = "15k")]
        prefix: String,

        #[arg(long, default_value_t = DEFAULT_TRAIN_RATIO)]
        ratio: f64,

        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },
}

impl Command {
    /// Loads the catalog and applies an optional explicit UID list.
    pub fn load_catalog(catalog: &CatalogArgs, uids: Option<&PathBuf>) -> Result<Catalog> {
        let loaded = catalog.load()?;
        match uids {
            Some(path) => Ok(loaded.with_uid_list(read_string_list(path)?)),
            None => Ok(loaded),
        }
    }
}
