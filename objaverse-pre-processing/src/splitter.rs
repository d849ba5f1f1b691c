//! Deterministic train/test split of completed renders.

use crate::error::{PreprocessError, Result};
use crate::uid_list::write_string_list;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Disjoint train and test UID lists covering the input universe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<String>,
    pub test: Vec<String>,
}

/// Lists immediate subdirectory names, sorted so enumeration order never
/// leaks into the shuffle. A missing root is an empty universe.
pub fn list_render_dirs(root: &Path) -> Result<Vec<String>> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            log::warn!("Renders directory {} does not exist", root.display());
            return Ok(Vec::new());
        }
        Err(err) => return Err(PreprocessError::io(root, err)),
    };

    let mut uids: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect();
    uids.sort();

    log::info!("Found {} rendered objects", uids.len());
    Ok(uids)
}

/// Seeded shuffle, then cut at `floor(ratio * n)`.
pub fn split_uids(mut uids: Vec<String>, ratio: f64, seed: u64) -> Result<Split> {
    if !(0.0..=1.0).contains(&ratio) {
        return Err(PreprocessError::InvalidSetting(format!(
            "split ratio {} is outside [0, 1]",
            ratio
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    uids.shuffle(&mut rng);

    let split_idx = ((uids.len() as f64 * ratio).floor() as usize).min(uids.len());
    let test = uids.split_off(split_idx);

    log::info!("Train: {}, Test: {}", uids.len(), test.len());
    Ok(Split { train: uids, test })
}

/// Writes `{prefix}_train.json` and `{prefix}_test.json`.
pub fn write_split(split: &Split, output_dir: &Path, prefix: &str) -> Result<(PathBuf, PathBuf)> {
    let train_path = output_dir.join(format!("{}_train.json", prefix));
    let test_path = output_dir.join(format!("{}_test.json", prefix));

    write_string_list(&train_path, &split.train)?;
    write_string_list(&test_path, &split.test)?;

    log::info!(
        "Created subset lists {} and {}",
        train_path.display(),
        test_path.display()
    );
    Ok((train_path, test_path))
}
