//! Download URL resolution and fixed-size batch files for distributed rendering.

use crate::catalog::Catalog;
use crate::error::{PreprocessError, Result};
use crate::uid_list::write_string_list;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Resolved download URLs plus the count of UIDs without a catalog entry.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub urls: Vec<String>,
    pub missing: usize,
}

/// Maps catalog paths onto the remote object store.
pub struct UrlResolver {
    base_url: String,
}

impl UrlResolver {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url_for(&self, catalog_path: &str) -> String {
        format!("{}/{}", self.base_url, catalog_path.trim_start_matches('/'))
    }

    /// Resolves UIDs in order; unmapped UIDs are counted and skipped.
    pub fn resolve(&self, uids: &[String], catalog: &Catalog) -> Resolution {
        let pb = ProgressBar::new(uids.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:40.cyan/blue}] {pos}/{len} uids ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("▉▊▋▌▍▎▏ "),
        );
        pb.set_message("Creating download URLs");

        let mut resolution = Resolution::default();
        for uid in uids {
            match catalog.path(uid) {
                Some(path) => resolution.urls.push(self.url_for(path)),
                None => resolution.missing += 1,
            }
            pb.inc(1);
        }
        pb.finish_with_message("URLs created");

        log::info!(
            "Successfully mapped {} UIDs to URLs",
            resolution.urls.len()
        );
        log::info!("Missing objects: {}", resolution.missing);
        resolution
    }
}

/// Splits URLs into contiguous batches of at most `batch_size`.
pub fn partition(urls: &[String], batch_size: usize) -> Result<Vec<&[String]>> {
    if batch_size == 0 {
        return Err(PreprocessError::InvalidSetting(
            "batch size must be at least 1".to_string(),
        ));
    }
    Ok(urls.chunks(batch_size).collect())
}

/// Files produced by one batch write.
#[derive(Debug, Clone)]
pub struct BatchOutput {
    /// Batch files in batch-index order.
    pub batch_files: Vec<PathBuf>,
    /// File holding the full unbatched URL list.
    pub all_file: PathBuf,
}

/// Writes `{name}_batch_{i}.json` files and `{name}_all.json` into one directory.
pub struct BatchWriter {
    output_dir: PathBuf,
    output_name: String,
}

impl BatchWriter {
    pub fn new(output_dir: &Path, output_name: &str) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            output_name: output_name.to_string(),
        }
    }

    pub fn batch_path(&self, index: usize) -> PathBuf {
        self.output_dir
            .join(format!("{}_batch_{}.json", self.output_name, index))
    }

    pub fn all_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_all.json", self.output_name))
    }

    pub fn write(&self, urls: &[String], batch_size: usize) -> Result<BatchOutput> {
        let batches = partition(urls, batch_size)?;
        let mut batch_files = Vec::with_capacity(batches.len());

        for (index, batch) in batches.iter().enumerate() {
            let path = self.batch_path(index);
            write_string_list(&path, batch)?;
            log::info!("Created batch {} with {} objects", index, batch.len());
            batch_files.push(path);
        }

        let all_file = self.all_path();
        write_string_list(&all_file, urls)?;

        Ok(BatchOutput {
            batch_files,
            all_file,
        })
    }
}

/// Sibling file for the pruned list: `filtered.json` -> `filtered_remaining.json`.
pub fn remaining_path(filtered_file: &Path) -> PathBuf {
    let name = filtered_file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let remaining = match name.strip_suffix(".json") {
        Some(stem) => format!("{}_remaining.json", stem),
        None => format!("{}_remaining.json", name),
    };
    filtered_file.with_file_name(remaining)
}

/// Drops already-rendered UIDs while keeping input order.
pub fn remove_completed(uids: Vec<String>, completed: &BTreeSet<String>) -> Vec<String> {
    uids.into_iter()
        .filter(|uid| !completed.contains(uid))
        .collect()
}
