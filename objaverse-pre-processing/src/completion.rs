//! Detection of assets whose multi-view render set is already on disk.

use constants::camera::MAX_VIEWS;
use constants::layout::{
    CAMERAS_FILE, COMPLETION_IMAGE_EXTENSION, VIEWS_DIR, depth_file_name, mask_file_name,
    rgb_file_name,
};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
struct ViewIndex {
    view_id: usize,
}

/// Completion predicate over per-UID render directories.
#[derive(Debug, Clone)]
pub struct CompletionScanner {
    /// Minimum number of counted images.
    required_images: usize,
    /// Extension of the counted images, without the dot.
    image_extension: String,
    /// Require every rgb/depth/mask triple and a 16-record metadata file.
    strict: bool,
}

impl Default for CompletionScanner {
    fn default() -> Self {
        Self {
            required_images: MAX_VIEWS,
            image_extension: COMPLETION_IMAGE_EXTENSION.to_string(),
            strict: false,
        }
    }
}

impl CompletionScanner {
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Directory holding the artifacts: `{dir}/views` when present, else `{dir}`.
    pub fn artifact_dir(dir: &Path) -> PathBuf {
        let views = dir.join(VIEWS_DIR);
        if views.is_dir() { views } else { dir.to_path_buf() }
    }

    pub fn is_complete(&self, dir: &Path) -> bool {
        let artifacts = Self::artifact_dir(dir);
        if !artifacts.join(CAMERAS_FILE).is_file() {
            return false;
        }

        if self.strict {
            self.has_all_views(&artifacts)
        } else {
            self.count_images(&artifacts) >= self.required_images
        }
    }

    fn count_images(&self, artifacts: &Path) -> usize {
        let Ok(entries) = fs::read_dir(artifacts) else {
            return 0;
        };

        entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext == self.image_extension.as_str())
            })
            .count()
    }

    fn has_all_views(&self, artifacts: &Path) -> bool {
        let files_present = (0..MAX_VIEWS).all(|view| {
            [rgb_file_name(view), depth_file_name(view), mask_file_name(view)]
                .iter()
                .all(|name| artifacts.join(name).is_file())
        });
        if !files_present {
            return false;
        }

        let cameras_path = artifacts.join(CAMERAS_FILE);
        let records: Vec<ViewIndex> = match fs::read_to_string(&cameras_path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
        {
            Some(records) => records,
            None => {
                log::debug!("Unreadable camera metadata: {}", cameras_path.display());
                return false;
            }
        };

        records.len() == MAX_VIEWS
            && records
                .iter()
                .enumerate()
                .all(|(idx, record)| record.view_id == idx)
    }

    /// Names of every complete immediate subdirectory of `root`.
    /// A missing root yields no completions.
    pub fn scan(&self, root: &Path) -> BTreeSet<String> {
        let mut completed = BTreeSet::new();

        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(err) => {
                log::warn!("Cannot read renders directory {}: {}", root.display(), err);
                return completed;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    log::warn!("Skipping unreadable entry in {}: {}", root.display(), err);
                    continue;
                }
            };
            let path = entry.path();
            if path.is_dir() && self.is_complete(&path) {
                completed.insert(entry.file_name().to_string_lossy().to_string());
            }
        }

        log::info!("Found {} already rendered objects", completed.len());
        completed
    }
}
