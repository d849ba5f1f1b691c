//! Catalog UID universe and UID -> storage path table.

use crate::error::{PreprocessError, Result};
use constants::catalog::OBJECT_PATHS_FILE;
use flate2::read::GzDecoder;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Read-only view of the asset catalog.
/// UID order follows the source table unless an explicit UID list replaces it.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// UIDs in catalog order.
    uids: Vec<String>,
    /// Relative storage path for each mapped UID.
    paths: HashMap<String, String>,
}

impl Catalog {
    /// Builds a catalog from ordered (uid, path) pairs.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut catalog = Catalog::default();
        for (uid, path) in entries {
            if catalog.paths.insert(uid.clone(), path).is_none() {
                catalog.uids.push(uid);
            }
        }
        catalog
    }

    /// Loads a local path table, transparently decompressing `.gz` files.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| PreprocessError::io(path, e))?;
        let reader = BufReader::new(file);

        let is_gzip = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));

        let catalog = if is_gzip {
            Self::from_reader(GzDecoder::new(reader), path.display())?
        } else {
            Self::from_reader(reader, path.display())?
        };

        log::info!(
            "Loaded catalog with {} objects from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Downloads the published path table from the remote object store.
    /// Single blocking attempt; failures surface as network errors.
    pub fn fetch(base_url: &str) -> Result<Self> {
        let url = format!("{}/{}", base_url.trim_end_matches('/'), OBJECT_PATHS_FILE);
        log::info!("Fetching catalog path table from {}", url);

        let network = |source| PreprocessError::Network {
            url: url.clone(),
            source,
        };
        let bytes = reqwest::blocking::get(&url)
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.bytes())
            .map_err(network)?;

        let catalog = Self::from_reader(GzDecoder::new(&bytes[..]), &url)?;
        log::info!("Fetched catalog with {} objects", catalog.len());
        Ok(catalog)
    }

    /// Parses a JSON object of `uid: path` entries.
    /// Entries whose value is not a string are skipped.
    fn from_reader<R: Read>(reader: R, origin: impl std::fmt::Display) -> Result<Self> {
        let table: Map<String, Value> =
            serde_json::from_reader(reader).map_err(|e| PreprocessError::json(&origin, e))?;

        let mut skipped = 0usize;
        let entries: Vec<(String, String)> = table
            .into_iter()
            .filter_map(|(uid, value)| match value {
                Value::String(path) => Some((uid, path)),
                _ => {
                    skipped += 1;
                    None
                }
            })
            .collect();

        if skipped > 0 {
            log::warn!("Skipped {} non-string catalog entries in {}", skipped, origin);
        }

        Ok(Self::from_entries(entries))
    }

    /// Replaces the UID universe with an explicit list.
    /// Listed UIDs without a table entry simply have no path.
    pub fn with_uid_list(mut self, uids: Vec<String>) -> Self {
        self.uids = uids;
        self
    }

    pub fn uids(&self) -> &[String] {
        &self.uids
    }

    /// Relative storage path of a UID, if mapped.
    pub fn path(&self, uid: &str) -> Option<&str> {
        self.paths.get(uid).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.uids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uids.is_empty()
    }
}
