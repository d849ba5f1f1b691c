//! Path-heuristic quality filter over a seeded catalog sample.

use crate::catalog::Catalog;
use constants::catalog::{ACCEPTED_EXTENSION, EXCLUSION_TERMS, MIN_PATH_LENGTH};
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::BTreeMap;

/// Reason a sampled UID was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    MissingPath,
    WrongExtension,
    ExcludedTerm(String),
    TooShort,
}

impl Rejection {
    pub fn label(&self) -> &'static str {
        match self {
            Rejection::MissingPath => "missing path",
            Rejection::WrongExtension => "wrong extension",
            Rejection::ExcludedTerm(_) => "excluded term",
            Rejection::TooShort => "path too short",
        }
    }
}

/// Acceptance rules applied to each catalog path.
#[derive(Debug, Clone)]
pub struct FilterRules {
    /// Required path suffix, matched case-sensitively.
    pub extension: String,
    /// Lowercase fragments that disqualify a path.
    pub exclusion_terms: Vec<String>,
    /// Minimum path length in characters.
    pub min_path_len: usize,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            extension: ACCEPTED_EXTENSION.to_string(),
            exclusion_terms: EXCLUSION_TERMS.iter().map(|t| t.to_string()).collect(),
            min_path_len: MIN_PATH_LENGTH,
        }
    }
}

impl FilterRules {
    /// Checks a catalog path against every rule in order:
    /// presence, extension, exclusion terms, then length.
    pub fn check(&self, path: Option<&str>) -> Result<(), Rejection> {
        let path = match path {
            Some(p) if !p.is_empty() => p,
            _ => return Err(Rejection::MissingPath),
        };

        if !path.ends_with(&self.extension) {
            return Err(Rejection::WrongExtension);
        }

        let lowered = path.to_lowercase();
        if let Some(term) = self
            .exclusion_terms
            .iter()
            .find(|term| lowered.contains(&term.to_lowercase()))
        {
            return Err(Rejection::ExcludedTerm(term.clone()));
        }

        if path.chars().count() < self.min_path_len {
            return Err(Rejection::TooShort);
        }

        Ok(())
    }
}

/// Outcome of one filter run.
#[derive(Debug, Clone, Default)]
pub struct FilterReport {
    /// UIDs drawn from the catalog.
    pub sampled: usize,
    /// Surviving UIDs in sample order.
    pub passed: Vec<String>,
    /// Rejection counts keyed by reason.
    pub rejected: BTreeMap<&'static str, usize>,
}

pub struct CatalogFilter {
    rules: FilterRules,
}

impl CatalogFilter {
    pub fn new(rules: FilterRules) -> Self {
        Self { rules }
    }

    /// Draws `min(sample_size, len)` distinct UIDs, seeded for reproducibility.
    pub fn sample<'c>(catalog: &'c Catalog, sample_size: usize, seed: u64) -> Vec<&'c str> {
        let uids = catalog.uids();
        let amount = sample_size.min(uids.len());
        let mut rng = StdRng::seed_from_u64(seed);

        rand::seq::index::sample(&mut rng, uids.len(), amount)
            .into_iter()
            .map(|idx| uids[idx].as_str())
            .collect()
    }

    /// Samples the catalog and keeps UIDs whose paths pass every rule.
    /// Unmapped UIDs are counted as rejections, never errors.
    pub fn run(&self, catalog: &Catalog, sample_size: usize, seed: u64) -> FilterReport {
        if catalog.is_empty() {
            log::warn!("Catalog is empty, nothing to filter");
        }

        let sampled = Self::sample(catalog, sample_size, seed);
        log::info!(
            "Sampled {} of {} catalog UIDs (seed {})",
            sampled.len(),
            catalog.len(),
            seed
        );

        let pb = ProgressBar::new(sampled.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:40.green/blue}] {pos}/{len} uids ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("▉▊▋▌▍▎▏ "),
        );
        pb.set_message("Filtering on paths");

        let mut report = FilterReport {
            sampled: sampled.len(),
            ..Default::default()
        };

        for uid in sampled {
            match self.rules.check(catalog.path(uid)) {
                Ok(()) => report.passed.push(uid.to_string()),
                Err(rejection) => {
                    log::trace!("Rejected {}: {:?}", uid, rejection);
                    *report.rejected.entry(rejection.label()).or_insert(0) += 1;
                }
            }
            pb.inc(1);
        }

        pb.finish_with_message("Filtering done");

        log::info!(
            "Filtered: {}/{} objects passed",
            report.passed.len(),
            report.sampled
        );
        for (reason, count) in &report.rejected {
            log::info!("  {}: {}", reason, count);
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        let entries = (0..200).map(|i| {
            let path = match i % 5 {
                0 => format!("glbs/000-{:03}/object{:04}.glb", i, i),
                1 => format!("glbs/000-{:03}/Test_Item{:04}.glb", i, i),
                2 => format!("glbs/000-{:03}/mesh{:04}.fbx", i, i),
                3 => "a.glb".to_string(),
                _ => String::new(),
            };
            (format!("uid{:04}", i), path)
        });
        Catalog::from_entries(entries)
    }

    #[test]
    fn same_seed_gives_same_output() {
        let filter = CatalogFilter::new(FilterRules::default());
        let catalog = catalog();

        let first = filter.run(&catalog, 50, 42);
        let second = filter.run(&catalog, 50, 42);

        assert_eq!(first.passed, second.passed);
        assert_eq!(first.sampled, 50);
    }

    #[test]
    fn survivors_satisfy_every_rule() {
        let rules = FilterRules::default();
        let catalog = catalog();
        let report = CatalogFilter::new(rules.clone()).run(&catalog, 500, 7);

        assert_eq!(report.sampled, 200);
        assert_eq!(report.passed.len(), 40);
        for uid in &report.passed {
            let path = catalog.path(uid).unwrap();
            let lowered = path.to_lowercase();
            assert!(path.ends_with(".glb"));
            assert!(path.len() >= rules.min_path_len);
            assert!(rules.exclusion_terms.iter().all(|t| !lowered.contains(t)));
        }
        let rejected: usize = report.rejected.values().sum();
        assert_eq!(rejected + report.passed.len(), report.sampled);
    }

    #[test]
    fn check_reports_first_failing_rule() {
        let rules = FilterRules::default();

        assert_eq!(rules.check(None), Err(Rejection::MissingPath));
        assert_eq!(rules.check(Some("")), Err(Rejection::MissingPath));
        assert_eq!(
            rules.check(Some("glbs/object.GLB")),
            Err(Rejection::WrongExtension)
        );
        assert_eq!(
            rules.check(Some("glbs/My-LowPoly-car.glb")),
            Err(Rejection::ExcludedTerm("lowpoly".to_string()))
        );
        assert_eq!(rules.check(Some("x/a.glb")), Err(Rejection::TooShort));
        assert_eq!(rules.check(Some("glbs/000-001/chair.glb")), Ok(()));
    }

    #[test]
    fn sample_never_exceeds_catalog() {
        let catalog = Catalog::from_entries([
            ("a".to_string(), "glbs/000-001/a.glb".to_string()),
            ("b".to_string(), "glbs/000-001/b.glb".to_string()),
        ]);

        let mut sampled = CatalogFilter::sample(&catalog, 10, 1);
        sampled.sort();

        assert_eq!(sampled, ["a", "b"]);
    }
}
