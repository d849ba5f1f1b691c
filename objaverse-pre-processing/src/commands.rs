//! Subcommand drivers: load inputs, run one stage, write outputs.

use crate::batcher::{BatchWriter, UrlResolver, remaining_path, remove_completed};
use crate::completion::CompletionScanner;
use crate::filter::{CatalogFilter, FilterRules};
use crate::settings::Command;
use crate::splitter::{list_render_dirs, split_uids, write_split};
use crate::uid_list::{read_string_list, write_string_list};
use anyhow::{Context, Result};

pub fn run(command: Command) -> Result<()> {
    match command {
        Command::Filter {
            catalog,
            uids,
            sample_size,
            seed,
            output_file,
        } => {
            let catalog = Command::load_catalog(&catalog, uids.as_ref())
                .context("Failed to load catalog")?;
            let report = CatalogFilter::new(FilterRules::default()).run(&catalog, sample_size, seed);

            write_string_list(&output_file, &report.passed)?;
            log::info!(
                "Saved {} filtered UIDs to {}",
                report.passed.len(),
                output_file.display()
            );
        }
        Command::Batch {
            catalog,
            filtered_file,
            output_name,
            batch_size,
            output_dir,
            skip_completed,
            renders_dir,
        } => {
            let mut uids = read_string_list(&filtered_file)
                .with_context(|| format!("Failed to read {}", filtered_file.display()))?;
            log::info!("Loaded {} filtered UIDs", uids.len());

            if skip_completed {
                let completed = CompletionScanner::default().scan(&renders_dir);
                uids = remove_completed(uids, &completed);

                let updated = remaining_path(&filtered_file);
                write_string_list(&updated, &uids)?;
                log::info!(
                    "Filtered to {} remaining objects (saved to {})",
                    uids.len(),
                    updated.display()
                );
            }

            let table = catalog.load().context("Failed to load catalog")?;
            let resolution = UrlResolver::new(&catalog.base_url).resolve(&uids, &table);
            let output =
                BatchWriter::new(&output_dir, &output_name).write(&resolution.urls, batch_size)?;
            log::info!(
                "Created {} batch files in {} (full list: {})",
                output.batch_files.len(),
                output_dir.display(),
                output.all_file.display()
            );
        }
        Command::Scan {
            renders_dir,
            strict,
            output_file,
        } => {
            let completed = CompletionScanner::default().strict(strict).scan(&renders_dir);
            if let Some(path) = output_file {
                let list: Vec<String> = completed.into_iter().collect();
                write_string_list(&path, &list)?;
                log::info!("Saved {} completed UIDs to {}", list.len(), path.display());
            }
        }
        Command::Split {
            renders_dir,
            output_dir,
            prefix,
            ratio,
            seed,
        } => {
            let uids = list_render_dirs(&renders_dir)?;
            let split = split_uids(uids, ratio, seed)?;
            write_split(&split, &output_dir, &prefix)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::CatalogArgs;
    use constants::layout::{CAMERAS_FILE, VIEWS_DIR, depth_file_name};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn write_completed_render(renders_dir: &Path, uid: &str) {
        let views = renders_dir.join(uid).join(VIEWS_DIR);
        fs::create_dir_all(&views).unwrap();
        for view in 0..16 {
            fs::write(views.join(depth_file_name(view)), b"depth").unwrap();
        }
        fs::write(views.join(CAMERAS_FILE), "[]").unwrap();
    }

    #[test]
    fn batch_skips_completed_renders() {
        let inputs = tempdir().unwrap();
        let renders = tempdir().unwrap();
        let batches = tempdir().unwrap();

        let filtered_file = inputs.path().join("filtered.json");
        let uids = ["a", "b", "c"].map(String::from);
        write_string_list(&filtered_file, &uids).unwrap();

        let catalog_file = inputs.path().join("object-paths.json");
        fs::write(
            &catalog_file,
            r#"{"a": "glbs/000-001/a.glb", "b": "glbs/000-001/b.glb", "c": "glbs/000-002/c.glb"}"#,
        )
        .unwrap();
        write_completed_render(renders.path(), "b");

        run(Command::Batch {
            catalog: CatalogArgs {
                catalog: Some(catalog_file),
                remote: false,
                base_url: "https://host/main/".to_string(),
            },
            filtered_file: filtered_file.clone(),
            output_name: "part".to_string(),
            batch_size: 1,
            output_dir: batches.path().to_path_buf(),
            skip_completed: true,
            renders_dir: renders.path().to_path_buf(),
        })
        .unwrap();

        let remaining = read_string_list(&inputs.path().join("filtered_remaining.json")).unwrap();
        assert_eq!(remaining, ["a", "c"]);
        // The input list itself is left untouched.
        assert_eq!(read_string_list(&filtered_file).unwrap(), uids);

        let expected = [
            "https://host/main/glbs/000-001/a.glb".to_string(),
            "https://host/main/glbs/000-002/c.glb".to_string(),
        ];
        let writer = BatchWriter::new(batches.path(), "part");
        assert_eq!(read_string_list(&writer.all_path()).unwrap(), expected);
        assert_eq!(read_string_list(&writer.batch_path(0)).unwrap(), expected[..1]);
        assert_eq!(read_string_list(&writer.batch_path(1)).unwrap(), expected[1..]);
        assert!(!writer.batch_path(2).exists());
    }
}
