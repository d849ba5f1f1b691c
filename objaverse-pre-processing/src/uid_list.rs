//! Flat JSON string lists shared by every stage (UIDs, URLs, splits)

use crate::error::{PreprocessError, Result};
use std::fs;
use std::path::Path;

/// Reads a JSON array of strings.
pub fn read_string_list(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).map_err(|e| PreprocessError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| PreprocessError::json(path.display(), e))
}

/// Writes a JSON array of strings with 2-space indentation.
/// Missing parent directories are created.
pub fn write_string_list(path: &Path, items: &[String]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PreprocessError::io(parent, e))?;
    }

    let json = serde_json::to_string_pretty(items)
        .map_err(|e| PreprocessError::json(path.display(), e))?;
    fs::write(path, json).map_err(|e| PreprocessError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn lists_use_two_space_indent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("uids.json");
        let items = vec!["a".to_string(), "b".to_string()];

        write_string_list(&path, &items).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "[\n  \"a\",\n  \"b\"\n]");
        assert_eq!(read_string_list(&path).unwrap(), items);
    }

    #[test]
    fn malformed_list_is_a_json_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{\"not\": \"a list\"}").unwrap();

        assert!(matches!(
            read_string_list(&path),
            Err(PreprocessError::Json { .. })
        ));
    }
}
