//! Airport code list files (`airport_<REGION>.txt`).

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error_handling::AirportListError;

fn list_path(data_dir: &Path, region: &str) -> PathBuf {
    data_dir.join(format!("airport_{}.txt", region.trim().to_ascii_uppercase()))
}

/// Loads the ordered, deduplicated IATA codes for `region`.
///
/// One code per line; blank lines and `#` comments are skipped and codes are
/// upper-cased. The first occurrence of a duplicate keeps its position.
///
/// # Errors
///
/// `EmptyRegion` for a blank region, `NotFound` when the list file does not
/// exist, `Io` for read failures.
pub fn load_airport_codes(data_dir: &Path, region: &str) -> Result<Vec<String>, AirportListError> {
    if region.trim().is_empty() {
        return Err(AirportListError::EmptyRegion);
    }
    let path = list_path(data_dir, region);
    if !path.is_file() {
        return Err(AirportListError::NotFound(path));
    }

    let text = fs::read_to_string(&path)?;
    let mut seen = HashSet::new();
    let codes = text
        .lines()
        .map(|line| line.trim().to_ascii_uppercase())
        .filter(|code| !code.is_empty() && !code.starts_with('#'))
        .filter(|code| seen.insert(code.clone()))
        .collect();
    Ok(codes)
}

/// Region tokens with a list file in `data_dir`, sorted and upper-cased.
///
/// A missing directory yields an empty list.
pub fn available_regions(data_dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(data_dir) else {
        return Vec::new();
    };
    let mut regions: Vec<String> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            let region = name.strip_prefix("airport_")?.strip_suffix(".txt")?;
            (!region.is_empty()).then(|| region.to_ascii_uppercase())
        })
        .collect();
    regions.sort();
    regions.dedup();
    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_dedupes_and_skips_comments() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("airport_JP.txt"),
            "# Japan\nhnd\nNRT\n\n  kix  \nHND\n#NGO\n",
        )
        .expect("write");

        let codes = load_airport_codes(dir.path(), "jp").expect("codes");
        assert_eq!(codes, vec!["HND", "NRT", "KIX"]);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            load_airport_codes(dir.path(), " "),
            Err(AirportListError::EmptyRegion)
        ));
        match load_airport_codes(dir.path(), "US") {
            Err(AirportListError::NotFound(path)) => {
                assert!(path.ends_with("airport_US.txt"));
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_available_regions() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in ["airport_us.txt", "airport_JP.txt", "airport_.txt", "notes.txt"] {
            fs::write(dir.path().join(name), "X\n").expect("write");
        }
        assert_eq!(available_regions(dir.path()), vec!["JP", "US"]);
        assert!(available_regions(&dir.path().join("missing")).is_empty());
    }
}
