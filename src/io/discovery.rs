use crate::types::{LstError, LstResult};
use glob::glob;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Monthly input rasters are named `<PRODUCT>_<YEAR>_<MONTH>_<SUFFIX>.tif`,
/// e.g. `DLST_2024_03_RD_clean.tif`.
///
/// Matches are returned sorted by filename, which both orders the months
/// chronologically (zero-padded month token) and makes the canonical-profile
/// rule deterministic: the lexicographically first file defines the output
/// georeferencing.
pub fn monthly_rasters(input_dir: &Path, product: &str, year: u16) -> LstResult<Vec<PathBuf>> {
    let pattern = input_dir
        .join(format!("{}_{}_*.tif", product, year))
        .to_string_lossy()
        .to_string();
    log::debug!("Searching for monthly rasters: {}", pattern);

    // Month token must be numeric so the yearly average output
    // (<PRODUCT>_<YEAR>_average.tif) never matches its own inputs.
    let month_re = Regex::new(&format!(r"^{}_{}_(\d{{1,2}})_.+\.tif$", product, year))
        .map_err(|e| LstError::Processing(format!("Invalid discovery pattern: {}", e)))?;

    let mut files = Vec::new();
    let entries = glob(&pattern)
        .map_err(|e| LstError::Processing(format!("Invalid glob pattern: {}", e)))?;

    for entry in entries {
        let path = entry.map_err(|e| LstError::Processing(format!("Glob error: {}", e)))?;
        if let Some(filename) = path.file_name().and_then(|n| n.to_str()) {
            if month_re.is_match(filename) {
                files.push(path);
            } else {
                log::debug!("Skipping non-monthly file: {}", filename);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Output name for a year's averaged composite
pub fn average_raster_name(product: &str, year: u16) -> String {
    format!("{}_{}_average.tif", product, year)
}

/// Output name for a year's rendered overlay image
pub fn overlay_image_name(product: &str, year: u16) -> String {
    format!("{}_{}.png", product.to_lowercase(), year)
}

/// Name of the aggregated metadata record
pub fn metadata_file_name(product: &str) -> String {
    format!("{}_metadata.json", product.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_discovery_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "DLST_2024_03_RD_clean.tif",
            "DLST_2024_01_RD_clean.tif",
            "DLST_2024_average.tif",
            "DLST_2023_01_RD_clean.tif",
            "notes.txt",
        ] {
            File::create(dir.path().join(name)).unwrap();
        }

        let files = monthly_rasters(dir.path(), "DLST", 2024).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();

        assert_eq!(
            names,
            vec!["DLST_2024_01_RD_clean.tif", "DLST_2024_03_RD_clean.tif"]
        );
    }

    #[test]
    fn test_discovery_empty_dir_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let files = monthly_rasters(dir.path(), "DLST", 2024).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_output_names() {
        assert_eq!(average_raster_name("DLST", 2024), "DLST_2024_average.tif");
        assert_eq!(overlay_image_name("DLST", 2024), "dlst_2024.png");
        assert_eq!(metadata_file_name("DLST"), "dlst_metadata.json");
    }
}
