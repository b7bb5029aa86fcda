//! CSV Data Loader Module
//! Reads click sources with Polars, every column kept as text.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Header names every source must carry.
pub const REQUIRED_COLUMNS: [&str; 6] = ["date", "time", "product", "device", "clicks", "clicks_rev"];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Source file not found: {0}")]
    Missing(PathBuf),
    #[error("Failed to load CSV {path}: {error}")]
    CsvError { path: PathBuf, error: PolarsError },
    #[error("{path} is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: &'static str },
}

/// A source file as read from disk, before any parsing.
#[derive(Debug, Clone)]
pub struct RawSource {
    pub name: String,
    pub df: DataFrame,
}

impl RawSource {
    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// Text cells of a column. Empty cells come back as `None`.
    pub fn text_column(&self, column: &str) -> PolarsResult<Vec<Option<String>>> {
        let values = self.df.column(column)?.str()?;
        Ok(values.into_iter().map(|v| v.map(str::to_string)).collect())
    }
}

/// Loads click sources from CSV files.
pub struct DataLoader;

impl DataLoader {
    /// Load a CSV file, checking the header contract.
    pub fn load_csv(path: impl AsRef<Path>) -> Result<RawSource, LoaderError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(LoaderError::Missing(path.to_path_buf()));
        }

        // Schema inference is off so dates, times and counts stay text
        // until the normalizer parses them explicitly.
        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()
            .and_then(|lazy| lazy.collect())
            .map_err(|error| LoaderError::CsvError {
                path: path.to_path_buf(),
                error,
            })?;

        for column in REQUIRED_COLUMNS {
            if df.get_column_index(column).is_none() {
                return Err(LoaderError::MissingColumn {
                    path: path.to_path_buf(),
                    column,
                });
            }
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        debug!(source = %name, rows = df.height(), "Loaded source");

        Ok(RawSource { name, df })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_keeps_text_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hlm.csv");
        fs::write(
            &path,
            "date,time,product,device,clicks,clicks_rev\n20/06/02,01:00:00,auto,mobile,12,3.5\n",
        )
        .unwrap();

        let source = DataLoader::load_csv(&path).unwrap();
        assert_eq!(source.name, "hlm.csv");
        assert_eq!(source.height(), 1);
        assert_eq!(
            source.text_column("clicks").unwrap(),
            vec![Some("12".to_string())]
        );
        assert_eq!(
            source.text_column("date").unwrap(),
            vec![Some("20/06/02".to_string())]
        );
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = DataLoader::load_csv(dir.path().join("absent.csv"));
        assert!(matches!(result, Err(LoaderError::Missing(_))));
    }

    #[test]
    fn test_missing_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pc.csv");
        fs::write(&path, "date,time,product,device,clicks\n2020-06-02,01:00:00,auto,mobile,1\n")
            .unwrap();

        match DataLoader::load_csv(&path) {
            Err(LoaderError::MissingColumn { column, .. }) => assert_eq!(column, "clicks_rev"),
            other => panic!("expected missing column, got {:?}", other),
        }
    }
}
