//! Where report facts come from. Querying the live database is left to
//! whatever produces these files; this crate only reads the exported rows.

use crate::models::{IndexStat, SizeRecord};
use serde::de::DeserializeOwned;
use snafu::{ResultExt, Snafu};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Snafu)]
pub enum SourceError {
    #[snafu(display("Failed to read facts from {}: {}", path.display(), source))]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Failed to parse JSON facts in {}: {}", path.display(), source))]
    JsonParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[snafu(display("Failed to parse YAML facts in {}: {}", path.display(), source))]
    YamlParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[snafu(display("Unsupported fact file format: {} (expected .json, .yaml or .yml)", path.display()))]
    UnsupportedFormat { path: PathBuf },

    #[snafu(display("No {} input was configured", kind))]
    MissingInput { kind: &'static str },
}

type Result<T, E = SourceError> = std::result::Result<T, E>;

/// Supplies the raw facts both reports are computed from.
pub trait FactSource {
    fn size_records(&self) -> Result<Vec<SizeRecord>>;
    fn index_stats(&self) -> Result<Vec<IndexStat>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FactFormat {
    Json,
    Yaml,
}

impl FactFormat {
    fn from_path(path: &Path) -> Result<Self> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => Ok(Self::Json),
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            _ => UnsupportedFormatSnafu { path }.fail(),
        }
    }
}

/// Facts exported to JSON or YAML files, one array of rows per file.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    size_records_path: Option<PathBuf>,
    index_stats_path: Option<PathBuf>,
}

impl FileSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size_records(mut self, path: impl Into<PathBuf>) -> Self {
        self.size_records_path = Some(path.into());
        self
    }

    pub fn with_index_stats(mut self, path: impl Into<PathBuf>) -> Self {
        self.index_stats_path = Some(path.into());
        self
    }
}

impl FactSource for FileSource {
    fn size_records(&self) -> Result<Vec<SizeRecord>> {
        let path = self
            .size_records_path
            .as_deref()
            .ok_or(SourceError::MissingInput {
                kind: "size record",
            })?;
        read_rows(path)
    }

    fn index_stats(&self) -> Result<Vec<IndexStat>> {
        let path = self
            .index_stats_path
            .as_deref()
            .ok_or(SourceError::MissingInput {
                kind: "index statistics",
            })?;
        read_rows(path)
    }
}

/// Facts already held in memory, e.g. fixtures or rows fetched elsewhere.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    pub size_records: Vec<SizeRecord>,
    pub index_stats: Vec<IndexStat>,
}

impl FactSource for StaticSource {
    fn size_records(&self) -> Result<Vec<SizeRecord>> {
        Ok(self.size_records.clone())
    }

    fn index_stats(&self) -> Result<Vec<IndexStat>> {
        Ok(self.index_stats.clone())
    }
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let format = FactFormat::from_path(path)?;
    let content = fs::read_to_string(path).context(FileReadSnafu { path })?;

    let rows: Vec<T> = match format {
        FactFormat::Json => serde_json::from_str(&content).context(JsonParseSnafu { path })?,
        FactFormat::Yaml => serde_yaml::from_str(&content).context(YamlParseSnafu { path })?,
    };

    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[rstest]
    #[case("facts.json", Some(FactFormat::Json))]
    #[case("facts.YAML", Some(FactFormat::Yaml))]
    #[case("facts.yml", Some(FactFormat::Yaml))]
    #[case("facts.csv", None)]
    #[case("facts", None)]
    fn detects_format_from_extension(#[case] name: &str, #[case] expected: Option<FactFormat>) {
        assert_eq!(FactFormat::from_path(Path::new(name)).ok(), expected);
    }

    #[test]
    fn reads_size_records_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "sizes.json",
            r#"[
                {"site_id": 1, "analysis_id": 2, "property_id": 3, "computer_id": 4, "primary_bytes": 300},
                {"site_id": 1, "analysis_id": 2, "property_id": 3, "computer_id": 5, "primary_bytes": null, "overflow_bytes": 700}
            ]"#,
        );

        let records = FileSource::new()
            .with_size_records(&path)
            .size_records()
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].overflow_bytes, Some(700));
    }

    #[test]
    fn reads_index_stats_from_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "indexes.yaml",
            r#"
- table_name: QUESTIONRESULTS
  index_name: PK_QUESTIONRESULTS
  index_type: CLUSTERED INDEX
  allocation_type: IN_ROW_DATA
  page_count: 1200
  record_count: 48000
  fragmentation_percent: 31.5
- table_name: LONGQUESTIONRESULTS
  index_name: PK_LONGQUESTIONRESULTS
  index_type: CLUSTERED INDEX
  allocation_type: LOB_DATA
  page_count: 40
  record_count: 0
"#,
        );

        let stats = FileSource::new().with_index_stats(&path).index_stats().unwrap();

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].fragmentation_percent, Some(31.5));
        assert_eq!(stats[1].fragmentation_percent, None);
    }

    #[test]
    fn missing_input_is_reported() {
        let err = FileSource::new().index_stats().unwrap_err();
        assert!(matches!(err, SourceError::MissingInput { .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "sizes.json", "{not json");

        let err = FileSource::new()
            .with_size_records(&path)
            .size_records()
            .unwrap_err();

        assert!(matches!(err, SourceError::JsonParse { .. }));
    }
}
