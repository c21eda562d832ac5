use crate::analysis::size::DEFAULT_TOP_N;
use serde::{Deserialize, Serialize};
use snafu::{ensure, ResultExt, Snafu};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Snafu)]
pub enum ConfigError {
    #[snafu(display("Failed to read config file: {}", source))]
    FileRead { source: std::io::Error },

    #[snafu(display("Failed to parse YAML config: {}", source))]
    YamlParse { source: serde_yaml::Error },

    #[snafu(display("Report job '{}' must request at least one row (top_n: 0)", name))]
    InvalidTopN { name: String },
}

type Result<T, E = ConfigError> = std::result::Result<T, E>;

/// One report to run from a job file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReportJob {
    /// Largest analysis properties by stored result size
    Size {
        name: String,
        input: PathBuf,
        #[serde(default = "default_top_n")]
        top_n: usize,
    },
    /// Fragmentation and space usage for every index
    Fragmentation { name: String, input: PathBuf },
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

impl ReportJob {
    pub fn name(&self) -> &str {
        match self {
            ReportJob::Size { name, .. } | ReportJob::Fragmentation { name, .. } => name,
        }
    }

    /// Loads jobs from a YAML file. Relative input paths are resolved
    /// against the directory holding the job file.
    pub fn from_config_file(path: &str) -> Result<Vec<Self>> {
        let content = fs::read_to_string(path).context(FileReadSnafu)?;
        let base = Path::new(path).parent().unwrap_or_else(|| Path::new(""));
        Ok(Self::from_yaml(&content)?
            .into_iter()
            .map(|job| job.resolve_input(base))
            .collect())
    }

    fn resolve_input(mut self, base: &Path) -> Self {
        let input = match &mut self {
            ReportJob::Size { input, .. } | ReportJob::Fragmentation { input, .. } => input,
        };
        if input.is_relative() {
            *input = base.join(&*input);
        }
        self
    }

    pub fn from_yaml(content: &str) -> Result<Vec<Self>> {
        let jobs: Vec<ReportJob> = serde_yaml::from_str(content).context(YamlParseSnafu)?;
        for job in &jobs {
            if let ReportJob::Size { name, top_n, .. } = job {
                ensure!(*top_n >= 1, InvalidTopNSnafu { name: name.as_str() });
            }
        }
        Ok(jobs)
    }
}
