use crate::analysis::{fragmentation, size, AnalysisError};
use crate::models::{FragmentationReport, SizeReport};
use crate::source::{FactSource, SourceError};
use snafu::{ResultExt, Snafu};
use tracing::{info, warn};

#[derive(Debug, Snafu)]
pub enum RunnerError {
    #[snafu(display("Failed to load {}: {}", what, source))]
    LoadError {
        what: &'static str,
        source: SourceError,
    },

    #[snafu(display("Failed to compute {}: {}", report, source))]
    ComputeError {
        report: &'static str,
        source: AnalysisError,
    },
}

type Result<T, E = RunnerError> = std::result::Result<T, E>;

/// Pulls facts from a source and hands them to the report computations.
pub struct ReportRunner<S> {
    source: S,
}

impl<S: FactSource> ReportRunner<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn size_report(&self, top_n: usize) -> Result<SizeReport> {
        info!("Loading size records...");
        let records = self.source.size_records().context(LoadSnafu {
            what: "size records",
        })?;
        info!("Ranking {} size records (top {})", records.len(), top_n);

        let report = size::analyze_sizes(&records, top_n).context(ComputeSnafu {
            report: "size report",
        })?;

        if report.group_count > report.rows.len() {
            info!(
                "Omitted {} smaller property groups beyond the top {}",
                report.group_count - report.rows.len(),
                top_n
            );
        }
        Ok(report)
    }

    pub fn fragmentation_report(&self) -> Result<FragmentationReport> {
        info!("Loading index statistics...");
        let stats = self.source.index_stats().context(LoadSnafu {
            what: "index statistics",
        })?;
        if stats.is_empty() {
            warn!("No index statistics supplied; the fragmentation report will be empty");
        }

        let report = fragmentation::analyze_fragmentation(&stats).context(ComputeSnafu {
            report: "fragmentation report",
        })?;

        if report.summary.high_count > 0 {
            warn!(
                "{} indexes are highly fragmented and should be rebuilt",
                report.summary.high_count
            );
        }
        Ok(report)
    }
}
