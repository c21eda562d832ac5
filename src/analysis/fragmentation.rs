use super::units::{pages_to_kilobytes, ChainedSize};
use super::{InvalidArgumentSnafu, Result};
use crate::models::{
    FragmentationReport, FragmentationReportRow, FragmentationStatus, FragmentationSummary,
    IndexStat,
};
use itertools::Itertools;
use snafu::{ensure, OptionExt};
use std::cmp::Ordering;
use tracing::debug;

/// Fragmentation at or above this percentage is `High`
pub const HIGH_FRAGMENTATION_PERCENT: f64 = 30.0;
/// Fragmentation at or above this percentage (and below high) is `Moderate`
pub const MODERATE_FRAGMENTATION_PERCENT: f64 = 10.0;

/// Annotates every index with its space usage and fragmentation band, most
/// fragmented first.
pub fn compute_fragmentation_report(stats: &[IndexStat]) -> Result<Vec<FragmentationReportRow>> {
    let rows = stats
        .iter()
        .map(to_report_row)
        .collect::<Result<Vec<_>>>()?;

    let rows: Vec<FragmentationReportRow> = rows
        .into_iter()
        .sorted_by(|a, b| {
            b.fragmentation_percent
                .partial_cmp(&a.fragmentation_percent)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.space_used_mb.cmp(&a.space_used_mb))
        })
        .collect();

    debug!("Classified fragmentation for {} indexes", rows.len());
    Ok(rows)
}

/// Fragmentation rows together with per-status counts and total space.
pub fn analyze_fragmentation(stats: &[IndexStat]) -> Result<FragmentationReport> {
    let rows = compute_fragmentation_report(stats)?;
    let summary = summarize(&rows)?;
    Ok(FragmentationReport { summary, rows })
}

/// Severity band for a measured (or unmeasured) fragmentation percentage.
pub fn classify(fragmentation_percent: Option<f64>) -> FragmentationStatus {
    let percent = fragmentation_percent.unwrap_or(0.0);
    if percent >= HIGH_FRAGMENTATION_PERCENT {
        FragmentationStatus::High
    } else if percent >= MODERATE_FRAGMENTATION_PERCENT {
        FragmentationStatus::Moderate
    } else {
        FragmentationStatus::Low
    }
}

fn to_report_row(stat: &IndexStat) -> Result<FragmentationReportRow> {
    ensure!(
        stat.page_count >= 0,
        InvalidArgumentSnafu {
            reason: format!("negative page count for index {}", qualified_name(stat)),
        }
    );
    ensure!(
        stat.record_count >= 0,
        InvalidArgumentSnafu {
            reason: format!("negative record count for index {}", qualified_name(stat)),
        }
    );
    if let Some(percent) = stat.fragmentation_percent {
        ensure!(
            percent.is_finite(),
            InvalidArgumentSnafu {
                reason: format!(
                    "fragmentation percent for index {} is not a number",
                    qualified_name(stat)
                ),
            }
        );
    }

    let space_used_kb = pages_to_kilobytes(stat.page_count).with_context(|| {
        InvalidArgumentSnafu {
            reason: format!("page count overflows for index {}", qualified_name(stat)),
        }
    })?;
    let space = ChainedSize::from_kilobytes(space_used_kb);

    Ok(FragmentationReportRow {
        table_name: stat.table_name.clone(),
        index_name: stat.index_name.clone(),
        index_type: stat.index_type.clone(),
        allocation_type: stat.allocation_type.clone(),
        page_count: stat.page_count,
        record_count: stat.record_count,
        fragmentation_percent: stat.fragmentation_percent,
        space_used_kb: space.kb,
        space_used_mb: space.mb,
        space_used_gb: space.gb,
        status: classify(stat.fragmentation_percent),
    })
}

fn summarize(rows: &[FragmentationReportRow]) -> Result<FragmentationSummary> {
    let mut summary = FragmentationSummary {
        index_count: rows.len(),
        ..FragmentationSummary::default()
    };

    let mut total_kb: i64 = 0;
    for row in rows {
        match row.status {
            FragmentationStatus::Low => summary.low_count += 1,
            FragmentationStatus::Moderate => summary.moderate_count += 1,
            FragmentationStatus::High => summary.high_count += 1,
        }
        total_kb = total_kb
            .checked_add(row.space_used_kb)
            .context(InvalidArgumentSnafu {
                reason: "total index space overflows",
            })?;
    }

    let total = ChainedSize::from_kilobytes(total_kb);
    summary.total_space_used_kb = total.kb;
    summary.total_space_used_mb = total.mb;
    summary.total_space_used_gb = total.gb;
    Ok(summary)
}

fn qualified_name(stat: &IndexStat) -> String {
    format!("{}.{}", stat.table_name, stat.index_name)
}
