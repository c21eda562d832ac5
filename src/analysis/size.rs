//! Ranks analysis properties by the amount of result data they store.

use super::units::{percentage_of, ChainedSize};
use super::{DivisionByZeroSnafu, EmptyInputSnafu, InvalidArgumentSnafu, Result};
use crate::models::{PropertyAggregate, PropertyKey, SizeRecord, SizeReport, SizeReportRow};
use itertools::Itertools;
use snafu::{ensure, OptionExt};
use std::collections::HashMap;
use tracing::debug;

/// Number of rows returned when no explicit limit is requested
pub const DEFAULT_TOP_N: usize = 20;

/// Largest `top_n` properties by total size, each annotated with its share
/// of the grand total across every record.
pub fn compute_size_report(records: &[SizeRecord], top_n: usize) -> Result<Vec<SizeReportRow>> {
    analyze_sizes(records, top_n).map(|report| report.rows)
}

/// Same ranking as [`compute_size_report`], keeping the totals alongside the
/// rows for presentation.
pub fn analyze_sizes(records: &[SizeRecord], top_n: usize) -> Result<SizeReport> {
    ensure!(
        top_n >= 1,
        InvalidArgumentSnafu {
            reason: "top_n must be at least 1"
        }
    );
    ensure!(!records.is_empty(), EmptyInputSnafu);

    let groups = aggregate_properties(records)?;
    let grand_total_bytes = grand_total(&groups)?;
    ensure!(grand_total_bytes > 0, DivisionByZeroSnafu);

    let group_count = groups.len();
    let rows = groups
        .into_iter()
        .sorted_by(|a, b| b.total_bytes.cmp(&a.total_bytes))
        .take(top_n)
        .map(|aggregate| to_report_row(&aggregate, grand_total_bytes))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        "Ranked {} of {} property groups ({} bytes total)",
        rows.len(),
        group_count,
        grand_total_bytes
    );

    Ok(SizeReport {
        top_n,
        group_count,
        grand_total_bytes,
        rows,
    })
}

/// Sums bytes per property and source table, keeping groups in the order
/// their first record was seen.
pub fn aggregate_properties(records: &[SizeRecord]) -> Result<Vec<PropertyAggregate>> {
    let mut positions: HashMap<PropertyKey, usize> = HashMap::new();
    let mut groups: Vec<PropertyAggregate> = Vec::new();

    for record in records {
        validate_record(record)?;

        let key = PropertyKey {
            site_id: record.site_id,
            analysis_id: record.analysis_id,
            property_id: record.property_id,
            source_table: record.source_table(),
        };
        let position = *positions.entry(key).or_insert_with(|| {
            groups.push(PropertyAggregate {
                key,
                total_bytes: 0,
            });
            groups.len() - 1
        });

        let group = &mut groups[position];
        group.total_bytes = group
            .total_bytes
            .checked_add(record.contributing_bytes())
            .with_context(|| InvalidArgumentSnafu {
                reason: format!(
                    "total bytes for site {} analysis {} property {} overflow",
                    key.site_id, key.analysis_id, key.property_id
                ),
            })?;
    }

    Ok(groups)
}

/// Only the byte count that contributes to the total is checked; the
/// other field is ignored entirely.
fn validate_record(record: &SizeRecord) -> Result<()> {
    let bytes = record.contributing_bytes();
    ensure!(
        bytes >= 0,
        InvalidArgumentSnafu {
            reason: format!(
                "negative size {} for computer {} (site {} analysis {} property {})",
                bytes, record.computer_id, record.site_id, record.analysis_id, record.property_id
            ),
        }
    );
    Ok(())
}

fn grand_total(groups: &[PropertyAggregate]) -> Result<i64> {
    groups
        .iter()
        .try_fold(0i64, |total, group| total.checked_add(group.total_bytes))
        .context(InvalidArgumentSnafu {
            reason: "grand total bytes overflow",
        })
}

fn to_report_row(aggregate: &PropertyAggregate, grand_total_bytes: i64) -> Result<SizeReportRow> {
    let size = ChainedSize::from_bytes(aggregate.total_bytes);
    let data_size_percentage =
        percentage_of(aggregate.total_bytes, grand_total_bytes).context(DivisionByZeroSnafu)?;

    Ok(SizeReportRow {
        site_id: aggregate.key.site_id,
        analysis_id: aggregate.key.analysis_id,
        property_id: aggregate.key.property_id,
        source_table: aggregate.key.source_table,
        total_bytes: aggregate.total_bytes,
        data_size_kb: size.kb,
        data_size_mb: size.mb,
        data_size_gb: size.gb,
        data_size_percentage,
    })
}
