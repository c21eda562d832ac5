use crate::analysis::units::format_bytes;
use crate::models::{
    FragmentationReport, FragmentationReportRow, FragmentationStatus, SizeReport,
};
use clap::ValueEnum;
use snafu::{ResultExt, Snafu};
use std::io::Write;

#[derive(Debug, Snafu)]
pub enum ReporterError {
    #[snafu(display("Failed to write output: {}", source))]
    OutputError { source: std::io::Error },

    #[snafu(display("Failed to serialize report: {}", source))]
    SerializeError { source: serde_json::Error },
}

type Result<T, E = ReporterError> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ReportFormat {
    /// Markdown formatted report
    Markdown,
    /// JSON formatted report
    Json,
    /// Plain text summary
    Text,
}

/// Renders computed reports; holds no state beyond the output format.
pub struct Reporter {
    format: ReportFormat,
}

impl Reporter {
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    pub fn report_size<W: Write>(&self, report: &SizeReport, out: &mut W) -> Result<()> {
        match self.format {
            ReportFormat::Markdown => self.size_markdown(report, out),
            ReportFormat::Json => write_json(report, out),
            ReportFormat::Text => self.size_text(report, out),
        }
    }

    pub fn report_fragmentation<W: Write>(
        &self,
        report: &FragmentationReport,
        out: &mut W,
    ) -> Result<()> {
        match self.format {
            ReportFormat::Markdown => self.fragmentation_markdown(report, out),
            ReportFormat::Json => write_json(report, out),
            ReportFormat::Text => self.fragmentation_text(report, out),
        }
    }

    fn size_markdown<W: Write>(&self, report: &SizeReport, out: &mut W) -> Result<()> {
        writeln!(out, "# Largest Analysis Properties\n").context(OutputSnafu)?;

        writeln!(out, "- **Property Groups**: {}", report.group_count).context(OutputSnafu)?;
        writeln!(
            out,
            "- **Grand Total**: {}",
            format_bytes(report.grand_total_bytes)
        )
        .context(OutputSnafu)?;
        writeln!(out, "- **Showing**: top {}", report.top_n).context(OutputSnafu)?;
        writeln!(out).context(OutputSnafu)?;

        writeln!(
            out,
            "| Site | Analysis | Property | Source | Bytes | KB | MB | GB | % of Total |"
        )
        .context(OutputSnafu)?;
        writeln!(
            out,
            "|------|----------|----------|--------|-------|----|----|----|------------|"
        )
        .context(OutputSnafu)?;

        for row in &report.rows {
            writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} | {} | {} | {:.2} |",
                row.site_id,
                row.analysis_id,
                row.property_id,
                row.source_table.as_str(),
                row.total_bytes,
                row.data_size_kb,
                row.data_size_mb,
                row.data_size_gb,
                row.data_size_percentage
            )
            .context(OutputSnafu)?;
        }
        writeln!(out).context(OutputSnafu)?;

        Ok(())
    }

    fn size_text<W: Write>(&self, report: &SizeReport, out: &mut W) -> Result<()> {
        writeln!(out, "Largest Analysis Properties").context(OutputSnafu)?;
        writeln!(out, "===========================\n").context(OutputSnafu)?;

        writeln!(out, "Summary:").context(OutputSnafu)?;
        writeln!(out, "  Property groups: {}", report.group_count).context(OutputSnafu)?;
        writeln!(
            out,
            "  Grand total:     {}",
            format_bytes(report.grand_total_bytes)
        )
        .context(OutputSnafu)?;
        writeln!(out, "  Showing:         top {}", report.top_n).context(OutputSnafu)?;
        writeln!(out).context(OutputSnafu)?;

        for (rank, row) in report.rows.iter().enumerate() {
            writeln!(
                out,
                "  #{} site {} / analysis {} / property {} [{}]",
                rank + 1,
                row.site_id,
                row.analysis_id,
                row.property_id,
                row.source_table.as_str()
            )
            .context(OutputSnafu)?;
            writeln!(
                out,
                "    {} bytes ({} KB, {} MB, {} GB), {:.2}% of total",
                row.total_bytes,
                row.data_size_kb,
                row.data_size_mb,
                row.data_size_gb,
                row.data_size_percentage
            )
            .context(OutputSnafu)?;
        }

        Ok(())
    }

    fn fragmentation_markdown<W: Write>(
        &self,
        report: &FragmentationReport,
        out: &mut W,
    ) -> Result<()> {
        let summary = &report.summary;

        writeln!(out, "# Index Fragmentation Report\n").context(OutputSnafu)?;

        writeln!(out, "- **Indexes**: {}", summary.index_count).context(OutputSnafu)?;
        for (status, count) in [
            (FragmentationStatus::High, summary.high_count),
            (FragmentationStatus::Moderate, summary.moderate_count),
            (FragmentationStatus::Low, summary.low_count),
        ] {
            if count > 0 {
                writeln!(
                    out,
                    "- **{} ({})**: {} indexes",
                    status.as_str(),
                    self.format_status_badge(status),
                    count
                )
                .context(OutputSnafu)?;
            }
        }
        writeln!(
            out,
            "- **Total Space Used**: {} KB ({} MB, {} GB)",
            summary.total_space_used_kb, summary.total_space_used_mb, summary.total_space_used_gb
        )
        .context(OutputSnafu)?;
        writeln!(out).context(OutputSnafu)?;

        if report.rows.is_empty() {
            return Ok(());
        }

        writeln!(
            out,
            "| Table | Index | Type | Allocation | Pages | Records | Fragmentation % | KB | MB | GB | Status | Action |"
        )
        .context(OutputSnafu)?;
        writeln!(
            out,
            "|-------|-------|------|------------|-------|---------|-----------------|----|----|----|--------|--------|"
        )
        .context(OutputSnafu)?;

        for row in &report.rows {
            writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} | {} | {} | {} | {} | {} | {} |",
                row.table_name,
                row.index_name,
                row.index_type,
                row.allocation_type,
                row.page_count,
                row.record_count,
                format_percent(row),
                row.space_used_kb,
                row.space_used_mb,
                row.space_used_gb,
                row.status.as_str(),
                row.status.maintenance_action().unwrap_or("-")
            )
            .context(OutputSnafu)?;
        }
        writeln!(out).context(OutputSnafu)?;

        Ok(())
    }

    fn fragmentation_text<W: Write>(
        &self,
        report: &FragmentationReport,
        out: &mut W,
    ) -> Result<()> {
        let summary = &report.summary;

        writeln!(out, "Index Fragmentation Report").context(OutputSnafu)?;
        writeln!(out, "==========================\n").context(OutputSnafu)?;

        writeln!(out, "Summary:").context(OutputSnafu)?;
        writeln!(out, "  Indexes:  {}", summary.index_count).context(OutputSnafu)?;
        writeln!(out, "  High:     {}", summary.high_count).context(OutputSnafu)?;
        writeln!(out, "  Moderate: {}", summary.moderate_count).context(OutputSnafu)?;
        writeln!(out, "  Low:      {}", summary.low_count).context(OutputSnafu)?;
        writeln!(
            out,
            "  Space:    {} KB ({} MB, {} GB)",
            summary.total_space_used_kb, summary.total_space_used_mb, summary.total_space_used_gb
        )
        .context(OutputSnafu)?;

        for row in &report.rows {
            writeln!(out).context(OutputSnafu)?;
            writeln!(
                out,
                "  [{}] {}.{}",
                self.format_status_text(row.status),
                row.table_name,
                row.index_name
            )
            .context(OutputSnafu)?;
            writeln!(
                out,
                "    Type:          {} ({})",
                row.index_type, row.allocation_type
            )
            .context(OutputSnafu)?;
            writeln!(
                out,
                "    Pages:         {} ({} records)",
                row.page_count, row.record_count
            )
            .context(OutputSnafu)?;
            writeln!(out, "    Fragmentation: {}", format_percent(row)).context(OutputSnafu)?;
            writeln!(
                out,
                "    Space used:    {} KB / {} MB / {} GB",
                row.space_used_kb, row.space_used_mb, row.space_used_gb
            )
            .context(OutputSnafu)?;
            if let Some(action) = row.status.maintenance_action() {
                writeln!(out, "    Action:        {}", action).context(OutputSnafu)?;
            }
        }

        Ok(())
    }

    fn format_status_badge(&self, status: FragmentationStatus) -> &'static str {
        match status {
            FragmentationStatus::High => "![HIGH](https://img.shields.io/badge/HIGH-red)",
            FragmentationStatus::Moderate => {
                "![MODERATE](https://img.shields.io/badge/MODERATE-orange)"
            }
            FragmentationStatus::Low => "![LOW](https://img.shields.io/badge/LOW-green)",
        }
    }

    fn format_status_text(&self, status: FragmentationStatus) -> &'static str {
        match status {
            FragmentationStatus::High => "HIGH",
            FragmentationStatus::Moderate => "MOD",
            FragmentationStatus::Low => "LOW",
        }
    }
}

fn format_percent(row: &FragmentationReportRow) -> String {
    row.fragmentation_percent
        .map(|percent| format!("{:.2}%", percent))
        .unwrap_or_else(|| "n/a".to_string())
}

fn write_json<T: serde::Serialize, W: Write>(report: &T, out: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report).context(SerializeSnafu)?;
    writeln!(out).context(OutputSnafu)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{fragmentation, size};
    use crate::models::{IndexStat, SizeRecord};

    fn index(name: &str, page_count: i64, fragmentation_percent: Option<f64>) -> IndexStat {
        IndexStat {
            table_name: "QUESTIONRESULTS".into(),
            index_name: name.into(),
            index_type: "NONCLUSTERED INDEX".into(),
            allocation_type: "IN_ROW_DATA".into(),
            page_count,
            record_count: 12_000,
            fragmentation_percent,
        }
    }

    fn render_fragmentation(format: ReportFormat, stats: &[IndexStat]) -> String {
        let report = fragmentation::analyze_fragmentation(stats).unwrap();
        let mut buffer = Vec::new();
        Reporter::new(format)
            .report_fragmentation(&report, &mut buffer)
            .unwrap();
        String::from_utf8(buffer).unwrap()
    }

    fn render_size(format: ReportFormat) -> String {
        let records = vec![
            SizeRecord {
                site_id: 1,
                analysis_id: 1,
                property_id: 1,
                computer_id: 1,
                primary_bytes: Some(300),
                overflow_bytes: None,
            },
            SizeRecord {
                site_id: 1,
                analysis_id: 1,
                property_id: 1,
                computer_id: 2,
                primary_bytes: None,
                overflow_bytes: Some(700),
            },
        ];
        let report = size::analyze_sizes(&records, 20).unwrap();
        let mut buffer = Vec::new();
        Reporter::new(format).report_size(&report, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn fragmentation_text_lists_every_index() {
        let rendered = render_fragmentation(
            ReportFormat::Text,
            &[index("IX_low", 16, None), index("IX_high", 640, Some(42.0))],
        );

        insta::assert_snapshot!(rendered.trim_end(), @r"
        Index Fragmentation Report
        ==========================

        Summary:
          Indexes:  2
          High:     1
          Moderate: 0
          Low:      1
          Space:    5248 KB (5 MB, 0 GB)

          [HIGH] QUESTIONRESULTS.IX_high
            Type:          NONCLUSTERED INDEX (IN_ROW_DATA)
            Pages:         640 (12000 records)
            Fragmentation: 42.00%
            Space used:    5120 KB / 5 MB / 0 GB
            Action:        REBUILD

          [LOW] QUESTIONRESULTS.IX_low
            Type:          NONCLUSTERED INDEX (IN_ROW_DATA)
            Pages:         16 (12000 records)
            Fragmentation: n/a
            Space used:    128 KB / 0 MB / 0 GB
        ");
    }

    #[test]
    fn size_markdown_renders_ranked_table() {
        let rendered = render_size(ReportFormat::Markdown);

        assert!(rendered.contains("- **Grand Total**: 1000 bytes"));
        let overflow = rendered
            .find("| 1 | 1 | 1 | OVERFLOW | 700 | 0 | 0 | 0 | 70.00 |")
            .expect("overflow row");
        let primary = rendered
            .find("| 1 | 1 | 1 | PRIMARY | 300 | 0 | 0 | 0 | 30.00 |")
            .expect("primary row");
        assert!(overflow < primary);
    }

    #[test]
    fn size_json_is_parseable() {
        let rendered = render_size(ReportFormat::Json);

        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["grand_total_bytes"], 1000);
        assert_eq!(value["rows"][0]["source_table"], "OVERFLOW");
        assert_eq!(value["rows"][0]["data_size_percentage"], 70.0);
    }

    #[test]
    fn fragmentation_markdown_shows_actions() {
        let rendered = render_fragmentation(
            ReportFormat::Markdown,
            &[index("IX_mod", 8, Some(10.0))],
        );

        assert!(rendered.contains("- **Moderate ("));
        assert!(rendered.contains(
            "| QUESTIONRESULTS | IX_mod | NONCLUSTERED INDEX | IN_ROW_DATA | 8 | 12000 | 10.00% | 64 | 0 | 0 | Moderate | REORGANIZE |"
        ));
    }

    #[test]
    fn size_text_ranks_rows() {
        let rendered = render_size(ReportFormat::Text);

        assert!(rendered.contains("  #1 site 1 / analysis 1 / property 1 [OVERFLOW]"));
        assert!(rendered.contains("    300 bytes (0 KB, 0 MB, 0 GB), 30.00% of total"));
    }
}
