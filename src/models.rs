use serde::{Deserialize, Serialize};

/// Which result table supplied a property's byte count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceTable {
    /// Values stored directly in the primary result table
    Primary,
    /// Values too large for the primary table, kept in the overflow table
    Overflow,
}

impl SourceTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTable::Primary => "PRIMARY",
            SourceTable::Overflow => "OVERFLOW",
        }
    }
}

/// A single raw size fact for one computer's analysis property result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeRecord {
    pub site_id: i64,
    pub analysis_id: i64,
    pub property_id: i64,
    pub computer_id: i64,
    #[serde(default)]
    pub primary_bytes: Option<i64>,
    #[serde(default)]
    pub overflow_bytes: Option<i64>,
}

impl SizeRecord {
    /// The table this record is attributed to. A record with neither value
    /// present is still attributed to `Primary`.
    pub fn source_table(&self) -> SourceTable {
        match (self.primary_bytes, self.overflow_bytes) {
            (None, Some(_)) => SourceTable::Overflow,
            _ => SourceTable::Primary,
        }
    }

    /// Bytes contributed by this record; zero when no value is present.
    pub fn contributing_bytes(&self) -> i64 {
        match self.source_table() {
            SourceTable::Primary => self.primary_bytes.unwrap_or(0),
            SourceTable::Overflow => self.overflow_bytes.unwrap_or(0),
        }
    }
}

/// Grouping key of a property aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyKey {
    pub site_id: i64,
    pub analysis_id: i64,
    pub property_id: i64,
    pub source_table: SourceTable,
}

/// Total size of one property within one source table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyAggregate {
    pub key: PropertyKey,
    pub total_bytes: i64,
}

/// One ranked row of the property size report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeReportRow {
    pub site_id: i64,
    pub analysis_id: i64,
    pub property_id: i64,
    pub source_table: SourceTable,
    pub total_bytes: i64,
    pub data_size_kb: i64,
    pub data_size_mb: i64,
    pub data_size_gb: i64,
    /// Share of the grand total, rounded to two decimal places
    pub data_size_percentage: f64,
}

/// Property size report along with the totals it was ranked against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeReport {
    pub top_n: usize,
    pub group_count: usize,
    pub grand_total_bytes: i64,
    pub rows: Vec<SizeReportRow>,
}

/// Physical statistics for one index allocation unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStat {
    pub table_name: String,
    pub index_name: String,
    pub index_type: String,
    pub allocation_type: String,
    pub page_count: i64,
    pub record_count: i64,
    #[serde(default)]
    pub fragmentation_percent: Option<f64>,
}

/// Severity band for index fragmentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FragmentationStatus {
    Low,
    Moderate,
    High,
}

impl FragmentationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentationStatus::Low => "Low",
            FragmentationStatus::Moderate => "Moderate",
            FragmentationStatus::High => "High",
        }
    }

    /// Conventional index maintenance for this band, if any
    pub fn maintenance_action(&self) -> Option<&'static str> {
        match self {
            FragmentationStatus::Low => None,
            FragmentationStatus::Moderate => Some("REORGANIZE"),
            FragmentationStatus::High => Some("REBUILD"),
        }
    }
}

/// An index annotated with space usage and fragmentation severity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentationReportRow {
    pub table_name: String,
    pub index_name: String,
    pub index_type: String,
    pub allocation_type: String,
    pub page_count: i64,
    pub record_count: i64,
    pub fragmentation_percent: Option<f64>,
    pub space_used_kb: i64,
    pub space_used_mb: i64,
    pub space_used_gb: i64,
    pub status: FragmentationStatus,
}

/// Totals across every index in a fragmentation report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentationSummary {
    pub index_count: usize,
    pub low_count: usize,
    pub moderate_count: usize,
    pub high_count: usize,
    pub total_space_used_kb: i64,
    pub total_space_used_mb: i64,
    pub total_space_used_gb: i64,
}

/// Exhaustive fragmentation report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentationReport {
    pub summary: FragmentationSummary,
    pub rows: Vec<FragmentationReportRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(primary: Option<i64>, overflow: Option<i64>) -> SizeRecord {
        SizeRecord {
            site_id: 1,
            analysis_id: 2,
            property_id: 3,
            computer_id: 4,
            primary_bytes: primary,
            overflow_bytes: overflow,
        }
    }

    #[test]
    fn primary_presence_decides_source_table() {
        assert_eq!(record(Some(0), Some(50)).source_table(), SourceTable::Primary);
        assert_eq!(record(None, Some(50)).source_table(), SourceTable::Overflow);
        assert_eq!(record(None, Some(50)).contributing_bytes(), 50);
    }

    #[test]
    fn record_without_values_counts_as_empty_primary() {
        let degenerate = record(None, None);
        assert_eq!(degenerate.source_table(), SourceTable::Primary);
        assert_eq!(degenerate.contributing_bytes(), 0);
    }

    #[test]
    fn size_record_deserializes_with_missing_optional_sizes() {
        let parsed: SizeRecord = serde_json::from_str(
            r#"{"site_id":1,"analysis_id":2,"property_id":3,"computer_id":4,"overflow_bytes":700}"#,
        )
        .expect("SizeRecord should deserialize");
        assert_eq!(parsed.primary_bytes, None);
        assert_eq!(parsed.overflow_bytes, Some(700));
    }

    #[test]
    fn source_table_serializes_in_upper_case() {
        let json = serde_json::to_string(&SourceTable::Overflow).expect("should serialize");
        assert_eq!(json, "\"OVERFLOW\"");
    }
}
