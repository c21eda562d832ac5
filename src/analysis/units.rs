//! Unit conversions shared by the size and fragmentation reports

/// Size of one SQL Server data page in kilobytes
pub const PAGE_SIZE_KB: i64 = 8;

const UNIT_STEP: i64 = 1024;

/// A size expressed in KB, MB and GB, each step floor-divided from the
/// previous one rather than from the original value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainedSize {
    pub kb: i64,
    pub mb: i64,
    pub gb: i64,
}

impl ChainedSize {
    pub fn from_bytes(bytes: i64) -> Self {
        Self::from_kilobytes(bytes / UNIT_STEP)
    }

    pub fn from_kilobytes(kb: i64) -> Self {
        let mb = kb / UNIT_STEP;
        let gb = mb / UNIT_STEP;
        Self { kb, mb, gb }
    }
}

/// Kilobytes occupied by `page_count` pages, or `None` on overflow.
pub fn pages_to_kilobytes(page_count: i64) -> Option<i64> {
    page_count.checked_mul(PAGE_SIZE_KB)
}

/// `part / whole * 100` rounded half away from zero to two decimal places.
/// `None` when `whole` is zero.
///
/// Rounding happens on the exact integer ratio; only the final hundredths
/// are converted to `f64`.
pub fn percentage_of(part: i64, whole: i64) -> Option<f64> {
    if whole == 0 {
        return None;
    }
    let negative = (part < 0) != (whole < 0);
    let part = i128::from(part).abs();
    let whole = i128::from(whole).abs();
    let hundredths = (part * 10_000 * 2 + whole) / (2 * whole);
    let hundredths = if negative { -hundredths } else { hundredths };
    Some(hundredths as f64 / 100.0)
}

/// Render a byte count using the largest unit that keeps the value above
/// one, e.g. `"700 bytes"` or `"3 MB"`.
pub fn format_bytes(bytes: i64) -> String {
    let size = ChainedSize::from_bytes(bytes);
    if size.gb > 0 {
        format!("{} GB", size.gb)
    } else if size.mb > 0 {
        format!("{} MB", size.mb)
    } else if size.kb > 0 {
        format!("{} KB", size.kb)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0, 0, 0)]
    #[case(1023, 0, 0, 0)]
    #[case(1024, 1, 0, 0)]
    #[case(1_073_741_823, 1_048_575, 1023, 0)]
    #[case(1_073_741_824, 1_048_576, 1024, 1)]
    fn chains_byte_conversions(
        #[case] bytes: i64,
        #[case] kb: i64,
        #[case] mb: i64,
        #[case] gb: i64,
    ) {
        assert_eq!(ChainedSize::from_bytes(bytes), ChainedSize { kb, mb, gb });
    }

    #[test]
    fn converts_pages_to_kilobytes() {
        assert_eq!(pages_to_kilobytes(10), Some(80));
        assert_eq!(pages_to_kilobytes(i64::MAX), None);
    }

    #[rstest]
    #[case(300, 1000, 30.0)]
    #[case(700, 1000, 70.0)]
    #[case(1, 3, 33.33)]
    #[case(2, 3, 66.67)]
    #[case(7, 20_000, 0.04)]
    #[case(201, 20_000, 1.01)]
    #[case(1, 200_000, 0.01)]
    #[case(0, 500, 0.0)]
    fn rounds_percentage_to_two_places(#[case] part: i64, #[case] whole: i64, #[case] expected: f64) {
        assert_eq!(percentage_of(part, whole), Some(expected));
    }

    #[test]
    fn percentage_of_zero_total_is_undefined() {
        assert_eq!(percentage_of(0, 0), None);
    }

    #[rstest]
    #[case(700, "700 bytes")]
    #[case(4096, "4 KB")]
    #[case(5 * 1024 * 1024, "5 MB")]
    #[case(3 * 1024 * 1024 * 1024, "3 GB")]
    fn formats_human_readable_sizes(#[case] bytes: i64, #[case] expected: &str) {
        assert_eq!(format_bytes(bytes), expected);
    }
}
