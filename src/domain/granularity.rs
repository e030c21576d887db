// Bucket granularity and axis-label density
use std::fmt;

/// Width of the time buckets rows are grouped into. `None` keeps every
/// original sample as its own bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    None,
    Seconds(u32),
    Minutes(u32),
    Hours(u32),
}

/// The selectable interval table, ordered finest to coarsest. The UI steps
/// through it by index.
pub const INTERVALS: [Granularity; 9] = [
    Granularity::None,
    Granularity::Seconds(5),
    Granularity::Seconds(15),
    Granularity::Seconds(30),
    Granularity::Minutes(1),
    Granularity::Minutes(5),
    Granularity::Minutes(15),
    Granularity::Minutes(30),
    Granularity::Hours(1),
];

impl Granularity {
    pub fn from_index(index: usize) -> Option<Self> {
        INTERVALS.get(index).copied()
    }

    /// Clamp a requested interval index to the table bounds.
    pub fn clamp_index(index: usize) -> usize {
        index.min(INTERVALS.len() - 1)
    }

    /// Typical bucket count per hour of data, parallel to `INTERVALS`. Feeds
    /// the label-thinning divisor: finer buckets mean more labels to thin.
    pub fn typical_bucket_count(self) -> usize {
        match self {
            Granularity::None => 5,
            Granularity::Seconds(5) => 5,
            Granularity::Seconds(15) => 10,
            Granularity::Seconds(_) => 15,
            Granularity::Minutes(1) => 20,
            Granularity::Minutes(5) => 30,
            Granularity::Minutes(15) => 40,
            Granularity::Minutes(_) => 50,
            Granularity::Hours(_) => 60,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::None => write!(f, "raw"),
            Granularity::Seconds(n) => write!(f, "{n}s"),
            Granularity::Minutes(n) => write!(f, "{n}m"),
            Granularity::Hours(n) => write!(f, "{n}h"),
        }
    }
}

/// Stride N such that every Nth bucket label is rendered. Aims for 10-30
/// visible labels regardless of series length.
pub fn tick_stride(granularity: Granularity, series_len: usize) -> usize {
    if series_len == 0 {
        return 1;
    }
    let target = (series_len / granularity.typical_bucket_count()).clamp(10, 30);
    (series_len / target).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_table_lookup() {
        assert_eq!(Granularity::from_index(0), Some(Granularity::None));
        assert_eq!(Granularity::from_index(5), Some(Granularity::Minutes(5)));
        assert_eq!(Granularity::from_index(8), Some(Granularity::Hours(1)));
        assert_eq!(Granularity::from_index(9), None);
    }

    #[test]
    fn test_clamp_index() {
        assert_eq!(Granularity::clamp_index(0), 0);
        assert_eq!(Granularity::clamp_index(8), 8);
        assert_eq!(Granularity::clamp_index(100), 8);
    }

    #[test]
    fn test_stride_empty_series_defaults_to_one() {
        for granularity in INTERVALS {
            assert_eq!(tick_stride(granularity, 0), 1);
        }
    }

    #[test]
    fn test_stride_is_always_positive() {
        for granularity in INTERVALS {
            for len in [1, 7, 12, 288, 1440, 100_000] {
                assert!(tick_stride(granularity, len) >= 1);
            }
        }
    }

    #[test]
    fn test_target_label_count_stays_clamped() {
        for granularity in INTERVALS {
            for len in [1, 50, 288, 1440, 100_000] {
                let target = (len / granularity.typical_bucket_count()).clamp(10, 30);
                assert!((10..=30).contains(&target));
            }
        }
    }

    #[test]
    fn test_stride_thins_long_series() {
        // 288 five-minute buckets (a full day) against a divisor of 30:
        // target = clamp(288 / 30, 10, 30) = 10, stride = 288 / 10 = 28.
        assert_eq!(tick_stride(Granularity::Minutes(5), 288), 28);
        // Short series keep every label.
        assert_eq!(tick_stride(Granularity::Minutes(5), 12), 1);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Granularity::None.to_string(), "raw");
        assert_eq!(Granularity::Seconds(15).to_string(), "15s");
        assert_eq!(Granularity::Minutes(5).to_string(), "5m");
        assert_eq!(Granularity::Hours(1).to_string(), "1h");
    }
}
