//! TTL classes
//!
//! Every cache write carries exactly one class. Classes are picked by
//! how often the underlying data changes, never by what a call site
//! finds convenient; a new call site chooses from this table instead of
//! inventing a duration.

use std::time::Duration;

/// Named staleness budgets, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TtlClass {
    /// 10 seconds. Near-real-time data such as live-session state.
    Instant,
    /// 60 seconds. Frequently-written rows such as lesson progress.
    Short,
    /// 5 minutes. Listings that change with routine authoring.
    Medium,
    /// 30 minutes. Published content that changes rarely.
    Long,
    /// 1 hour. Site-wide configuration.
    VeryLong,
    /// 24 hours. Taxonomy and other near-static data.
    Day,
    /// 7 days.
    Week,
    /// 30 days.
    Month,
}

impl TtlClass {
    /// The class's staleness budget in seconds.
    pub fn seconds(&self) -> u64 {
        match self {
            TtlClass::Instant => 10,
            TtlClass::Short => 60,
            TtlClass::Medium => 300,
            TtlClass::Long => 1_800,
            TtlClass::VeryLong => 3_600,
            TtlClass::Day => 86_400,
            TtlClass::Week => 604_800,
            TtlClass::Month => 2_592_000,
        }
    }

    /// The class's staleness budget as a `Duration`.
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.seconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_table() {
        assert_eq!(TtlClass::Instant.seconds(), 10);
        assert_eq!(TtlClass::Short.seconds(), 60);
        assert_eq!(TtlClass::Medium.seconds(), 300);
        assert_eq!(TtlClass::Long.seconds(), 1_800);
        assert_eq!(TtlClass::VeryLong.seconds(), 3_600);
        assert_eq!(TtlClass::Day.seconds(), 86_400);
        assert_eq!(TtlClass::Week.seconds(), 604_800);
        assert_eq!(TtlClass::Month.seconds(), 2_592_000);
    }

    #[test]
    fn test_classes_are_strictly_increasing() {
        let classes = [
            TtlClass::Instant,
            TtlClass::Short,
            TtlClass::Medium,
            TtlClass::Long,
            TtlClass::VeryLong,
            TtlClass::Day,
            TtlClass::Week,
            TtlClass::Month,
        ];
        for pair in classes.windows(2) {
            assert!(pair[0].seconds() < pair[1].seconds());
        }
    }
}
