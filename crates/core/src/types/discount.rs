//! Time-windowed discounts.
//!
//! Products, variants and bundles carry an optional `discount_start` /
//! `discount_end` pair. A discount applies only while the current time falls
//! inside that window; a missing bound means no discount is configured.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A discount window with optional bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountWindow {
    /// First instant the discount applies.
    pub start: Option<DateTime<Utc>>,
    /// Last instant the discount applies.
    pub end: Option<DateTime<Utc>>,
}

impl DiscountWindow {
    /// Create a window from its (possibly missing) bounds.
    #[must_use]
    pub const fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// Whether the discount is running at `now`.
    ///
    /// Both bounds are inclusive. Returns `false` when either bound is missing.
    /// Callers aggregating many rows must capture `now` once and reuse it so
    /// every row of a response is judged against the same instant.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= now && now <= end,
            _ => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn january() -> DiscountWindow {
        DiscountWindow::new(Some(at(2024, 1, 1)), Some(at(2024, 1, 31)))
    }

    #[test]
    fn test_inside_window() {
        assert!(january().is_active_at(at(2024, 1, 15)));
    }

    #[test]
    fn test_after_window() {
        assert!(!january().is_active_at(at(2024, 2, 1)));
    }

    #[test]
    fn test_before_window() {
        assert!(!january().is_active_at(at(2023, 12, 31)));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(january().is_active_at(at(2024, 1, 1)));
        assert!(january().is_active_at(at(2024, 1, 31)));
    }

    #[test]
    fn test_missing_bound_is_inactive() {
        let now = at(2024, 1, 15);
        assert!(!DiscountWindow::new(None, Some(at(2024, 1, 31))).is_active_at(now));
        assert!(!DiscountWindow::new(Some(at(2024, 1, 1)), None).is_active_at(now));
        assert!(!DiscountWindow::default().is_active_at(now));
    }

    #[test]
    fn test_inverted_window_never_active() {
        let window = DiscountWindow::new(Some(at(2024, 2, 1)), Some(at(2024, 1, 1)));
        assert!(!window.is_active_at(at(2024, 1, 15)));
    }
}
