use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::Result;

/// Caller-supplied range of local dates, `[start, start + days)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ReportingWindow {
    pub start: NaiveDate,

    #[validate(range(min = 1))]
    pub days: u32,
}

impl ReportingWindow {
    pub fn new(start: NaiveDate, days: u32) -> Result<Self> {
        let window = Self { start, days };
        window.validate()?;
        Ok(window)
    }

    /// First date after the window, `None` if it overflows the calendar.
    pub fn end_exclusive(&self) -> Option<NaiveDate> {
        self.start.checked_add_days(Days::new(u64::from(self.days)))
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.end_exclusive().and_then(|d| d.pred_opt())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && self.end_exclusive().map_or(true, |end| date < end)
    }
}

impl std::fmt::Display for ReportingWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.last_day() {
            Some(last) => write!(f, "{} to {} ({} days)", self.start, last, self.days),
            None => write!(f, "from {} ({} days)", self.start, self.days),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_bounds() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();
        let window = ReportingWindow::new(start, 3).unwrap();

        assert!(!window.contains(NaiveDate::from_ymd_opt(2024, 2, 26).unwrap()));
        assert!(window.contains(start));
        assert!(window.contains(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));
        assert!(!window.contains(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
        assert_eq!(window.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29));
    }

    #[test]
    fn test_zero_day_window_rejected() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();
        assert!(ReportingWindow::new(start, 0).is_err());
    }
}
