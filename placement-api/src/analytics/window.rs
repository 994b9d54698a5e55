use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};

/// The reference instant a report is computed for.
///
/// Statement time windows are fixed per statement ("last 12 months", "last
/// 6 months"); this type turns them into concrete, bindable boundaries and
/// into the list of calendar month keys the derived series are filled over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    now: NaiveDateTime,
}

impl ReportWindow {
    pub fn new(now: NaiveDateTime) -> Self {
        ReportWindow { now }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date()
    }

    /// First day of the month `months_back` months before the current one.
    /// `month_start(0)` is the first day of the current month.
    pub fn month_start(&self, months_back: u32) -> NaiveDate {
        let first = self.today().with_day(1).unwrap_or(self.today());
        first
            .checked_sub_months(Months::new(months_back))
            .unwrap_or(first)
    }

    /// Midnight at the start of `month_start(months_back)`.
    pub fn month_start_timestamp(&self, months_back: u32) -> NaiveDateTime {
        self.month_start(months_back)
            .and_hms_opt(0, 0, 0)
            .unwrap_or(self.now)
    }

    /// The calendar month following the current one, 1-based.
    pub fn next_month(&self) -> u32 {
        self.today().month() % 12 + 1
    }

    /// `YYYY-MM` keys for the last `months` calendar months, oldest first,
    /// ending with the current month.
    pub fn month_keys(&self, months: u32) -> Vec<String> {
        (0..months)
            .rev()
            .map(|back| self.month_start(back).format("%Y-%m").to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(y: i32, m: u32, d: u32) -> ReportWindow {
        ReportWindow::new(
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(15, 30, 0)
                .unwrap(),
        )
    }

    #[test]
    fn test_month_start_crosses_year_boundary() {
        let w = window(2026, 2, 14);
        assert_eq!(w.month_start(0), NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert_eq!(w.month_start(2), NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert_eq!(w.month_start(11), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
    }

    #[test]
    fn test_month_keys_oldest_first() {
        let w = window(2026, 1, 31);
        assert_eq!(w.month_keys(3), vec!["2025-11", "2025-12", "2026-01"]);
    }

    #[test]
    fn test_next_month_wraps() {
        assert_eq!(window(2025, 12, 5).next_month(), 1);
        assert_eq!(window(2025, 6, 5).next_month(), 7);
    }
}
