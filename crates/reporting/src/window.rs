//! Relative date windows resolved against the batch anchor date.

use std::fmt;
use std::str::FromStr;

use campaign_core::CampaignError;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

pub use campaign_core::types::{parse_sheet_date, SHEET_DATE_FORMAT};

/// The calendar day before the anchor. Distinct from [`DateWindow::Yesterday`],
/// which resolves to the anchor itself.
pub fn day_before(anchor: NaiveDate) -> NaiveDate {
    anchor - Duration::days(1)
}

/// Named reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateWindow {
    /// The latest day in the batch (the anchor), not anchor - 1.
    Yesterday,
    Last7,
    Last14,
    Last30,
    Last60,
    MonthToDate,
    LastMonth,
    YearToDate,
    /// Caller-supplied start through the anchor.
    Custom(NaiveDate),
}

impl DateWindow {
    /// Resolve to an inclusive interval for the given anchor.
    pub fn resolve(&self, anchor: NaiveDate) -> DateRange {
        match self {
            Self::Yesterday => DateRange::new(anchor, anchor),
            Self::Last7 => trailing(anchor, 7),
            Self::Last14 => trailing(anchor, 14),
            Self::Last30 => trailing(anchor, 30),
            Self::Last60 => trailing(anchor, 60),
            Self::MonthToDate => DateRange::new(first_of_month(anchor), anchor),
            Self::LastMonth => {
                let end = first_of_month(anchor) - Duration::days(1);
                DateRange::new(first_of_month(end), end)
            }
            Self::YearToDate => {
                DateRange::new(anchor - Duration::days(anchor.ordinal0() as i64), anchor)
            }
            Self::Custom(start) => DateRange::new(*start, anchor),
        }
    }

    /// The same-length interval immediately preceding the resolved window.
    pub fn previous(&self, anchor: NaiveDate) -> DateRange {
        self.resolve(anchor).previous()
    }
}

fn trailing(anchor: NaiveDate, days: i64) -> DateRange {
    DateRange::new(anchor - Duration::days(days - 1), anchor)
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.day0() as i64)
}

impl FromStr for DateWindow {
    type Err = CampaignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(raw) = trimmed.strip_prefix("custom:") {
            return parse_sheet_date(raw).map(Self::Custom);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "yesterday" => Ok(Self::Yesterday),
            "7d" => Ok(Self::Last7),
            "14d" => Ok(Self::Last14),
            "30d" => Ok(Self::Last30),
            "60d" => Ok(Self::Last60),
            "mtd" => Ok(Self::MonthToDate),
            "lastmonth" | "last-month" | "last_month" => Ok(Self::LastMonth),
            "ytd" => Ok(Self::YearToDate),
            _ => Err(CampaignError::InvalidWindow(s.to_string())),
        }
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yesterday => f.write_str("yesterday"),
            Self::Last7 => f.write_str("7d"),
            Self::Last14 => f.write_str("14d"),
            Self::Last30 => f.write_str("30d"),
            Self::Last60 => f.write_str("60d"),
            Self::MonthToDate => f.write_str("mtd"),
            Self::LastMonth => f.write_str("lastMonth"),
            Self::YearToDate => f.write_str("ytd"),
            Self::Custom(start) => write!(f, "custom:{}", start.format(SHEET_DATE_FORMAT)),
        }
    }
}

/// Inclusive calendar interval. `start > end` is an empty range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Number of calendar days covered, 0 for an empty range.
    pub fn days(&self) -> i64 {
        ((self.end - self.start).num_days() + 1).max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.days() == 0
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Contiguous interval of identical length ending the day before `start`.
    pub fn previous(&self) -> DateRange {
        let end = self.start - Duration::days(1);
        let start = end - Duration::days(self.days() - 1);
        DateRange::new(start, end)
    }

    /// Every day in the range, chronologically.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        (0..self.days()).map(move |offset| start + Duration::days(offset))
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format(SHEET_DATE_FORMAT),
            self.end.format(SHEET_DATE_FORMAT)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const ALL: [&str; 8] = ["yesterday", "7d", "14d", "mtd", "30d", "60d", "lastMonth", "ytd"];

    #[test]
    fn test_yesterday_is_anchor() {
        let anchor = date(2025, 3, 10);
        let range = DateWindow::Yesterday.resolve(anchor);
        assert_eq!(range, DateRange::new(anchor, anchor));
        assert_eq!(day_before(anchor), date(2025, 3, 9));
    }

    #[test]
    fn test_trailing_windows_include_anchor() {
        let anchor = date(2025, 3, 10);
        let range = DateWindow::Last7.resolve(anchor);
        assert_eq!(range.start, date(2025, 3, 4));
        assert_eq!(range.end, anchor);
        assert_eq!(range.days(), 7);
        assert_eq!(DateWindow::Last60.resolve(anchor).days(), 60);
    }

    #[test]
    fn test_month_to_date_and_last_month() {
        let anchor = date(2025, 1, 15);
        assert_eq!(
            DateWindow::MonthToDate.resolve(anchor),
            DateRange::new(date(2025, 1, 1), date(2025, 1, 15))
        );
        assert_eq!(
            DateWindow::LastMonth.resolve(anchor),
            DateRange::new(date(2024, 12, 1), date(2024, 12, 31))
        );
    }

    #[test]
    fn test_last_month_leap_february() {
        let range = DateWindow::LastMonth.resolve(date(2024, 3, 31));
        assert_eq!(range, DateRange::new(date(2024, 2, 1), date(2024, 2, 29)));
        assert_eq!(range.previous(), DateRange::new(date(2024, 1, 3), date(2024, 1, 31)));
    }

    #[test]
    fn test_year_to_date() {
        let range = DateWindow::YearToDate.resolve(date(2024, 12, 31));
        assert_eq!(range.start, date(2024, 1, 1));
        assert_eq!(range.days(), 366);
    }

    #[test]
    fn test_previous_period_same_length() {
        let anchors = [date(2025, 1, 1), date(2024, 2, 29), date(2025, 3, 1), date(2023, 12, 31)];
        for anchor in anchors {
            for keyword in ALL {
                let window: DateWindow = keyword.parse().unwrap();
                let current = window.resolve(anchor);
                let previous = window.previous(anchor);
                assert_eq!(current.days(), previous.days(), "{keyword} at {anchor}");
                assert_eq!(previous.end + Duration::days(1), current.start);
            }
        }
    }

    #[test]
    fn test_previous_crosses_year_boundary() {
        let prev = DateWindow::Last7.previous(date(2025, 1, 3));
        assert_eq!(prev, DateRange::new(date(2024, 12, 21), date(2024, 12, 27)));
    }

    #[test]
    fn test_custom_window() {
        let anchor = date(2025, 1, 15);
        let window: DateWindow = "custom:01/10/2025".parse().unwrap();
        assert_eq!(window, DateWindow::Custom(date(2025, 1, 10)));
        assert_eq!(window.resolve(anchor).days(), 6);

        let future = DateWindow::Custom(date(2025, 2, 1)).resolve(anchor);
        assert!(future.is_empty());
        assert_eq!(future.previous().days(), 0);
    }

    #[test]
    fn test_parse_and_display() {
        for keyword in ALL {
            let window: DateWindow = keyword.parse().unwrap();
            assert_eq!(window.to_string(), keyword);
        }
        assert!("fortnight".parse::<DateWindow>().is_err());
        assert!("custom:13/45/2025".parse::<DateWindow>().is_err());
    }

    #[test]
    fn test_parse_sheet_date() {
        assert_eq!(parse_sheet_date("01/15/2025").unwrap(), date(2025, 1, 15));
        assert_eq!(parse_sheet_date(" 1/5/2025 ").unwrap(), date(2025, 1, 5));
        assert!(parse_sheet_date("2025-01-15").is_err());
    }

    #[test]
    fn test_range_dates_iterates_chronologically() {
        let range = DateRange::new(date(2024, 2, 27), date(2024, 3, 1));
        let days: Vec<_> = range.dates().collect();
        assert_eq!(days.len(), 4);
        assert_eq!(days[2], date(2024, 2, 29));
        assert!(range.contains(date(2024, 3, 1)));
        assert!(!range.contains(date(2024, 3, 2)));
    }
}
