//! Everything the ledger knows about days: how they are keyed, which of them are legal holidays,
//! and how a month is walked.

pub mod date_key;
pub mod holidays;

use std::{fmt::Display, str::FromStr};

use anyhow::{anyhow, Context};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Serialize, Serializer};

/// A calendar month. `month0` is zero based to match [holidays::Holiday].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month0: u32,
}

impl YearMonth {
    /// `None` unless both this month and the one after it can be represented.
    pub fn new_opt(year: i32, month0: u32) -> Option<Self> {
        if month0 > 11 {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month0 + 1, 1)?;
        let month = Self { year, month0 };
        let next = month.next();
        NaiveDate::from_ymd_opt(next.year, next.month0 + 1, 1)?;
        Some(month)
    }

    /// Month of `date`. `None` only for the very last representable month.
    pub fn of(date: NaiveDate) -> Option<Self> {
        Self::new_opt(date.year(), date.month0())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month0(&self) -> u32 {
        self.month0
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month0 + 1, 1)
            .expect("YearMonth is only constructed from valid dates")
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next()
            .first_day()
            .pred_opt()
            .expect("YearMonth is only constructed when the next month is valid")
    }

    pub fn next(&self) -> Self {
        if self.month0 == 11 {
            Self {
                year: self.year + 1,
                month0: 0,
            }
        } else {
            Self {
                year: self.year,
                month0: self.month0 + 1,
            }
        }
    }

    /// Every day of the month in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let last = self.last_day();
        self.first_day().iter_days().take_while(move |day| *day <= last)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month0() == self.month0
    }

    /// Long form used in report headers, e.g. `May 2024`.
    pub fn long_name(&self) -> String {
        self.first_day().format("%B %Y").to_string()
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month0 + 1)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for YearMonth {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| anyhow!("Expected a month as YYYY-MM, got {s}"))?;
        let year = year.parse::<i32>().with_context(|| format!("Invalid year in {s}"))?;
        let month = month.parse::<u32>().with_context(|| format!("Invalid month in {s}"))?;
        month
            .checked_sub(1)
            .and_then(|month0| YearMonth::new_opt(year, month0))
            .ok_or_else(|| anyhow!("Month {month} is out of range in {s}"))
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, NaiveDate};

    use super::YearMonth;

    #[test]
    fn month_days_cover_leap_february() {
        let february = YearMonth::new_opt(2024, 1).unwrap();
        let days = february.days().collect::<Vec<_>>();
        assert_eq!(days.len(), 29);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(days[28], NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn december_rolls_into_next_year() {
        let december = YearMonth::new_opt(2023, 11).unwrap();
        assert_eq!(december.next(), YearMonth::new_opt(2024, 0).unwrap());
        assert_eq!(december.last_day(), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn last_representable_month_is_refused() {
        let max = NaiveDate::MAX;
        assert_eq!(YearMonth::new_opt(max.year(), 11), None);
        assert_eq!(YearMonth::of(max), None);
        let before = YearMonth::new_opt(max.year(), 10).unwrap();
        assert_eq!(before.last_day(), NaiveDate::from_ymd_opt(max.year(), 11, 30).unwrap());
        assert!(format!("{}-12", max.year()).parse::<YearMonth>().is_err());
    }

    #[test]
    fn parses_and_displays() {
        let month: YearMonth = "2024-05".parse().unwrap();
        assert_eq!(month, YearMonth::new_opt(2024, 4).unwrap());
        assert_eq!(month.to_string(), "2024-05");
        assert_eq!(month.long_name(), "May 2024");
        assert!("2024-13".parse::<YearMonth>().is_err());
        assert!("2024-00".parse::<YearMonth>().is_err());
        assert!("May".parse::<YearMonth>().is_err());
    }
}
