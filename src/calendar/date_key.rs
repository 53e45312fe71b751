use std::fmt::Display;

use chrono::{DateTime, Datelike, LocalResult, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

/// Canonical identifier of one local calendar day, `YYYY-MM-DD`.
///
/// Keys are only ever built from local year/month/day components, so a key never shifts with the
/// time zone offset of the moment it was created from. Because every component is zero-padded,
/// lexicographic order is chronological order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateKey(String);

impl DateKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the day this key identifies. Keys built by this module always resolve.
    pub fn to_date(&self) -> Option<NaiveDate> {
        let (year, month0, day) = parse(&self.0)?;
        NaiveDate::from_ymd_opt(year, month0 + 1, day)
    }
}

impl Display for DateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        DateKey(format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            date.month(),
            date.day()
        ))
    }
}

/// This is the standard way of converting a moment to a day key. Only the fields of `date` in its
/// own time zone are used.
pub fn key_of<Tz: TimeZone>(date: &DateTime<Tz>) -> DateKey {
    date.date_naive().into()
}

/// Splits a key into `(year, zero based month, day)`.
///
/// Components don't have to be zero-padded, which is what lets older keys such as `2024-3-5` be
/// read during migration.
pub fn parse(key: &str) -> Option<(i32, u32, u32)> {
    let mut parts = key.split('-');
    let year = parts.next()?.trim().parse::<i32>().ok()?;
    let month = parts.next()?.trim().parse::<u32>().ok()?;
    let day = parts.next()?.trim().parse::<u32>().ok()?;
    if parts.next().is_some() || !(1..=12).contains(&month) {
        return None;
    }
    Some((year, month - 1, day))
}

/// Rebuilds a key that might have been derived under different time zone rules.
///
/// The raw key is anchored at midday in `tz` before its local day is taken again, so no offset in
/// either direction can push it onto a neighbouring day.
pub fn rekey_in<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateKey> {
    let (year, month0, day) = parse(raw)?;
    let midday = NaiveDate::from_ymd_opt(year, month0 + 1, day)?
        .and_time(NaiveTime::from_hms_opt(12, 0, 0)?);
    let anchored = match tz.from_local_datetime(&midday) {
        LocalResult::Single(v) => v,
        LocalResult::Ambiguous(v, _) => v,
        LocalResult::None => return Some(midday.date().into()),
    };
    Some(key_of(&anchored))
}
