use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use tracing::trace;

/// A legal holiday of a specific year. `month` is zero based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Holiday {
    pub month: u32,
    pub day: u32,
    pub name: &'static str,
}

impl Holiday {
    fn on(date: NaiveDate, name: &'static str) -> Self {
        Self {
            month: date.month0(),
            day: date.day(),
            name,
        }
    }

    fn falls_on(&self, date: NaiveDate) -> bool {
        self.month == date.month0() && self.day == date.day()
    }
}

/// Holiday that happens on the same day every year.
#[derive(Debug, Clone, Copy)]
pub struct FixedHoliday {
    pub month: u32,
    pub day: u32,
    pub name: &'static str,
}

/// Holiday defined as a number of days away from Orthodox Easter.
#[derive(Debug, Clone, Copy)]
pub struct MovableHoliday {
    pub offset_days: i64,
    pub name: &'static str,
}

#[rustfmt::skip]
const NATIONAL_FIXED: &[FixedHoliday] = &[
    FixedHoliday { month: 0, day: 1, name: "New Year's Day" },
    FixedHoliday { month: 0, day: 2, name: "New Year's Day (second day)" },
    FixedHoliday { month: 0, day: 24, name: "Unification Day" },
    FixedHoliday { month: 4, day: 1, name: "Labour Day" },
    FixedHoliday { month: 5, day: 1, name: "Children's Day" },
    FixedHoliday { month: 7, day: 15, name: "Assumption of Mary" },
    FixedHoliday { month: 10, day: 30, name: "St. Andrew's Day" },
    FixedHoliday { month: 11, day: 1, name: "National Day" },
    FixedHoliday { month: 11, day: 25, name: "Christmas Day" },
    FixedHoliday { month: 11, day: 26, name: "Christmas (second day)" },
];

#[rustfmt::skip]
const NATIONAL_MOVABLE: &[MovableHoliday] = &[
    MovableHoliday { offset_days: -2, name: "Good Friday" },
    MovableHoliday { offset_days: 0, name: "Easter Sunday" },
    MovableHoliday { offset_days: 1, name: "Easter Monday" },
    MovableHoliday { offset_days: 49, name: "Whit Sunday" },
    MovableHoliday { offset_days: 50, name: "Whit Monday" },
];

/// Difference between the Julian and Gregorian calendars. Only exact for 1900-2099.
const JULIAN_TO_GREGORIAN_DAYS: i64 = 13;

/// Computes Orthodox Easter for a year, expressed in the Gregorian calendar. `None` for years
/// chrono can't represent.
pub fn orthodox_easter(year: i32) -> Option<NaiveDate> {
    let a = year.rem_euclid(4);
    let b = year.rem_euclid(7);
    let c = year.rem_euclid(19);
    let d = (19 * c + 15).rem_euclid(30);
    let e = (2 * a + 4 * b - d + 34).rem_euclid(7);
    let month = (d + e + 114) / 31;
    let day = (d + e + 114) % 31 + 1;

    NaiveDate::from_ymd_opt(year, month as u32, day as u32)?
        .checked_add_signed(Duration::days(JULIAN_TO_GREGORIAN_DAYS))
}

/// Legal holidays of a country. Lookups return the first match in list order: fixed holidays
/// first, in the order they were declared, then movable ones. When two holidays share a day the
/// earlier one is the one reported.
#[derive(Debug, Clone, Copy)]
pub struct HolidayCalendar {
    fixed: &'static [FixedHoliday],
    movable: &'static [MovableHoliday],
}

impl Default for HolidayCalendar {
    fn default() -> Self {
        Self::national()
    }
}

impl HolidayCalendar {
    pub fn new(fixed: &'static [FixedHoliday], movable: &'static [MovableHoliday]) -> Self {
        Self { fixed, movable }
    }

    /// The national calendar: ten fixed holidays and five tied to Orthodox Easter.
    pub fn national() -> Self {
        Self::new(NATIONAL_FIXED, NATIONAL_MOVABLE)
    }

    pub fn holidays_of(&self, year: i32) -> Vec<Holiday> {
        let easter = orthodox_easter(year);
        trace!("Orthodox easter for {year} is {easter:?}");

        let fixed = self.fixed.iter().map(|v| Holiday {
            month: v.month,
            day: v.day,
            name: v.name,
        });
        // Offsets are applied to a real date so that e.g. Whit Monday rolls into June.
        let movable = easter.into_iter().flat_map(|easter| {
            self.movable.iter().filter_map(move |v| {
                let date = easter.checked_add_signed(Duration::days(v.offset_days))?;
                Some(Holiday::on(date, v.name))
            })
        });

        fixed.chain(movable).collect()
    }

    /// Holidays of the given month, in lookup order.
    pub fn holidays_in_month(&self, year: i32, month0: u32) -> Vec<Holiday> {
        self.holidays_of(year)
            .into_iter()
            .filter(|v| v.month == month0)
            .collect()
    }

    pub fn is_holiday(&self, date: NaiveDate) -> Option<Holiday> {
        self.holidays_of(date.year())
            .into_iter()
            .find(|v| v.falls_on(date))
    }
}
