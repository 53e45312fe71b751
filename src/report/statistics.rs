use serde::Serialize;

use crate::calendar::is_weekend;

use super::{grouping::DayGroup, LineKind};

/// Aggregates over one month of day groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthStatistics {
    /// Days with any activity or holiday.
    pub days_with_entries: usize,
    /// Monday to Friday days with at least one project line.
    pub workdays_with_projects: usize,
    /// Holidays that got their own line.
    pub holidays: usize,
    pub vacation_days: usize,
    pub vacation_hours: f64,
    pub project_hours: f64,
    /// Vacation and project hours together.
    pub total_hours: f64,
}

/// Returns statistics of the grouped lines of a month.
pub fn analyze_groups(groups: &[DayGroup]) -> MonthStatistics {
    let mut statistics = MonthStatistics {
        days_with_entries: groups.len(),
        ..Default::default()
    };

    for group in groups {
        let has = |kind: LineKind| group.items.iter().any(|v| v.kind == kind);

        if has(LineKind::Project) && !is_weekend(group.day) {
            statistics.workdays_with_projects += 1;
        }
        if has(LineKind::Holiday) {
            statistics.holidays += 1;
        }
        if has(LineKind::Vacation) {
            statistics.vacation_days += 1;
        }

        for item in &group.items {
            let hours = item.hours.unwrap_or_default();
            match item.kind {
                LineKind::Vacation => statistics.vacation_hours += hours,
                LineKind::Project => statistics.project_hours += hours,
                LineKind::Holiday | LineKind::LegacyNote => {}
            }
        }
    }

    statistics.total_hours = statistics.vacation_hours + statistics.project_hours;
    statistics
}
