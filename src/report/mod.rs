//! Monthly report assembly. Activities, vacations and holidays of a month are merged into line
//! items, grouped per day and annotated with statistics. The result doesn't know how it will be
//! displayed, see [render] for the renderers shipped with the application.

pub mod grouping;
pub mod render;
pub mod statistics;

use std::{collections::HashMap, fmt::Display};

use anyhow::{bail, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};
use tracing::{debug, instrument};

use crate::{
    calendar::{
        holidays::{Holiday, HolidayCalendar},
        is_weekend, YearMonth,
    },
    storage::{
        activity_store::ActivityStore,
        key_value::KeyValueStore,
        projects::Project,
        records::DayRecord,
    },
};

use grouping::{group_by_day, DayGroup};
use statistics::{analyze_groups, MonthStatistics};

pub const REPORT_TITLE: &str = "Monthly Report";
pub const UNKNOWN_PROJECT: &str = "Unknown project";
pub const VACATION_LABEL: &str = "Vacation";
pub const LEGACY_LABEL: &str = "Legacy note";
pub const HOLIDAY_DESCRIPTION: &str = "Legal holiday";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Holiday,
    Vacation,
    Project,
    LegacyNote,
}

/// One reported line before grouping.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub day: NaiveDate,
    pub kind: LineKind,
    pub label: String,
    pub hours: Option<f64>,
    pub description: String,
}

/// How a day is labeled in the status column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayStatus {
    Holiday(&'static str),
    Vacation,
    Weekend,
    Workday,
}

impl DayStatus {
    fn of(day: NaiveDate, record: &DayRecord, holiday: Option<&Holiday>) -> Self {
        match (record, holiday) {
            (DayRecord::Vacation { .. }, _) => DayStatus::Vacation,
            (_, Some(holiday)) => DayStatus::Holiday(holiday.name),
            _ if is_weekend(day) => DayStatus::Weekend,
            _ => DayStatus::Workday,
        }
    }
}

impl Display for DayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DayStatus::Holiday(name) => f.write_str(name),
            DayStatus::Vacation => f.write_str("Vacation"),
            DayStatus::Weekend => f.write_str("Weekend"),
            DayStatus::Workday => f.write_str("Workday"),
        }
    }
}

impl Serialize for DayStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Cells shared by every row of a day. Renderers are expected to merge them over `row_span` rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupHead {
    pub date: NaiveDate,
    pub weekday: String,
    pub status: DayStatus,
    pub row_span: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    /// Only present on the first row of a day.
    pub head: Option<GroupHead>,
    pub kind: LineKind,
    pub label: String,
    pub hours: Option<f64>,
    pub description: String,
}

/// Body of a monthly report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthReport {
    pub month: YearMonth,
    pub rows: Vec<ReportRow>,
    pub statistics: MonthStatistics,
}

impl MonthReport {
    /// Number of distinct days in the report.
    pub fn day_count(&self) -> usize {
        self.rows.iter().filter(|v| v.head.is_some()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportHeader {
    pub title: String,
    pub employee: String,
    pub month: YearMonth,
}

impl ReportHeader {
    /// Fails when no employee name is given, before anything is built.
    pub fn new(employee: &str, month: YearMonth) -> Result<Self> {
        let employee = employee.trim();
        if employee.is_empty() {
            bail!("Please enter the employee name before exporting a report");
        }
        Ok(Self {
            title: REPORT_TITLE.to_owned(),
            employee: employee.to_owned(),
            month,
        })
    }
}

/// A report ready to be exported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub header: ReportHeader,
    #[serde(flatten)]
    pub body: MonthReport,
}

impl Report {
    /// File name without extension, e.g. `Report_Ana_Pop_05-2024`.
    pub fn file_stem(&self) -> String {
        let employee = self
            .header
            .employee
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_");
        let month = self.header.month;
        format!(
            "Report_{employee}_{:02}-{:04}",
            month.month0() + 1,
            month.year()
        )
    }
}

/// Builds the body of the report for `month`.
///
/// A holiday only gets its own line when nothing else was recorded that day. Project ids are
/// looked up by string equality and unknown ones are reported as [UNKNOWN_PROJECT].
#[instrument(skip(store, calendar, projects))]
pub fn build_month_report<S: KeyValueStore>(
    month: YearMonth,
    store: &ActivityStore<S>,
    calendar: &HolidayCalendar,
    projects: &[Project],
) -> MonthReport {
    let holidays = calendar.holidays_in_month(month.year(), month.month0());

    let mut items = vec![];
    let mut statuses = HashMap::new();
    for day in month.days() {
        let record = store.get(day);
        let holiday = holidays.iter().find(|v| v.day == day.day());

        let lines = activity_lines(day, &record, projects);
        if lines.is_empty() {
            if let Some(holiday) = holiday {
                items.push(LineItem {
                    day,
                    kind: LineKind::Holiday,
                    label: holiday.name.to_owned(),
                    hours: None,
                    description: HOLIDAY_DESCRIPTION.to_owned(),
                });
                statuses.insert(day, DayStatus::of(day, &record, Some(holiday)));
            }
        } else {
            items.extend(lines);
            statuses.insert(day, DayStatus::of(day, &record, holiday));
        }
    }

    items.sort_by_key(|v| v.day);
    let groups = group_by_day(items);
    let statistics = analyze_groups(&groups);
    debug!("Built {} day groups for {month}", groups.len());

    let rows = groups
        .into_iter()
        .flat_map(|group| {
            let status = statuses
                .get(&group.day)
                .copied()
                .unwrap_or(DayStatus::Workday);
            group_rows(group, status)
        })
        .collect();

    MonthReport {
        month,
        rows,
        statistics,
    }
}

fn activity_lines(day: NaiveDate, record: &DayRecord, projects: &[Project]) -> Vec<LineItem> {
    match record {
        DayRecord::Empty => vec![],
        DayRecord::Vacation { hours } => vec![LineItem {
            day,
            kind: LineKind::Vacation,
            label: VACATION_LABEL.to_owned(),
            hours: Some(*hours),
            description: String::new(),
        }],
        DayRecord::Projects { .. } => record
            .valid_entries()
            .map(|entry| LineItem {
                day,
                kind: LineKind::Project,
                label: projects
                    .iter()
                    .find(|v| v.id == entry.project_id)
                    .map(|v| v.name.clone())
                    .unwrap_or_else(|| UNKNOWN_PROJECT.to_owned()),
                hours: Some(entry.hours),
                description: entry.description.trim().to_owned(),
            })
            .collect(),
        DayRecord::LegacyText { text } => vec![LineItem {
            day,
            kind: LineKind::LegacyNote,
            label: LEGACY_LABEL.to_owned(),
            hours: None,
            description: text.trim().to_owned(),
        }],
    }
}

fn group_rows(group: DayGroup, status: DayStatus) -> Vec<ReportRow> {
    let row_span = group.items.len();
    let mut head = Some(GroupHead {
        date: group.day,
        weekday: group.day.format("%A").to_string(),
        status,
        row_span,
    });
    group
        .items
        .into_iter()
        .map(|item| ReportRow {
            head: head.take(),
            kind: item.kind,
            label: item.label,
            hours: item.hours,
            description: item.description,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::NaiveDate;

    use super::{build_month_report, DayStatus, LineKind, ReportHeader, UNKNOWN_PROJECT};
    use crate::{
        calendar::{holidays::HolidayCalendar, YearMonth},
        storage::{
            activity_store::ActivityStore,
            entities::ProjectId,
            key_value::MemoryStore,
            projects::Project,
            records::{DayRecord, ProjectActivity},
        },
    };

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn projects() -> Vec<Project> {
        vec![
            Project {
                id: ProjectId::new("1"),
                name: "Bridge".into(),
            },
            Project {
                id: ProjectId::new("2"),
                name: "Tunnel".into(),
            },
        ]
    }

    #[test]
    fn holiday_vacation_and_two_projects() -> Result<()> {
        // December 2024: National Day on Sunday the 1st.
        let mut store = ActivityStore::empty(MemoryStore::new());
        store.set(date(2024, 12, 3), DayRecord::vacation())?;
        store.set(
            date(2024, 12, 4),
            DayRecord::projects([
                ProjectActivity::new("1", 3., "Survey"),
                ProjectActivity::new("2", 5., "Drawings"),
            ]),
        )?;

        let december = YearMonth::new_opt(2024, 11).unwrap();
        let calendar = HolidayCalendar::national();
        let report = build_month_report(december, &store, &calendar, &projects());

        let heads = report
            .rows
            .iter()
            .filter_map(|v| v.head.as_ref())
            .collect::<Vec<_>>();
        assert_eq!(heads.len(), 5);
        assert_eq!(heads[0].date, date(2024, 12, 1));
        assert_eq!(heads[0].status, DayStatus::Holiday("National Day"));
        assert_eq!(heads[1].status, DayStatus::Vacation);
        assert_eq!(heads[2].date, date(2024, 12, 4));
        assert_eq!(heads[2].weekday, "Wednesday");
        assert_eq!(heads[2].row_span, 2);
        assert_eq!(heads[2].status, DayStatus::Workday);

        let project_rows = report
            .rows
            .iter()
            .filter(|v| v.kind == LineKind::Project)
            .collect::<Vec<_>>();
        assert_eq!(project_rows.len(), 2);
        assert!(project_rows[0].head.is_some());
        assert!(project_rows[1].head.is_none());
        assert_eq!(project_rows[1].label, "Tunnel");

        let statistics = &report.statistics;
        assert_eq!(statistics.vacation_hours, 8.);
        assert_eq!(statistics.project_hours, 8.);
        assert_eq!(statistics.total_hours, 16.);
        assert_eq!(statistics.vacation_days, 1);
        assert_eq!(statistics.workdays_with_projects, 1);
        // National Day and the two Christmas days.
        assert_eq!(statistics.holidays, 3);
        assert_eq!(statistics.days_with_entries, 5);
        Ok(())
    }

    #[test]
    fn three_day_groups_for_a_quiet_month() -> Result<()> {
        // August 2024 has a single holiday, Assumption on Thursday the 15th.
        let mut store = ActivityStore::empty(MemoryStore::new());
        store.set(date(2024, 8, 5), DayRecord::vacation())?;
        store.set(
            date(2024, 8, 6),
            DayRecord::projects([
                ProjectActivity::new("1", 3., "Survey"),
                ProjectActivity::new("2", 5., "Drawings"),
            ]),
        )?;
        let august = YearMonth::new_opt(2024, 7).unwrap();
        let report = build_month_report(august, &store, &HolidayCalendar::national(), &projects());

        assert_eq!(report.day_count(), 3);
        assert_eq!(report.rows.len(), 4);
        assert_eq!(report.rows[1].head.as_ref().unwrap().row_span, 2);
        assert_eq!(report.rows[3].kind, LineKind::Holiday);
        assert_eq!(report.rows[3].label, "Assumption of Mary");
        assert_eq!(report.statistics.total_hours, 16.);
        assert_eq!(report.statistics.days_with_entries, 3);
        assert_eq!(report.statistics.holidays, 1);
        Ok(())
    }

    #[test]
    fn activity_suppresses_holiday_line() -> Result<()> {
        let mut store = ActivityStore::empty(MemoryStore::new());
        store.set(
            date(2024, 8, 15),
            DayRecord::projects([ProjectActivity::new("9", 2., "On call")]),
        )?;
        let august = YearMonth::new_opt(2024, 7).unwrap();
        let report = build_month_report(august, &store, &HolidayCalendar::national(), &projects());

        assert_eq!(report.rows.len(), 1);
        let row = &report.rows[0];
        assert_eq!(row.kind, LineKind::Project);
        assert_eq!(row.label, UNKNOWN_PROJECT);
        assert_eq!(
            row.head.as_ref().unwrap().status,
            DayStatus::Holiday("Assumption of Mary")
        );
        assert_eq!(report.statistics.holidays, 0);
        assert_eq!(report.statistics.workdays_with_projects, 1);
        Ok(())
    }

    #[test]
    fn weekend_work_is_not_a_workday() -> Result<()> {
        let mut store = ActivityStore::empty(MemoryStore::new());
        store.set(
            date(2024, 3, 9),
            DayRecord::projects([ProjectActivity::new("1", 4., "Site visit")]),
        )?;
        let march = YearMonth::new_opt(2024, 2).unwrap();
        let report = build_month_report(march, &store, &HolidayCalendar::national(), &projects());

        assert_eq!(report.rows[0].head.as_ref().unwrap().status, DayStatus::Weekend);
        assert_eq!(report.statistics.workdays_with_projects, 0);
        assert_eq!(report.statistics.days_with_entries, 1);
        assert_eq!(report.statistics.project_hours, 4.);
        Ok(())
    }

    #[test]
    fn legacy_text_is_reported_without_hours() -> Result<()> {
        use serde_json::json;

        let backend = MemoryStore::new().with_entry(
            crate::storage::activity_store::ACTIVITIES_KEY,
            json!({ "2024-03-12": "Wrote the tender documentation" }),
        );
        let store = ActivityStore::load(&backend)?;
        let march = YearMonth::new_opt(2024, 2).unwrap();
        let report = build_month_report(march, &store, &HolidayCalendar::national(), &projects());

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].kind, LineKind::LegacyNote);
        assert_eq!(report.rows[0].description, "Wrote the tender documentation");
        assert_eq!(report.statistics.days_with_entries, 1);
        assert_eq!(report.statistics.total_hours, 0.);
        Ok(())
    }

    #[test]
    fn empty_month_has_empty_body() {
        let store = ActivityStore::empty(MemoryStore::new());
        // March 2024 has no holidays.
        let march = YearMonth::new_opt(2024, 2).unwrap();
        let report = build_month_report(march, &store, &HolidayCalendar::national(), &[]);
        assert!(report.rows.is_empty());
        assert_eq!(report.statistics, Default::default());
    }

    #[test]
    fn header_requires_employee() {
        let month = YearMonth::new_opt(2024, 4).unwrap();
        assert!(ReportHeader::new("  ", month).is_err());
        assert_eq!(ReportHeader::new(" Ana ", month).unwrap().employee, "Ana");
    }

    #[test]
    fn file_stem_uses_employee_and_month() {
        let month = YearMonth::new_opt(2024, 4).unwrap();
        let store = ActivityStore::empty(MemoryStore::new());
        let report = super::Report {
            header: ReportHeader::new("Ana  Maria Pop", month).unwrap(),
            body: build_month_report(month, &store, &HolidayCalendar::national(), &[]),
        };
        assert_eq!(report.file_stem(), "Report_Ana_Maria_Pop_05-2024");
    }
}
