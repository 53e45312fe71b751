use std::{fmt::Display, io::Write};

use anyhow::Result;
use clap::ValueEnum;

use super::{statistics::MonthStatistics, Report, ReportRow};

pub const COLUMNS: [&str; 6] = [
    "Date",
    "Weekday",
    "Project/Label",
    "Hours",
    "Description",
    "Status",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Tab separated rows, can be pasted into a spreadsheet.
    Text,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "tsv",
            OutputFormat::Json => "json",
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

pub fn render(report: &Report, format: OutputFormat, out: &mut impl Write) -> Result<()> {
    match format {
        OutputFormat::Text => write_text(report, out),
        OutputFormat::Json => write_json(report, out),
    }
}

pub fn write_json(report: &Report, out: &mut impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}

/// Writes the report as tab separated rows. Merged cells are only filled on the first row of a day.
pub fn write_text(report: &Report, out: &mut impl Write) -> Result<()> {
    let header = &report.header;
    writeln!(out, "{}", header.title)?;
    writeln!(out, "Employee: {}", header.employee)?;
    writeln!(out, "Month: {}", header.month.long_name())?;
    writeln!(out)?;

    writeln!(out, "{}", COLUMNS.join("\t"))?;
    for row in &report.body.rows {
        writeln!(out, "{}", row_cells(row).join("\t"))?;
    }

    writeln!(out)?;
    for line in statistics_lines(&report.body.statistics) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

fn row_cells(row: &ReportRow) -> [String; 6] {
    let (date, weekday, status) = match &row.head {
        Some(head) => (
            head.date.format("%d.%m.%Y").to_string(),
            head.weekday.clone(),
            head.status.to_string(),
        ),
        None => Default::default(),
    };
    [
        date,
        weekday,
        clean_cell(&row.label),
        row.hours.map(format_hours).unwrap_or_default(),
        clean_cell(&row.description),
        status,
    ]
}

pub fn statistics_lines(statistics: &MonthStatistics) -> Vec<String> {
    vec![
        "Statistics:".to_owned(),
        format!("Total days with entries: {}", statistics.days_with_entries),
        format!("Workdays with project activity: {}", statistics.workdays_with_projects),
        format!("Holidays: {}", statistics.holidays),
        format!(
            "Vacation days: {} ({}h)",
            statistics.vacation_days,
            format_hours(statistics.vacation_hours)
        ),
        format!("Project hours: {}", format_hours(statistics.project_hours)),
        format!("Total hours: {}", format_hours(statistics.total_hours)),
    ]
}

pub fn format_hours(hours: f64) -> String {
    // Avoids 0.1 + 0.2 style noise in sums.
    let rounded = (hours * 100.).round() / 100.;
    format!("{rounded}")
}

/// Tabs and line breaks would break the row structure.
fn clean_cell(value: &str) -> String {
    value
        .split(['\t', '\n', '\r'])
        .filter(|v| !v.trim().is_empty())
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ")
}
