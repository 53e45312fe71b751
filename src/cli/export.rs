use std::{
    fs::File,
    io::{stdout, BufWriter, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use chrono::Datelike;
use tracing::info;

use crate::{
    calendar::{holidays::HolidayCalendar, YearMonth},
    report::{
        build_month_report,
        render::{render, OutputFormat},
        Report, ReportHeader,
    },
    storage::{
        activity_store::ActivityStore, key_value::KeyValueStore, load_employee_name,
        projects::ProjectRegistry,
    },
    utils::clock::Clock,
};

use super::resolve_month;

#[derive(Debug, clap::Args)]
pub struct ExportCommand {
    #[arg(long, short, help = "Month as YYYY-MM. Defaults to the current month")]
    month: Option<YearMonth>,
    #[arg(long, short, help = "Employee name. Defaults to the one saved with `login`")]
    employee: Option<String>,
    #[arg(long, short, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    #[arg(
        long,
        short,
        help = "Directory the report file is written into. Prints to stdout when missing"
    )]
    out: Option<PathBuf>,
}

/// Builds the report for a month. The employee name is checked before anything else is loaded.
pub fn prepare_report(
    month: Option<YearMonth>,
    employee: Option<String>,
    state: &impl KeyValueStore,
    clock: &impl Clock,
) -> Result<Report> {
    let employee = match employee {
        Some(employee) => employee,
        None => load_employee_name(state)?.unwrap_or_default(),
    };
    let month = resolve_month(month, clock)?;
    let header = ReportHeader::new(&employee, month)?;

    let store = ActivityStore::load(state)?;
    let projects = ProjectRegistry::load(state)?.projects();
    let body = build_month_report(month, &store, &HolidayCalendar::national(), &projects);
    Ok(Report { header, body })
}

pub fn process_export_command(
    ExportCommand {
        month,
        employee,
        format,
        out,
    }: ExportCommand,
    state: &impl KeyValueStore,
    clock: &impl Clock,
) -> Result<()> {
    let report = prepare_report(month, employee, state, clock)?;

    match out {
        Some(dir) => {
            let path = dir.join(format!("{}.{}", report.file_stem(), format.extension()));
            let file = File::create(&path)
                .with_context(|| format!("Failed to create report file {path:?}"))?;
            let mut writer = BufWriter::new(file);
            render(&report, format, &mut writer)?;
            writer.flush()?;
            info!("Report written to {path:?}");
            println!("{}", path.display());
        }
        None => render(&report, format, &mut stdout().lock())?,
    }
    Ok(())
}

pub fn process_holidays_command(year: Option<i32>, clock: &impl Clock) -> Result<()> {
    let year = year.unwrap_or_else(|| clock.today().year());
    for holiday in HolidayCalendar::national().holidays_of(year) {
        println!(
            "{:02}.{:02}.{year}\t{}",
            holiday.day,
            holiday.month + 1,
            holiday.name
        );
    }
    Ok(())
}
