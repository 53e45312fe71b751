use std::fmt::Display;

use ansi_term::{Colour, Style};
use anyhow::{anyhow, bail, Result};
use chrono::NaiveDate;
use chrono_english::parse_date_string;
use clap::ValueEnum;
use tracing::info;

use crate::{
    calendar::{date_key, holidays::HolidayCalendar, is_weekend, YearMonth},
    storage::{
        activity_store::ActivityStore,
        key_value::KeyValueStore,
        projects::{Project, ProjectRegistry},
        records::{DayRecord, ProjectActivity},
    },
    utils::clock::Clock,
};

use super::resolve_month;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Clone, clap::Args)]
pub struct DayArg {
    #[arg(help = "Day to change. \
                  Examples are \"today\", \"yesterday\", \"2025-03-15\", \"15/03/2025\"")]
    day: String,
    #[arg(
        long,
        default_value_t = DateStyle::Uk,
        help = "Style of dates used during parsing. \
                For Uk it's day/month/year. For Us it's month/day/year"
    )]
    date_style: DateStyle,
}

#[derive(Debug, clap::Args)]
pub struct LogCommand {
    #[command(flatten)]
    day: DayArg,
    #[arg(long, short, help = "Project id or name")]
    project: String,
    #[arg(long = "hours", short = 'H')]
    hours: f64,
    #[arg(long, short, default_value = "")]
    description: String,
}

#[derive(Debug, clap::Args)]
pub struct VacationCommand {
    #[command(flatten)]
    day: DayArg,
    #[arg(long = "hours", short = 'H', default_value_t = 8.)]
    hours: f64,
}

/// Parses a day argument. Days after today are refused.
pub fn parse_day(arg: &DayArg, clock: &impl Clock) -> Result<NaiveDate> {
    let day = match date_key::parse(&arg.day) {
        Some((year, month0, day)) => NaiveDate::from_ymd_opt(year, month0 + 1, day)
            .ok_or_else(|| anyhow!("{} is not a valid day", arg.day))?,
        None => parse_date_string(&arg.day, clock.now(), arg.date_style.into())
            .map_err(|e| anyhow!("Failed to validate day {}: {e}", arg.day))?
            .date_naive(),
    };

    if day > clock.today() {
        bail!("{day} is in the future, activity can only be recorded up to today");
    }
    Ok(day)
}

/// Finds a project by id first and by case insensitive name second.
pub fn find_project(projects: &[Project], query: &str) -> Result<Project> {
    let query = query.trim();
    projects
        .iter()
        .find(|v| v.id.as_str() == query)
        .or_else(|| {
            projects
                .iter()
                .find(|v| v.name.to_lowercase() == query.to_lowercase())
        })
        .cloned()
        .ok_or_else(|| {
            anyhow!("There is no project {query}. Add it with `dayledger project add`")
        })
}

pub fn process_log_command(
    LogCommand {
        day,
        project,
        hours,
        description,
    }: LogCommand,
    state: &impl KeyValueStore,
    clock: &impl Clock,
) -> Result<()> {
    let day = parse_day(&day, clock)?;
    let project = find_project(&ProjectRegistry::load(state)?.projects(), &project)?;

    let mut store = ActivityStore::load(state)?;
    let activity = ProjectActivity::new(project.id.clone(), hours, description);
    let record = if hours == 0. {
        info!("No hours for {} on {day}, removing its entry", project.name);
        store.get(day).without_project(&project.id)
    } else if activity.is_valid() {
        store.get(day).with_project(activity)
    } else {
        bail!("Hours should be positive and a description is required");
    };
    store.set(day, record)?;

    println!("{day}: {}", store.get(day).summary());
    Ok(())
}

pub fn process_vacation_command(
    VacationCommand { day, hours }: VacationCommand,
    state: &impl KeyValueStore,
    clock: &impl Clock,
) -> Result<()> {
    let day = parse_day(&day, clock)?;
    let mut store = ActivityStore::load(state)?;
    store.set(day, DayRecord::Vacation { hours })?;
    println!("{day}: {}", store.get(day).summary());
    Ok(())
}

pub fn process_clear_command(
    day: DayArg,
    state: &impl KeyValueStore,
    clock: &impl Clock,
) -> Result<()> {
    let day = parse_day(&day, clock)?;
    let mut store = ActivityStore::load(state)?;
    store.set(day, DayRecord::Empty)?;
    println!("{day}: cleared");
    Ok(())
}

/// Prints every day of a month with what was recorded on it.
pub fn process_show_command(
    month: Option<YearMonth>,
    state: &impl KeyValueStore,
    clock: &impl Clock,
) -> Result<()> {
    let month = resolve_month(month, clock)?;
    let store = ActivityStore::load(state)?;
    let projects = ProjectRegistry::load(state)?;
    let calendar = HolidayCalendar::national();

    println!("{}", Style::new().bold().paint(month.long_name()));
    for day in month.days() {
        let date = day.format("%d.%m %a").to_string();
        let date = match calendar.is_holiday(day) {
            Some(holiday) => format!("{} {}", Colour::Red.paint(date), holiday.name),
            None if is_weekend(day) => Style::new().dimmed().paint(date).to_string(),
            None => date,
        };

        match store.get(day) {
            DayRecord::Projects { entries } => {
                println!("{date}");
                for entry in entries {
                    let name = projects
                        .resolve(&entry.project_id)
                        .map(|v| v.name)
                        .unwrap_or_else(|| entry.project_id.to_string());
                    println!("\t{name}\t{}h\t{}", entry.hours, entry.description);
                }
            }
            record => println!("{date}\t{}", record.summary()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{Duration, NaiveDate};
    use chrono::{TimeZone, Utc};

    use super::{
        find_project, parse_day, process_clear_command, process_log_command,
        process_vacation_command, DateStyle, DayArg, LogCommand, VacationCommand,
    };
    use crate::{
        cli::test_clock::FixedClock,
        storage::{
            activity_store::ActivityStore,
            key_value::MemoryStore,
            projects::ProjectRegistry,
            records::{DayRecord, ProjectActivity},
        },
    };

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
    }

    fn day_arg(day: &str) -> DayArg {
        DayArg {
            day: day.into(),
            date_style: DateStyle::Uk,
        }
    }

    fn log(day: &str, project: &str, hours: f64, description: &str) -> LogCommand {
        LogCommand {
            day: day_arg(day),
            project: project.into(),
            hours,
            description: description.into(),
        }
    }

    #[test]
    fn day_arguments() -> Result<()> {
        let clock = FixedClock(today());
        assert_eq!(
            parse_day(&day_arg("2024-05-06"), &clock)?,
            NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
        );
        assert_eq!(parse_day(&day_arg("yesterday"), &clock)?, today() - Duration::days(1));
        assert_eq!(parse_day(&day_arg("today"), &clock)?, today());
        assert!(parse_day(&day_arg("2024-05-21"), &clock).is_err());
        assert!(parse_day(&day_arg("2024-02-30"), &clock).is_err());
        Ok(())
    }

    #[test]
    fn log_vacation_and_clear() -> Result<()> {
        let clock = FixedClock(today());
        let state = MemoryStore::new();
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bridge = ProjectRegistry::load(&state)?.add("Bridge", created)?;
        let day = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        let run = |project: &str, hours: f64, description: &str| {
            process_log_command(log("2024-05-06", project, hours, description), &state, &clock)
        };

        run("bridge", 3., "Survey")?;
        run(bridge.id.as_str(), 4., "Survey, day two")?;
        assert_eq!(
            ActivityStore::load(&state)?.get(day),
            DayRecord::projects([ProjectActivity::new(bridge.id.clone(), 4., "Survey, day two")])
        );

        assert!(run("Tunnel", 1., "x").is_err());

        process_vacation_command(
            VacationCommand {
                day: day_arg("2024-05-06"),
                hours: 8.,
            },
            &state,
            &clock,
        )?;
        assert_eq!(ActivityStore::load(&state)?.get(day), DayRecord::vacation());

        run("Bridge", 2., "Survey")?;
        assert!(run("Bridge", 2., " ").is_err());
        assert!(run("Bridge", -1., "Survey").is_err());
        assert!(run("Bridge", f64::INFINITY, "Survey").is_err());
        assert_eq!(
            ActivityStore::load(&state)?.get(day),
            DayRecord::projects([ProjectActivity::new(bridge.id.clone(), 2., "Survey")])
        );
        run("Bridge", 0., "")?;
        assert_eq!(ActivityStore::load(&state)?.get(day), DayRecord::Empty);

        run("Bridge", 2., "Survey")?;
        process_clear_command(day_arg("2024-05-06"), &state, &clock)?;
        assert!(ActivityStore::load(&state)?.is_empty());
        Ok(())
    }

    #[test]
    fn project_lookup_by_id_or_name() -> Result<()> {
        let state = MemoryStore::new();
        let mut registry = ProjectRegistry::load(&state)?;
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let tunnel = registry.add("Tunnel", created)?;
        let projects = registry.projects();

        assert_eq!(find_project(&projects, tunnel.id.as_str())?, tunnel);
        assert_eq!(find_project(&projects, " tUNNEL ")?, tunnel);
        assert!(find_project(&projects, "Bridge").is_err());
        Ok(())
    }
}
