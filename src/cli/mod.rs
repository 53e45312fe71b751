pub mod activity;
pub mod export;
pub mod projects;

use std::path::PathBuf;

use activity::{
    process_clear_command, process_log_command, process_show_command, process_vacation_command,
    DayArg, LogCommand, VacationCommand,
};
use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use export::{process_export_command, process_holidays_command, ExportCommand};
use projects::{process_project_command, ProjectCommand};
use tracing::{info, level_filters::LevelFilter};

use crate::{
    calendar::YearMonth,
    storage::{forget_employee_name, key_value::JsonFileStore, save_employee_name},
    utils::{
        clock::{Clock, DefaultClock},
        dir::AppPaths,
        logging::{enable_logging, LoggingConfig},
    },
};

/// Years the `holidays` command accepts.
const MIN_YEAR: i64 = 1900;
const MAX_YEAR: i64 = 9999;

#[derive(Parser, Debug)]
#[command(name = "Dayledger", version, long_about = None)]
#[command(about = "Monthly work activity ledger", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Print logs to the console")]
    log: bool,
    #[arg(long = "log-filter", help = "Log level, for example info or trace")]
    log_filter: Option<LevelFilter>,
    #[arg(
        long,
        global = true,
        help = "Application directory. \
                By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Remember the employee name reports are exported for")]
    Login { name: String },
    #[command(about = "Forget the employee name")]
    Logout {},
    #[command(about = "Manage projects")]
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },
    #[command(
        about = "Record hours spent on a project. Zero hours remove the project from the day"
    )]
    Log {
        #[command(flatten)]
        command: LogCommand,
    },
    #[command(about = "Mark a day as vacation")]
    Vacation {
        #[command(flatten)]
        command: VacationCommand,
    },
    #[command(about = "Remove everything recorded for a day")]
    Clear {
        #[command(flatten)]
        day: DayArg,
    },
    #[command(about = "Show what was recorded during a month")]
    Show {
        #[arg(long, short, help = "Month as YYYY-MM. Defaults to the current month")]
        month: Option<YearMonth>,
    },
    #[command(about = "Export the monthly report")]
    Export {
        #[command(flatten)]
        command: ExportCommand,
    },
    #[command(about = "List legal holidays of a year")]
    Holidays {
        #[arg(
            help = "Defaults to the current year",
            value_parser = clap::value_parser!(i32).range(MIN_YEAR..=MAX_YEAR)
        )]
        year: Option<i32>,
    },
}

pub fn run_cli() -> Result<()> {
    let args = Args::parse();

    let logging_level = args
        .log_filter
        .or_else(|| args.log.then_some(LevelFilter::TRACE));
    let paths = AppPaths::resolve(args.dir)?;
    enable_logging(&LoggingConfig {
        directory: paths.logs(),
        level: logging_level,
        console: args.log,
    })?;

    let state = JsonFileStore::new(paths.state_file())?;
    let clock = DefaultClock;
    info!("Using state file {:?}", state.path());

    match args.commands {
        Commands::Login { name } => {
            let name = save_employee_name(&state, &name)?;
            println!("Reports will be exported for {name}");
            Ok(())
        }
        Commands::Logout {} => forget_employee_name(&state),
        Commands::Project { command } => process_project_command(command, &state, &clock),
        Commands::Log { command } => process_log_command(command, &state, &clock),
        Commands::Vacation { command } => process_vacation_command(command, &state, &clock),
        Commands::Clear { day } => process_clear_command(day, &state, &clock),
        Commands::Show { month } => process_show_command(month, &state, &clock),
        Commands::Export { command } => process_export_command(command, &state, &clock),
        Commands::Holidays { year } => process_holidays_command(year, &clock),
    }
}

/// Resolves an optional month argument. Months after the current one can't be browsed.
pub fn resolve_month(month: Option<YearMonth>, clock: &impl Clock) -> Result<YearMonth> {
    let today = clock.today();
    let current = YearMonth::of(today).ok_or_else(|| anyhow!("{today} is out of range"))?;
    let month = month.unwrap_or(current);
    if month > current {
        bail!("{month} is in the future, the latest available month is {current}");
    }
    Ok(month)
}
