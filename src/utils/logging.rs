use std::{path::PathBuf, sync::LazyLock};

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::{
    fmt::{format::FmtSpan, writer::MakeWriterExt},
    EnvFilter,
};

pub const LOG_PREFIX: &str = "dayledger";
const KEPT_LOG_FILES: usize = 5;
const DEFAULT_LEVEL: &str = "debug";

/// How the process logs. Files are always written, the console only gets logs when `console` is
/// set. The console is stderr so reports printed to stdout stay clean.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub level: Option<LevelFilter>,
    pub console: bool,
}

impl LoggingConfig {
    /// Level from the arguments first, then `RUST_LOG`, then [DEFAULT_LEVEL]. Only this crate's
    /// events pass the filter.
    pub fn directive(&self, env_level: Option<String>) -> String {
        let level = self
            .level
            .map(|v| v.to_string().to_lowercase())
            .or(env_level)
            .unwrap_or_else(|| DEFAULT_LEVEL.into());
        format!("{}={level}", env!("CARGO_PKG_NAME").replace('-', "_"))
    }
}

pub fn enable_logging(config: &LoggingConfig) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(KEPT_LOG_FILES)
        .filename_prefix(LOG_PREFIX)
        .build(&config.directory)?;

    let console = config.console;
    let stderr = std::io::stderr.with_filter(move |_| console);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(
            config.directive(std::env::var("RUST_LOG").ok()),
        ))
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(stderr.and(appender))
        .pretty()
        .init();
    Ok(())
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .pretty()
        .init()
});
