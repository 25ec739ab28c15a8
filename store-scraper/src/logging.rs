use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::panic;
use std::thread;

use chrono::{DateTime, Local};
use env_logger::{Builder, Logger, Target, WriteStyle};
use log::{Level, LevelFilter};

use crate::cli::GlobalOptions;
use crate::error::LoggingError;
use crate::paths::ResolvedPath;

/// Where log lines go. Exactly one of these per process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    Stdout,
    File(ResolvedPath),
}

impl fmt::Display for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogSink::Stdout => f.write_str("stdout"),
            LogSink::File(path) => write!(f, "file `{}`", path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub sink: LogSink,
    pub level: LevelFilter,
}

impl LoggingConfig {
    pub fn from_options(options: &GlobalOptions) -> Self {
        let sink = match &options.log_to_file_path {
            Some(path) => LogSink::File(path.clone()),
            None => LogSink::Stdout,
        };
        let level = if options.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        };

        LoggingConfig { sink, level }
    }

    /// Build the logger without installing it. Opens the log file (append) if
    /// one was asked for.
    pub fn build_logger(&self) -> Result<Logger, LoggingError> {
        let mut builder = Builder::new();
        builder
            .format(|buf, record| {
                let line = format_line(
                    Local::now(),
                    thread::current().name().unwrap_or("unnamed"),
                    record.target(),
                    record.level(),
                    record.args(),
                );
                writeln!(buf, "{}", line)
            })
            .filter_level(self.level)
            .write_style(WriteStyle::Never);

        match &self.sink {
            LogSink::Stdout => {
                builder.target(Target::Stdout);
            }
            LogSink::File(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|source| LoggingError::OpenLogFile {
                        path: path.to_path_buf(),
                        source,
                    })?;
                builder.target(Target::Pipe(Box::new(file)));
            }
        }

        Ok(builder.build())
    }

    /// Install the logger for the whole process, then the level, then route
    /// panic messages into the same sink. Fails if called twice.
    pub fn install(self) -> Result<LoggingContext, LoggingError> {
        let logger = self.build_logger()?;
        log::set_boxed_logger(Box::new(logger))?;
        log::set_max_level(self.level);
        capture_panics();

        Ok(LoggingContext { config: self })
    }
}

/// Proof that logging is configured. Handed to the dispatcher and to every
/// operation; there is no way to reconfigure through it.
#[derive(Debug)]
pub struct LoggingContext {
    config: LoggingConfig,
}

impl LoggingContext {
    pub fn level(&self) -> LevelFilter {
        self.config.level
    }

    pub fn is_verbose(&self) -> bool {
        self.config.level >= LevelFilter::Debug
    }

    pub fn sink(&self) -> &LogSink {
        &self.config.sink
    }

    #[cfg(test)]
    pub(crate) fn uninstalled(config: LoggingConfig) -> Self {
        LoggingContext { config }
    }
}

/// `<local iso-8601> <thread> <target> <LEVEL>: <message>`
pub fn format_line(
    now: DateTime<Local>,
    thread: &str,
    target: &str,
    level: Level,
    message: &fmt::Arguments<'_>,
) -> String {
    format!(
        "{} {:<10} {:<20} {:<8}: {}",
        now.to_rfc3339(),
        thread,
        target,
        level,
        message
    )
}

fn capture_panics() {
    panic::set_hook(Box::new(|info| {
        let thread = thread::current();
        log::error!(
            target: "panic",
            "thread '{}' {}",
            thread.name().unwrap_or("unnamed"),
            info
        );
    }));
}
