use std::ffi::OsString;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::process::ExitCode;

use anyhow::Result;
use log::{debug, error, info, warn};

use crate::cli::{self, Cli, Operation};
use crate::logging::{LoggingConfig, LoggingContext};
use crate::operations::Operations;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The selected operation finished.
    Completed,
    /// No subcommand was given; usage was printed.
    NoOperation,
    /// The operation returned an error or panicked.
    Failed,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Outcome::Completed | Outcome::NoOperation => ExitCode::SUCCESS,
            Outcome::Failed => ExitCode::FAILURE,
        }
    }
}

/// Parse, configure logging, dispatch. Argument and logging setup errors
/// are printed to stderr because there is no logger yet.
pub fn run<I, T>(args: I, operations: &dyn Operations) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let cli = match cli::parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            err.report();
            return ExitCode::from(err.exit_code());
        }
    };

    let logging = match LoggingConfig::from_options(&cli.global).install() {
        Ok(logging) => logging,
        Err(err) => {
            eprintln!("error: {}", err);
            return ExitCode::FAILURE;
        }
    };

    dispatch(&cli, &logging, operations, &mut io::stdout()).exit_code()
}

/// Run the selected operation. The only place failures from an operation are
/// caught; everything below here propagates. Usage goes to `usage` when no
/// subcommand was given.
pub fn dispatch(
    cli: &Cli,
    logging: &LoggingContext,
    operations: &dyn Operations,
    usage: &mut dyn Write,
) -> Outcome {
    debug!("Parsed arguments: {:?}", cli);
    debug!("Logging to {} at level {}", logging.sink(), logging.level());

    let Some(operation) = &cli.operation else {
        info!("no subcommand specified!");
        if let Err(err) = cli::write_usage(usage) {
            warn!("Failed to print usage: {}", err);
        }
        return Outcome::NoOperation;
    };

    info!("Running {}", operation.name());
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        invoke(operation, logging, operations)
    }));

    match result {
        Ok(Ok(())) => {
            info!("Done!");
            Outcome::Completed
        }
        Ok(Err(err)) => {
            error!("Something went wrong! {} failed: {:?}", operation.name(), err);
            Outcome::Failed
        }
        Err(_) => {
            // the panic hook has already logged the payload and location
            error!("Something went wrong! {} panicked", operation.name());
            Outcome::Failed
        }
    }
}

fn invoke(
    operation: &Operation,
    logging: &LoggingContext,
    operations: &dyn Operations,
) -> Result<()> {
    match operation {
        Operation::CollectUrls(args) => operations.collect_urls(args, logging),
        Operation::DownloadViaExternalTool(args) => {
            operations.download_via_external_tool(args, logging)
        }
        Operation::CaptureArchive(args) => operations.capture_archive(args, logging),
    }
}
