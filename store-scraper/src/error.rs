use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::paths::PathPolicy;

/// A raw path string that failed the policy declared for its option.
#[derive(Debug, Error)]
#[error("`{raw}` rejected as {policy}: {kind}")]
pub struct PathValidationError {
    pub raw: String,
    pub policy: PathPolicy,
    pub kind: PathFailure,
}

#[derive(Debug, Error)]
pub enum PathFailure {
    #[error("path is empty")]
    Empty,

    #[error("failed to parse as a path: {0}")]
    Resolve(#[source] io::Error),

    #[error("the parent directory of `{}` doesn't exist", .0.display())]
    MissingParent(PathBuf),

    #[error("the path `{}` is not a file", .0.display())]
    NotAFile(PathBuf),

    #[error("the path `{}` is not a directory", .0.display())]
    NotADirectory(PathBuf),
}

/// Failures raised before logging exists. These go to stderr.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Schema(#[from] clap::Error),

    #[error("failed to read argument file `{}`: {source}", path.display())]
    ArgFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CliError {
    /// `--help` and `--version` come back from clap as errors but are not failures.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Schema(err) if !err.use_stderr() => 0,
            _ => 1,
        }
    }

    /// Print the error the way clap would, without exiting.
    pub fn report(&self) {
        match self {
            CliError::Schema(err) => {
                let _ = err.print();
            }
            other => eprintln!("error: {}", other),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to open log file `{}`: {source}", path.display())]
    OpenLogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("logging was already configured for this process")]
    AlreadyInstalled(#[from] log::SetLoggerError),
}
