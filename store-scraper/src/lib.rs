pub mod cli;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod operations;
pub mod paths;
pub mod wpull;

#[cfg(test)]
pub mod tests;

// Re-export key types and functions for easier access
pub use crate::cli::{parse_from, Cli, GlobalOptions, Operation};
pub use crate::dispatch::{dispatch, run, Outcome};
pub use crate::error::{CliError, LoggingError, PathFailure, PathValidationError};
pub use crate::logging::{LogSink, LoggingConfig, LoggingContext};
pub use crate::operations::{Operations, StoreOperations};
pub use crate::paths::{resolve, PathPolicy, ResolvedPath};
