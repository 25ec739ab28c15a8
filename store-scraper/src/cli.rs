use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};

use crate::error::CliError;
use crate::paths::{self, ResolvedPath};

/// Scrape the game store
#[derive(Parser, Debug)]
#[command(
    name = "store_scraper",
    version,
    about = "scrape the game store",
    long_about = None,
    after_help = "Arguments can be read from a file with `@path`, one argument per line."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub operation: Option<Operation>,
}

/// Options that apply whichever subcommand runs. They go before the subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalOptions {
    /// Log to the specified file instead of stdout
    #[arg(long, value_parser = paths::optional_existing_file)]
    pub log_to_file_path: Option<ResolvedPath>,

    /// Increase logging verbosity
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Operation {
    /// Scrape product URLs to a list
    #[command(name = "collect-URLs", alias = "scrape_urls")]
    CollectUrls(CollectUrlsArgs),

    /// Download URLs with wpull
    #[command(name = "download-via-external-tool", alias = "wpull_urls")]
    DownloadViaExternalTool(DownloadArgs),

    /// Capture product pages and list the media they reference
    #[command(name = "capture-archive", alias = "warcio_scrape")]
    CaptureArchive(CaptureArchiveArgs),
}

impl Operation {
    /// The subcommand name as typed on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::CollectUrls(_) => "collect-URLs",
            Operation::DownloadViaExternalTool(_) => "download-via-external-tool",
            Operation::CaptureArchive(_) => "capture-archive",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct CollectUrlsArgs {
    /// Where to save the URL list, one URL per line
    #[arg(long, value_parser = paths::new_file_location)]
    pub outfile: ResolvedPath,
}

#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    /// The list of URLs to download
    #[arg(long, value_parser = paths::existing_file)]
    pub url_list: ResolvedPath,

    /// The path to wpull
    #[arg(long, value_parser = paths::existing_file)]
    pub wpull_binary: ResolvedPath,

    /// Where to store the resulting WARCs
    #[arg(long, value_parser = paths::existing_directory)]
    pub warc_output_folder: ResolvedPath,
}

#[derive(Args, Debug, Clone)]
pub struct CaptureArchiveArgs {
    /// The list of SKUs to download
    #[arg(long, value_parser = paths::existing_file)]
    pub sku_list: ResolvedPath,

    /// First part of a region code, the `en` in `en-US`
    #[arg(long)]
    pub region_lang: String,

    /// Second part of a region code, the `us` in `en-US`
    #[arg(long)]
    pub region_country: String,

    /// Where to save the captured pages
    #[arg(long, value_parser = paths::optional_existing_file)]
    pub warc_output_file: Option<ResolvedPath>,

    /// Where to save the list of media URLs we discovered
    #[arg(long, value_parser = paths::optional_existing_file)]
    pub media_files_output_file: Option<ResolvedPath>,
}

impl CaptureArchiveArgs {
    /// `en` + `us` -> `en-us`
    pub fn region(&self) -> String {
        format!(
            "{}-{}",
            self.region_lang.to_lowercase(),
            self.region_country.to_lowercase()
        )
    }
}

/// Expand `@file` arguments, then parse. Stops at the first problem.
pub fn parse_from<I, T>(args: I) -> Result<Cli, CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args = expand_arg_files(args.into_iter().map(Into::into).collect())?;
    Ok(Cli::try_parse_from(args)?)
}

/// Usage text for when no subcommand was given.
pub fn write_usage(out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "{}", Cli::command().render_help())
}

/// Replace every `@path` token (after the program name) with the lines of
/// that file, one argument per line. Blank lines become empty arguments.
/// Files may reference other files.
pub fn expand_arg_files(args: Vec<OsString>) -> Result<Vec<OsString>, CliError> {
    let mut expanded = Vec::with_capacity(args.len());
    let mut iter = args.into_iter();

    // the program name is never an argfile
    if let Some(program) = iter.next() {
        expanded.push(program);
    }
    for arg in iter {
        expand_into(arg, &mut expanded, 0)?;
    }

    Ok(expanded)
}

const MAX_ARG_FILE_DEPTH: usize = 16;

fn expand_into(arg: OsString, out: &mut Vec<OsString>, depth: usize) -> Result<(), CliError> {
    let file = match arg.to_str().and_then(|s| s.strip_prefix('@')) {
        Some(file) if !file.is_empty() && depth < MAX_ARG_FILE_DEPTH => PathBuf::from(file),
        _ => {
            out.push(arg);
            return Ok(());
        }
    };

    let contents = fs::read_to_string(&file).map_err(|source| CliError::ArgFile {
        path: file.clone(),
        source,
    })?;

    for line in contents.lines() {
        expand_into(OsString::from(line), out, depth + 1)?;
    }

    Ok(())
}
