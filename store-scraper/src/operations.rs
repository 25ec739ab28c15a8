use std::collections::BTreeSet;
use std::env;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use chrono::Local;
use log::{debug, info, warn};
use regex::Regex;
use reqwest::blocking::Client;
use serde::Serialize;

use crate::cli::{CaptureArchiveArgs, CollectUrlsArgs, DownloadArgs};
use crate::logging::LoggingContext;
use crate::wpull;

pub const STORE_BASE_URL: &str = "https://store.playstation.com";

/// Region used for the browse listing when collecting URLs.
pub const COLLECT_REGION: &str = "en-us";

const MAX_BROWSE_PAGES: usize = 2000;

/// The work behind each subcommand. The dispatcher only sees this trait.
pub trait Operations {
    fn collect_urls(&self, args: &CollectUrlsArgs, logging: &LoggingContext) -> Result<()>;

    fn download_via_external_tool(&self, args: &DownloadArgs, logging: &LoggingContext)
        -> Result<()>;

    fn capture_archive(&self, args: &CaptureArchiveArgs, logging: &LoggingContext) -> Result<()>;
}

/// Talks to the real store and the real wpull binary.
#[derive(Debug, Default)]
pub struct StoreOperations;

impl Operations for StoreOperations {
    fn collect_urls(&self, args: &CollectUrlsArgs, _logging: &LoggingContext) -> Result<()> {
        let client = http_client()?;
        let mut urls = BTreeSet::new();

        for page in 1..=MAX_BROWSE_PAGES {
            let url = browse_page_url(COLLECT_REGION, page);
            debug!("Fetching browse page {}", url);

            let body = client
                .get(&url)
                .send()
                .and_then(|r| r.error_for_status())
                .with_context(|| format!("Failed to fetch browse page {}", url))?
                .text()
                .with_context(|| format!("Failed to read browse page {}", url))?;

            let before = urls.len();
            urls.extend(product_urls(&body, COLLECT_REGION));
            let found = urls.len() - before;
            info!("Page {}: {} new product URLs ({} total)", page, found, urls.len());

            if found == 0 {
                break;
            }
        }

        let urls: Vec<String> = urls.into_iter().collect();
        save_list(&args.outfile, &urls)?;

        info!("Saved {} URLs to {}", urls.len(), args.outfile);
        Ok(())
    }

    fn download_via_external_tool(
        &self,
        args: &DownloadArgs,
        logging: &LoggingContext,
    ) -> Result<()> {
        let urls = read_list(&args.url_list)?;
        info!(
            "Downloading {} URLs from {} with {}",
            urls.len(),
            args.url_list,
            args.wpull_binary
        );

        let prefix = args
            .warc_output_folder
            .join(format!("store-{}", timestamp_slug()));

        let mut wpull = wpull::create_wpull_command(&args.wpull_binary);
        wpull
            .input_file(&args.url_list)
            .warc_file(&prefix)
            .database(&prefix.with_extension("db"))
            .verbosity(logging.is_verbose());

        let mut cmd = wpull.cmd();
        debug!("Running {:?}", cmd);

        let status = cmd
            .status()
            .with_context(|| format!("Failed to run wpull at {}", args.wpull_binary))?;
        if !status.success() {
            return Err(anyhow::anyhow!("wpull exited with {}", status));
        }

        info!("WARC written to {}.warc.gz", prefix.display());
        Ok(())
    }

    fn capture_archive(&self, args: &CaptureArchiveArgs, _logging: &LoggingContext) -> Result<()> {
        let skus = read_list(&args.sku_list)?;
        let region = args.region();
        let stamp = timestamp_slug();

        let capture_path = output_path(
            args.warc_output_file.as_deref(),
            &format!("capture-{}.jsonl", stamp),
        )?;
        let media_path = output_path(
            args.media_files_output_file.as_deref(),
            &format!("media-{}.txt", stamp),
        )?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&capture_path)
            .with_context(|| format!("Failed to open {}", capture_path.display()))?;
        let mut capture = BufWriter::new(file);

        let client = http_client()?;
        let mut media = BTreeSet::new();

        for (i, sku) in skus.iter().enumerate() {
            let url = product_url(&region, sku);
            info!("[{}/{}] capturing {}", i + 1, skus.len(), url);

            let response = client
                .get(&url)
                .send()
                .with_context(|| format!("Failed to fetch {}", url))?;
            let status = response.status();
            let body = response
                .text()
                .with_context(|| format!("Failed to read {}", url))?;

            if !status.is_success() {
                warn!("{} returned {}", url, status);
            }

            let found = media_urls(&body);
            debug!("{} references {} media files", url, found.len());
            media.extend(found);

            let record = CapturedPage {
                url: &url,
                status: status.as_u16(),
                fetched_at: Local::now().to_rfc3339(),
                body: &body,
            };
            serde_json::to_writer(&mut capture, &record)
                .with_context(|| format!("Failed to record {}", url))?;
            capture.write_all(b"\n")?;
        }
        capture.flush()?;

        let media: Vec<String> = media.into_iter().collect();
        save_list(&media_path, &media)?;

        info!(
            "Captured {} pages to {}, {} media URLs to {}",
            skus.len(),
            capture_path.display(),
            media.len(),
            media_path.display()
        );
        Ok(())
    }
}

/// One line of the capture file.
#[derive(Debug, Serialize)]
struct CapturedPage<'a> {
    url: &'a str,
    status: u16,
    fetched_at: String,
    body: &'a str,
}

fn http_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("store-scraper/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

fn timestamp_slug() -> String {
    Local::now().format("%Y-%m-%dT%H-%M-%S").to_string()
}

/// The given path, or `name` in the current directory.
fn output_path(given: Option<&Path>, name: &str) -> Result<PathBuf> {
    match given {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(env::current_dir()
            .context("Failed to get current directory")?
            .join(name)),
    }
}

/// Non-empty lines, trimmed, skipping `#` comments.
pub fn read_list(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// One entry per line, the format `read_list` and wpull's `--input-file` take.
pub fn save_list(path: &Path, entries: &[String]) -> Result<()> {
    let listing: String = entries.iter().map(|entry| format!("{}\n", entry)).collect();
    fs::write(path, listing).with_context(|| format!("Failed to write {}", path.display()))
}

pub fn browse_page_url(region: &str, page: usize) -> String {
    format!("{}/{}/pages/browse/{}", STORE_BASE_URL, region, page)
}

pub fn product_url(region: &str, sku: &str) -> String {
    format!("{}/{}/product/{}", STORE_BASE_URL, region, sku)
}

/// Product links in a raw page body, rewritten to `region`.
pub fn product_urls(body: &str, region: &str) -> BTreeSet<String> {
    static PRODUCT: OnceLock<Regex> = OnceLock::new();
    let re = PRODUCT.get_or_init(|| {
        Regex::new(r"/[a-z]{2}-[a-z]{2}/product/([A-Z0-9][A-Z0-9_-]+)").expect("valid regex")
    });

    re.captures_iter(body)
        .map(|caps| product_url(region, &caps[1]))
        .collect()
}

/// Image and video URLs on the store's media hosts.
pub fn media_urls(body: &str) -> BTreeSet<String> {
    static MEDIA: OnceLock<Regex> = OnceLock::new();
    let re = MEDIA.get_or_init(|| {
        Regex::new(
            r#"https://(?:image\.api\.playstation\.com|vulcan\.dl\.playstation\.net|gs2-sec\.ww\.prod\.dl\.playstation\.net)/[^\s"'<>\\)]+"#,
        )
        .expect("valid regex")
    });

    re.find_iter(body).map(|m| m.as_str().to_string()).collect()
}
