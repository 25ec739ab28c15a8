use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

use super::fixtures::{self, s, Scratch};
use super::write_list;
use crate::cli::{parse_from, DownloadArgs, Operation};
use crate::logging::{LoggingConfig, LoggingContext};
use crate::operations::{
    browse_page_url, media_urls, product_url, product_urls, read_list, save_list, Operations,
    StoreOperations,
};
use crate::wpull::create_wpull_command;

#[test]
fn test_media_urls_from_product_page() {
    let html = fixtures::load_html_fixture("product_page");
    let media: Vec<String> = media_urls(&html).into_iter().collect();

    // duplicates collapse, non-store hosts are ignored, output is sorted
    assert_eq!(
        media,
        vec![
            "https://gs2-sec.ww.prod.dl.playstation.net/gs2-sec/appkgo/prod/CUSA00001/icon.png",
            "https://image.api.playstation.com/vulcan/ap/rnd/202010/0222/cover.png",
            "https://image.api.playstation.com/vulcan/ap/rnd/202010/0222/screenshot1.jpg",
            "https://vulcan.dl.playstation.net/ap/rnd/202010/0222/trailer.mp4",
        ]
    );
}

#[test]
fn test_product_urls_are_rewritten_to_region() {
    let html = fixtures::load_html_fixture("product_page");
    let urls: Vec<String> = product_urls(&html, "en-gb").into_iter().collect();

    assert_eq!(
        urls,
        vec![
            "https://store.playstation.com/en-gb/product/EP0002-CUSA00002_00-OTHERGAME0000002",
            "https://store.playstation.com/en-gb/product/UP0001-CUSA00001_00-TESTGAME00000001",
        ]
    );
}

#[test]
fn test_store_urls() {
    assert_eq!(
        browse_page_url("en-us", 3),
        "https://store.playstation.com/en-us/pages/browse/3"
    );
    assert_eq!(
        product_url("ja-jp", "JP0001-PPSA00001_00-GAME"),
        "https://store.playstation.com/ja-jp/product/JP0001-PPSA00001_00-GAME"
    );
}

#[test]
fn test_read_list_skips_blanks_and_comments() -> Result<()> {
    let scratch = Scratch::new();
    let path = write_list(
        &scratch,
        "skus.txt",
        &["# from the october sale", "  SKU-1  ", "", "SKU-2", "#SKU-3"],
    )?;

    assert_eq!(read_list(&path)?, vec!["SKU-1", "SKU-2"]);
    Ok(())
}

#[test]
fn test_collected_list_feeds_the_download_step() -> Result<()> {
    let scratch = Scratch::new();
    let urls = vec![
        product_url("en-us", "EP0002-CUSA00002_00-OTHERGAME0000002"),
        product_url("en-us", "UP0001-CUSA00001_00-TESTGAME00000001"),
    ];

    // what collect-URLs writes to --outfile
    let outfile = scratch.path("urls.txt");
    save_list(&outfile, &urls)?;

    // read back exactly, no brackets or quotes for wpull to choke on
    assert_eq!(read_list(&outfile)?, urls);
    let contents = fs::read_to_string(&outfile)?;
    assert_eq!(contents.lines().collect::<Vec<_>>(), urls);

    // and the same file is accepted as --url-list
    scratch.file("bin/wpull", "");
    let cli = parse_from([
        "store_scraper",
        "download-via-external-tool",
        "--url-list",
        &s(&outfile),
        "--wpull-binary",
        &s(&scratch.path("bin/wpull")),
        "--warc-output-folder",
        &s(scratch.root()),
    ])?;
    assert!(matches!(
        cli.operation,
        Some(Operation::DownloadViaExternalTool(_))
    ));
    Ok(())
}

#[test]
fn test_wpull_command_line() {
    let mut wpull = create_wpull_command(Path::new("/opt/wpull/wpull"));
    wpull
        .input_file(Path::new("/data/urls.txt"))
        .warc_file(Path::new("/data/warcs/store-1"))
        .database(Path::new("/data/warcs/store-1.db"))
        .verbosity(false);
    let cmd = wpull.cmd();

    assert_eq!(cmd.get_program(), OsStr::new("/opt/wpull/wpull"));
    let args: Vec<&OsStr> = cmd.get_args().collect();
    assert_eq!(
        args,
        [
            "--no-robots",
            "--no-check-certificate",
            "--delete-after",
            "--input-file",
            "/data/urls.txt",
            "--warc-file",
            "/data/warcs/store-1",
            "--warc-cdx",
            "--database",
            "/data/warcs/store-1.db",
            "--quiet",
        ]
        .map(OsStr::new)
    );
}

#[test]
fn test_wpull_verbose_follows_logging() {
    let mut wpull = create_wpull_command(Path::new("wpull"));
    wpull.verbosity(true);
    let cmd = wpull.cmd();

    assert_eq!(cmd.get_args().last(), Some(OsStr::new("--verbose")));
}

fn download_args(scratch: &Scratch, binary: &Path) -> DownloadArgs {
    let urls = scratch.file("urls.txt", "https://example.com/\n");
    let out = scratch.dir("warcs");

    let cli = parse_from([
        "store_scraper",
        "download-via-external-tool",
        "--url-list",
        &s(&urls),
        "--wpull-binary",
        &s(binary),
        "--warc-output-folder",
        &s(&out),
    ])
    .unwrap();

    match cli.operation {
        Some(Operation::DownloadViaExternalTool(args)) => args,
        other => panic!("expected download-via-external-tool, got {:?}", other),
    }
}

fn quiet_logging() -> LoggingContext {
    let cli = parse_from(["store_scraper"]).unwrap();
    LoggingContext::uninstalled(LoggingConfig::from_options(&cli.global))
}

/// `/bin/true` or `/bin/false`, unless it's a multi-call binary that would
/// choke on wpull's arguments.
fn coreutil(name: &str) -> Option<PathBuf> {
    let path = fs::canonicalize(Path::new("/bin").join(name)).ok()?;
    (path.file_name() == Some(OsStr::new(name))).then_some(path)
}

#[cfg(unix)]
#[test]
fn test_download_succeeds_when_tool_exits_zero() {
    let Some(binary) = coreutil("true") else {
        return;
    };
    let scratch = Scratch::new();
    let args = download_args(&scratch, &binary);

    StoreOperations
        .download_via_external_tool(&args, &quiet_logging())
        .unwrap();
}

#[cfg(unix)]
#[test]
fn test_download_fails_when_tool_exits_nonzero() {
    let Some(binary) = coreutil("false") else {
        return;
    };
    let scratch = Scratch::new();
    let args = download_args(&scratch, &binary);

    let err = StoreOperations
        .download_via_external_tool(&args, &quiet_logging())
        .unwrap_err();
    assert!(err.to_string().contains("wpull exited with"), "{}", err);
}
