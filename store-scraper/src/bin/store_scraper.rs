use std::process::ExitCode;

use store_scraper::{run, StoreOperations};

fn main() -> ExitCode {
    run(std::env::args_os(), &StoreOperations)
}
