use std::ffi::OsStr;
use std::path::Path;
use std::process::Command;

#[derive(Debug)]
pub struct Wpull {
    cmd: Command,
}

impl Wpull {
    pub fn cmd(self) -> Command {
        self.cmd
    }

    pub fn arg<S: AsRef<OsStr>>(&mut self, arg: S) -> &mut Wpull {
        self.cmd.arg(arg);
        self
    }

    /// Read the URLs to fetch from `path`, one per line.
    pub fn input_file(&mut self, path: &Path) -> &mut Wpull {
        self.arg("--input-file").arg(path)
    }

    /// wpull adds `.warc.gz` itself, and writes a CDX index next to it.
    pub fn warc_file(&mut self, prefix: &Path) -> &mut Wpull {
        self.arg("--warc-file").arg(prefix).arg("--warc-cdx")
    }

    /// Keep wpull's resume state in a sqlite file so an interrupted run can continue.
    pub fn database(&mut self, path: &Path) -> &mut Wpull {
        self.arg("--database").arg(path)
    }

    pub fn verbosity(&mut self, verbose: bool) -> &mut Wpull {
        if verbose {
            self.arg("--verbose")
        } else {
            self.arg("--quiet")
        }
    }
}

pub fn create_wpull_command(binary: &Path) -> Wpull {
    let mut cmd = Command::new(binary);
    cmd.args(["--no-robots", "--no-check-certificate", "--delete-after"]);
    Wpull { cmd }
}
