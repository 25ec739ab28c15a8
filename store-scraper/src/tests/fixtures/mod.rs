use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Load test HTML fixture by name
pub fn load_html_fixture(fixture_name: &str) -> String {
    let path = Path::new("src/tests/fixtures").join(format!("{}.html", fixture_name));
    fs::read_to_string(path)
        .unwrap_or_else(|_| panic!("Failed to load test fixture: {}", fixture_name))
}

/// A scratch directory that disappears with the test.
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    pub fn new() -> Scratch {
        Scratch {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Path inside the scratch dir, without creating anything.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, contents).expect("Failed to write fixture file");
        path
    }

    pub fn dir(&self, name: &str) -> PathBuf {
        let path = self.path(name);
        fs::create_dir_all(&path).expect("Failed to create fixture dir");
        path
    }

    /// Canonical form of a path under the scratch dir that exists.
    pub fn canonical(&self, name: &str) -> PathBuf {
        fs::canonicalize(self.path(name)).expect("Failed to canonicalize fixture path")
    }

    /// Canonical root joined with `name`, for paths that don't exist yet.
    pub fn canonical_join(&self, name: &str) -> PathBuf {
        fs::canonicalize(self.root())
            .expect("Failed to canonicalize scratch dir")
            .join(name)
    }
}

pub fn s(path: &Path) -> String {
    path.to_str().expect("fixture paths are utf-8").to_string()
}
