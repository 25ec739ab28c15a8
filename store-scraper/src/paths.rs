use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::ops::Deref;
use std::path::{Component, Path, PathBuf};

use crate::error::{PathFailure, PathValidationError};

/// What a path option has to point at before we accept it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPolicy {
    /// May not exist yet, but its parent directory must.
    NewFileLocation,
    /// Must exist and be a regular file.
    ExistingFile,
    /// Normalized only; whoever writes it creates it later.
    OptionalExistingFile,
    /// Must exist and be a directory.
    ExistingDirectory,
}

impl PathPolicy {
    fn is_strict(self) -> bool {
        matches!(self, PathPolicy::ExistingFile | PathPolicy::ExistingDirectory)
    }
}

impl fmt::Display for PathPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PathPolicy::NewFileLocation => "a new file location",
            PathPolicy::ExistingFile => "an existing file",
            PathPolicy::OptionalExistingFile => "an optional file",
            PathPolicy::ExistingDirectory => "an existing directory",
        };
        f.write_str(name)
    }
}

/// An absolute path that passed its policy. Only `resolve` builds these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    path: PathBuf,
    policy: PathPolicy,
}

impl ResolvedPath {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> PathPolicy {
        self.policy
    }
}

impl Deref for ResolvedPath {
    type Target = Path;

    fn deref(&self) -> &Path {
        &self.path
    }
}

impl AsRef<Path> for ResolvedPath {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Expand `~`, make absolute, resolve symlinks and dot components, then check
/// the result against `policy`. Never touches the filesystem beyond stat calls.
pub fn resolve(raw: &str, policy: PathPolicy) -> Result<ResolvedPath, PathValidationError> {
    let fail = |kind: PathFailure| PathValidationError {
        raw: raw.to_string(),
        policy,
        kind,
    };

    if raw.trim().is_empty() {
        return Err(fail(PathFailure::Empty));
    }

    let expanded = shellexpand::tilde(raw);
    let path = Path::new(expanded.as_ref());

    let resolved = if policy.is_strict() {
        fs::canonicalize(path)
    } else {
        resolve_lenient(path)
    }
    .map_err(|e| fail(PathFailure::Resolve(e)))?;

    match policy {
        PathPolicy::NewFileLocation => {
            let parent_ok = resolved.parent().map_or(false, Path::is_dir);
            if !parent_ok {
                return Err(fail(PathFailure::MissingParent(resolved)));
            }
        }
        PathPolicy::ExistingFile => {
            if !resolved.is_file() {
                return Err(fail(PathFailure::NotAFile(resolved)));
            }
        }
        PathPolicy::ExistingDirectory => {
            if !resolved.is_dir() {
                return Err(fail(PathFailure::NotADirectory(resolved)));
            }
        }
        PathPolicy::OptionalExistingFile => {}
    }

    Ok(ResolvedPath {
        path: resolved,
        policy,
    })
}

/// Canonicalize the deepest ancestor that exists and append the rest lexically,
/// so the final components don't have to exist.
fn resolve_lenient(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()?.join(path)
    };

    let components: Vec<Component> = absolute.components().collect();
    let mut last_err = None;

    for split in (1..=components.len()).rev() {
        let prefix: PathBuf = components[..split].iter().collect();
        match fs::canonicalize(&prefix) {
            Ok(mut resolved) => {
                for component in &components[split..] {
                    match component {
                        Component::CurDir => {}
                        Component::ParentDir => {
                            resolved.pop();
                        }
                        other => resolved.push(other.as_os_str()),
                    }
                }
                return Ok(resolved);
            }
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "no existing ancestor directory")
    }))
}

// clap value parsers, one per policy

pub fn new_file_location(raw: &str) -> Result<ResolvedPath, PathValidationError> {
    resolve(raw, PathPolicy::NewFileLocation)
}

pub fn existing_file(raw: &str) -> Result<ResolvedPath, PathValidationError> {
    resolve(raw, PathPolicy::ExistingFile)
}

pub fn optional_existing_file(raw: &str) -> Result<ResolvedPath, PathValidationError> {
    resolve(raw, PathPolicy::OptionalExistingFile)
}

pub fn existing_directory(raw: &str) -> Result<ResolvedPath, PathValidationError> {
    resolve(raw, PathPolicy::ExistingDirectory)
}
