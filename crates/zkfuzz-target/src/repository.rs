//! Target checkouts: clone or reset, then optionally inject faults.

use crate::revision::RevisionRegistry;
use crate::targets::{InjectionSource, Target};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};
use zkfuzz_core::{Error, Result};

/// Version control operations used by [`install`]
pub trait Repository {
    fn is_repository(&self, path: &Path) -> bool;

    fn clone_and_switch(&self, path: &Path, remote_url: &str, revision: &str) -> Result<()>;

    fn reset_and_switch(&self, path: &Path, revision: &str) -> Result<()>;
}

/// [`Repository`] backed by the `git` executable
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
        }
    }
}

impl GitCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, cwd: Option<&Path>, args: &[&str]) -> Result<()> {
        let mut command = Command::new(&self.program);
        command.args(args);
        if let Some(cwd) = cwd {
            command.current_dir(cwd);
        }
        debug!(program = %self.program, ?args, "Running git");

        let output = command.output().map_err(|e| {
            Error::Repository(format!("failed to spawn {}: {}", self.program, e))
        })?;
        if !output.status.success() {
            return Err(Error::Repository(format!(
                "{} {} failed ({}): {}",
                self.program,
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

impl Repository for GitCli {
    fn is_repository(&self, path: &Path) -> bool {
        path.join(".git").exists()
    }

    fn clone_and_switch(&self, path: &Path, remote_url: &str, revision: &str) -> Result<()> {
        let revision = checked_revision(revision)?;
        let target = path.to_string_lossy();
        self.run(None, &["clone", "--", remote_url, target.as_ref()])?;
        self.run(Some(path), &["checkout", "--force", revision])
    }

    fn reset_and_switch(&self, path: &Path, revision: &str) -> Result<()> {
        let revision = checked_revision(revision)?;
        self.run(Some(path), &["reset", "--hard"])?;
        self.run(Some(path), &["clean", "-fdx"])?;
        self.run(Some(path), &["fetch", "--all", "--tags"])?;
        self.run(Some(path), &["checkout", "--force", revision])
    }
}

/// Revisions come from configuration and must not be read as git options
fn checked_revision(revision: &str) -> Result<&str> {
    if revision.is_empty() || revision.starts_with('-') {
        return Err(Error::Repository(format!("invalid revision '{}'", revision)));
    }
    Ok(revision)
}

/// What to install and where
#[derive(Debug, Clone)]
pub struct InstallRequest {
    pub target: Target,
    pub path: PathBuf,
    pub remote_url: String,
    pub revision: String,
    pub fault_injection: bool,
}

/// Result of a successful install
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub cloned: bool,
    /// Path of the written injection source, when fault injection was requested
    pub injected: Option<PathBuf>,
}

/// Bring a checkout to the requested revision and write its injection hooks.
///
/// The revision is resolved before touching the checkout, so an unsupported
/// revision leaves the filesystem alone.
pub fn install(
    repo: &dyn Repository,
    request: &InstallRequest,
    registry: &RevisionRegistry,
) -> Result<InstallReport> {
    let source = if request.fault_injection {
        Some(registry.lookup(request.target, &request.revision)?)
    } else {
        None
    };

    let cloned = !repo.is_repository(&request.path);
    if cloned {
        info!(zkvm = %request.target, path = %request.path.display(), "Cloning target");
        repo.clone_and_switch(&request.path, &request.remote_url, &request.revision)?;
    } else {
        info!(zkvm = %request.target, revision = %request.revision, "Resetting target");
        repo.reset_and_switch(&request.path, &request.revision)?;
    }

    let injected = match source {
        Some(source) => Some(write_source(&request.path, &source)?),
        None => None,
    };

    Ok(InstallReport { cloned, injected })
}

fn write_source(root: &Path, source: &InjectionSource) -> Result<PathBuf> {
    let path = root.join(source.relative_path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, source.text)?;
    debug!(path = %path.display(), "Wrote injection source");
    Ok(path)
}
