//! Build and run commands under independent timeouts.

use crate::outcome::RunReport;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, instrument, warn};
use zkfuzz_core::{Error, Result, TargetConfig};

/// A command line with its working directory, environment and time budget
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub argv: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    pub timeout: Duration,
}

impl CommandSpec {
    pub fn new(argv: Vec<String>, timeout: Duration) -> Self {
        Self {
            argv,
            cwd: None,
            env: Vec::new(),
            timeout,
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Run `spec` to completion.
///
/// Returns `Ok(None)` when the timeout expires; the child is killed. Spawn
/// failures are errors.
pub async fn run_command(
    spec: &CommandSpec,
    extra_env: &[(String, String)],
) -> Result<Option<CommandOutput>> {
    let (program, args) = spec
        .argv
        .split_first()
        .ok_or_else(|| Error::Config("empty command line".to_string()))?;

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(cwd) = &spec.cwd {
        command.current_dir(cwd);
    }
    for (key, value) in spec.env.iter().chain(extra_env) {
        command.env(key, value);
    }

    debug!(%program, ?args, timeout = ?spec.timeout, "Spawning command");
    let child = command.spawn()?;

    match tokio::time::timeout(spec.timeout, child.wait_with_output()).await {
        Ok(output) => {
            let output = output?;
            Ok(Some(CommandOutput {
                success: output.status.success(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }))
        }
        Err(_) => {
            warn!(%program, timeout = ?spec.timeout, "Command timed out");
            Ok(None)
        }
    }
}

/// Builds a target project once and runs it any number of times
#[derive(Debug, Clone)]
pub struct Executor {
    build: Option<CommandSpec>,
    run: CommandSpec,
}

impl Executor {
    pub fn new(build: Option<CommandSpec>, run: CommandSpec) -> Self {
        Self { build, run }
    }

    /// Executor for a target's configured commands, run inside `project_dir`.
    ///
    /// `None` when the target has no run command.
    pub fn from_config(config: &TargetConfig, project_dir: &Path) -> Option<Self> {
        if !config.executes() {
            return None;
        }
        let build = (!config.build_command.is_empty()).then(|| {
            CommandSpec::new(config.build_command.clone(), config.build_timeout())
                .with_cwd(project_dir)
        });
        let run = CommandSpec::new(config.run_command.clone(), config.run_timeout())
            .with_cwd(project_dir);
        Some(Self::new(build, run))
    }

    /// Run the build step.
    ///
    /// `Ok(None)` means the project is ready to run; otherwise the returned
    /// report is the final word for every circuit in the project.
    #[instrument(skip(self))]
    pub async fn build(&self) -> Result<Option<RunReport>> {
        let Some(build) = &self.build else {
            return Ok(None);
        };
        match run_command(build, &[]).await? {
            None => Ok(Some(RunReport::BuildTimedOut)),
            Some(output) if output.success => Ok(None),
            Some(output) => Ok(Some(RunReport::BuildFailed {
                log: format!("{}{}", output.stdout, output.stderr),
            })),
        }
    }

    /// Run the built project once with additional environment variables
    pub async fn run(&self, env: &[(String, String)]) -> Result<RunReport> {
        Ok(match run_command(&self.run, env).await? {
            None => RunReport::RunTimedOut,
            Some(output) => RunReport::Exited {
                success: output.success,
                stdout: output.stdout,
                stderr: output.stderr,
            },
        })
    }

    /// Build, then run once
    pub async fn execute(&self, env: &[(String, String)]) -> Result<RunReport> {
        if let Some(report) = self.build().await? {
            return Ok(report);
        }
        self.run(env).await
    }
}
