//! External process invocation with per-step timeouts.

use std::ffi::OsStr;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::error::{MirrorError, MirrorStep};

/// Runs external programs on behalf of a mirror sub-step.
#[derive(Debug, Clone)]
pub(crate) struct CommandRunner {
    timeout: Option<Duration>,
}

impl CommandRunner {
    pub(crate) fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Runs `program` with `args` and returns its stdout.
    ///
    /// The child is killed if the timeout elapses first.
    pub(crate) async fn run<I, S>(
        &self,
        step: MirrorStep,
        program: &str,
        args: I,
    ) -> Result<String, MirrorError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(program);
        command
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(step = %step, "Running {:?}", command.as_std());

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, command.output())
                .await
                .map_err(|_| MirrorError::Timeout {
                    step,
                    seconds: limit.as_secs(),
                })?,
            None => command.output().await,
        }
        .map_err(|source| MirrorError::Spawn {
            step,
            program: program.to_string(),
            source,
        })?;

        if !output.status.success() {
            return Err(MirrorError::Command {
                step,
                program: program.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Returns the last non-empty line of a program's output.
pub(crate) fn last_line(stdout: &str) -> Option<&str> {
    stdout
        .lines()
        .map(str::trim)
        .rev()
        .find(|line| !line.is_empty())
}
