//! Site build step
//!
//! Runs the configured shell command that exports the site's pages before
//! any page is read. Output is inherited so the build's own progress shows
//! on the terminal.

use std::process::{Command, ExitStatus};
use tracing::info;

/// Build command errors
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Shell could not be started
    #[error("failed to start build command `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Command ran and reported failure
    #[error("build command `{command}` failed with {}", describe(.code))]
    Failed { command: String, code: Option<i32> },
}

impl BuildError {
    /// Process exit code to report for this failure
    ///
    /// The command's own code when it fits, otherwise 1.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Failed {
                code: Some(code), ..
            } => u8::try_from(*code).ok().filter(|c| *c != 0).unwrap_or(1),
            _ => 1,
        }
    }
}

fn describe(code: &Option<i32>) -> String {
    code.map_or_else(|| "no exit code".to_string(), |c| format!("exit code {c}"))
}

fn shell(command: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}

/// Run `command` through the platform shell and wait for it
///
/// # Errors
/// Returns [`BuildError::Spawn`] if the shell cannot be started and
/// [`BuildError::Failed`] if the command exits unsuccessfully
pub fn run_build_command(command: &str) -> Result<(), BuildError> {
    info!(command, "running build command");
    let status: ExitStatus = shell(command).status().map_err(|source| BuildError::Spawn {
        command: command.to_string(),
        source,
    })?;

    if status.success() {
        info!(command, "build command finished");
        Ok(())
    } else {
        Err(BuildError::Failed {
            command: command.to_string(),
            code: status.code(),
        })
    }
}
