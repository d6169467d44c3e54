use std::io::Write;
use std::process::{Command, Stdio};

use super::SetupError;

/// Captured result of one external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// stdout followed by stderr, trimmed. This is what gets shown to the
    /// user when a service-manager call fails.
    pub fn combined(&self) -> String {
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();
        match (stdout.is_empty(), stderr.is_empty()) {
            (true, _) => stderr.to_string(),
            (false, true) => stdout.to_string(),
            (false, false) => format!("{}\n{}", stdout, stderr),
        }
    }
}

impl From<std::process::Output> for CommandOutput {
    fn from(out: std::process::Output) -> Self {
        Self {
            success: out.status.success(),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        }
    }
}

/// Runs `systemctl`, `launchctl` and `crontab` for the installers.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> std::io::Result<CommandOutput>;

    /// Run with `input` written to the child's stdin, then closed.
    fn run_with_stdin(
        &self,
        program: &str,
        args: &[&str],
        input: &str,
    ) -> std::io::Result<CommandOutput>;
}

/// Blocking `std::process` implementation.
#[derive(Debug, Default)]
pub struct SystemCommands;

impl CommandRunner for SystemCommands {
    fn run(&self, program: &str, args: &[&str]) -> std::io::Result<CommandOutput> {
        Command::new(program).args(args).output().map(Into::into)
    }

    fn run_with_stdin(
        &self,
        program: &str,
        args: &[&str],
        input: &str,
    ) -> std::io::Result<CommandOutput> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input.as_bytes())?;
        }
        child.wait_with_output().map(Into::into)
    }
}

pub(crate) fn display_command(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run a command and turn a non-zero exit into [`SetupError::CommandFailed`]
/// carrying the combined output.
pub(crate) fn run_checked(
    runner: &dyn CommandRunner,
    program: &str,
    args: &[&str],
) -> Result<CommandOutput, SetupError> {
    let command = display_command(program, args);
    tracing::debug!(%command, "running");
    let output = runner
        .run(program, args)
        .map_err(|source| SetupError::Spawn {
            command: command.clone(),
            source,
        })?;
    if output.success {
        Ok(output)
    } else {
        Err(SetupError::CommandFailed {
            command,
            output: output.combined(),
        })
    }
}
