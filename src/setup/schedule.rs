use std::path::{Path, PathBuf};

use tracing::info;

use super::command::{CommandRunner, display_command};
use super::{InstallTargets, SetupError, script, write_file};
use crate::platform::{NativePlatform, OsFamily, Platform};

/// Fixed script name for the Linux interval directories.
pub const CRON_DIR_SCRIPT: &str = "apts-schedule";
/// Directory under `$HOME` holding scripts referenced from the crontab.
pub const CRONTAB_SCRIPT_DIR: &str = "apts-scheduled-task";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl Cadence {
    pub const ALL: [Cadence; 4] = [
        Cadence::Hourly,
        Cadence::Daily,
        Cadence::Weekly,
        Cadence::Monthly,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Cadence::Hourly => "Hourly",
            Cadence::Daily => "Daily",
            Cadence::Weekly => "Weekly",
            Cadence::Monthly => "Monthly",
        }
    }

    pub fn cron_expression(self) -> &'static str {
        match self {
            Cadence::Hourly => "@hourly",
            Cadence::Daily => "0 0 * * *",
            Cadence::Weekly => "0 0 * * 0",
            Cadence::Monthly => "0 0 1 * *",
        }
    }

    /// Name of the run-parts directory under `/etc`.
    pub fn cron_dir(self) -> &'static str {
        match self {
            Cadence::Hourly => "cron.hourly",
            Cadence::Daily => "cron.daily",
            Cadence::Weekly => "cron.weekly",
            Cadence::Monthly => "cron.monthly",
        }
    }
}

/// One scheduled check of one listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodicTaskSpec {
    pub target_url: String,
    pub cadence: Cadence,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// Script dropped into an interval directory.
    ScriptPlaced { path: PathBuf },
    CronLineAdded { line: String },
    /// The identical crontab line was already there; nothing changed.
    AlreadyScheduled { line: String },
}

/// Returns the new crontab, or `None` when `line` is already present.
///
/// Blank lines are dropped and matching is on the trimmed line, so the same
/// script at a different cadence counts as a new entry.
pub fn merge_crontab(existing: &str, line: &str) -> Option<String> {
    let mut merged = String::new();
    for current in existing.lines() {
        let trimmed = current.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == line {
            return None;
        }
        merged.push_str(current);
        merged.push('\n');
    }
    merged.push_str(line);
    merged.push('\n');
    Some(merged)
}

pub struct ScheduleInstaller<'a> {
    commands: &'a dyn CommandRunner,
    targets: &'a InstallTargets,
}

impl<'a> ScheduleInstaller<'a> {
    pub fn new(commands: &'a dyn CommandRunner, targets: &'a InstallTargets) -> Self {
        Self { commands, targets }
    }

    pub fn install(
        &self,
        os: &OsFamily,
        spec: &PeriodicTaskSpec,
    ) -> Result<ScheduleOutcome, SetupError> {
        match os {
            OsFamily::Linux => {
                let script = script::generate(os, &spec.target_url)?;
                self.install_cron_dir(&script, spec.cadence)
            }
            OsFamily::MacOs => {
                let script = script::generate(os, &spec.target_url)?;
                self.install_crontab(&script, spec.cadence)
            }
            OsFamily::Windows => Err(SetupError::ComingSoon(os.clone())),
            other => Err(SetupError::UnsupportedOs(other.clone())),
        }
    }

    fn install_cron_dir(
        &self,
        script: &str,
        cadence: Cadence,
    ) -> Result<ScheduleOutcome, SetupError> {
        let path = self
            .targets
            .cron_root
            .join(cadence.cron_dir())
            .join(CRON_DIR_SCRIPT);
        write_executable(&path, script)?;
        info!(path = %path.display(), cadence = cadence.label(), "placed cron script");
        Ok(ScheduleOutcome::ScriptPlaced { path })
    }

    fn install_crontab(
        &self,
        script: &str,
        cadence: Cadence,
    ) -> Result<ScheduleOutcome, SetupError> {
        let script_dir = self.targets.home()?.join(CRONTAB_SCRIPT_DIR);
        std::fs::create_dir_all(&script_dir).map_err(|source| SetupError::Write {
            path: script_dir.clone(),
            source,
        })?;

        let script_path = script_dir.join(format!("{}_{}", CRON_DIR_SCRIPT, (self.targets.now)()));
        write_executable(&script_path, script)?;

        let line = format!("{} {}", cadence.cron_expression(), script_path.display());

        // `crontab -l` fails when the user has no crontab yet.
        let existing = match self.commands.run("crontab", &["-l"]) {
            Ok(out) if out.success => out.stdout,
            Ok(out) => {
                info!(output = %out.combined(), "no existing crontab, starting a new one");
                String::new()
            }
            Err(err) => {
                info!(error = %err, "crontab -l unavailable, starting a new one");
                String::new()
            }
        };

        let Some(merged) = merge_crontab(&existing, &line) else {
            return Ok(ScheduleOutcome::AlreadyScheduled { line });
        };

        let command = display_command("crontab", &["-"]);
        let output = self
            .commands
            .run_with_stdin("crontab", &["-"], &merged)
            .map_err(|source| SetupError::Spawn {
                command: command.clone(),
                source,
            })?;
        if !output.success {
            return Err(SetupError::CommandFailed {
                command,
                output: output.combined(),
            });
        }

        info!(%line, "installed cron job");
        Ok(ScheduleOutcome::CronLineAdded { line })
    }
}

fn write_executable(path: &Path, contents: &str) -> Result<(), SetupError> {
    write_file(path, contents)?;
    NativePlatform::set_executable(path).map_err(|source| SetupError::Write {
        path: path.to_path_buf(),
        source,
    })
}
