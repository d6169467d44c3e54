//! Interactive provisioning: the wizard and the installers it drives.

pub mod command;
pub mod prompt;
pub mod registrar;
pub mod schedule;
pub mod script;
pub mod service;
pub mod wizard;

#[cfg(test)]
pub(crate) mod testing;

use std::path::PathBuf;

use crate::core::config::StoreError;
use crate::platform::OsFamily;

pub use registrar::RegistrarError;
pub use script::ScriptError;

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("unsupported operating system: {0}")]
    UnsupportedOs(OsFamily),
    #[error("scheduled tasks on {0} are coming soon")]
    ComingSoon(OsFamily),
    #[error("could not determine the user's home directory")]
    NoHomeDir,
    #[error("cannot determine executable path: {0}")]
    Executable(#[source] std::io::Error),
    #[error("could not write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` failed ({output})")]
    CommandFailed { command: String, output: String },
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error("Telegram bot setup failed: {0}")]
    Registrar(#[from] RegistrarError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Prompt(#[from] inquire::InquireError),
}

/// Where the installers put things.
///
/// Production uses [`InstallTargets::system`]; tests point every path into a
/// temporary directory and pin the clock.
#[derive(Debug, Clone)]
pub struct InstallTargets {
    /// systemd unit directory, `/etc/systemd/system`.
    pub systemd_dir: PathBuf,
    /// Parent of the `cron.hourly` .. `cron.monthly` directories.
    pub cron_root: PathBuf,
    pub home_dir: Option<PathBuf>,
    /// Seconds since the epoch, used to name crontab scripts.
    pub now: fn() -> u64,
}

impl InstallTargets {
    pub fn system() -> Self {
        Self {
            systemd_dir: PathBuf::from("/etc/systemd/system"),
            cron_root: PathBuf::from("/etc"),
            home_dir: dirs::home_dir(),
            now: unix_now,
        }
    }

    pub(crate) fn home(&self) -> Result<&PathBuf, SetupError> {
        self.home_dir.as_ref().ok_or(SetupError::NoHomeDir)
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

pub(crate) fn write_file(path: &std::path::Path, contents: &str) -> Result<(), SetupError> {
    std::fs::write(path, contents).map_err(|source| SetupError::Write {
        path: path.to_path_buf(),
        source,
    })
}
