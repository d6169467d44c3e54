use std::path::{Path, PathBuf};

use tracing::info;

use super::command::{CommandRunner, display_command, run_checked};
use super::{InstallTargets, SetupError, write_file};
use crate::core::terminal::print_info;
use crate::platform::OsFamily;

pub const SYSTEMD_UNIT: &str = "apts.service";
pub const LAUNCHD_LABEL: &str = "com.apts.agent";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartPolicy {
    OnFailure,
    Always,
}

impl RestartPolicy {
    fn systemd_value(self) -> &'static str {
        match self {
            RestartPolicy::OnFailure => "on-failure",
            RestartPolicy::Always => "always",
        }
    }
}

/// How the OS should keep the server process running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDefinition {
    pub working_directory: PathBuf,
    pub executable_path: PathBuf,
    pub restart_policy: RestartPolicy,
}

impl ServiceDefinition {
    /// Describe the running binary, started from its own directory so it
    /// picks up the `.env` that sits next to it.
    pub fn for_current_executable(restart_policy: RestartPolicy) -> Result<Self, SetupError> {
        let executable_path = std::env::current_exe()
            .and_then(|p| p.canonicalize())
            .map_err(SetupError::Executable)?;
        let working_directory = executable_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));
        Ok(Self {
            working_directory,
            executable_path,
            restart_policy,
        })
    }

    pub fn systemd_unit(&self) -> String {
        format!(
            "[Unit]\n\
             Description=apts listing monitor\n\
             After=network.target\n\
             \n\
             [Service]\n\
             WorkingDirectory={}\n\
             ExecStart={}\n\
             Restart={}\n\
             \n\
             [Install]\n\
             WantedBy=multi-user.target\n",
            self.working_directory.display(),
            self.executable_path.display(),
            self.restart_policy.systemd_value(),
        )
    }

    /// A launchd property list. launchd only knows "keep alive" or not, so
    /// any restart policy maps to `KeepAlive`.
    pub fn launchd_plist(&self, label: &str, log_path: &Path) -> String {
        let esc = |s: &str| quick_xml::escape::escape(s).into_owned();
        let log = esc(&log_path.to_string_lossy());
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
  <key>Label</key>
  <string>{label}</string>

  <key>ProgramArguments</key>
  <array>
    <string>{program}</string>
  </array>

  <key>WorkingDirectory</key>
  <string>{workdir}</string>

  <key>RunAtLoad</key>
  <true/>

  <key>KeepAlive</key>
  <true/>

  <key>StandardOutPath</key>
  <string>{log}</string>
  <key>StandardErrorPath</key>
  <string>{log}</string>
</dict>
</plist>
"#,
            label = esc(label),
            program = esc(&self.executable_path.to_string_lossy()),
            workdir = esc(&self.working_directory.to_string_lossy()),
            log = log,
        )
    }
}

/// Installs the always-on service through systemd or launchd.
pub struct ServiceInstaller<'a> {
    commands: &'a dyn CommandRunner,
    targets: &'a InstallTargets,
}

impl<'a> ServiceInstaller<'a> {
    pub fn new(commands: &'a dyn CommandRunner, targets: &'a InstallTargets) -> Self {
        Self { commands, targets }
    }

    /// Write the service definition and activate it. Returns the path of the
    /// definition file. The file is overwritten on every run.
    pub fn install(
        &self,
        os: &OsFamily,
        definition: &ServiceDefinition,
    ) -> Result<PathBuf, SetupError> {
        match os {
            OsFamily::Linux => self.install_systemd(definition),
            OsFamily::MacOs => self.install_launchd(definition),
            other => Err(SetupError::UnsupportedOs(other.clone())),
        }
    }

    fn install_systemd(&self, definition: &ServiceDefinition) -> Result<PathBuf, SetupError> {
        let unit_path = self.targets.systemd_dir.join(SYSTEMD_UNIT);
        write_file(&unit_path, &definition.systemd_unit())?;
        info!(path = %unit_path.display(), "wrote systemd unit");

        run_checked(self.commands, "systemctl", &["daemon-reload"])?;

        let enable = ["enable", SYSTEMD_UNIT];
        let output = self
            .commands
            .run("systemctl", &enable)
            .map_err(|source| SetupError::Spawn {
                command: display_command("systemctl", &enable),
                source,
            })?;
        if !output.success {
            let combined = output.combined();
            if combined.contains("is enabled") || combined.contains("already enabled") {
                print_info(&format!("{} is already enabled.", SYSTEMD_UNIT));
            } else {
                return Err(SetupError::CommandFailed {
                    command: display_command("systemctl", &enable),
                    output: combined,
                });
            }
        }

        run_checked(self.commands, "systemctl", &["restart", SYSTEMD_UNIT])?;
        Ok(unit_path)
    }

    fn install_launchd(&self, definition: &ServiceDefinition) -> Result<PathBuf, SetupError> {
        let home = self.targets.home()?;
        let agents_dir = home.join("Library").join("LaunchAgents");
        std::fs::create_dir_all(&agents_dir).map_err(|source| SetupError::Write {
            path: agents_dir.clone(),
            source,
        })?;

        let log_path = home.join("Library").join("Logs").join("apts.log");
        let plist_path = agents_dir.join(format!("{}.plist", LAUNCHD_LABEL));
        write_file(
            &plist_path,
            &definition.launchd_plist(LAUNCHD_LABEL, &log_path),
        )?;
        info!(path = %plist_path.display(), "wrote launch agent");

        let plist = plist_path.to_string_lossy().into_owned();
        // Not loaded yet on a first install; that failure is expected.
        if let Ok(out) = self.commands.run("launchctl", &["unload", plist.as_str()])
            && !out.success
        {
            tracing::debug!(output = %out.combined(), "launchctl unload ignored");
        }

        run_checked(self.commands, "launchctl", &["load", plist.as_str()])?;
        Ok(plist_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::testing::FakeCommands;

    fn definition() -> ServiceDefinition {
        ServiceDefinition {
            working_directory: PathBuf::from("/opt/apts"),
            executable_path: PathBuf::from("/opt/apts/apts"),
            restart_policy: RestartPolicy::OnFailure,
        }
    }

    fn targets(root: &Path) -> InstallTargets {
        let systemd_dir = root.join("systemd");
        std::fs::create_dir_all(&systemd_dir).unwrap();
        InstallTargets {
            systemd_dir,
            cron_root: root.join("etc"),
            home_dir: Some(root.join("home")),
            now: || 1_700_000_000,
        }
    }

    #[test]
    fn systemd_unit_has_both_substitutions_and_restart_policy() {
        let unit = definition().systemd_unit();
        assert!(unit.contains("WorkingDirectory=/opt/apts\n"));
        assert!(unit.contains("ExecStart=/opt/apts/apts\n"));
        assert!(unit.contains("Restart=on-failure\n"));
        assert!(unit.contains("WantedBy=multi-user.target"));
        // No leading indentation leaks into the unit file.
        assert!(unit.lines().all(|l| !l.starts_with(' ')));
    }

    #[test]
    fn plist_escapes_paths() {
        let mut def = definition();
        def.executable_path = PathBuf::from("/Users/a&b/apts");
        let plist = def.launchd_plist(LAUNCHD_LABEL, Path::new("/Users/a&b/Library/Logs/apts.log"));
        assert!(plist.contains("<string>/Users/a&amp;b/apts</string>"));
        assert!(plist.contains("<key>StandardErrorPath</key>\n  <string>/Users/a&amp;b/Library/Logs/apts.log</string>"));
        assert!(plist.contains("<string>com.apts.agent</string>"));
    }

    #[test]
    fn systemd_install_writes_unit_then_runs_manager() {
        let dir = tempfile::tempdir().unwrap();
        let targets = targets(dir.path());
        let commands = FakeCommands::new();

        let path = ServiceInstaller::new(&commands, &targets)
            .install(&OsFamily::Linux, &definition())
            .unwrap();

        assert_eq!(path, targets.systemd_dir.join("apts.service"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), definition().systemd_unit());
        assert_eq!(
            commands.calls(),
            vec![
                "systemctl daemon-reload",
                "systemctl enable apts.service",
                "systemctl restart apts.service",
            ]
        );
    }

    #[test]
    fn systemd_install_overwrites_previous_unit() {
        let dir = tempfile::tempdir().unwrap();
        let targets = targets(dir.path());
        std::fs::write(targets.systemd_dir.join("apts.service"), "stale").unwrap();

        let mut def = definition();
        def.restart_policy = RestartPolicy::Always;
        ServiceInstaller::new(&FakeCommands::new(), &targets)
            .install(&OsFamily::Linux, &def)
            .unwrap();

        let unit = std::fs::read_to_string(targets.systemd_dir.join("apts.service")).unwrap();
        assert!(unit.contains("Restart=always"));
        assert!(!unit.contains("stale"));
    }

    #[test]
    fn already_enabled_unit_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let targets = targets(dir.path());
        let commands = FakeCommands::new().respond(
            "systemctl enable apts.service",
            false,
            "Unit apts.service is enabled",
        );

        ServiceInstaller::new(&commands, &targets)
            .install(&OsFamily::Linux, &definition())
            .unwrap();
        assert_eq!(commands.calls().len(), 3);
    }

    #[test]
    fn other_enable_failures_abort_before_restart() {
        let dir = tempfile::tempdir().unwrap();
        let targets = targets(dir.path());
        let commands = FakeCommands::new().respond(
            "systemctl enable apts.service",
            false,
            "Access denied",
        );

        let err = ServiceInstaller::new(&commands, &targets)
            .install(&OsFamily::Linux, &definition())
            .unwrap_err();
        match err {
            SetupError::CommandFailed { command, output } => {
                assert_eq!(command, "systemctl enable apts.service");
                assert_eq!(output, "Access denied");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!commands.calls().contains(&"systemctl restart apts.service".to_string()));
    }

    #[test]
    fn daemon_reload_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let targets = targets(dir.path());
        let commands =
            FakeCommands::new().respond("systemctl daemon-reload", false, "Failed to connect to bus");

        let err = ServiceInstaller::new(&commands, &targets)
            .install(&OsFamily::Linux, &definition())
            .unwrap_err();
        assert!(err.to_string().contains("Failed to connect to bus"));
    }

    #[test]
    fn launchd_install_creates_agents_dir_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let targets = targets(dir.path());
        let plist = dir
            .path()
            .join("home/Library/LaunchAgents/com.apts.agent.plist");
        let plist_arg = plist.to_string_lossy().to_string();
        let commands = FakeCommands::new().respond(
            &format!("launchctl unload {}", plist_arg),
            false,
            "Could not find specified service",
        );

        let path = ServiceInstaller::new(&commands, &targets)
            .install(&OsFamily::MacOs, &definition())
            .unwrap();

        assert_eq!(path, plist);
        let contents = std::fs::read_to_string(&plist).unwrap();
        assert!(contents.contains("<string>/opt/apts/apts</string>"));
        assert!(contents.contains("Library/Logs/apts.log"));
        assert_eq!(
            commands.calls(),
            vec![
                format!("launchctl unload {}", plist_arg),
                format!("launchctl load {}", plist_arg),
            ]
        );
    }

    #[test]
    fn launchd_load_failure_carries_output() {
        let dir = tempfile::tempdir().unwrap();
        let targets = targets(dir.path());
        let plist = dir
            .path()
            .join("home/Library/LaunchAgents/com.apts.agent.plist");
        let commands = FakeCommands::new().respond(
            &format!("launchctl load {}", plist.to_string_lossy()),
            false,
            "Load failed: 5: Input/output error",
        );

        let err = ServiceInstaller::new(&commands, &targets)
            .install(&OsFamily::MacOs, &definition())
            .unwrap_err();
        assert!(err.to_string().contains("Load failed: 5: Input/output error"));
    }

    #[test]
    fn unsupported_os_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let targets = targets(dir.path());
        let commands = FakeCommands::new();

        for os in [OsFamily::Windows, OsFamily::Other("solaris".into())] {
            let err = ServiceInstaller::new(&commands, &targets)
                .install(&os, &definition())
                .unwrap_err();
            assert!(matches!(err, SetupError::UnsupportedOs(_)));
        }
        assert!(commands.calls().is_empty());
        assert_eq!(std::fs::read_dir(&targets.systemd_dir).unwrap().count(), 0);
        assert!(!dir.path().join("home").exists());
    }
}
