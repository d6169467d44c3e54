//! The `--setup` wizard.
//!
//! A fixed sequence of questions: proxies, notifications, persist, always-on
//! service, scheduled monitoring. Each step blocks on one answer. The only
//! state carried between steps is the [`RunConfiguration`], which is written
//! to the store after the notification step and read back before the
//! service step so later steps see exactly what was persisted.

use std::collections::BTreeMap;

use console::style;
use inquire::InquireError;
use tracing::{info, warn};

use super::command::CommandRunner;
use super::prompt::Prompter;
use super::registrar::TelegramRegistrar;
use super::schedule::{Cadence, PeriodicTaskSpec, ScheduleInstaller, ScheduleOutcome};
use super::service::{ServiceDefinition, ServiceInstaller};
use super::{InstallTargets, SetupError};
use crate::core::config::{self, EnvFile, ProxyCredentials, RunConfiguration};
use crate::core::terminal::{
    GuideSection, print_error, print_info, print_step, print_success, print_warn,
};
use crate::platform::OsFamily;

/// How a completed wizard run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardOutcome {
    /// The configuration as reloaded from the store.
    pub config: RunConfiguration,
    pub service_installed: bool,
    pub schedule: Option<ScheduleOutcome>,
    /// The process should end instead of going on to serve. True whenever
    /// the always-on service was installed, since that service is now the
    /// server.
    pub exit_after: bool,
}

pub struct SetupWizard<'a> {
    pub os: OsFamily,
    pub prompter: &'a mut dyn Prompter,
    pub commands: &'a dyn CommandRunner,
    pub store: &'a EnvFile,
    pub registrar: &'a TelegramRegistrar,
    pub targets: InstallTargets,
    pub service: ServiceDefinition,
    /// Known keys exported in the process environment.
    pub environment: BTreeMap<String, String>,
}

impl SetupWizard<'_> {
    pub async fn run(&mut self) -> Result<WizardOutcome, SetupError> {
        let stored = self.store.load()?;
        let available = config::layered_values(stored, &self.environment);
        let mut config = RunConfiguration::from_values(&available);

        config.proxies_enabled = self.ask_proxies(&available)?;
        self.ask_notifications(&mut config).await?;

        let config = config.persist(self.store)?;
        info!(
            proxies = config.proxies_enabled,
            notifications = config.notifications_enabled,
            path = %self.store.path().display(),
            "configuration saved"
        );

        if !self.ask_persistent_service()? {
            return Ok(WizardOutcome {
                config,
                service_installed: false,
                schedule: None,
                exit_after: false,
            });
        }

        let schedule = if config.notifications_enabled {
            self.ask_scheduled_monitoring()?
        } else {
            None
        };

        Ok(WizardOutcome {
            config,
            service_installed: true,
            schedule,
            exit_after: true,
        })
    }

    fn ask_proxies(&mut self, available: &BTreeMap<String, String>) -> Result<bool, SetupError> {
        let wanted = self.prompter.confirm(
            "Do you want to enable proxies with OxyLabs?",
            Some("Proxies help avoid IP blocking"),
        )?;
        if !wanted {
            return Ok(false);
        }

        if ProxyCredentials::from_values(available).is_none() {
            warn!("proxy requested but credentials are incomplete");
            print_warn("Unable to locate all OxyLabs credentials.");
            print_info(&format!(
                "Set {}, {}, {} and {} to use proxies. Continuing without proxies...",
                config::PROXY_USERNAME_KEY,
                config::PROXY_PASSWORD_KEY,
                config::PROXY_HOST_KEY,
                config::PROXY_PORT_KEY,
            ));
            return Ok(false);
        }
        Ok(true)
    }

    async fn ask_notifications(&mut self, config: &mut RunConfiguration) -> Result<(), SetupError> {
        config.notifications_enabled = false;
        if !self
            .prompter
            .confirm("Do you want to enable notifications with Telegram?", None)?
        {
            return Ok(());
        }

        if config.bot.is_some() {
            print_info("Using the Telegram bot already configured.");
            config.notifications_enabled = true;
            return Ok(());
        }

        print_warn("You must set up a Telegram bot and add its credentials.");
        if !self
            .prompter
            .confirm("Do you wish to set that up now?", None)?
        {
            print_info("Continuing without notifications.");
            return Ok(());
        }

        match self.registrar.register(&mut *self.prompter).await {
            Ok(identity) => {
                print_success("Telegram Bot Successfully Enabled!");
                config.bot = Some(identity);
                config.notifications_enabled = true;
            }
            Err(SetupError::Registrar(err)) => {
                warn!(error = %err, "telegram registration failed");
                print_error(&format!("Telegram bot setup failed: {}", err));
                print_info("Continuing without notifications. Run setup again to retry.");
            }
            Err(other) => return Err(other),
        }
        Ok(())
    }

    fn ask_persistent_service(&mut self) -> Result<bool, SetupError> {
        if !self
            .prompter
            .confirm("Do you want to set up apts as an always-on service?", None)?
        {
            return Ok(false);
        }

        print_step("Installing always-on service...");
        let path = ServiceInstaller::new(self.commands, &self.targets)
            .install(&self.os, &self.service)?;
        print_success(&format!(
            "Service installed from {}",
            style(path.display()).dim()
        ));
        Ok(true)
    }

    fn ask_scheduled_monitoring(&mut self) -> Result<Option<ScheduleOutcome>, SetupError> {
        if !self
            .prompter
            .confirm("Do you want to monitor a listing with Telegram?", None)?
        {
            return Ok(None);
        }

        print_step("Beginning Scheduled Task Setup...");
        print_info(&format!("Operating system detected: {}", self.os));

        let target_url = loop {
            let answer = self.prompter.text(
                "URL of the listing you wish to monitor:",
                Some("e.g. https://www.apartments.com/<listing>/<id>/"),
            )?;
            match url::Url::parse(&answer) {
                Ok(_) => break answer,
                Err(err) => print_warn(&format!("That does not look like a URL ({}).", err)),
            }
        };

        let labels: Vec<&str> = Cadence::ALL.iter().map(|c| c.label()).collect();
        let choice = self
            .prompter
            .select("How often should the listing be checked?", &labels)?;
        let cadence = Cadence::ALL.get(choice).copied().ok_or_else(|| {
            InquireError::InvalidConfiguration(format!("no cadence at index {}", choice))
        })?;
        let spec = PeriodicTaskSpec { target_url, cadence };

        let outcome = ScheduleInstaller::new(self.commands, &self.targets).install(&self.os, &spec)?;
        match &outcome {
            ScheduleOutcome::ScriptPlaced { path } => {
                print_success(&format!("Scheduled task written to {}", path.display()))
            }
            ScheduleOutcome::CronLineAdded { line } => {
                print_success(&format!("Installed new cron job: {}", line))
            }
            ScheduleOutcome::AlreadyScheduled { line } => {
                print_info(&format!("Job already exists in crontab, nothing added: {}", line))
            }
        }
        Ok(Some(outcome))
    }
}

/// Summary printed once the wizard has finished.
pub fn print_summary(outcome: &WizardOutcome) {
    let flag = |on: bool| {
        if on {
            style("enabled").green().bold().to_string()
        } else {
            style("disabled").dim().to_string()
        }
    };
    let mut section = GuideSection::new("Setup Complete")
        .status("Proxies", &flag(outcome.config.proxies_enabled))
        .status("Notifications", &flag(outcome.config.notifications_enabled))
        .status("Always-on service", &flag(outcome.service_installed));
    if let Some(schedule) = &outcome.schedule {
        let detail = match schedule {
            ScheduleOutcome::ScriptPlaced { path } => path.display().to_string(),
            ScheduleOutcome::CronLineAdded { line } | ScheduleOutcome::AlreadyScheduled { line } => {
                line.clone()
            }
        };
        section = section.status("Scheduled check", &detail);
    }
    if !outcome.config.notifications_enabled {
        section = section.warn("Telegram alerts are off. Run `apts --setup` again to enable them.");
    }
    if outcome.exit_after {
        section = section.info("The service now serves the API; this process will exit.");
    }
    section.print();
    println!();
}
