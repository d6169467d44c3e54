use anyhow::{Context, Result};

use crate::core::config::{self, EnvFile};
use crate::platform::OsFamily;
use crate::setup::command::SystemCommands;
use crate::setup::prompt::InquirePrompter;
use crate::setup::registrar::TelegramRegistrar;
use crate::setup::service::{RestartPolicy, ServiceDefinition};
use crate::setup::wizard::{self, SetupWizard, WizardOutcome};
use crate::setup::InstallTargets;

pub async fn run_setup() -> Result<WizardOutcome> {
    let store = EnvFile::in_working_dir();
    let registrar = TelegramRegistrar::new(reqwest::Client::new());
    let mut prompter = InquirePrompter;
    let service = ServiceDefinition::for_current_executable(RestartPolicy::OnFailure)?;

    let mut wizard = SetupWizard {
        os: OsFamily::detect(),
        prompter: &mut prompter,
        commands: &SystemCommands,
        store: &store,
        registrar: &registrar,
        targets: InstallTargets::system(),
        service,
        environment: config::environment_snapshot(),
    };
    let outcome = wizard.run().await.context("setup failed")?;

    wizard::print_summary(&outcome);
    Ok(outcome)
}
