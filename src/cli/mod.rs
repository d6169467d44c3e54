mod serve;
mod setup;

use anyhow::{Result, bail};
use console::style;
use inquire::InquireError;

use crate::core::terminal::{self, GuideSection};
use crate::logging::{self, LogMode};
use crate::setup::SetupError;

fn print_help() {
    terminal::print_banner();

    GuideSection::new("Modes")
        .command("(none)", "Serve the listing API on 0.0.0.0:8000")
        .command("--setup", "Run the interactive setup wizard")
        .command("--help", "Show this help")
        .print();

    GuideSection::new("Endpoints")
        .command("GET  /apts?url=", "Available units of a listing as JSON")
        .command("POST /chat?url=", "Send the listing summary to Telegram")
        .print();

    GuideSection::new("Environment")
        .text("Settings are read from .env in the working directory;")
        .text("exported variables take precedence.")
        .command(logging::LOG_LEVEL_VAR, "Log level (error, warn, info, debug, trace)")
        .print();

    println!(
        "\n {} {} [--setup]\n",
        style("Usage:").bold(),
        style("apts").green()
    );
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    Serve,
    Setup,
    Help,
}

pub(crate) fn parse_command(args: &[String]) -> Result<Command> {
    let mut command = Command::Serve;
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--setup" | "-setup" => command = Command::Setup,
            "--help" | "-h" | "-help" => return Ok(Command::Help),
            other => bail!("unknown argument `{}` (try --help)", other),
        }
    }
    Ok(command)
}

/// True when the error comes from the user leaving a prompt (Esc or Ctrl+C).
/// Command output that merely mentions cancelling does not count.
pub fn is_user_cancel(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<SetupError>(),
            Some(SetupError::Prompt(
                InquireError::OperationCanceled | InquireError::OperationInterrupted
            ))
        ) || matches!(
            cause.downcast_ref::<InquireError>(),
            Some(InquireError::OperationCanceled | InquireError::OperationInterrupted)
        )
    })
}

pub async fn run_main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    match parse_command(&args)? {
        Command::Help => {
            print_help();
            Ok(())
        }
        Command::Setup => {
            logging::init(LogMode::Setup);
            terminal::print_banner();
            let outcome = setup::run_setup().await?;
            if outcome.exit_after {
                return Ok(());
            }
            logging::set_mode(LogMode::Serve);
            serve::run_serve().await
        }
        Command::Serve => {
            logging::init(LogMode::Serve);
            terminal::print_banner();
            serve::run_serve().await
        }
    }
}
