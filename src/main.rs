mod cli;
mod core;
mod interfaces;
mod logging;
mod platform;
mod setup;

use crate::core::terminal;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run_main().await {
        if cli::is_user_cancel(&e) {
            terminal::print_goodbye();
        } else {
            terminal::print_error(&format!("{:#}", e));
            std::process::exit(1);
        }
    } else {
        terminal::print_goodbye();
    }
}
