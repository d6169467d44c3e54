use anyhow::{Context, Result, bail};
use tracing::info;

use crate::core::config::{self, EnvFile, ProxyCredentials, RunConfiguration};
use crate::core::http::build_client;
use crate::core::notify::TelegramNotifier;
use crate::core::terminal::print_info;
use crate::interfaces::web::{self, AppState};

pub async fn run_serve() -> Result<()> {
    let store = EnvFile::in_working_dir();
    let values = config::layered_values(
        store.load().context("reading configuration")?,
        &config::environment_snapshot(),
    );
    let config = RunConfiguration::from_values(&values);

    let proxy = if config.proxies_enabled {
        match ProxyCredentials::from_values(&values) {
            Some(credentials) => Some(credentials),
            None => bail!(
                "proxies are enabled but {}, {}, {} and {} are not all set",
                config::PROXY_USERNAME_KEY,
                config::PROXY_PASSWORD_KEY,
                config::PROXY_HOST_KEY,
                config::PROXY_PORT_KEY
            ),
        }
    } else {
        None
    };
    let client = build_client(proxy.as_ref()).context("building HTTP client")?;

    let notifier = match (&config.bot, config.notifications_enabled) {
        (Some(identity), true) => {
            Some(TelegramNotifier::new(identity).context("configuring Telegram notifications")?)
        }
        _ => None,
    };

    let routes = if notifier.is_some() { "/apts and /chat" } else { "/apts" };
    let via = if proxy.is_some() { " with proxies" } else { "" };
    print_info(&format!(
        "{}{} running on {}",
        routes,
        via,
        web::DEFAULT_BIND_ADDR
    ));
    info!(
        proxies = proxy.is_some(),
        notifications = notifier.is_some(),
        "starting listing API"
    );

    web::serve(AppState::new(client, notifier), web::DEFAULT_BIND_ADDR).await
}
