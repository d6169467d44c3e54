//! Persisted run configuration.
//!
//! The `.env` store in the working directory is the only channel between
//! invocations: the wizard writes it, serve mode reads it on startup. Within
//! one process the decoded [`RunConfiguration`] is passed around directly.

mod store;

pub use store::{EnvFile, StoreError};

use std::collections::BTreeMap;

pub const PROXIES_ENABLED_KEY: &str = "proxies_enabled";
pub const TELEGRAM_ENABLED_KEY: &str = "telegram_enabled";
pub const BOT_TOKEN_KEY: &str = "TELEGRAM_BOT_TOKEN";
pub const CHAT_ID_KEY: &str = "TELEGRAM_CHAT_ID";

pub const PROXY_USERNAME_KEY: &str = "OXYLABS_USERNAME";
pub const PROXY_PASSWORD_KEY: &str = "OXYLABS_PASSWORD";
pub const PROXY_HOST_KEY: &str = "OXYLABS_PROXY_HOST";
pub const PROXY_PORT_KEY: &str = "OXYLABS_PROXY_PORT";

/// Every key the process cares about, used to snapshot the environment.
pub const KNOWN_KEYS: [&str; 8] = [
    PROXIES_ENABLED_KEY,
    TELEGRAM_ENABLED_KEY,
    BOT_TOKEN_KEY,
    CHAT_ID_KEY,
    PROXY_USERNAME_KEY,
    PROXY_PASSWORD_KEY,
    PROXY_HOST_KEY,
    PROXY_PORT_KEY,
];

/// A registered Telegram bot and the chat it posts into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub credential: String,
    /// Numeric chat id kept as a string so large ids survive untouched.
    pub destination_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfiguration {
    pub proxies_enabled: bool,
    pub notifications_enabled: bool,
    pub bot: Option<BotIdentity>,
}

impl RunConfiguration {
    /// Decode from a flat key-value map.
    ///
    /// Notifications are only reported as enabled when a complete bot
    /// identity is present alongside the flag.
    pub fn from_values(values: &BTreeMap<String, String>) -> Self {
        let bot = match (non_empty(values, BOT_TOKEN_KEY), non_empty(values, CHAT_ID_KEY)) {
            (Some(credential), Some(destination_id)) => Some(BotIdentity {
                credential: credential.to_string(),
                destination_id: destination_id.to_string(),
            }),
            _ => None,
        };
        let notifications_enabled = bot.is_some()
            && values
                .get(TELEGRAM_ENABLED_KEY)
                .is_some_and(|v| parse_flag(v));

        Self {
            proxies_enabled: values
                .get(PROXIES_ENABLED_KEY)
                .is_some_and(|v| parse_flag(v)),
            notifications_enabled,
            bot,
        }
    }

    /// Write the flags and identity into `values`, leaving unrelated keys alone.
    pub fn apply_to(&self, values: &mut BTreeMap<String, String>) {
        values.insert(
            PROXIES_ENABLED_KEY.to_string(),
            render_flag(self.proxies_enabled).to_string(),
        );
        values.insert(
            TELEGRAM_ENABLED_KEY.to_string(),
            render_flag(self.notifications_enabled && self.bot.is_some()).to_string(),
        );
        if let Some(bot) = &self.bot {
            values.insert(BOT_TOKEN_KEY.to_string(), bot.credential.clone());
            values.insert(CHAT_ID_KEY.to_string(), bot.destination_id.clone());
        }
    }

    pub fn load(store: &EnvFile) -> Result<Self, StoreError> {
        Ok(Self::from_values(&store.load()?))
    }

    /// Merge into the store, save, and return what the store now holds.
    pub fn persist(&self, store: &EnvFile) -> Result<Self, StoreError> {
        let mut values = store.load()?;
        self.apply_to(&mut values);
        store.save(&values)?;
        Self::load(store)
    }
}

/// Credentials for the upstream rotating proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyCredentials {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: String,
}

impl ProxyCredentials {
    /// Returns `None` unless all four fields are present and non-empty.
    pub fn from_values(values: &BTreeMap<String, String>) -> Option<Self> {
        Some(Self {
            username: non_empty(values, PROXY_USERNAME_KEY)?.to_string(),
            password: non_empty(values, PROXY_PASSWORD_KEY)?.to_string(),
            host: non_empty(values, PROXY_HOST_KEY)?.to_string(),
            port: non_empty(values, PROXY_PORT_KEY)?.to_string(),
        })
    }

    pub fn proxy_url(&self) -> String {
        format!(
            "http://{}:{}@{}:{}",
            urlencoding::encode(&self.username),
            urlencoding::encode(&self.password),
            self.host,
            self.port
        )
    }
}

/// Snapshot of the known keys currently set in the process environment.
pub fn environment_snapshot() -> BTreeMap<String, String> {
    KNOWN_KEYS
        .iter()
        .filter_map(|key| {
            std::env::var(key)
                .ok()
                .map(|value| (key.to_string(), value))
        })
        .collect()
}

/// Store values with the process environment layered on top, matching the
/// usual dotenv precedence where an exported variable wins over the file.
pub fn layered_values(
    store_values: BTreeMap<String, String>,
    environment: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut values = store_values;
    for (key, value) in environment {
        if !value.is_empty() {
            values.insert(key.clone(), value.clone());
        }
    }
    values
}

pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "y" | "yes" | "true" | "1"
    )
}

fn render_flag(enabled: bool) -> &'static str {
    if enabled { "y" } else { "n" }
}

fn non_empty<'a>(values: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    values
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}
