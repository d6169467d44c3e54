use serde::Deserialize;

use super::SetupError;
use super::prompt::Prompter;
use crate::core::config::BotIdentity;
use crate::core::terminal::{print_info, print_step, print_success};

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, thiserror::Error)]
pub enum RegistrarError {
    #[error("no bot token was entered")]
    EmptyToken,
    #[error("getUpdates request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("getUpdates returned status {0}")]
    Status(u16),
    #[error("decoding getUpdates JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("no messages found in chat. Please send your bot a message")]
    NoMessages,
    #[error("the most recent update is not a chat message")]
    NotAMessage,
}

// Only the fields the registrar reads: result[].message.chat.id

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    #[serde(default)]
    result: Vec<Update>,
}

#[derive(Debug, Deserialize)]
struct Update {
    message: Option<UpdateMessage>,
}

#[derive(Debug, Deserialize)]
struct UpdateMessage {
    chat: Chat,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: f64,
}

/// Pull the chat id of the most recent message out of a getUpdates body.
pub fn latest_chat_id(body: &str) -> Result<String, RegistrarError> {
    let response: UpdatesResponse = serde_json::from_str(body)?;
    let last = response.result.last().ok_or(RegistrarError::NoMessages)?;
    let message = last.message.as_ref().ok_or(RegistrarError::NotAMessage)?;
    Ok(format_chat_id(message.chat.id))
}

/// Chat ids arrive as JSON numbers; print them without a fractional part.
pub fn format_chat_id(id: f64) -> String {
    format!("{:.0}", id)
}

/// Walks the user through creating a bot with BotFather and discovers the
/// chat the bot should post into.
#[derive(Debug, Clone)]
pub struct TelegramRegistrar {
    client: reqwest::Client,
    api_base: String,
}

impl TelegramRegistrar {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            api_base: TELEGRAM_API_BASE.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub async fn register(&self, prompter: &mut dyn Prompter) -> Result<BotIdentity, SetupError> {
        print_step("Beginning Telegram Bot Setup...");
        println!("  1. Open Telegram");
        println!("  2. Search for the 'BotFather' (username: @BotFather)");
        println!("  3. Start a chat with BotFather and send '/newbot', then follow the instructions\n");

        let credential = prompter.secret("Telegram bot token:")?;
        if credential.is_empty() {
            return Err(RegistrarError::EmptyToken.into());
        }

        print_info(
            "Click the t.me/<yourbotname> link BotFather provided, press 'Start' and send the bot a message.",
        );
        while !prompter.confirm(
            "Have you sent your bot a message?",
            Some("The chat id is read from the most recent message the bot received"),
        )? {
            print_info("Start the chat with your bot and send it any message first.");
        }

        print_step("Fetching Chat ID...");
        let destination_id = self.fetch_chat_id(&credential).await?;
        print_success(&format!("Retrieved Chat ID: {}", destination_id));

        Ok(BotIdentity {
            credential,
            destination_id,
        })
    }

    pub async fn fetch_chat_id(&self, credential: &str) -> Result<String, RegistrarError> {
        let url = format!("{}/bot{}/getUpdates", self.api_base, credential);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            tracing::warn!(status = status.as_u16(), "getUpdates rejected");
            return Err(RegistrarError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        latest_chat_id(&body)
    }
}
