use teloxide::prelude::*;
use tracing::info;

use super::config::BotIdentity;
use super::listing::{Listing, UnitRecord};

const UNIT_SEPARATOR: &str = "\n━━━━━━━━━━━━━━━━━\n";

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("telegram chat id is not a number: {0}")]
    ChatId(String),
    #[error("telegram request failed: {0}")]
    Request(#[from] teloxide::RequestError),
}

/// Render a listing as a single chat message.
pub fn format_message(listing: &Listing) -> String {
    if listing.units.is_empty() {
        return format!("No available units right now at {}", listing.name);
    }

    let body = listing
        .units
        .iter()
        .map(format_unit)
        .collect::<Vec<_>>()
        .join(UNIT_SEPARATOR);
    format!("\n🚨 {} Alert 🚨\n\n{}\n", listing.name, body)
}

fn format_unit(unit: &UnitRecord) -> String {
    format!(
        "🏠 Unit: {}\n🛏️ {} Bed | 🛁 {:.1} Bath\n💰 ${:.2} | 📏 {:.0} sqft\n🗓️ {}",
        unit.name,
        unit.beds,
        unit.baths,
        unit.rent,
        unit.square_feet,
        unit.available_date_text
    )
}

/// Pushes listing summaries to the configured chat.
#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramNotifier {
    pub fn new(identity: &BotIdentity) -> Result<Self, NotifyError> {
        let chat_id = identity
            .destination_id
            .trim()
            .parse::<i64>()
            .map_err(|_| NotifyError::ChatId(identity.destination_id.clone()))?;
        Ok(Self {
            bot: Bot::new(&identity.credential),
            chat_id: ChatId(chat_id),
        })
    }

    /// Point the bot at another Bot API server.
    pub fn with_api_url(mut self, url: url::Url) -> Self {
        self.bot = self.bot.set_api_url(url);
        self
    }

    pub async fn send(&self, listing: &Listing) -> Result<(), NotifyError> {
        let text = format_message(listing);
        self.bot.send_message(self.chat_id, text).await?;
        info!(
            listing = %listing.name,
            units = listing.units.len(),
            "notification sent"
        );
        Ok(())
    }
}
