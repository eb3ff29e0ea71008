//! Platform bot capability contract and the bot registry.
//!
//! The relay core never talks to a chat platform directly; each platform
//! client implements [`RelayBot`] and registers itself. Transport details
//! (HTTP, gateways, webhooks) stay on the other side of this trait.

use {
    anyhow::Result,
    async_trait::async_trait,
    partyline_protocol::{Author, Platform},
    serde::Serialize,
    std::{collections::HashMap, sync::Arc},
};

/// Body of a Discord webhook execution
/// (`POST /webhooks/{id}/{token}?wait=1`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WebhookPayload {
    pub content: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<WebhookEmbed>,
}

/// Minimal embed used for the reply jump link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookEmbed {
    pub description: String,
}

/// Result of a user lookup.
#[derive(Debug, Clone, Default)]
pub struct UserProfile {
    pub nickname: Option<String>,
    pub username: Option<String>,
}

impl UserProfile {
    pub fn display_name(&self) -> Option<&str> {
        self.nickname.as_deref().or(self.username.as_deref())
    }
}

/// A fetched message, used for deletion audit logging.
#[derive(Debug, Clone)]
pub struct FetchedMessage {
    pub author: Author,
    pub content: String,
}

/// Capabilities the relay needs from one platform bot account.
///
/// `send_message` and `delete_message` are mandatory; the lookup calls and
/// webhook execution default to an error so platforms without the concept
/// degrade gracefully.
#[async_trait]
pub trait RelayBot: Send + Sync {
    fn platform(&self) -> Platform;

    /// The bot's own account id on its platform.
    fn self_id(&self) -> &str;

    /// Plain send; returns the platform-native message id(s).
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<Vec<String>>;

    /// Execute a Discord webhook, posting under an arbitrary name/avatar.
    async fn execute_webhook(
        &self,
        webhook_id: &str,
        webhook_token: &str,
        payload: &WebhookPayload,
    ) -> Result<Vec<String>> {
        let _ = (webhook_id, webhook_token, payload);
        anyhow::bail!("webhook execution is not supported on {}", self.platform())
    }

    async fn get_message(&self, channel_id: &str, message_id: &str) -> Result<FetchedMessage> {
        anyhow::bail!(
            "message lookup is not supported on {} ({channel_id}/{message_id})",
            self.platform()
        )
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<()>;

    async fn get_user(&self, user_id: &str) -> Result<UserProfile> {
        anyhow::bail!(
            "user lookup is not supported on {} ({user_id})",
            self.platform()
        )
    }
}

/// Registry of bot accounts keyed by platform and self id.
#[derive(Default)]
pub struct BotRegistry {
    bots: HashMap<(Platform, String), Arc<dyn RelayBot>>,
}

impl BotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, bot: Arc<dyn RelayBot>) {
        self.bots
            .insert((bot.platform(), bot.self_id().to_string()), bot);
    }

    pub fn get(&self, platform: Platform, bot_id: &str) -> Option<Arc<dyn RelayBot>> {
        self.bots.get(&(platform, bot_id.to_string())).cloned()
    }
}
