use {partyline_protocol::Platform, serde::{Deserialize, Serialize}};

/// Raw relay configuration surface: the links and the recent-window size.
///
/// Loading this from a file or CLI is the host's job; the relay core only
/// consumes the deserialized value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Number of recent origin messages kept per channel for reply
    /// resolution and deletion cascade. `None` means the default (1000).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent: Option<usize>,

    /// Each inner list is one link of 2+ endpoints.
    pub links: Vec<Vec<EndpointConfig>>,
}

/// One partially-specified endpoint as written in configuration.
/// Unset fields take platform defaults during normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub platform: Platform,
    pub channel_id: String,
    pub bot_id: String,

    /// Prefix shown in front of relayed senders (e.g. `[QQ]`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg_prefix: Option<String>,

    /// Whether destinations prepend the source prefix when relaying *to*
    /// this endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_prefix: Option<bool>,

    /// Only relay messages that mention this endpoint's bot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_only: Option<bool>,

    /// Show sender ids/discriminators when relaying to this endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_id: Option<bool>,

    // Discord-only credentials. An endpoint missing these on Discord is
    // dropped during normalization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_token: Option<String>,
}

impl EndpointConfig {
    pub fn new(
        platform: Platform,
        channel_id: impl Into<String>,
        bot_id: impl Into<String>,
    ) -> Self {
        Self {
            platform,
            channel_id: channel_id.into(),
            bot_id: bot_id.into(),
            msg_prefix: None,
            use_prefix: None,
            at_only: None,
            show_id: None,
            guild_id: None,
            webhook_id: None,
            webhook_token: None,
        }
    }
}
