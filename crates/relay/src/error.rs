use partyline_protocol::Platform;

/// Crate-wide result type for relay operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed relay errors. All of these are per-destination: the router logs
/// them and carries on with the remaining destinations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No bot registered for the destination's platform and id.
    #[error("no bot {bot_id} registered on {platform}")]
    UnknownBot { platform: Platform, bot_id: String },

    /// A Discord destination without webhook credentials slipped through
    /// normalization.
    #[error("discord endpoint {channel_id} has no webhook credentials")]
    MissingWebhook { channel_id: String },

    /// The destination platform rejected or failed the send.
    #[error("send to {channel} failed: {source}")]
    Send {
        channel: String,
        #[source]
        source: anyhow::Error,
    },
}

impl Error {
    #[must_use]
    pub fn unknown_bot(platform: Platform, bot_id: impl Into<String>) -> Self {
        Self::UnknownBot {
            platform,
            bot_id: bot_id.into(),
        }
    }

    #[must_use]
    pub fn send(channel: impl std::fmt::Display, source: anyhow::Error) -> Self {
        Self::Send {
            channel: channel.to_string(),
            source,
        }
    }
}
