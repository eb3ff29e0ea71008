//! Shared relay data model.
//!
//! Platforms, channel keys, message segments, and the inbound events the
//! relay core subscribes to. Everything here is plain data — no I/O.

use {serde::{Deserialize, Serialize}, std::fmt};

// ── Platforms ────────────────────────────────────────────────────────────────

/// Chat platforms a link endpoint can live on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// QQ via the OneBot protocol.
    Onebot,
    Discord,
    Telegram,
    /// In-game chat channel (e.g. a Minecraft server bridge).
    GameChat,
}

impl Platform {
    /// Wire name, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Onebot => "onebot",
            Self::Discord => "discord",
            Self::Telegram => "telegram",
            Self::GameChat => "game_chat",
        }
    }

    /// Alias used in per-destination suppression tags (`__no<alias>__`).
    /// OneBot goes by "qq"; every other platform uses its wire name.
    pub fn alias(self) -> &'static str {
        match self {
            Self::Onebot => "qq",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Channel keys ─────────────────────────────────────────────────────────────

/// Unique identity of a channel across platforms, rendered `platform:channel`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelKey {
    pub platform: Platform,
    pub channel_id: String,
}

impl ChannelKey {
    pub fn new(platform: Platform, channel_id: impl Into<String>) -> Self {
        Self {
            platform,
            channel_id: channel_id.into(),
        }
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.platform, self.channel_id)
    }
}

// ── Segments ─────────────────────────────────────────────────────────────────

/// A typed unit of rich message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    Text {
        content: String,
    },
    /// Image carried by URL reference only — never re-uploaded by the relay.
    Image {
        url: String,
    },
    /// An @-mention of a user, role, or special target.
    Mention {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        role: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
    },
    /// Reply-to reference carrying the quoted message id.
    Quote {
        id: String,
    },
}

impl Segment {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    pub fn is_quote(&self) -> bool {
        matches!(self, Self::Quote { .. })
    }

    /// Render a segment sequence as plain text for platforms without rich
    /// content. Mentions fall back to `@id` when no display name survived
    /// transformation; quotes have no plain-text form and are dropped.
    pub fn join(segments: &[Segment]) -> String {
        let mut out = String::new();
        for segment in segments {
            match segment {
                Self::Text { content } => out.push_str(content),
                Self::Image { url } => out.push_str(url),
                Self::Mention { name, id, .. } => {
                    if let Some(target) = name.as_deref().or(id.as_deref()) {
                        out.push('@');
                        out.push_str(target);
                    }
                },
                Self::Quote { .. } => {},
            }
        }
        out
    }
}

// ── Authors and events ───────────────────────────────────────────────────────

/// Sender identity attached to an inbound message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Author {
    pub user_id: String,
    pub username: Option<String>,
    pub nickname: Option<String>,
    /// Discord-style discriminator, when the platform has one.
    pub discriminator: Option<String>,
    pub avatar_url: Option<String>,
    pub is_bot: bool,
}

impl Author {
    /// Preferred display name: nickname over username, empty when neither.
    pub fn display_name(&self) -> &str {
        self.nickname
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or("")
    }
}

/// An inbound platform event the relay core subscribes to: a received
/// message, a message the bot itself sent, or a deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEvent {
    pub platform: Platform,
    pub channel_id: String,
    pub message_id: String,
    pub segments: Vec<Segment>,
    pub author: Author,
    /// Unix seconds.
    pub timestamp: i64,
    /// On deletion events: who recalled the message, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator_id: Option<String>,
}

impl MessageEvent {
    pub fn channel_key(&self) -> ChannelKey {
        ChannelKey::new(self.platform, self.channel_id.clone())
    }

    /// Plain-text rendering of the event's content.
    pub fn content(&self) -> String {
        Segment::join(&self.segments)
    }
}
