//! Per-destination rewrite of a parsed message.
//!
//! Text and images pass through (images stay URL references). Quotes are
//! resolved through the relay cache to the destination's copy of the quoted
//! message. Mentions are suppressed or escaped to plain text depending on
//! the source/destination pair.

use {
    crate::bot::{BotRegistry, RelayBot},
    partyline_cache::RelayCache,
    partyline_links::Endpoint,
    partyline_protocol::{Author, MessageEvent, Platform, Segment},
    std::sync::Arc,
    tracing::warn,
};

/// A transformed segment sequence plus the resolved quote target, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutput {
    pub segments: Vec<Segment>,
    /// Destination-side id of the quoted message, when a quote resolved.
    pub resolved_quote: Option<String>,
}

/// Rewrites message content for one destination at a time.
pub struct ContentTransformer {
    cache: Arc<RelayCache>,
    bots: Arc<BotRegistry>,
}

impl ContentTransformer {
    pub fn new(cache: Arc<RelayCache>, bots: Arc<BotRegistry>) -> Self {
        Self { cache, bots }
    }

    pub async fn transform(
        &self,
        event: &MessageEvent,
        source: &Endpoint,
        dest: &Endpoint,
    ) -> TransformOutput {
        let origin = event.channel_key();
        let dest_key = dest.channel_key();
        let source_bot = self.bots.get(source.platform, &source.bot_id);

        let mut segments = Vec::with_capacity(event.segments.len());
        let mut resolved_quote = None;
        let mut prev_was_quote = false;
        for segment in &event.segments {
            let after_quote = prev_was_quote;
            prev_was_quote = segment.is_quote();
            match segment {
                Segment::Text { .. } | Segment::Image { .. } => segments.push(segment.clone()),
                Segment::Quote { id } => {
                    match self.cache.resolve_quote(&origin, id, &dest_key) {
                        Some(target) => {
                            resolved_quote = Some(target.clone());
                            segments.push(Segment::Quote { id: target });
                        },
                        None => {
                            // Soft failure: the destination renderer shows a
                            // broken reference instead of us dropping content.
                            warn!(
                                origin = %origin,
                                quoted = %id,
                                dest = %dest_key,
                                "quote target not resolvable, passing through"
                            );
                            segments.push(segment.clone());
                        },
                    }
                },
                Segment::Mention {
                    id,
                    name,
                    role,
                    kind,
                } => {
                    if id.as_deref() == Some(source.bot_id.as_str()) {
                        // Never relay mentions of our own relay bot.
                        segments.push(Segment::text(""));
                        continue;
                    }
                    // OneBot auto-attaches a mention right after a reply;
                    // relaying it would duplicate the quoted sender.
                    if source.platform == Platform::Onebot && after_quote {
                        segments.push(Segment::text(""));
                        continue;
                    }
                    let non_user = role.is_some() || kind.is_some();
                    if source.platform != dest.platform || non_user {
                        let display = self
                            .mention_display(source_bot.as_deref(), id, name, role, kind)
                            .await;
                        segments.push(Segment::text(format!("@{display}")));
                    } else {
                        segments.push(segment.clone());
                    }
                },
            }
        }
        TransformOutput {
            segments,
            resolved_quote,
        }
    }

    /// Resolution order: explicit name, looked-up nickname/username, raw id,
    /// role/kind, then a literal fallback.
    async fn mention_display(
        &self,
        source_bot: Option<&dyn RelayBot>,
        id: &Option<String>,
        name: &Option<String>,
        role: &Option<String>,
        kind: &Option<String>,
    ) -> String {
        if let Some(name) = name {
            return name.clone();
        }
        if let Some(id) = id {
            if let Some(bot) = source_bot {
                match bot.get_user(id).await {
                    Ok(profile) => {
                        if let Some(display) = profile.display_name() {
                            return display.to_string();
                        }
                    },
                    Err(e) => {
                        warn!(user_id = %id, error = %e, "mention target lookup failed");
                    },
                }
            }
            return id.clone();
        }
        role.clone()
            .or_else(|| kind.clone())
            .unwrap_or_else(|| "unknown user".to_string())
    }

    /// Sender line shown on the destination: `nickname || username`, with the
    /// discriminator or ` (userId)` appended when the source platform's ids
    /// are meaningful and the destination wants them.
    pub fn sender_display(author: &Author, source: &Endpoint, dest: &Endpoint) -> String {
        let mut sender = author.display_name().to_string();
        if !source.bad_id && dest.show_id {
            if let Some(discriminator) = &author.discriminator {
                sender.push('#');
                sender.push_str(discriminator);
            } else if !author.user_id.is_empty() {
                sender.push_str(&format!(" ({})", author.user_id));
            }
        }
        sender
    }
}
