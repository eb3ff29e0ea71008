//! Per-destination send, dispatched on the destination platform.
//!
//! Discord destinations go through webhook execution so the relayed message
//! carries the original sender's name and avatar; everything else gets a
//! single formatted `prefix + sender: content` line through the plain send
//! primitive.

use {
    crate::{
        bot::{BotRegistry, RelayBot, WebhookEmbed, WebhookPayload},
        error::{Error, Result},
        transform::{ContentTransformer, TransformOutput},
    },
    partyline_cache::RelayedCopy,
    partyline_links::Endpoint,
    partyline_protocol::{MessageEvent, Platform, Segment},
    std::sync::Arc,
    tracing::info,
};

/// Sends one transformed message to one destination.
pub struct OutboundDispatcher {
    bots: Arc<BotRegistry>,
}

impl OutboundDispatcher {
    pub fn new(bots: Arc<BotRegistry>) -> Self {
        Self { bots }
    }

    /// Returns the copy record on success. Failures are typed so the router
    /// can log them per destination without aborting the fan-out round.
    pub async fn send(
        &self,
        event: &MessageEvent,
        source: &Endpoint,
        dest: &Endpoint,
        output: &TransformOutput,
    ) -> Result<RelayedCopy> {
        let bot = self
            .bots
            .get(dest.platform, &dest.bot_id)
            .ok_or_else(|| Error::unknown_bot(dest.platform, &dest.bot_id))?;
        let sender = ContentTransformer::sender_display(&event.author, source, dest);

        let msg_ids = match dest.platform {
            Platform::Discord => {
                self.send_webhook(bot.as_ref(), event, source, dest, output, &sender)
                    .await?
            },
            _ => {
                let prefix = if dest.use_prefix {
                    source.msg_prefix.as_str()
                } else {
                    ""
                };
                let content = Segment::join(&output.segments);
                let line = format!("{prefix}{sender}: {content}");
                bot.send_message(&dest.channel_id, &line)
                    .await
                    .map_err(|e| Error::send(dest.channel_key(), e))?
            },
        };

        info!(
            source = %source.channel_key(),
            dest = %dest.channel_key(),
            sender = %sender,
            messages = msg_ids.len(),
            "message relayed"
        );
        Ok(RelayedCopy::new(
            dest.channel_key(),
            dest.bot_id.clone(),
            msg_ids,
        ))
    }

    async fn send_webhook(
        &self,
        bot: &dyn RelayBot,
        event: &MessageEvent,
        source: &Endpoint,
        dest: &Endpoint,
        output: &TransformOutput,
        sender: &str,
    ) -> Result<Vec<String>> {
        let webhook = dest.webhook.as_ref().ok_or_else(|| Error::MissingWebhook {
            channel_id: dest.channel_id.clone(),
        })?;

        // Webhook posts cannot natively thread; the quote becomes a jump
        // link embed instead.
        let body: Vec<Segment> = output
            .segments
            .iter()
            .filter(|s| !s.is_quote())
            .cloned()
            .collect();
        let embeds = output
            .resolved_quote
            .iter()
            .map(|quoted| WebhookEmbed {
                description: format!(
                    "[replied message](https://discord.com/channels/{}/{}/{})",
                    webhook.guild_id, dest.channel_id, quoted
                ),
            })
            .collect();
        // QQ avatars are derivable from the numeric user id; other platforms
        // hand us a URL directly or nothing at all.
        let avatar_url = match source.platform {
            Platform::Onebot => Some(format!(
                "http://q1.qlogo.cn/g?b=qq&nk={}&s=640",
                event.author.user_id
            )),
            _ => event.author.avatar_url.clone(),
        };

        let payload = WebhookPayload {
            content: Segment::join(&body),
            username: format!("{}{sender}", source.msg_prefix),
            avatar_url,
            embeds,
        };
        bot.execute_webhook(&webhook.webhook_id, &webhook.webhook_token, &payload)
            .await
            .map_err(|e| Error::send(dest.channel_key(), e))
    }
}
