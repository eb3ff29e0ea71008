//! Deletion cascade: when an origin message is recalled, delete every
//! relayed copy of it, best-effort.

use {
    crate::bot::BotRegistry,
    partyline_cache::RelayCache,
    partyline_links::Endpoint,
    partyline_protocol::MessageEvent,
    std::sync::Arc,
    tracing::{debug, info, warn},
};

pub struct DeletionPropagator {
    cache: Arc<RelayCache>,
    bots: Arc<BotRegistry>,
}

impl DeletionPropagator {
    pub fn new(cache: Arc<RelayCache>, bots: Arc<BotRegistry>) -> Self {
        Self { cache, bots }
    }

    /// Delete every relayed copy of the recalled message. One destination's
    /// failure never stops the cascade, and the audit lookups (operator,
    /// original author) never block a delete.
    pub async fn propagate(&self, event: &MessageEvent, source: &Endpoint) {
        let origin = event.channel_key();
        let Some(copies) = self.cache.get(&origin, &event.message_id) else {
            debug!(
                channel = %origin,
                msg_id = %event.message_id,
                "recalled message has no relay record"
            );
            return;
        };

        let operator = self.operator_name(event, source).await;
        for copy in &copies {
            let Some(bot) = self.bots.get(copy.channel.platform, &copy.bot_id) else {
                warn!(
                    dest = %copy.channel,
                    bot_id = %copy.bot_id,
                    "no bot registered to delete relayed copy"
                );
                continue;
            };
            // Author name for the audit line only.
            let author = match copy.first_msg_id() {
                Some(id) => bot
                    .get_message(&copy.channel.channel_id, id)
                    .await
                    .ok()
                    .map(|m| {
                        let name = m.author.display_name().to_string();
                        if name.is_empty() { m.author.user_id } else { name }
                    }),
                None => None,
            };
            for msg_id in &copy.msg_ids {
                match bot.delete_message(&copy.channel.channel_id, msg_id).await {
                    Ok(()) => info!(
                        dest = %copy.channel,
                        msg_id = %msg_id,
                        operator = %operator.as_deref().unwrap_or("unknown"),
                        author = %author.as_deref().unwrap_or("unknown"),
                        "relayed copy deleted"
                    ),
                    Err(e) => warn!(
                        dest = %copy.channel,
                        msg_id = %msg_id,
                        error = %e,
                        "failed to delete relayed copy"
                    ),
                }
            }
        }
    }

    async fn operator_name(&self, event: &MessageEvent, source: &Endpoint) -> Option<String> {
        let operator_id = event.operator_id.as_ref()?;
        let looked_up = match self.bots.get(source.platform, &source.bot_id) {
            Some(bot) => bot
                .get_user(operator_id)
                .await
                .ok()
                .and_then(|u| u.display_name().map(str::to_string)),
            None => None,
        };
        Some(looked_up.unwrap_or_else(|| operator_id.clone()))
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::test_support::{MockBot, endpoint, event_from},
        partyline_cache::RelayedCopy,
        partyline_protocol::{ChannelKey, Platform},
    };

    fn setup(bots: Vec<Arc<dyn crate::bot::RelayBot>>) -> (DeletionPropagator, Arc<RelayCache>) {
        let cache = Arc::new(RelayCache::new(10));
        let mut registry = BotRegistry::new();
        for bot in bots {
            registry.register(bot);
        }
        (
            DeletionPropagator::new(Arc::clone(&cache), Arc::new(registry)),
            cache,
        )
    }

    #[tokio::test]
    async fn cascade_deletes_every_copy_even_when_one_fails() {
        let discord = Arc::new(MockBot::new(Platform::Discord, "901").failing_delete_of("d1"));
        let telegram = Arc::new(MockBot::new(Platform::Telegram, "902"));
        let (propagator, cache) =
            setup(vec![Arc::clone(&discord) as _, Arc::clone(&telegram) as _]);

        cache.push(
            ChannelKey::new(Platform::Onebot, "100"),
            "m1".into(),
            vec![
                RelayedCopy::new(ChannelKey::new(Platform::Discord, "200"), "901", vec![
                    "d1".into(),
                ]),
                RelayedCopy::new(ChannelKey::new(Platform::Telegram, "300"), "902", vec![
                    "t1".into(),
                ]),
            ],
        );

        let event = event_from(Platform::Onebot, "100", "m1", "");
        propagator
            .propagate(&event, &endpoint(Platform::Onebot, "100"))
            .await;

        // Discord delete failed, but Telegram's was still attempted.
        assert!(discord.deleted.lock().unwrap().is_empty());
        assert_eq!(
            telegram.deleted.lock().unwrap().as_slice(),
            [("300".to_string(), "t1".to_string())]
        );
    }

    #[tokio::test]
    async fn unknown_message_is_a_no_op() {
        let telegram = Arc::new(MockBot::new(Platform::Telegram, "902"));
        let (propagator, _cache) = setup(vec![Arc::clone(&telegram) as _]);
        let event = event_from(Platform::Onebot, "100", "never-relayed", "");
        propagator
            .propagate(&event, &endpoint(Platform::Onebot, "100"))
            .await;
        assert!(telegram.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn multi_part_copies_delete_every_id() {
        let telegram = Arc::new(MockBot::new(Platform::Telegram, "902"));
        let (propagator, cache) = setup(vec![Arc::clone(&telegram) as _]);
        cache.push(
            ChannelKey::new(Platform::Onebot, "100"),
            "m1".into(),
            vec![RelayedCopy::new(
                ChannelKey::new(Platform::Telegram, "300"),
                "902",
                vec!["t1".into(), "t2".into()],
            )],
        );

        let event = event_from(Platform::Onebot, "100", "m1", "");
        propagator
            .propagate(&event, &endpoint(Platform::Onebot, "100"))
            .await;
        let deleted = telegram.deleted.lock().unwrap();
        assert_eq!(deleted.len(), 2);
    }

    #[tokio::test]
    async fn operator_lookup_failure_does_not_block_deletes() {
        // Source bot is not even registered; operator resolution degrades to
        // the raw id and deletes proceed.
        let telegram = Arc::new(MockBot::new(Platform::Telegram, "902"));
        let (propagator, cache) = setup(vec![Arc::clone(&telegram) as _]);
        cache.push(
            ChannelKey::new(Platform::Onebot, "100"),
            "m1".into(),
            vec![RelayedCopy::new(
                ChannelKey::new(Platform::Telegram, "300"),
                "902",
                vec!["t1".into()],
            )],
        );

        let mut event = event_from(Platform::Onebot, "100", "m1", "");
        event.operator_id = Some("4321".into());
        propagator
            .propagate(&event, &endpoint(Platform::Onebot, "100"))
            .await;
        assert_eq!(telegram.deleted.lock().unwrap().len(), 1);
    }
}
