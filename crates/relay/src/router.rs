//! Event-driven relay orchestration.
//!
//! For each inbound message on a linked channel: run the anti-loop gate,
//! transform and send to every other endpoint of the link concurrently,
//! then record the surviving copies in the cache once the whole fan-out
//! round has settled. Deletions cascade through the same cache.

use {
    crate::{
        anti_loop::AntiLoopFilter,
        bot::BotRegistry,
        deletion::DeletionPropagator,
        dispatch::OutboundDispatcher,
        transform::ContentTransformer,
    },
    futures::future::join_all,
    partyline_cache::{RelayCache, RelayedCopy},
    partyline_links::{Endpoint, LinkRegistry},
    partyline_protocol::MessageEvent,
    std::sync::Arc,
    tracing::{debug, warn},
};

/// The relay engine's front door: feed it message and deletion events.
///
/// Received messages and the bot's own sent messages go through the same
/// path — subscription lifetime is the host plugin's lifetime.
pub struct RelayRouter {
    registry: Arc<LinkRegistry>,
    cache: Arc<RelayCache>,
    filter: AntiLoopFilter,
    transformer: ContentTransformer,
    dispatcher: OutboundDispatcher,
    deletion: DeletionPropagator,
}

impl RelayRouter {
    pub fn new(registry: Arc<LinkRegistry>, bots: Arc<BotRegistry>) -> Self {
        let cache = Arc::new(RelayCache::new(registry.recent_capacity()));
        Self {
            filter: AntiLoopFilter::new(Arc::clone(&registry)),
            transformer: ContentTransformer::new(Arc::clone(&cache), Arc::clone(&bots)),
            dispatcher: OutboundDispatcher::new(Arc::clone(&bots)),
            deletion: DeletionPropagator::new(Arc::clone(&cache), Arc::clone(&bots)),
            registry,
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<RelayCache> {
        &self.cache
    }

    /// Handle a message received (or sent by our own bot) on any channel.
    pub async fn on_message(&self, event: &MessageEvent) {
        if event.segments.is_empty() {
            return;
        }
        if self.filter.is_webhook_echo(event) {
            debug!(channel = %event.channel_key(), "ignoring own webhook echo");
            return;
        }

        let origin = event.channel_key();
        for route in self.registry.routes_from(&origin) {
            if self.filter.should_ignore_source(event, route.source) {
                debug!(channel = %origin, "message filtered at source");
                continue;
            }
            let sends = route
                .destinations
                .iter()
                .map(|dest| self.relay_to(event, route.source, dest));
            // The cache write waits for every branch to settle; no branch
            // cancels its siblings.
            let copies: Vec<RelayedCopy> =
                join_all(sends).await.into_iter().flatten().collect();
            self.cache
                .push(origin.clone(), event.message_id.clone(), copies);
        }
    }

    /// Handle a deletion on any channel; cascades to all relayed copies.
    pub async fn on_message_deleted(&self, event: &MessageEvent) {
        // The relay record is keyed by origin channel, so one cascade covers
        // every link the channel participates in.
        let routes = self.registry.routes_from(&event.channel_key());
        let Some(route) = routes.first() else {
            return;
        };
        self.deletion.propagate(event, route.source).await;
    }

    async fn relay_to(
        &self,
        event: &MessageEvent,
        source: &Endpoint,
        dest: &Endpoint,
    ) -> Option<RelayedCopy> {
        if self.filter.should_skip_destination(event, dest) {
            debug!(dest = %dest.channel_key(), "destination suppressed by tag");
            return None;
        }
        let output = self.transformer.transform(event, source, dest).await;
        match self.dispatcher.send(event, source, dest, &output).await {
            Ok(copy) => Some(copy),
            Err(e) => {
                warn!(
                    source = %source.channel_key(),
                    dest = %dest.channel_key(),
                    error = %e,
                    "relay to destination failed"
                );
                None
            },
        }
    }
}
