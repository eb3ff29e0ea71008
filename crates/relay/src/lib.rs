//! Cross-platform relay engine.
//!
//! Mirrors messages between linked channels so that every member of a link
//! behaves like one shared room. Inbound events flow through the anti-loop
//! filter, are transformed per destination, fanned out concurrently, and the
//! resulting copies recorded in the relay cache for reply resolution and
//! deletion cascade.

pub mod anti_loop;
pub mod bot;
pub mod deletion;
pub mod dispatch;
pub mod error;
pub mod router;
pub mod transform;

pub use {
    anti_loop::AntiLoopFilter,
    bot::{BotRegistry, FetchedMessage, RelayBot, UserProfile, WebhookEmbed, WebhookPayload},
    deletion::DeletionPropagator,
    dispatch::OutboundDispatcher,
    error::{Error, Result},
    router::RelayRouter,
    transform::{ContentTransformer, TransformOutput},
};

#[cfg(test)]
pub(crate) mod test_support;
