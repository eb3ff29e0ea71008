//! Link configuration and the normalized link registry.
//!
//! A *link* is an ordered set of two or more channel endpoints whose messages
//! mirror each other (an N-way mesh, not a star). Raw config comes in as
//! partial endpoint objects; normalization fills platform defaults and drops
//! anything degenerate without failing startup.

pub mod config;
pub mod registry;

pub use {
    config::{EndpointConfig, RelayConfig},
    registry::{DiscordWebhook, Endpoint, Link, LinkRegistry, RelayRoute},
};
