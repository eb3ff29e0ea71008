//! Predicates that stop relayed messages from being relayed again.
//!
//! A relayed message can come back at us three ways: authored by one of our
//! own Discord webhooks, prefixed with a known relay prefix, or carrying a
//! per-destination suppression tag. All checks are pure — no side effects.

use {
    partyline_links::{Endpoint, LinkRegistry},
    partyline_protocol::{MessageEvent, Segment},
    std::sync::Arc,
};

/// Anti-loop filter over one normalized registry.
pub struct AntiLoopFilter {
    registry: Arc<LinkRegistry>,
}

impl AntiLoopFilter {
    pub fn new(registry: Arc<LinkRegistry>) -> Self {
        Self { registry }
    }

    /// The sender is one of the relay's own outbound webhook identities.
    /// Checked at the middleware level, before any routing.
    pub fn is_webhook_echo(&self, event: &MessageEvent) -> bool {
        !event.author.user_id.is_empty() && self.registry.is_webhook_sender(&event.author.user_id)
    }

    /// Source-level rules: relay-chain output (bot sender with a known
    /// prefix, or a prefixed leading text segment) and `at_only` gating.
    pub fn should_ignore_source(&self, event: &MessageEvent, source: &Endpoint) -> bool {
        let content = event.content();
        let prefixes = self.registry.known_prefixes();
        // A bot whose message starts with a relay prefix is another relay's
        // output; platforms without webhooks rely on this check alone.
        if event.author.is_bot && prefixes.iter().any(|p| content.starts_with(p.as_str())) {
            return true;
        }
        // The prefix may not be the literal first character of the joined
        // content (rich-text composition), so check the leading text segment.
        if let Some(first) = leading_text(&event.segments)
            && prefixes.iter().any(|p| first.starts_with(p.as_str()))
        {
            return true;
        }
        if source.at_only && !mentions(&event.segments, &source.bot_id) {
            return true;
        }
        false
    }

    /// Per-destination suppression tag: `%disabled%` or `__no<alias>__`,
    /// case-insensitive.
    pub fn should_skip_destination(&self, event: &MessageEvent, dest: &Endpoint) -> bool {
        has_suppression_tag(&event.content(), dest.platform.alias())
    }

    /// OR of every rule for one source/destination pair.
    pub fn should_ignore(&self, event: &MessageEvent, source: &Endpoint, dest: &Endpoint) -> bool {
        self.is_webhook_echo(event)
            || self.should_ignore_source(event, source)
            || self.should_skip_destination(event, dest)
    }
}

fn has_suppression_tag(content: &str, alias: &str) -> bool {
    let lower = content.to_lowercase();
    lower.contains("%disabled%") || lower.contains(&format!("__no{}__", alias.to_lowercase()))
}

fn leading_text(segments: &[Segment]) -> Option<&str> {
    segments.iter().find_map(|s| match s {
        Segment::Text { content } => Some(content.as_str()),
        _ => None,
    })
}

/// Whether any mention segment targets the given bot id.
pub(crate) fn mentions(segments: &[Segment], bot_id: &str) -> bool {
    segments
        .iter()
        .any(|s| matches!(s, Segment::Mention { id: Some(id), .. } if id == bot_id))
}
