use {
    crate::config::{EndpointConfig, RelayConfig},
    partyline_protocol::{ChannelKey, Platform},
    std::collections::HashSet,
    tracing::{info, warn},
};

/// Default recent-window capacity per origin channel.
pub const DEFAULT_RECENT_CAPACITY: usize = 1000;

/// Discord webhook credentials for fan-in posting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscordWebhook {
    pub guild_id: String,
    pub webhook_id: String,
    pub webhook_token: String,
}

/// A fully-defaulted endpoint record.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub platform: Platform,
    pub channel_id: String,
    pub bot_id: String,
    pub msg_prefix: String,
    pub use_prefix: bool,
    pub at_only: bool,
    pub show_id: bool,
    /// Platform ids are not meaningful to display (e.g. game chat).
    pub bad_id: bool,
    /// Present exactly when `platform` is Discord.
    pub webhook: Option<DiscordWebhook>,
}

impl Endpoint {
    pub fn channel_key(&self) -> ChannelKey {
        ChannelKey::new(self.platform, self.channel_id.clone())
    }
}

struct PlatformDefaults {
    msg_prefix: &'static str,
    use_prefix: bool,
    bad_id: bool,
}

fn platform_defaults(platform: Platform) -> PlatformDefaults {
    match platform {
        Platform::Onebot => PlatformDefaults {
            msg_prefix: "[QQ]",
            use_prefix: true,
            bad_id: false,
        },
        Platform::Discord => PlatformDefaults {
            msg_prefix: "[DC]",
            use_prefix: false,
            bad_id: false,
        },
        Platform::Telegram => PlatformDefaults {
            msg_prefix: "[TL]",
            use_prefix: true,
            bad_id: false,
        },
        Platform::GameChat => PlatformDefaults {
            msg_prefix: "[MC]",
            use_prefix: true,
            bad_id: true,
        },
    }
}

/// An ordered mesh of 2+ endpoints mirroring each other.
#[derive(Debug, Clone)]
pub struct Link {
    pub endpoints: Vec<Endpoint>,
}

/// One source endpoint of a link together with its relay destinations
/// (every other endpoint of the same link).
#[derive(Debug)]
pub struct RelayRoute<'a> {
    pub source: &'a Endpoint,
    pub destinations: Vec<&'a Endpoint>,
}

/// Normalized links plus the registry-wide derived sets.
#[derive(Debug, Default)]
pub struct LinkRegistry {
    links: Vec<Link>,
    webhook_sender_ids: HashSet<String>,
    known_prefixes: Vec<String>,
    recent_capacity: usize,
}

impl LinkRegistry {
    /// Normalize raw configuration into fully-defaulted links.
    ///
    /// Fail soft throughout: links with fewer than two usable endpoints,
    /// Discord endpoints without webhook credentials, and duplicate
    /// (platform, channel) pairs within a link are dropped with a warning
    /// rather than failing startup.
    pub fn normalize(config: &RelayConfig) -> Self {
        let mut links = Vec::new();
        for raw_link in &config.links {
            let mut endpoints: Vec<Endpoint> = Vec::with_capacity(raw_link.len());
            for raw in raw_link {
                let Some(endpoint) = normalize_endpoint(raw) else {
                    continue;
                };
                if endpoints
                    .iter()
                    .any(|e| e.platform == endpoint.platform && e.channel_id == endpoint.channel_id)
                {
                    warn!(channel = %endpoint.channel_key(), "duplicate endpoint in link, dropping");
                    continue;
                }
                endpoints.push(endpoint);
            }
            if endpoints.len() < 2 {
                warn!(
                    endpoints = endpoints.len(),
                    "link has fewer than two usable endpoints, dropping"
                );
                continue;
            }
            info!(
                link = %endpoints
                    .iter()
                    .map(|e| e.channel_key().to_string())
                    .collect::<Vec<_>>()
                    .join(" ⇿ "),
                "link established"
            );
            links.push(Link { endpoints });
        }

        let webhook_sender_ids = links
            .iter()
            .flat_map(|link| &link.endpoints)
            .filter_map(|e| e.webhook.as_ref())
            .map(|w| w.webhook_id.clone())
            .collect();

        let mut known_prefixes: Vec<String> = Vec::new();
        for endpoint in links.iter().flat_map(|link| &link.endpoints) {
            if !known_prefixes.contains(&endpoint.msg_prefix) {
                known_prefixes.push(endpoint.msg_prefix.clone());
            }
        }

        Self {
            links,
            webhook_sender_ids,
            known_prefixes,
            recent_capacity: config.recent.unwrap_or(DEFAULT_RECENT_CAPACITY),
        }
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// All Discord webhook ids the relay posts through — messages authored
    /// by these accounts are the relay's own output.
    pub fn is_webhook_sender(&self, user_id: &str) -> bool {
        self.webhook_sender_ids.contains(user_id)
    }

    /// Distinct message prefixes in use across all links.
    pub fn known_prefixes(&self) -> &[String] {
        &self.known_prefixes
    }

    pub fn recent_capacity(&self) -> usize {
        self.recent_capacity
    }

    /// Routes whose source endpoint sits on the given channel: the endpoint
    /// itself plus every other endpoint of the same link as destinations.
    pub fn routes_from(&self, channel: &ChannelKey) -> Vec<RelayRoute<'_>> {
        let mut routes = Vec::new();
        for link in &self.links {
            for (i, source) in link.endpoints.iter().enumerate() {
                if source.platform != channel.platform || source.channel_id != channel.channel_id {
                    continue;
                }
                let destinations = link
                    .endpoints
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, e)| e)
                    .collect();
                routes.push(RelayRoute {
                    source,
                    destinations,
                });
            }
        }
        routes
    }
}

fn normalize_endpoint(raw: &EndpointConfig) -> Option<Endpoint> {
    let defaults = platform_defaults(raw.platform);
    let webhook = if raw.platform == Platform::Discord {
        match (&raw.guild_id, &raw.webhook_id, &raw.webhook_token) {
            (Some(guild_id), Some(webhook_id), Some(webhook_token)) => Some(DiscordWebhook {
                guild_id: guild_id.clone(),
                webhook_id: webhook_id.clone(),
                webhook_token: webhook_token.clone(),
            }),
            _ => {
                warn!(
                    channel_id = %raw.channel_id,
                    "discord endpoint missing webhook credentials, dropping"
                );
                return None;
            },
        }
    } else {
        None
    };
    Some(Endpoint {
        platform: raw.platform,
        channel_id: raw.channel_id.clone(),
        bot_id: raw.bot_id.clone(),
        msg_prefix: raw
            .msg_prefix
            .clone()
            .unwrap_or_else(|| defaults.msg_prefix.to_string()),
        use_prefix: raw.use_prefix.unwrap_or(defaults.use_prefix),
        at_only: raw.at_only.unwrap_or(false),
        show_id: raw.show_id.unwrap_or(false),
        bad_id: defaults.bad_id,
        webhook,
    })
}
