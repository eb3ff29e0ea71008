//! Shared fixtures for the relay crate's tests: a recording mock bot and
//! canned registries/events.

#![allow(clippy::unwrap_used)]

use {
    crate::bot::{FetchedMessage, RelayBot, UserProfile, WebhookPayload},
    anyhow::Result,
    async_trait::async_trait,
    partyline_links::{DiscordWebhook, Endpoint, EndpointConfig, LinkRegistry, RelayConfig},
    partyline_protocol::{Author, MessageEvent, Platform, Segment},
    std::{
        collections::{HashMap, HashSet, VecDeque},
        sync::{
            Arc, Mutex,
            atomic::{AtomicBool, AtomicUsize, Ordering},
        },
    },
};

/// A bot that records every call and hands out deterministic message ids.
pub struct MockBot {
    platform: Platform,
    self_id: String,
    pub sent: Mutex<Vec<(String, String)>>,
    pub webhooks: Mutex<Vec<(String, String, WebhookPayload)>>,
    pub deleted: Mutex<Vec<(String, String)>>,
    users: Mutex<HashMap<String, UserProfile>>,
    messages: Mutex<HashMap<String, FetchedMessage>>,
    canned_ids: Mutex<VecDeque<String>>,
    counter: AtomicUsize,
    fail_sends: AtomicBool,
    fail_deletes: Mutex<HashSet<String>>,
}

impl MockBot {
    pub fn new(platform: Platform, self_id: &str) -> Self {
        Self {
            platform,
            self_id: self_id.to_string(),
            sent: Mutex::new(Vec::new()),
            webhooks: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            users: Mutex::new(HashMap::new()),
            messages: Mutex::new(HashMap::new()),
            canned_ids: Mutex::new(VecDeque::new()),
            counter: AtomicUsize::new(0),
            fail_sends: AtomicBool::new(false),
            fail_deletes: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_user(self, user_id: &str, nickname: Option<&str>, username: Option<&str>) -> Self {
        self.users.lock().unwrap().insert(
            user_id.to_string(),
            UserProfile {
                nickname: nickname.map(str::to_string),
                username: username.map(str::to_string),
            },
        );
        self
    }

    pub fn with_message(self, message_id: &str, author: Author, content: &str) -> Self {
        self.messages.lock().unwrap().insert(
            message_id.to_string(),
            FetchedMessage {
                author,
                content: content.to_string(),
            },
        );
        self
    }

    /// Queue a specific id to return from the next send.
    pub fn with_next_id(self, id: &str) -> Self {
        self.canned_ids.lock().unwrap().push_back(id.to_string());
        self
    }

    pub fn failing_sends(self) -> Self {
        self.fail_sends.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_delete_of(self, message_id: &str) -> Self {
        self.fail_deletes
            .lock()
            .unwrap()
            .insert(message_id.to_string());
        self
    }

    fn next_id(&self) -> String {
        if let Some(id) = self.canned_ids.lock().unwrap().pop_front() {
            return id;
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}-{n}", self.platform, self.self_id)
    }
}

#[async_trait]
impl RelayBot for MockBot {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn self_id(&self) -> &str {
        &self.self_id
    }

    async fn send_message(&self, channel_id: &str, text: &str) -> Result<Vec<String>> {
        if self.fail_sends.load(Ordering::SeqCst) {
            anyhow::bail!("simulated send failure");
        }
        self.sent
            .lock()
            .unwrap()
            .push((channel_id.to_string(), text.to_string()));
        Ok(vec![self.next_id()])
    }

    async fn execute_webhook(
        &self,
        webhook_id: &str,
        webhook_token: &str,
        payload: &WebhookPayload,
    ) -> Result<Vec<String>> {
        if self.platform != Platform::Discord {
            anyhow::bail!("webhook execution is not supported on {}", self.platform);
        }
        if self.fail_sends.load(Ordering::SeqCst) {
            anyhow::bail!("simulated webhook failure");
        }
        self.webhooks.lock().unwrap().push((
            webhook_id.to_string(),
            webhook_token.to_string(),
            payload.clone(),
        ));
        Ok(vec![self.next_id()])
    }

    async fn get_message(&self, _channel_id: &str, message_id: &str) -> Result<FetchedMessage> {
        self.messages
            .lock()
            .unwrap()
            .get(message_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no such message: {message_id}"))
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<()> {
        if self.fail_deletes.lock().unwrap().contains(message_id) {
            anyhow::bail!("simulated delete failure for {message_id}");
        }
        self.deleted
            .lock()
            .unwrap()
            .push((channel_id.to_string(), message_id.to_string()));
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> Result<UserProfile> {
        self.users
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no such user: {user_id}"))
    }
}

/// A fully-defaulted endpoint for the given platform and channel.
pub fn endpoint(platform: Platform, channel_id: &str) -> Endpoint {
    let bot_id = match platform {
        Platform::Onebot => "900",
        Platform::Discord => "901",
        Platform::Telegram => "902",
        Platform::GameChat => "903",
    };
    let webhook = (platform == Platform::Discord).then(|| DiscordWebhook {
        guild_id: "g1".into(),
        webhook_id: "wh1".into(),
        webhook_token: "tok".into(),
    });
    let defaults = match platform {
        Platform::Onebot => ("[QQ]", true, false),
        Platform::Discord => ("[DC]", false, false),
        Platform::Telegram => ("[TL]", true, false),
        Platform::GameChat => ("[MC]", true, true),
    };
    Endpoint {
        platform,
        channel_id: channel_id.to_string(),
        bot_id: bot_id.to_string(),
        msg_prefix: defaults.0.to_string(),
        use_prefix: defaults.1,
        at_only: false,
        show_id: false,
        bad_id: defaults.2,
        webhook,
    }
}

pub fn endpoint_config(platform: Platform, channel_id: &str) -> EndpointConfig {
    let e = endpoint(platform, channel_id);
    EndpointConfig {
        guild_id: e.webhook.as_ref().map(|w| w.guild_id.clone()),
        webhook_id: e.webhook.as_ref().map(|w| w.webhook_id.clone()),
        webhook_token: e.webhook.as_ref().map(|w| w.webhook_token.clone()),
        ..EndpointConfig::new(platform, channel_id, e.bot_id)
    }
}

/// Registry with one link: onebot:100 ⇿ discord:200.
pub fn registry_two_way() -> Arc<LinkRegistry> {
    registry_from(vec![vec![
        endpoint_config(Platform::Onebot, "100"),
        endpoint_config(Platform::Discord, "200"),
    ]])
}

/// Registry with one link: onebot:100 ⇿ discord:200 ⇿ telegram:300.
pub fn registry_three_way() -> Arc<LinkRegistry> {
    registry_from(vec![vec![
        endpoint_config(Platform::Onebot, "100"),
        endpoint_config(Platform::Discord, "200"),
        endpoint_config(Platform::Telegram, "300"),
    ]])
}

pub fn registry_from(links: Vec<Vec<EndpointConfig>>) -> Arc<LinkRegistry> {
    Arc::new(LinkRegistry::normalize(&RelayConfig {
        recent: None,
        links,
    }))
}

/// A text-only message event from a human sender named Alice.
pub fn event_from(
    platform: Platform,
    channel_id: &str,
    message_id: &str,
    text: &str,
) -> MessageEvent {
    MessageEvent {
        platform,
        channel_id: channel_id.to_string(),
        message_id: message_id.to_string(),
        segments: if text.is_empty() {
            Vec::new()
        } else {
            vec![Segment::text(text)]
        },
        author: Author {
            user_id: "1234".into(),
            username: Some("alice".into()),
            nickname: Some("Alice".into()),
            discriminator: None,
            avatar_url: Some("https://cdn.example/alice.png".into()),
            is_bot: false,
        },
        timestamp: 1_700_000_000,
        operator_id: None,
    }
}
