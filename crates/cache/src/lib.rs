//! Bounded in-memory map from origin messages to their relayed copies.
//!
//! Per origin channel, a FIFO of recently-seen message ids bounds the store;
//! evicting an id removes its relay record and every reverse-index entry that
//! pointed at its copies. Everything lives in process memory — this is a
//! cache, not a durable log, and is lost on restart by design.
//!
//! All three structures (FIFO, record map, reverse map) mutate together under
//! one mutex so the invariants hold on a multi-threaded runtime.

use {
    partyline_protocol::ChannelKey,
    std::{
        collections::{HashMap, VecDeque},
        sync::Mutex,
    },
    tracing::debug,
};

/// One destination copy produced from an origin message.
///
/// `msg_ids` is plural: a single relay may fan out to multiple
/// platform-native messages. Call sites expecting one id take the first.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayedCopy {
    pub channel: ChannelKey,
    pub bot_id: String,
    pub msg_ids: Vec<String>,
}

impl RelayedCopy {
    pub fn new(channel: ChannelKey, bot_id: impl Into<String>, msg_ids: Vec<String>) -> Self {
        Self {
            channel,
            bot_id: bot_id.into(),
            msg_ids,
        }
    }

    pub fn first_msg_id(&self) -> Option<&str> {
        self.msg_ids.first().map(String::as_str)
    }
}

#[derive(Default)]
struct ChannelWindow {
    recent: VecDeque<String>,
    records: HashMap<String, Vec<RelayedCopy>>,
}

#[derive(Default)]
struct Inner {
    /// origin channel → bounded window of origin messages and their copies.
    windows: HashMap<ChannelKey, ChannelWindow>,
    /// (copy channel, copy msg id) → (origin channel, origin msg id).
    origins: HashMap<ChannelKey, HashMap<String, (ChannelKey, String)>>,
}

/// Bounded store of relay records with a reverse index for quote resolution.
pub struct RelayCache {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl RelayCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// All relayed copies of an origin message, if still in the window.
    pub fn get(&self, channel: &ChannelKey, msg_id: &str) -> Option<Vec<RelayedCopy>> {
        let inner = self.lock();
        inner
            .windows
            .get(channel)
            .and_then(|w| w.records.get(msg_id))
            .cloned()
    }

    /// The origin of a relayed copy, if still in the window.
    pub fn get_origin(&self, channel: &ChannelKey, msg_id: &str) -> Option<(ChannelKey, String)> {
        let inner = self.lock();
        inner
            .origins
            .get(channel)
            .and_then(|m| m.get(msg_id))
            .cloned()
    }

    /// Record the relayed copies of an origin message, evicting the oldest
    /// record for that channel once the window exceeds capacity.
    ///
    /// Pushing again under the same `(channel, msg_id)` extends the existing
    /// record: a channel participating in several links contributes one
    /// record per message, occupying one window slot.
    pub fn push(&self, channel: ChannelKey, msg_id: String, copies: Vec<RelayedCopy>) {
        let mut inner = self.lock();
        for copy in &copies {
            let entries = inner.origins.entry(copy.channel.clone()).or_default();
            for relayed_id in &copy.msg_ids {
                entries.insert(relayed_id.clone(), (channel.clone(), msg_id.clone()));
            }
        }
        debug!(channel = %channel, msg_id = %msg_id, copies = copies.len(), "relay record stored");

        let evicted = {
            let window = inner.windows.entry(channel.clone()).or_default();
            if let Some(existing) = window.records.get_mut(&msg_id) {
                existing.extend(copies);
                None
            } else {
                window.recent.push_back(msg_id.clone());
                window.records.insert(msg_id, copies);
                if window.recent.len() > self.capacity {
                    window.recent.pop_front().map(|id| {
                        // Guard every removal: a missing entry must never panic.
                        let copies = window.records.remove(&id).unwrap_or_default();
                        (id, copies)
                    })
                } else {
                    None
                }
            }
        };

        if let Some((evicted_id, evicted_copies)) = evicted {
            for copy in &evicted_copies {
                if let Some(entries) = inner.origins.get_mut(&copy.channel) {
                    for relayed_id in &copy.msg_ids {
                        entries.remove(relayed_id);
                    }
                    if entries.is_empty() {
                        inner.origins.remove(&copy.channel);
                    }
                }
            }
            debug!(channel = %channel, msg_id = %evicted_id, "relay record evicted");
        }
    }

    /// Resolve a quote of message `quoted_id` seen on `channel` to the id
    /// representing the same logical message on `dest`.
    ///
    /// Transitive: a reply to a relayed copy of a relayed copy resolves back
    /// through the shared origin and forward to the per-destination copy.
    pub fn resolve_quote(
        &self,
        channel: &ChannelKey,
        quoted_id: &str,
        dest: &ChannelKey,
    ) -> Option<String> {
        let inner = self.lock();

        // The quoted message is itself an origin already relayed from here.
        if let Some(copies) = inner
            .windows
            .get(channel)
            .and_then(|w| w.records.get(quoted_id))
        {
            return copy_in(copies, dest);
        }

        // The quoted message is a relayed copy; walk back to its origin.
        let (origin_channel, origin_id) = inner
            .origins
            .get(channel)
            .and_then(|m| m.get(quoted_id))
            .cloned()?;
        if &origin_channel == dest {
            // The destination already holds the true original.
            return Some(origin_id);
        }
        let copies = inner
            .windows
            .get(&origin_channel)
            .and_then(|w| w.records.get(&origin_id))?;
        copy_in(copies, dest)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn copy_in(copies: &[RelayedCopy], dest: &ChannelKey) -> Option<String> {
    copies
        .iter()
        .find(|c| &c.channel == dest)
        .and_then(|c| c.first_msg_id())
        .map(str::to_string)
}
