//! Channel synchronization engine.
//!
//! Owns the item↔channel mapping tables, the refresh set, and the lock that
//! serializes all RCI traffic. The remote gateway processes one command at a
//! time, so the whole poll cycle and the whole per-item write body run under
//! one mutex, including the pacing sleeps. Mappings and transcoder bindings
//! are established once during registration and never change afterwards.

use crate::config::{GatewayConfig, ItemBinding};
use crate::error::{GatewayError, GatewayResult};
use crate::rci::{ChannelValue, RciCommands};
use crate::transcode::{self, Decoder, Encoder, ItemReading};
use rcibridge_core::{ItemId, ItemStore};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

/// Source identity the engine stamps on item updates it pushes. Updates
/// carrying this source are ignored by the write path.
pub const SOURCE_NAME: &str = "rci-gateway";

/// Transcoder functions bound to one item at registration.
#[derive(Default, Clone, Copy)]
struct TranscoderBinding {
    encoder: Option<Encoder>,
    decoder: Option<Decoder>,
}

/// Lifetime counters of the engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineStats {
    /// Completed poll cycles.
    pub polls: u64,
    /// channel_refresh commands issued.
    pub refreshes: u64,
    /// channel_set commands issued successfully.
    pub sets: u64,
    /// Item updates pushed from polled values.
    pub updates_pushed: u64,
}

#[derive(Default)]
struct Counters {
    polls: AtomicU64,
    refreshes: AtomicU64,
    sets: AtomicU64,
    updates_pushed: AtomicU64,
}

/// Channel synchronization engine.
///
/// Built mutably during registration, then frozen into an `Arc` for the
/// lifetime of the process.
pub struct SyncEngine {
    rci: Arc<dyn RciCommands>,
    items: Arc<dyn ItemStore>,
    /// item -> channel it listens on
    listen: HashMap<ItemId, String>,
    /// channel -> items listening on it
    listeners: HashMap<String, Vec<ItemId>>,
    /// item -> channel it writes to
    send: HashMap<ItemId, String>,
    bindings: HashMap<ItemId, TranscoderBinding>,
    command_delay: Duration,
    refresh_settle: Duration,
    /// Channels to refresh before the next poll is trusted. The mutex doubles
    /// as the engine lock: poll cycles and write bodies serialize on it.
    refresh: Mutex<HashSet<String>>,
    counters: Counters,
}

impl SyncEngine {
    pub fn new(
        rci: Arc<dyn RciCommands>,
        items: Arc<dyn ItemStore>,
        config: &GatewayConfig,
    ) -> Self {
        Self {
            rci,
            items,
            listen: HashMap::new(),
            listeners: HashMap::new(),
            send: HashMap::new(),
            bindings: HashMap::new(),
            command_delay: config.command_delay(),
            refresh_settle: config.refresh_settle(),
            refresh: Mutex::new(HashSet::new()),
            counters: Counters::default(),
        }
    }

    /// Register an item's channel binding.
    ///
    /// Returns whether any binding field was recognized. An unresolvable
    /// encoder or decoder name is logged and skipped; the item still
    /// registers and its values pass through unmodified.
    pub fn bind_item(&mut self, item: &str, binding: &ItemBinding) -> bool {
        if binding.is_empty() {
            return false;
        }

        if let Some(listen) = &binding.listen {
            self.listen.insert(item.to_string(), listen.clone());
            self.listeners
                .entry(listen.clone())
                .or_default()
                .push(item.to_string());
        }
        if let Some(send) = &binding.send {
            self.send.insert(item.to_string(), send.clone());
        }

        let mut bound = TranscoderBinding::default();
        if let Some(name) = &binding.encoder {
            match transcode::encoder(name) {
                Some(f) => bound.encoder = Some(f),
                None => error!(item, encoder = %name, "cannot find encoder"),
            }
        }
        if let Some(name) = &binding.decoder {
            match transcode::decoder(name) {
                Some(f) => bound.decoder = Some(f),
                None => error!(item, decoder = %name, "cannot find decoder"),
            }
        }
        self.bindings.insert(item.to_string(), bound);
        true
    }

    /// Whether an item was registered with any binding.
    pub fn is_bound(&self, item: &str) -> bool {
        self.bindings.contains_key(item)
    }

    /// Number of registered items.
    pub fn bound_items(&self) -> usize {
        self.bindings.len()
    }

    /// Channels currently queued for refresh before the next poll.
    pub async fn pending_refreshes(&self) -> usize {
        self.refresh.lock().await.len()
    }

    /// Snapshot of the lifetime counters.
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            polls: self.counters.polls.load(Ordering::Relaxed),
            refreshes: self.counters.refreshes.load(Ordering::Relaxed),
            sets: self.counters.sets.load(Ordering::Relaxed),
            updates_pushed: self.counters.updates_pushed.load(Ordering::Relaxed),
        }
    }

    /// One poll cycle: drain pending refreshes, dump all channels, push
    /// decoded values into listening items.
    ///
    /// Channels refreshed in this cycle are skipped in the update pass; the
    /// dump may still carry their pre-refresh value. Transport failures end
    /// the cycle early, the next scheduled cycle retries.
    pub async fn poll_channels(&self) {
        let mut refresh = self.refresh.lock().await;
        let mut skip = HashSet::new();

        if !refresh.is_empty() {
            while let Some(channel) = refresh.iter().next().cloned() {
                refresh.remove(&channel);
                match self.rci.channel_refresh(&channel).await {
                    Ok(()) => debug!(channel = %channel, "refreshed channel"),
                    Err(e) => {
                        warn!(channel = %channel, error = %e, "channel refresh failed, aborting cycle");
                        return;
                    }
                }
                self.counters.refreshes.fetch_add(1, Ordering::Relaxed);
                skip.insert(channel);
            }
            tokio::time::sleep(self.refresh_settle).await;
        }

        let dump = match self.rci.channel_dump().await {
            Ok(dump) => dump,
            Err(e) => {
                warn!(error = %e, "channel dump failed, aborting cycle");
                return;
            }
        };
        self.counters.polls.fetch_add(1, Ordering::Relaxed);

        for (channel, value) in dump {
            if skip.contains(&channel) {
                continue;
            }
            let Some(items) = self.listeners.get(&channel) else {
                continue;
            };
            for item in items {
                self.decode_and_push(item, &value).await;
            }
        }
    }

    async fn decode_and_push(&self, item: &str, value: &ChannelValue) {
        let decoded = match self.bindings.get(item).and_then(|b| b.decoder) {
            Some(decode) => {
                let reading = self.reading(item).await;
                match decode(value, &reading) {
                    Ok(decoded) => decoded,
                    Err(e) => {
                        debug!(item, error = %e, "decoder failed, dropping value");
                        return;
                    }
                }
            }
            None => Some(value.clone().into()),
        };

        if let Some(new_value) = decoded {
            match self.items.update(item, new_value, SOURCE_NAME).await {
                Ok(()) => {
                    self.counters.updates_pushed.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => warn!(item, error = %e, "cannot push item update"),
            }
        }
    }

    /// Handle an item value change signalled by the host.
    ///
    /// Updates sourced from the engine itself are ignored, breaking the
    /// decode→write feedback loop. Encoder failures surface to the caller
    /// before any command is sent; a failed channel_set is logged and the
    /// remaining wire values are still attempted.
    pub async fn update_item(&self, item: &str, source: &str) -> GatewayResult<()> {
        if source == SOURCE_NAME {
            return Ok(());
        }
        let Some(send_channel) = self.send.get(item) else {
            return Ok(());
        };
        let listen_channel = self.listen.get(item);

        let mut refresh = self.refresh.lock().await;

        let reading = self.reading(item).await;
        let current = reading.current.clone().ok_or(GatewayError::MissingValue)?;
        let wire_values = match self.bindings.get(item).and_then(|b| b.encoder) {
            Some(encode) => encode(&current, &reading)?,
            None => vec![ChannelValue::from(&current)],
        };

        for value in wire_values {
            debug!(channel = %send_channel, value = %value, "set channel");
            match self.rci.channel_set(send_channel, &value).await {
                Ok(()) => {
                    self.counters.sets.fetch_add(1, Ordering::Relaxed);
                    tokio::time::sleep(self.command_delay).await;
                    if let Some(listen) = listen_channel {
                        refresh.insert(listen.clone());
                    }
                }
                Err(e) => {
                    error!(channel = %send_channel, error = %e, "error while writing to channel");
                }
            }
        }
        Ok(())
    }

    async fn reading(&self, item: &str) -> ItemReading {
        ItemReading {
            current: self.items.value(item).await,
            previous: self.items.previous_value(item).await,
        }
    }
}
