//! In-memory item registry with a broadcast feed of item updates.
//!
//! The registry is the reference `ItemStore` implementation. Every update
//! rotates the current value into the previous-value slot, stamps the change
//! source, and publishes an `ItemEvent` to all subscribers. Subscribers that
//! fall behind skip over the gap rather than stalling the publisher.

use crate::item::{ItemError, ItemId, ItemResult, ItemState, ItemStore, ItemValue};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};

/// Default capacity of the item event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Item change notification.
#[derive(Debug, Clone)]
pub struct ItemEvent {
    /// Item that changed.
    pub item: ItemId,
    /// New value.
    pub value: ItemValue,
    /// Identity of whoever made the change.
    pub source: String,
    /// Unix timestamp of the change.
    pub timestamp: i64,
}

/// In-memory item storage.
pub struct ItemRegistry {
    items: RwLock<HashMap<ItemId, ItemState>>,
    tx: broadcast::Sender<ItemEvent>,
}

impl ItemRegistry {
    /// Create a registry with the default event capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Create a registry with the given event channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            items: RwLock::new(HashMap::new()),
            tx,
        }
    }

    /// Register an item with no initial value.
    pub async fn register(&self, item: impl Into<ItemId>) {
        let mut items = self.items.write().await;
        items.entry(item.into()).or_default();
    }

    /// Register an item with an initial value.
    ///
    /// The initial value is not published as a change event.
    pub async fn register_with_value(&self, item: impl Into<ItemId>, value: ItemValue) {
        let mut items = self.items.write().await;
        let state = items.entry(item.into()).or_default();
        state.value = Some(value);
        state.last_updated = chrono::Utc::now().timestamp();
    }

    /// Number of registered items.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// Whether the registry holds no items.
    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    /// Full state snapshot of an item.
    pub async fn state(&self, item: &str) -> Option<ItemState> {
        self.items.read().await.get(item).cloned()
    }

    /// Subscribe to item change events.
    pub fn subscribe(&self) -> ItemEventReceiver {
        ItemEventReceiver {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for ItemRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ItemStore for ItemRegistry {
    async fn value(&self, item: &str) -> Option<ItemValue> {
        self.items.read().await.get(item).and_then(|s| s.value.clone())
    }

    async fn previous_value(&self, item: &str) -> Option<ItemValue> {
        self.items
            .read()
            .await
            .get(item)
            .and_then(|s| s.previous.clone())
    }

    async fn update(&self, item: &str, value: ItemValue, source: &str) -> ItemResult<()> {
        let event = {
            let mut items = self.items.write().await;
            let state = items
                .get_mut(item)
                .ok_or_else(|| ItemError::NotFound(item.to_string()))?;
            state.previous = state.value.take();
            state.value = Some(value.clone());
            state.source = source.to_string();
            state.last_updated = chrono::Utc::now().timestamp();
            ItemEvent {
                item: item.to_string(),
                value,
                source: source.to_string(),
                timestamp: state.last_updated,
            }
        };
        // Publishing with no subscribers is fine; the event is discarded.
        let _ = self.tx.send(event);
        Ok(())
    }
}

/// Receiver for item change events.
pub struct ItemEventReceiver {
    rx: broadcast::Receiver<ItemEvent>,
}

impl ItemEventReceiver {
    /// Receive the next event.
    ///
    /// Returns `None` once the registry is dropped. A lagged receiver skips
    /// to the oldest retained event instead of erroring out.
    pub async fn recv(&mut self) -> Option<ItemEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "item event receiver lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn update_rotates_previous_and_stamps_source() {
        let registry = ItemRegistry::new();
        registry.register("spa.temp").await;

        registry
            .update("spa.temp", ItemValue::Float(37.0), "user")
            .await
            .unwrap();
        registry
            .update("spa.temp", ItemValue::Float(37.5), "user")
            .await
            .unwrap();

        assert_eq!(registry.value("spa.temp").await, Some(ItemValue::Float(37.5)));
        assert_eq!(
            registry.previous_value("spa.temp").await,
            Some(ItemValue::Float(37.0))
        );
        let state = registry.state("spa.temp").await.unwrap();
        assert_eq!(state.source, "user");
    }

    #[tokio::test]
    async fn update_unknown_item_fails() {
        let registry = ItemRegistry::new();
        let err = registry
            .update("missing", ItemValue::Integer(1), "user")
            .await
            .unwrap_err();
        assert!(matches!(err, ItemError::NotFound(_)));
    }

    #[tokio::test]
    async fn subscribers_see_source_tag() {
        let registry = ItemRegistry::new();
        registry.register("spa.lights").await;
        let mut rx = registry.subscribe();

        registry
            .update("spa.lights", ItemValue::Boolean(true), "gateway")
            .await
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.item, "spa.lights");
        assert_eq!(event.value, ItemValue::Boolean(true));
        assert_eq!(event.source, "gateway");
    }

    #[tokio::test]
    async fn initial_value_is_not_published() {
        let registry = ItemRegistry::new();
        let mut rx = registry.subscribe();
        registry
            .register_with_value("spa.pump", ItemValue::Integer(1))
            .await;

        registry
            .update("spa.pump", ItemValue::Integer(2), "user")
            .await
            .unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event.value, ItemValue::Integer(2));
        // The registration itself produced no event, so the first received
        // event is the explicit update.
        assert_eq!(registry.previous_value("spa.pump").await, Some(ItemValue::Integer(1)));
    }
}
