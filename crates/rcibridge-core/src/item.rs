//! Item model: value holders with previous-value tracking and change-source
//! tagging.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identity of an item. Items are addressed by name, e.g. `"spa.temp"`.
pub type ItemId = String;

/// Result type for item operations.
pub type ItemResult<T> = Result<T, ItemError>;

/// Error type for item operations.
#[derive(Debug, Error)]
pub enum ItemError {
    /// Item not found
    #[error("Item not found: {0}")]
    NotFound(ItemId),
}

/// Value held by an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
}

impl ItemValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            Self::Float(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for ItemValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Boolean(v) => write!(f, "{}", v),
            Self::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for ItemValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for ItemValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for ItemValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<&str> for ItemValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// Stored state of a single item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemState {
    /// Current value, if the item has ever been written.
    pub value: Option<ItemValue>,
    /// Value before the most recent update.
    pub previous: Option<ItemValue>,
    /// Unix timestamp of the most recent update.
    pub last_updated: i64,
    /// Source identity of the most recent update.
    pub source: String,
}

/// Read/write capability over the host's item storage.
///
/// The gateway engine depends only on this interface. `update` must rotate
/// the current value into the previous-value slot and record `source` as the
/// origin of the change.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Current value of an item, or `None` if unknown.
    async fn value(&self, item: &str) -> Option<ItemValue>;

    /// Value the item held before its most recent update.
    async fn previous_value(&self, item: &str) -> Option<ItemValue>;

    /// Push a new value into an item on behalf of `source`.
    async fn update(&self, item: &str, value: ItemValue, source: &str) -> ItemResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_accessors() {
        assert_eq!(ItemValue::Integer(4).as_f64(), Some(4.0));
        assert_eq!(ItemValue::Float(37.5).as_f64(), Some(37.5));
        assert_eq!(ItemValue::Float(37.5).as_i64(), Some(37));
        assert_eq!(ItemValue::Boolean(true).as_bool(), Some(true));
        assert_eq!(ItemValue::Text("on".into()).as_str(), Some("on"));
        assert_eq!(ItemValue::Text("on".into()).as_f64(), None);
    }

    #[test]
    fn value_display_matches_wire_form() {
        assert_eq!(ItemValue::Integer(65281).to_string(), "65281");
        assert_eq!(ItemValue::Boolean(false).to_string(), "false");
        assert_eq!(ItemValue::Float(37.5).to_string(), "37.5");
        assert_eq!(ItemValue::Text("100F".into()).to_string(), "100F");
    }

    #[test]
    fn value_serde_is_untagged() {
        let v: ItemValue = serde_json::from_str("37.5").unwrap();
        assert_eq!(v, ItemValue::Float(37.5));
        let v: ItemValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, ItemValue::Boolean(true));
    }
}
