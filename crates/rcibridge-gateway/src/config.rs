//! Gateway configuration.
//!
//! All process-wide tunables live in [`GatewayConfig`]; per-item channel
//! bindings live in [`ItemBinding`]. Both deserialize with serde, with every
//! field optional in the input.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Process-wide gateway configuration, set once at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the remote device gateway.
    #[serde(default = "default_url")]
    pub url: String,
    /// Target identifier placed on every RCI command envelope.
    #[serde(default)]
    pub rci_target: String,
    /// Poll cycle period in seconds.
    #[serde(default = "default_poll_period")]
    pub poll_period_secs: u64,
    /// Delay before the first poll cycle, in seconds.
    #[serde(default = "default_poll_offset")]
    pub poll_offset_secs: u64,
    /// Priority of the poll job on the host scheduler.
    #[serde(default = "default_poll_priority")]
    pub poll_priority: u8,
    /// Pause after each channel_set command, in seconds.
    #[serde(default = "default_command_delay")]
    pub command_delay_secs: u64,
    /// Pause after draining refresh commands, letting the device apply them,
    /// in seconds.
    #[serde(default = "default_refresh_settle")]
    pub refresh_settle_secs: u64,
    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
}

fn default_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_poll_period() -> u64 {
    61
}

fn default_poll_offset() -> u64 {
    20
}

fn default_poll_priority() -> u8 {
    5
}

fn default_command_delay() -> u64 {
    1
}

fn default_refresh_settle() -> u64 {
    5
}

fn default_http_timeout() -> u64 {
    10
}

impl GatewayConfig {
    /// Create a configuration for the given gateway URL and RCI target,
    /// with default timings.
    pub fn new(url: impl Into<String>, rci_target: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            rci_target: rci_target.into(),
            ..Self::default()
        }
    }

    pub fn poll_period(&self) -> Duration {
        Duration::from_secs(self.poll_period_secs)
    }

    pub fn poll_offset(&self) -> Duration {
        Duration::from_secs(self.poll_offset_secs)
    }

    pub fn command_delay(&self) -> Duration {
        Duration::from_secs(self.command_delay_secs)
    }

    pub fn refresh_settle(&self) -> Duration {
        Duration::from_secs(self.refresh_settle_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            rci_target: String::new(),
            poll_period_secs: default_poll_period(),
            poll_offset_secs: default_poll_offset(),
            poll_priority: default_poll_priority(),
            command_delay_secs: default_command_delay(),
            refresh_settle_secs: default_refresh_settle(),
            http_timeout_secs: default_http_timeout(),
        }
    }
}

/// Per-item channel binding.
///
/// An item with no recognized field is not bound to the gateway at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemBinding {
    /// Channel whose polled value updates this item.
    #[serde(default)]
    pub listen: Option<String>,
    /// Channel this item's value changes are written to.
    #[serde(default)]
    pub send: Option<String>,
    /// Name of the encoder applied before writing.
    #[serde(default)]
    pub encoder: Option<String>,
    /// Name of the decoder applied to polled values.
    #[serde(default)]
    pub decoder: Option<String>,
}

impl ItemBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listen(mut self, channel: impl Into<String>) -> Self {
        self.listen = Some(channel.into());
        self
    }

    pub fn with_send(mut self, channel: impl Into<String>) -> Self {
        self.send = Some(channel.into());
        self
    }

    pub fn with_encoder(mut self, name: impl Into<String>) -> Self {
        self.encoder = Some(name.into());
        self
    }

    pub fn with_decoder(mut self, name: impl Into<String>) -> Self {
        self.decoder = Some(name.into());
        self
    }

    /// Whether no binding field is set.
    pub fn is_empty(&self) -> bool {
        self.listen.is_none()
            && self.send.is_none()
            && self.encoder.is_none()
            && self.decoder.is_none()
    }
}
