//! Bridge between a host item model and an RCI device gateway.
//!
//! The gateway speaks a fixed XML-over-HTTP remote-command-interface: named
//! channels are dumped, refreshed and set with `do_command` envelopes. This
//! crate keeps a set of host items synchronized with those channels in both
//! directions.
//!
//! ## Architecture
//!
//! - **RciClient**: builds command envelopes, POSTs them as `text/xml`,
//!   parses responses into typed channel values.
//! - **transcode**: pure value converters between wire and item domains,
//!   resolved by name at registration.
//! - **SyncEngine**: mapping tables, refresh set, and the single lock that
//!   serializes poll cycles against write-triggered channel sets.
//! - **GatewayService**: hooks the engine to the host scheduler and item
//!   event feed.
//!
//! Polled values pushed into items carry the engine's source identity, and
//! the write path ignores changes with that source, so a poll never feeds
//! back into a write.

pub mod config;
pub mod engine;
pub mod error;
pub mod rci;
pub mod service;
pub mod transcode;

pub use config::{GatewayConfig, ItemBinding};
pub use engine::{EngineStats, SyncEngine, SOURCE_NAME};
pub use error::{GatewayError, GatewayResult};
pub use rci::{ChannelValue, RciClient, RciCommands};
pub use service::GatewayService;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
