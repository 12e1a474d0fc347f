//! Host-side capabilities for the rcibridge gateway.
//!
//! This crate holds the two narrow interfaces the channel synchronization
//! engine is injected with, plus concrete implementations usable by hosts
//! and tests:
//!
//! - **ItemStore / ItemRegistry**: an addressable value holder per item,
//!   tracking current value, previous value and the source of the last
//!   change, with a broadcast feed of item updates.
//! - **PeriodicScheduler / TokioScheduler**: registration of periodic jobs
//!   with a cycle period, startup offset and priority. Jobs are
//!   single-flight: the next tick fires only after the previous invocation
//!   returns.
//!
//! The gateway engine never owns items. It reads and writes them through
//! `ItemStore`, tagging every update it pushes with its own source identity
//! so hosts (and the engine itself) can tell gateway-originated changes from
//! user-originated ones.

pub mod item;
pub mod registry;
pub mod scheduler;

pub use item::{ItemError, ItemId, ItemResult, ItemState, ItemStore, ItemValue};
pub use registry::{ItemEvent, ItemEventReceiver, ItemRegistry, DEFAULT_EVENT_CAPACITY};
pub use scheduler::{JobFn, JobSpec, PeriodicScheduler, TokioScheduler};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
