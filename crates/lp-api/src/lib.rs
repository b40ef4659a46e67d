//! Launchpad Wire Model
//!
//! Typed views over the JSON payloads exchanged with the Launchpad API.
//! Pure data: no I/O, no auth, no transport.

pub mod build;
pub mod builders;
pub mod collection;
pub mod processors;
pub mod snap;
pub mod webhook;

pub use build::{BuildEntry, BuildState, StoreUploadStatus};
pub use builders::{format_duration, parse_duration, BuildQueueSizes, QueueDuration, QueueSlot};
pub use collection::Collection;
pub use processors::{processor_link, SUPPORTED_PROCESSORS};
pub use snap::SnapEntry;
pub use webhook::{WebhookEntry, LIVEFS_BUILD_EVENT};

/// API root for production Launchpad.
pub const DEFAULT_API_BASE: &str = "https://api.launchpad.net/devel/";
