//! Webhook entries on livefs targets.

use serde::{Deserialize, Serialize};

/// Event type delivered when a livefs build changes state.
pub const LIVEFS_BUILD_EVENT: &str = "livefs:build:0.1";

/// A registered webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEntry {
    pub self_link: String,

    pub delivery_url: String,

    #[serde(default)]
    pub event_types: Vec<String>,

    #[serde(default)]
    pub active: bool,
}

impl WebhookEntry {
    /// Whether this webhook subscribes to livefs build events.
    ///
    /// Together with the delivery URL this is the identity the upsert
    /// scan dedups on.
    pub fn notifies_livefs_builds(&self) -> bool {
        self.event_types.iter().any(|e| e == LIVEFS_BUILD_EVENT)
    }
}
