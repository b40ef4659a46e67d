//! Mock Launchpad state.
//!
//! Plain records for the objects the lane touches, convertible into
//! the entry JSON the API would serve.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use lp_api::{BuildState, StoreUploadStatus, DEFAULT_API_BASE};

/// A registered snap recipe.
#[derive(Debug, Clone)]
pub struct SnapRecord {
    pub name: String,
    pub store_name: String,
    pub git_repository_url: String,
    pub owner: String,
    pub auto_build_archive: String,
    pub auto_build_pocket: String,
    pub auto_build_channels: Option<Value>,
    pub store_channels: Vec<String>,
    /// Processor links, e.g. `/+processors/amd64`.
    pub processors: Vec<String>,
    /// Set by `completeAuthorization`.
    pub authorized: bool,
}

impl SnapRecord {
    pub fn self_link(&self) -> String {
        format!("{}~{}/+snap/{}", DEFAULT_API_BASE, self.owner, self.name)
    }

    pub fn to_entry_json(&self) -> Value {
        let link = self.self_link();
        json!({
            "self_link": link,
            "name": self.name,
            "store_name": self.store_name,
            "git_repository_url": self.git_repository_url,
            "git_path": "HEAD",
            "auto_build": false,
            "auto_build_archive": self.auto_build_archive,
            "auto_build_pocket": self.auto_build_pocket,
            "auto_build_channels": self.auto_build_channels,
            "store_series_link": format!("{DEFAULT_API_BASE}+snappy-series/16"),
            "store_channels": self.store_channels,
            "processors": self.processors,
            "webhooks_collection_link": format!("{link}/webhooks"),
            "builds_collection_link": format!("{link}/builds"),
            "pending_builds_collection_link": format!("{link}/pending_builds"),
            "completed_builds_collection_link": format!("{link}/completed_builds"),
        })
    }
}

/// One build of a snap recipe.
#[derive(Debug, Clone)]
pub struct BuildRecord {
    pub id: u64,
    /// Recipe (not store) name of the owning snap.
    pub recipe_name: String,
    pub owner: String,
    pub arch_tag: String,
    pub state: BuildState,
    pub store_upload_status: Option<StoreUploadStatus>,
    pub date_created: DateTime<Utc>,
}

impl BuildRecord {
    pub fn self_link(&self) -> String {
        format!(
            "{}~{}/+snap/{}/+build/{}",
            DEFAULT_API_BASE, self.owner, self.recipe_name, self.id
        )
    }

    pub fn to_entry_json(&self) -> Value {
        json!({
            "self_link": self.self_link(),
            "arch_tag": self.arch_tag,
            "buildstate": self.state.as_str(),
            "store_upload_status": self.store_upload_status.map(|s| s.as_str()),
            "datecreated": self.date_created,
        })
    }
}

/// A webhook registered on a livefs.
#[derive(Debug, Clone)]
pub struct WebhookRecord {
    pub id: u64,
    /// Livefs path the webhook hangs off, without the API base.
    pub livefs_path: String,
    pub delivery_url: String,
    pub event_types: Vec<String>,
    pub active: bool,
    pub secret: String,
}

impl WebhookRecord {
    pub fn self_link(&self) -> String {
        format!("{}{}/+webhook/{}", DEFAULT_API_BASE, self.livefs_path, self.id)
    }

    pub fn to_entry_json(&self) -> Value {
        json!({
            "self_link": self.self_link(),
            "delivery_url": self.delivery_url,
            "event_types": self.event_types,
            "active": self.active,
        })
    }
}

/// Mock state container.
#[derive(Debug, Default)]
pub struct MockState {
    pub snaps: Vec<SnapRecord>,
    pub builds: Vec<BuildRecord>,
    pub webhooks: Vec<WebhookRecord>,
    /// Image build requests, as (livefs path, form fields), oldest first.
    pub image_build_requests: Vec<(String, Vec<(String, String)>)>,
    /// `getBuildQueueSizes` virt payload: arch -> (jobs, duration value).
    pub queue_sizes: HashMap<String, (u64, Option<Value>)>,
    /// Virtualized builder counts per architecture.
    pub builder_counts: HashMap<String, u64>,
    /// Named operations handled, in order.
    pub ops: Vec<String>,
    id_counter: u64,
}

impl MockState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> u64 {
        self.id_counter += 1;
        self.id_counter
    }

    pub fn snap_by_name(&self, name: &str) -> Option<&SnapRecord> {
        self.snaps.iter().find(|snap| snap.name == name)
    }

    pub fn snap_by_name_mut(&mut self, name: &str) -> Option<&mut SnapRecord> {
        self.snaps.iter_mut().find(|snap| snap.name == name)
    }

    pub fn snap_by_store_name(&self, store_name: &str) -> Option<&SnapRecord> {
        self.snaps.iter().find(|snap| snap.store_name == store_name)
    }

    /// Prefix match on store names, shortest (most exact) first: the
    /// breadth `findByStoreName` is allowed to have.
    pub fn snaps_matching(&self, store_name: &str) -> Vec<&SnapRecord> {
        let mut matches: Vec<&SnapRecord> = self
            .snaps
            .iter()
            .filter(|snap| snap.store_name.starts_with(store_name))
            .collect();
        matches.sort_by(|a, b| a.store_name.cmp(&b.store_name));
        matches
    }
}
