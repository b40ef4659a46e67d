//! Snap recipe entries.

use serde::{Deserialize, Serialize};

/// A snap recipe as returned by `findByStoreName` and object GETs.
///
/// Launchpad entries carry many more fields; only the ones the lane
/// reads are modeled, everything else is ignored on decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapEntry {
    pub self_link: String,

    /// Content-derived recipe name (hash of the git URL).
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub store_name: String,

    #[serde(default)]
    pub git_repository_url: String,

    #[serde(default = "default_git_path")]
    pub git_path: String,

    #[serde(default)]
    pub auto_build: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_build_archive: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_build_pocket: Option<String>,

    /// Channel overrides forwarded verbatim to `requestBuilds`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_build_channels: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_series_link: Option<String>,

    #[serde(default)]
    pub store_channels: Vec<String>,

    /// Processor links the recipe is configured to build for.
    #[serde(default)]
    pub processors: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhooks_collection_link: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builds_collection_link: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_builds_collection_link: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_builds_collection_link: Option<String>,
}

fn default_git_path() -> String {
    "HEAD".to_string()
}
