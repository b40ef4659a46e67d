//! Snap build entries.
//!
//! Builds are created and advanced by Launchpad; this client only
//! observes their state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Build farm states, as the API spells them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildState {
    #[serde(rename = "Needs building")]
    NeedsBuilding,
    #[serde(rename = "Dependency wait")]
    DependencyWait,
    #[serde(rename = "Currently building")]
    CurrentlyBuilding,
    #[serde(rename = "Gathering build output")]
    GatheringBuildOutput,
    #[serde(rename = "Uploading build")]
    UploadingBuild,
    #[serde(rename = "Successfully built")]
    SuccessfullyBuilt,
    #[serde(rename = "Failed to build")]
    FailedToBuild,
    #[serde(rename = "Chroot problem")]
    ChrootProblem,
    #[serde(rename = "Build for superseded Source")]
    SupersededSource,
    #[serde(rename = "Failed to upload")]
    FailedToUpload,
    #[serde(rename = "Cancelling build")]
    CancellingBuild,
    #[serde(rename = "Cancelled build")]
    CancelledBuild,
}

impl BuildState {
    /// Whether the build is still moving through the farm.
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            BuildState::NeedsBuilding
                | BuildState::DependencyWait
                | BuildState::CurrentlyBuilding
                | BuildState::GatheringBuildOutput
                | BuildState::UploadingBuild
                | BuildState::CancellingBuild
        )
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildState::NeedsBuilding => "Needs building",
            BuildState::DependencyWait => "Dependency wait",
            BuildState::CurrentlyBuilding => "Currently building",
            BuildState::GatheringBuildOutput => "Gathering build output",
            BuildState::UploadingBuild => "Uploading build",
            BuildState::SuccessfullyBuilt => "Successfully built",
            BuildState::FailedToBuild => "Failed to build",
            BuildState::ChrootProblem => "Chroot problem",
            BuildState::SupersededSource => "Build for superseded Source",
            BuildState::FailedToUpload => "Failed to upload",
            BuildState::CancellingBuild => "Cancelling build",
            BuildState::CancelledBuild => "Cancelled build",
        }
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store upload outcome for a finished build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreUploadStatus {
    #[serde(rename = "Unscheduled")]
    Unscheduled,
    #[serde(rename = "Pending")]
    Pending,
    #[serde(rename = "Failed to upload")]
    FailedToUpload,
    #[serde(rename = "Failed to release to channels")]
    FailedToRelease,
    #[serde(rename = "Uploaded")]
    Uploaded,
}

impl StoreUploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreUploadStatus::Unscheduled => "Unscheduled",
            StoreUploadStatus::Pending => "Pending",
            StoreUploadStatus::FailedToUpload => "Failed to upload",
            StoreUploadStatus::FailedToRelease => "Failed to release to channels",
            StoreUploadStatus::Uploaded => "Uploaded",
        }
    }
}

impl fmt::Display for StoreUploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One build of a snap recipe, as listed in the builds collections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildEntry {
    pub self_link: String,

    /// Architecture tag the build targets (e.g. `armhf`).
    pub arch_tag: String,

    pub buildstate: BuildState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_upload_status: Option<StoreUploadStatus>,

    #[serde(rename = "datecreated")]
    pub date_created: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}
