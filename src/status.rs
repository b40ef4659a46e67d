//! Cross-architecture status aggregation.
//!
//! Read-only views recomputed on every query; nothing here mutates
//! remote state or caches it locally.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Serialize, Serializer};

use lp_api::{
    format_duration, processor_link, BuildQueueSizes, BuildState, Collection,
    StoreUploadStatus, SUPPORTED_PROCESSORS,
};

use crate::client::ApiClient;
use crate::error::Error;
use crate::session::ApiRequest;
use crate::snap::SnapBuilder;

/// Most recent build outcome for one architecture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchBuildStatus {
    pub build_state: BuildState,
    pub store_upload_status: Option<StoreUploadStatus>,
}

/// Virtualized builder-queue snapshot for one architecture.
///
/// `estimated_duration` is `None` both for an idle queue and when no
/// builders exist to divide the backlog across.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuilderQueue {
    pub pending_jobs: u64,

    #[serde(serialize_with = "serialize_clock")]
    pub total_jobs_duration: Option<Duration>,

    #[serde(serialize_with = "serialize_clock")]
    pub estimated_duration: Option<Duration>,
}

fn serialize_clock<S: Serializer>(
    duration: &Option<Duration>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match duration {
        Some(duration) => serializer.serialize_some(&format_duration(*duration)),
        None => serializer.serialize_none(),
    }
}

pub struct BuildStatusAggregator {
    client: ApiClient,
    snaps: SnapBuilder,
}

impl BuildStatusAggregator {
    pub fn new(client: ApiClient) -> Self {
        let snaps = SnapBuilder::new(client.clone());
        Self { client, snaps }
    }

    /// Latest build state per architecture for a recipe.
    ///
    /// Only the N most recent builds across the completed and pending
    /// collections are considered (N = number of supported processors);
    /// within that window the most recent build per architecture wins,
    /// and an architecture with no recent build is absent from the map.
    pub fn snap_build_status(
        &self,
        store_name: &str,
    ) -> Result<BTreeMap<String, ArchBuildStatus>, Error> {
        let snap = self.snaps.require(store_name)?;

        let mut builds = self.snaps.completed_builds(&snap)?;
        builds.extend(self.snaps.pending_builds(&snap)?);
        builds.sort_by(|a, b| b.date_created.cmp(&a.date_created));
        builds.truncate(SUPPORTED_PROCESSORS.len());

        let mut status = BTreeMap::new();
        for build in builds {
            status
                .entry(build.arch_tag.clone())
                .or_insert_with(|| ArchBuildStatus {
                    build_state: build.buildstate,
                    store_upload_status: build.store_upload_status,
                });
        }
        Ok(status)
    }

    /// Pending jobs and wait estimates for the virtualized builder pool,
    /// for every supported architecture.
    ///
    /// An architecture absent from the queue-size response is an idle
    /// queue: zero pending jobs, no durations.
    pub fn builder_queue_status(&self) -> Result<BTreeMap<String, BuilderQueue>, Error> {
        let sizes: BuildQueueSizes = self.client.get_json(
            &ApiRequest::get("builders").with_query("ws.op", "getBuildQueueSizes"),
        )?;

        let mut queues = BTreeMap::new();
        for arch in SUPPORTED_PROCESSORS {
            let queue = match sizes.virt.get(arch) {
                Some(slot) => {
                    let total = slot.duration();
                    let builders = self.virtualized_builder_count(arch)?;
                    let estimated = match total {
                        Some(total) if builders > 0 => {
                            Some(total / u32::try_from(builders).unwrap_or(u32::MAX))
                        }
                        _ => None,
                    };
                    BuilderQueue {
                        pending_jobs: slot.pending_jobs(),
                        total_jobs_duration: total,
                        estimated_duration: estimated,
                    }
                }
                None => BuilderQueue {
                    pending_jobs: 0,
                    total_jobs_duration: None,
                    estimated_duration: None,
                },
            };
            queues.insert(arch.to_string(), queue);
        }
        Ok(queues)
    }

    fn virtualized_builder_count(&self, arch: &str) -> Result<u64, Error> {
        let request = ApiRequest::get("builders")
            .with_query("ws.op", "getBuildersForQueue")
            .with_query("processor", processor_link(arch))
            .with_query("virtualized", "true");
        let builders: Collection<serde_json::Value> = self.client.collection(&request)?;
        Ok(builders.size())
    }
}
