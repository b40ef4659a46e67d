//! Snap recipe lifecycle.
//!
//! Recipes are addressed by a content-derived name (hash of the git
//! URL) so repeated creations from the same source collide onto the
//! same remote object rather than accumulating near-duplicates.

use sha2::{Digest, Sha256};

use lp_api::{processor_link, BuildEntry, SnapEntry, SUPPORTED_PROCESSORS};

use crate::client::{ApiClient, RequestError};
use crate::error::Error;
use crate::session::ApiRequest;

/// Archive recipes auto-build from.
const AUTO_BUILD_ARCHIVE: &str = "/ubuntu/+archive/primary";

const STORE_SERIES: &str = "/+snappy-series/16";

const DEFAULT_STORE_CHANNEL: &str = "edge";

/// Derive the recipe name for a git URL.
///
/// The name is the hex SHA-256 of the URL: stable across repeated
/// create attempts for the same repository.
pub fn recipe_name(git_url: &str) -> String {
    hex::encode(Sha256::digest(git_url.as_bytes()))
}

pub struct SnapBuilder {
    client: ApiClient,
}

impl SnapBuilder {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Look up a recipe by store name.
    ///
    /// `findByStoreName` may match more broadly than an exact name, so
    /// the first entry is accepted only if its store name equals the
    /// query; anything else is "not found", not an error.
    pub fn find_by_store_name(&self, store_name: &str) -> Result<Option<SnapEntry>, Error> {
        let request = ApiRequest::get("+snaps")
            .with_query("ws.op", "findByStoreName")
            .with_query("owner", self.client.credentials().owner())
            .with_query("store_name", store_name);

        let snaps = self.client.collection::<SnapEntry>(&request)?;
        Ok(snaps
            .entries
            .into_iter()
            .next()
            .filter(|snap| snap.store_name == store_name))
    }

    /// Like `find_by_store_name`, but absence is an error.
    pub fn require(&self, store_name: &str) -> Result<SnapEntry, Error> {
        self.find_by_store_name(store_name)?
            .ok_or_else(|| Error::SnapNotFound {
                store_name: store_name.to_string(),
            })
    }

    /// Register a recipe and authorize it for store uploads.
    ///
    /// Creation is a two-step sequence. If `completeAuthorization`
    /// fails, the recipe exists but cannot upload; the error propagates
    /// so the caller can detect the state with a later status check.
    pub fn create(
        &self,
        store_name: &str,
        git_url: &str,
        macaroon: &str,
    ) -> Result<SnapEntry, Error> {
        let owner = self.client.credentials().owner();

        let mut request = ApiRequest::post("+snaps")
            .with_form("ws.op", "new")
            .with_form("owner", owner)
            .with_form("name", recipe_name(git_url))
            .with_form("store_name", store_name)
            .with_form("git_repository_url", git_url)
            .with_form("git_path", "HEAD")
            .with_form("auto_build", "false")
            .with_form("auto_build_archive", AUTO_BUILD_ARCHIVE)
            .with_form("auto_build_pocket", "Updates")
            .with_form("store_upload", "true")
            .with_form("store_series", STORE_SERIES)
            .with_form("store_channels", DEFAULT_STORE_CHANNEL);
        for arch in SUPPORTED_PROCESSORS {
            request = request.with_form("processors", processor_link(arch));
        }

        let created: SnapEntry = self
            .client
            .execute(&request)?
            .json()
            .map_err(RequestError::from)?;

        let authorize = ApiRequest::post(created.self_link.as_str())
            .with_form("ws.op", "completeAuthorization")
            .with_form("root_macaroon", macaroon);
        self.client.execute(&authorize)?;

        Ok(created)
    }

    /// Request builds for every architecture the recipe is configured
    /// with. One aggregate call using the recipe's own archive, pocket
    /// and channels, not one request per architecture.
    pub fn request_builds(&self, store_name: &str) -> Result<(), Error> {
        let snap = self.require(store_name)?;

        let mut request = ApiRequest::post(snap.self_link.as_str())
            .with_form("ws.op", "requestBuilds")
            .with_form(
                "archive",
                snap.auto_build_archive.as_deref().unwrap_or(AUTO_BUILD_ARCHIVE),
            )
            .with_form(
                "pocket",
                snap.auto_build_pocket.as_deref().unwrap_or("Updates"),
            );
        if let Some(channels) = &snap.auto_build_channels {
            request = request.with_form(
                "channels",
                serde_json::to_string(channels).map_err(RequestError::from)?,
            );
        }
        self.client.execute(&request)?;
        Ok(())
    }

    /// Cancel every pending build, returning how many cancels were
    /// issued.
    ///
    /// Cancels are independent; a failing cancel aborts the sweep but
    /// does not undo cancels already applied.
    pub fn cancel_pending_builds(&self, store_name: &str) -> Result<usize, Error> {
        let snap = self.require(store_name)?;
        let pending = self.pending_builds(&snap)?;
        let count = pending.len();
        for build in pending {
            let request = ApiRequest::post(build.self_link.as_str()).with_form("ws.op", "cancel");
            self.client.execute(&request)?;
        }
        Ok(count)
    }

    /// Delete the recipe.
    pub fn delete(&self, store_name: &str) -> Result<(), Error> {
        let snap = self.require(store_name)?;
        self.client
            .execute(&ApiRequest::delete(snap.self_link.as_str()))?;
        Ok(())
    }

    /// Whether any build for the recipe is still moving through the farm.
    pub fn is_building(&self, store_name: &str) -> Result<bool, Error> {
        let snap = self.require(store_name)?;
        Ok(!self.pending_builds(&snap)?.is_empty())
    }

    pub(crate) fn pending_builds(&self, snap: &SnapEntry) -> Result<Vec<BuildEntry>, Error> {
        self.build_collection(snap.pending_builds_collection_link.as_deref())
    }

    pub(crate) fn completed_builds(&self, snap: &SnapEntry) -> Result<Vec<BuildEntry>, Error> {
        self.build_collection(snap.completed_builds_collection_link.as_deref())
    }

    fn build_collection(&self, link: Option<&str>) -> Result<Vec<BuildEntry>, Error> {
        let Some(link) = link else {
            return Ok(Vec::new());
        };
        let builds = self.client.collection::<BuildEntry>(&ApiRequest::get(link))?;
        Ok(builds.entries)
    }
}
