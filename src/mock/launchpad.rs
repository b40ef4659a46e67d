//! Mock Launchpad request handling.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use lp_api::{BuildState, StoreUploadStatus, DEFAULT_API_BASE, SUPPORTED_PROCESSORS};

use crate::session::{ApiRequest, ApiResponse, Method};

use super::state::{BuildRecord, MockState, SnapRecord, WebhookRecord};

/// An error queued for the next matching request.
#[derive(Debug, Clone)]
struct InjectedFailure {
    /// Matched against the request's `ws.op`, or the trailing path
    /// segment for plain collection GETs.
    op: String,
    status: u16,
    body: String,
}

/// In-process mock of the Launchpad API.
///
/// Clones share state, so a test can keep one handle for assertions
/// while a `MockSession` drives the other.
#[derive(Clone, Default)]
pub struct MockLaunchpad {
    state: Arc<Mutex<MockState>>,
    failures: Arc<Mutex<Vec<InjectedFailure>>>,
}

impl MockLaunchpad {
    pub fn new() -> Self {
        Self::default()
    }

    // === Test configuration ===

    /// Register an authorized recipe configured like `create` would
    /// leave it. Returns the recipe name.
    pub fn seed_snap(&self, store_name: &str, git_url: &str) -> String {
        let name = crate::snap::recipe_name(git_url);
        let record = SnapRecord {
            name: name.clone(),
            store_name: store_name.to_string(),
            git_repository_url: git_url.to_string(),
            owner: "test-owner".to_string(),
            auto_build_archive: "/ubuntu/+archive/primary".to_string(),
            auto_build_pocket: "Updates".to_string(),
            auto_build_channels: None,
            store_channels: vec!["edge".to_string()],
            processors: SUPPORTED_PROCESSORS
                .iter()
                .map(|arch| lp_api::processor_link(arch))
                .collect(),
            authorized: true,
        };
        self.state.lock().unwrap().snaps.push(record);
        name
    }

    /// Add a build for a seeded recipe. Panics if the recipe is missing.
    pub fn add_build(
        &self,
        store_name: &str,
        arch: &str,
        state: BuildState,
        store_upload_status: Option<StoreUploadStatus>,
        date_created: DateTime<Utc>,
    ) -> u64 {
        let mut locked = self.state.lock().unwrap();
        let snap = locked
            .snap_by_store_name(store_name)
            .unwrap_or_else(|| panic!("no seeded snap with store name '{store_name}'"));
        let (recipe_name, owner) = (snap.name.clone(), snap.owner.clone());
        let id = locked.next_id();
        locked.builds.push(BuildRecord {
            id,
            recipe_name,
            owner,
            arch_tag: arch.to_string(),
            state,
            store_upload_status,
            date_created,
        });
        id
    }

    /// Register a webhook directly, bypassing `newWebhook`.
    pub fn add_webhook(
        &self,
        livefs_path: &str,
        delivery_url: &str,
        event_types: &[&str],
        secret: &str,
    ) -> u64 {
        let mut locked = self.state.lock().unwrap();
        let id = locked.next_id();
        locked.webhooks.push(WebhookRecord {
            id,
            livefs_path: livefs_path.trim_matches('/').to_string(),
            delivery_url: delivery_url.to_string(),
            event_types: event_types.iter().map(|s| s.to_string()).collect(),
            active: true,
            secret: secret.to_string(),
        });
        id
    }

    pub fn set_queue_size(&self, arch: &str, jobs: u64, duration: Option<&str>) {
        self.state.lock().unwrap().queue_sizes.insert(
            arch.to_string(),
            (jobs, duration.map(|d| Value::String(d.to_string()))),
        );
    }

    pub fn set_queue_size_seconds(&self, arch: &str, jobs: u64, seconds: f64) {
        self.state
            .lock()
            .unwrap()
            .queue_sizes
            .insert(arch.to_string(), (jobs, Some(json!(seconds))));
    }

    pub fn set_builder_count(&self, arch: &str, count: u64) {
        self.state
            .lock()
            .unwrap()
            .builder_counts
            .insert(arch.to_string(), count);
    }

    /// Fail the next request whose `ws.op` (or trailing path segment)
    /// matches `op`.
    pub fn inject_error(&self, op: &str, status: u16, body: &str) {
        self.failures.lock().unwrap().push(InjectedFailure {
            op: op.to_string(),
            status,
            body: body.to_string(),
        });
    }

    // === Assertion helpers ===

    pub fn snaps(&self) -> Vec<SnapRecord> {
        self.state.lock().unwrap().snaps.clone()
    }

    pub fn builds(&self) -> Vec<BuildRecord> {
        self.state.lock().unwrap().builds.clone()
    }

    pub fn webhooks(&self) -> Vec<WebhookRecord> {
        self.state.lock().unwrap().webhooks.clone()
    }

    pub fn image_build_requests(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.state.lock().unwrap().image_build_requests.clone()
    }

    /// Named operations handled so far, in order.
    pub fn ops(&self) -> Vec<String> {
        self.state.lock().unwrap().ops.clone()
    }

    // === Request handling ===

    pub fn handle(&self, request: &ApiRequest) -> ApiResponse {
        let path = normalize_path(&request.path);

        {
            let mut failures = self.failures.lock().unwrap();
            let matched = failures.iter().position(|failure| {
                request.ws_op() == Some(failure.op.as_str()) || path.ends_with(&failure.op)
            });
            if let Some(pos) = matched {
                let failure = failures.remove(pos);
                return ApiResponse {
                    status: failure.status,
                    body: failure.body.into_bytes(),
                };
            }
        }

        if let Some(op) = request.ws_op() {
            self.state.lock().unwrap().ops.push(op.to_string());
        }

        let segments: Vec<String> = path.split('/').map(str::to_string).collect();
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

        match request.method {
            Method::Get => self.handle_get(&segments, &path, request),
            Method::Post => self.handle_post(&segments, &path, request),
            Method::Delete => self.handle_delete(&segments),
        }
    }

    fn handle_get(&self, segments: &[&str], path: &str, request: &ApiRequest) -> ApiResponse {
        match segments {
            ["+snaps"] if request.ws_op() == Some("findByStoreName") => {
                let query = request.param("store_name").unwrap_or_default();
                let state = self.state.lock().unwrap();
                let entries: Vec<Value> = state
                    .snaps_matching(query)
                    .into_iter()
                    .map(SnapRecord::to_entry_json)
                    .collect();
                collection_response(entries, None)
            }
            ["builders"] if request.ws_op() == Some("getBuildQueueSizes") => {
                let state = self.state.lock().unwrap();
                let virt: serde_json::Map<String, Value> = state
                    .queue_sizes
                    .iter()
                    .map(|(arch, (jobs, duration))| {
                        (
                            arch.clone(),
                            json!([jobs, duration.clone().unwrap_or(Value::Null)]),
                        )
                    })
                    .collect();
                json_response(200, json!({ "virt": virt, "nonvirt": {} }))
            }
            ["builders"] if request.ws_op() == Some("getBuildersForQueue") => {
                let arch = request
                    .param("processor")
                    .and_then(|link| link.rsplit('/').next())
                    .unwrap_or_default()
                    .to_string();
                let state = self.state.lock().unwrap();
                let count = state.builder_counts.get(&arch).copied().unwrap_or(0);
                collection_response(Vec::new(), Some(count))
            }
            [_, "+snap", name, sub] if *sub == "pending_builds" || *sub == "completed_builds" => {
                let pending = *sub == "pending_builds";
                let state = self.state.lock().unwrap();
                if state.snap_by_name(name).is_none() {
                    return not_found();
                }
                let entries: Vec<Value> = state
                    .builds
                    .iter()
                    .filter(|build| {
                        build.recipe_name == *name && build.state.is_pending() == pending
                    })
                    .map(BuildRecord::to_entry_json)
                    .collect();
                collection_response(entries, None)
            }
            [_, "+livefs", .., "webhooks"] => {
                let livefs_path = path.trim_end_matches("/webhooks");
                let state = self.state.lock().unwrap();
                let entries: Vec<Value> = state
                    .webhooks
                    .iter()
                    .filter(|hook| hook.livefs_path == livefs_path)
                    .map(WebhookRecord::to_entry_json)
                    .collect();
                collection_response(entries, None)
            }
            _ => not_found(),
        }
    }

    fn handle_post(&self, segments: &[&str], path: &str, request: &ApiRequest) -> ApiResponse {
        match (segments, request.ws_op()) {
            (["+snaps"], Some("new")) => self.create_snap(request),
            ([_, "+snap", name], Some("completeAuthorization")) => {
                let mut state = self.state.lock().unwrap();
                match state.snap_by_name_mut(name) {
                    Some(snap) => {
                        snap.authorized = true;
                        json_response(200, Value::Null)
                    }
                    None => not_found(),
                }
            }
            ([_, "+snap", name], Some("requestBuilds")) => self.request_builds(name),
            ([_, "+snap", name, "+build", id], Some("cancel")) => {
                let id: u64 = match id.parse() {
                    Ok(id) => id,
                    Err(_) => return not_found(),
                };
                let mut state = self.state.lock().unwrap();
                let build = state
                    .builds
                    .iter_mut()
                    .find(|build| build.id == id && build.recipe_name == *name);
                match build {
                    Some(build) => {
                        build.state = BuildState::CancelledBuild;
                        json_response(200, Value::Null)
                    }
                    None => not_found(),
                }
            }
            ([_, "+livefs", _, _, _], Some("requestBuild")) => {
                let mut state = self.state.lock().unwrap();
                state
                    .image_build_requests
                    .push((path.to_string(), request.form.clone()));
                json_response(201, json!({}))
            }
            ([_, "+livefs", _, _, _], Some("newWebhook")) => self.new_webhook(path, request),
            ([_, "+livefs", _, _, _, "+webhook", id], Some("setSecret")) => {
                let id: u64 = match id.parse() {
                    Ok(id) => id,
                    Err(_) => return not_found(),
                };
                let secret = request.param("secret").unwrap_or_default().to_string();
                let mut state = self.state.lock().unwrap();
                match state.webhooks.iter_mut().find(|hook| hook.id == id) {
                    Some(hook) => {
                        hook.secret = secret;
                        json_response(200, Value::Null)
                    }
                    None => not_found(),
                }
            }
            _ => not_found(),
        }
    }

    fn handle_delete(&self, segments: &[&str]) -> ApiResponse {
        match segments {
            [_, "+snap", name] => {
                let mut state = self.state.lock().unwrap();
                let before = state.snaps.len();
                state.snaps.retain(|snap| snap.name != *name);
                if state.snaps.len() == before {
                    return not_found();
                }
                state.builds.retain(|build| build.recipe_name != *name);
                json_response(200, Value::Null)
            }
            _ => not_found(),
        }
    }

    fn create_snap(&self, request: &ApiRequest) -> ApiResponse {
        let name = request.param("name").unwrap_or_default().to_string();
        let mut state = self.state.lock().unwrap();
        if state.snap_by_name(&name).is_some() {
            return json_response(
                400,
                json!(format!("name: {name} is already in use by another snap.")),
            );
        }

        let owner = request
            .param("owner")
            .unwrap_or_default()
            .trim_start_matches("/~")
            .to_string();
        let processors: Vec<String> = request
            .form
            .iter()
            .filter(|(key, _)| key == "processors")
            .map(|(_, value)| value.clone())
            .collect();
        let record = SnapRecord {
            name,
            store_name: request.param("store_name").unwrap_or_default().to_string(),
            git_repository_url: request
                .param("git_repository_url")
                .unwrap_or_default()
                .to_string(),
            owner,
            auto_build_archive: request
                .param("auto_build_archive")
                .unwrap_or_default()
                .to_string(),
            auto_build_pocket: request
                .param("auto_build_pocket")
                .unwrap_or_default()
                .to_string(),
            auto_build_channels: None,
            store_channels: request
                .param("store_channels")
                .map(|channel| vec![channel.to_string()])
                .unwrap_or_default(),
            processors,
            authorized: false,
        };
        let entry = record.to_entry_json();
        state.snaps.push(record);
        ApiResponse {
            status: 201,
            body: serde_json::to_vec(&entry).unwrap(),
        }
    }

    fn request_builds(&self, name: &str) -> ApiResponse {
        let mut state = self.state.lock().unwrap();
        let snap = match state.snap_by_name(name) {
            Some(snap) => snap.clone(),
            None => return not_found(),
        };
        for processor in &snap.processors {
            let arch = processor.rsplit('/').next().unwrap_or_default().to_string();
            let id = state.next_id();
            state.builds.push(BuildRecord {
                id,
                recipe_name: snap.name.clone(),
                owner: snap.owner.clone(),
                arch_tag: arch,
                state: BuildState::NeedsBuilding,
                store_upload_status: Some(StoreUploadStatus::Unscheduled),
                date_created: Utc::now(),
            });
        }
        json_response(201, json!({}))
    }

    fn new_webhook(&self, path: &str, request: &ApiRequest) -> ApiResponse {
        let event_types: Vec<String> = request
            .param("event_types")
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default();
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let record = WebhookRecord {
            id,
            livefs_path: path.to_string(),
            delivery_url: request.param("delivery_url").unwrap_or_default().to_string(),
            event_types,
            active: request.param("active") != Some("false"),
            secret: request.param("secret").unwrap_or_default().to_string(),
        };
        let entry = record.to_entry_json();
        state.webhooks.push(record);
        ApiResponse {
            status: 201,
            body: serde_json::to_vec(&entry).unwrap(),
        }
    }
}

fn normalize_path(path: &str) -> String {
    path.strip_prefix(DEFAULT_API_BASE)
        .unwrap_or(path)
        .trim_matches('/')
        .to_string()
}

fn json_response(status: u16, body: Value) -> ApiResponse {
    ApiResponse {
        status,
        body: serde_json::to_vec(&body).unwrap(),
    }
}

fn collection_response(entries: Vec<Value>, total_size: Option<u64>) -> ApiResponse {
    let total = total_size.unwrap_or(entries.len() as u64);
    json_response(200, json!({ "entries": entries, "total_size": total }))
}

fn not_found() -> ApiResponse {
    ApiResponse {
        status: 404,
        body: b"Object: not found".to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_paths_are_404() {
        let launchpad = MockLaunchpad::new();
        let response = launchpad.handle(&ApiRequest::get("nonsense"));
        assert_eq!(response.status, 404);
    }

    #[test]
    fn absolute_self_links_are_normalized() {
        let launchpad = MockLaunchpad::new();
        launchpad.seed_snap("toto", "https://example.com/toto");
        launchpad.add_build(
            "toto",
            "amd64",
            BuildState::NeedsBuilding,
            None,
            Utc::now(),
        );

        let name = crate::snap::recipe_name("https://example.com/toto");
        let link = format!("{DEFAULT_API_BASE}~test-owner/+snap/{name}/pending_builds");
        let response = launchpad.handle(&ApiRequest::get(link));
        assert_eq!(response.status, 200);
        let body: Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["entries"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn injected_errors_fire_once() {
        let launchpad = MockLaunchpad::new();
        launchpad.seed_snap("toto", "https://example.com/toto");
        launchpad.inject_error("findByStoreName", 503, "farm down");

        let request = ApiRequest::get("+snaps")
            .with_query("ws.op", "findByStoreName")
            .with_query("store_name", "toto");
        assert_eq!(launchpad.handle(&request).status, 503);
        assert_eq!(launchpad.handle(&request).status, 200);
    }
}
