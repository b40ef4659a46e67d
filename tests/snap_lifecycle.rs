//! Snap recipe lifecycle tests.

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use launchpad_lane::mock::{MockLaunchpad, MockSession};
use launchpad_lane::{recipe_name, ApiClient, Credentials, Error, RequestError, SnapBuilder};
use lp_api::BuildState;

const GIT_URL: &str = "https://github.com/build-staging-snapcraft-io/test1";

fn builder(launchpad: &MockLaunchpad) -> SnapBuilder {
    let session = MockSession::with_launchpad(launchpad.clone());
    let credentials = Credentials::new("build.snapcraft.io", "token", "secret");
    SnapBuilder::new(ApiClient::new(Arc::new(session), credentials))
}

#[test]
fn create_registers_and_authorizes_the_recipe() {
    let launchpad = MockLaunchpad::new();

    let entry = builder(&launchpad)
        .create("new-test-snap", GIT_URL, "macaroon")
        .unwrap();

    assert_eq!(entry.name, recipe_name(GIT_URL));
    assert_eq!(entry.store_name, "new-test-snap");
    assert_eq!(entry.git_repository_url, GIT_URL);

    let snaps = launchpad.snaps();
    assert_eq!(snaps.len(), 1);
    assert_eq!(snaps[0].owner, "build.snapcraft.io");
    assert_eq!(snaps[0].processors.len(), 6);
    assert!(snaps[0].authorized, "completeAuthorization must have run");
}

#[test]
fn create_twice_collides_on_the_same_recipe() {
    let launchpad = MockLaunchpad::new();
    let builder = builder(&launchpad);

    builder.create("new-test-snap", GIT_URL, "macaroon").unwrap();
    let err = builder
        .create("new-test-snap", GIT_URL, "macaroon")
        .unwrap_err();

    // Identity is derived from the git URL, so the second create
    // addresses the same remote object and the API rejects it.
    assert!(matches!(
        err,
        Error::Request(RequestError::Remote { status: 400, .. })
    ));
    assert_eq!(launchpad.snaps().len(), 1);
}

#[test]
fn failed_authorization_leaves_the_recipe_behind() {
    let launchpad = MockLaunchpad::new();
    launchpad.inject_error("completeAuthorization", 500, "store is down");

    let err = builder(&launchpad)
        .create("new-test-snap", GIT_URL, "macaroon")
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Request(RequestError::Remote { status: 500, .. })
    ));
    // Partial-failure state: created but not upload-authorized.
    let snaps = launchpad.snaps();
    assert_eq!(snaps.len(), 1);
    assert!(!snaps[0].authorized);
}

#[test]
fn find_returns_exact_matches_only() {
    let launchpad = MockLaunchpad::new();
    launchpad.seed_snap("toto-core", "https://example.com/toto-core");

    // findByStoreName matches by prefix; the first result's store name
    // differs from the query, so this is "not found", not an error.
    assert!(builder(&launchpad)
        .find_by_store_name("toto")
        .unwrap()
        .is_none());

    launchpad.seed_snap("toto", "https://example.com/toto");
    let entry = builder(&launchpad)
        .find_by_store_name("toto")
        .unwrap()
        .expect("exact match");
    assert_eq!(entry.store_name, "toto");
}

#[test]
fn find_unknown_store_name_is_none() {
    let launchpad = MockLaunchpad::new();
    assert!(builder(&launchpad)
        .find_by_store_name("snap-that-does-not-exist")
        .unwrap()
        .is_none());
}

#[test]
fn request_builds_is_one_aggregate_call() {
    let launchpad = MockLaunchpad::new();
    launchpad.seed_snap("toto", GIT_URL);

    builder(&launchpad).request_builds("toto").unwrap();

    // One build per configured processor, from a single requestBuilds.
    assert_eq!(launchpad.builds().len(), 6);
    let request_ops = launchpad
        .ops()
        .iter()
        .filter(|op| *op == "requestBuilds")
        .count();
    assert_eq!(request_ops, 1);
}

#[test]
fn request_builds_for_unknown_snap_is_not_found() {
    let launchpad = MockLaunchpad::new();
    let err = builder(&launchpad).request_builds("missing").unwrap_err();
    assert!(matches!(err, Error::SnapNotFound { .. }));
}

#[test]
fn cancel_sweeps_pending_builds_only() {
    let launchpad = MockLaunchpad::new();
    launchpad.seed_snap("toto", GIT_URL);
    let t = |s: i64| Utc.timestamp_opt(1_550_000_000 + s, 0).unwrap();
    launchpad.add_build("toto", "amd64", BuildState::NeedsBuilding, None, t(0));
    launchpad.add_build("toto", "arm64", BuildState::CurrentlyBuilding, None, t(1));
    launchpad.add_build("toto", "armhf", BuildState::SuccessfullyBuilt, None, t(2));

    let cancelled = builder(&launchpad).cancel_pending_builds("toto").unwrap();

    assert_eq!(cancelled, 2);
    let states: Vec<BuildState> = launchpad.builds().iter().map(|b| b.state).collect();
    assert_eq!(
        states.iter().filter(|s| **s == BuildState::CancelledBuild).count(),
        2
    );
    assert!(states.contains(&BuildState::SuccessfullyBuilt));
}

#[test]
fn failing_cancel_aborts_without_rollback() {
    let launchpad = MockLaunchpad::new();
    launchpad.seed_snap("toto", GIT_URL);
    let t = |s: i64| Utc.timestamp_opt(1_550_000_000 + s, 0).unwrap();
    launchpad.add_build("toto", "amd64", BuildState::NeedsBuilding, None, t(0));
    launchpad.add_build("toto", "arm64", BuildState::NeedsBuilding, None, t(1));
    launchpad.inject_error("cancel", 500, "builder exploded");

    let err = builder(&launchpad).cancel_pending_builds("toto").unwrap_err();

    assert!(matches!(
        err,
        Error::Request(RequestError::Remote { status: 500, .. })
    ));
    // Non-transactional: nothing is rolled back, the sweep just stops.
    assert!(launchpad
        .builds()
        .iter()
        .all(|b| b.state != BuildState::CancelledBuild));
}

#[test]
fn is_building_tracks_pending_builds() {
    let launchpad = MockLaunchpad::new();
    launchpad.seed_snap("toto", GIT_URL);
    let builder = builder(&launchpad);

    assert!(!builder.is_building("toto").unwrap());

    launchpad.add_build(
        "toto",
        "amd64",
        BuildState::CurrentlyBuilding,
        None,
        Utc::now(),
    );
    assert!(builder.is_building("toto").unwrap());
}

#[test]
fn delete_removes_the_recipe() {
    let launchpad = MockLaunchpad::new();
    launchpad.seed_snap("new-test-snap", GIT_URL);

    builder(&launchpad).delete("new-test-snap").unwrap();
    assert!(launchpad.snaps().is_empty());
}

#[test]
fn delete_unknown_snap_is_not_found() {
    let launchpad = MockLaunchpad::new();
    let err = builder(&launchpad).delete("missing").unwrap_err();
    assert!(matches!(err, Error::SnapNotFound { .. }));
}
