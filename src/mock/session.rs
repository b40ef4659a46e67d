//! Mock session wiring.

use crate::session::{ApiRequest, ApiResponse, Session, TransportError};

use super::MockLaunchpad;

/// `Session` backed by an in-process [`MockLaunchpad`].
#[derive(Clone, Default)]
pub struct MockSession {
    launchpad: MockLaunchpad,
}

impl MockSession {
    /// Create a session with a fresh, empty mock Launchpad.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session over a pre-configured mock Launchpad.
    pub fn with_launchpad(launchpad: MockLaunchpad) -> Self {
        Self { launchpad }
    }

    /// The underlying mock, for test configuration and assertions.
    pub fn launchpad(&self) -> &MockLaunchpad {
        &self.launchpad
    }
}

impl Session for MockSession {
    fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        Ok(self.launchpad.handle(request))
    }
}
