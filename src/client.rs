//! Request gateway.
//!
//! Signs and issues API calls, surfaces non-2xx responses and unwraps
//! collection envelopes. Every higher-level manager goes through here;
//! none of them touch the session directly.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use lp_api::Collection;

use crate::auth::Credentials;
use crate::session::{ApiRequest, ApiResponse, Session, TransportError};

/// Request failures. Remote errors are surfaced, never retried here;
/// retry and backoff policy belong to the caller.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Non-2xx response from Launchpad.
    #[error("launchpad returned {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Signed access to the Launchpad API for one identity.
#[derive(Clone)]
pub struct ApiClient {
    session: Arc<dyn Session>,
    credentials: Credentials,
}

impl ApiClient {
    pub fn new(session: Arc<dyn Session>, credentials: Credentials) -> Self {
        Self {
            session,
            credentials,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Issue one call; any non-2xx response becomes `RequestError::Remote`.
    pub fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, RequestError> {
        let response = self.session.execute(request)?;
        if !response.is_success() {
            return Err(RequestError::Remote {
                status: response.status,
                body: response.body_text(),
            });
        }
        Ok(response)
    }

    /// Issue one call and decode the JSON body.
    pub fn get_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, RequestError> {
        Ok(self.execute(request)?.json()?)
    }

    /// Fetch a collection. A response without an `entries` field is an
    /// empty collection, not an error.
    pub fn collection<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<Collection<T>, RequestError> {
        self.get_json(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Method;

    /// Session returning one canned response regardless of the request.
    struct CannedSession {
        status: u16,
        body: &'static str,
    }

    impl Session for CannedSession {
        fn execute(&self, _request: &ApiRequest) -> Result<ApiResponse, TransportError> {
            Ok(ApiResponse {
                status: self.status,
                body: self.body.as_bytes().to_vec(),
            })
        }
    }

    fn client(status: u16, body: &'static str) -> ApiClient {
        ApiClient::new(
            Arc::new(CannedSession { status, body }),
            Credentials::new("u", "t", "s"),
        )
    }

    #[test]
    fn non_2xx_surfaces_remote_error() {
        let client = client(401, "Unauthorized");
        let err = client
            .execute(&ApiRequest::new(Method::Get, "+snaps"))
            .unwrap_err();
        match err {
            RequestError::Remote { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "Unauthorized");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn collection_defaults_to_empty_entries() {
        let client = client(200, r#"{"total_size": 0}"#);
        let collection: Collection<serde_json::Value> = client
            .collection(&ApiRequest::new(Method::Get, "+snaps"))
            .unwrap();
        assert!(collection.entries.is_empty());
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        let client = client(200, "not json");
        let err = client
            .collection::<serde_json::Value>(&ApiRequest::new(Method::Get, "+snaps"))
            .unwrap_err();
        assert!(matches!(err, RequestError::Decode(_)));
    }
}
