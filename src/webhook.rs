//! Idempotent webhook registration on livefs targets.

use lp_api::{WebhookEntry, LIVEFS_BUILD_EVENT};

use crate::client::{ApiClient, RequestError};
use crate::error::Error;
use crate::resolver::BuildTarget;
use crate::session::ApiRequest;

/// What `upsert_build_webhook` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// No matching webhook existed; one was created.
    Created,
    /// A webhook for the delivery URL already notified livefs builds;
    /// its secret was replaced.
    Updated,
}

pub struct WebhookManager {
    client: ApiClient,
}

impl WebhookManager {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Ensure exactly one build webhook for `delivery_url` exists on the
    /// target's livefs, converging on `secret`.
    ///
    /// Find-or-update, not create-once: repeated calls with a changed
    /// secret update the existing webhook instead of erroring or
    /// duplicating it.
    pub fn upsert_build_webhook(
        &self,
        target: &BuildTarget,
        delivery_url: &str,
        secret: &str,
    ) -> Result<WebhookOutcome, Error> {
        let livefs = target.livefs_path(&self.client.credentials().livefs_owner());

        let existing = self
            .client
            .collection::<WebhookEntry>(&ApiRequest::get(format!("{livefs}/webhooks")))?;

        let matching = existing
            .entries
            .iter()
            .find(|hook| hook.delivery_url == delivery_url && hook.notifies_livefs_builds());

        if let Some(hook) = matching {
            let request = ApiRequest::post(hook.self_link.as_str())
                .with_form("ws.op", "setSecret")
                .with_form("secret", secret);
            self.client.execute(&request)?;
            return Ok(WebhookOutcome::Updated);
        }

        let request = ApiRequest::post(livefs)
            .with_form("ws.op", "newWebhook")
            .with_form("delivery_url", delivery_url)
            .with_form(
                "event_types",
                serde_json::to_string(&[LIVEFS_BUILD_EVENT]).map_err(RequestError::from)?,
            )
            .with_form("active", "true")
            .with_form("secret", secret);
        self.client.execute(&request)?;
        Ok(WebhookOutcome::Created)
    }
}
