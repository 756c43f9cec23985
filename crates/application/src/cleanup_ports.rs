//! Ports for the external collaborators of a cleanup run.

use async_trait::async_trait;

use snapsweep_core::{AppError, AppResult};
use snapsweep_domain::{Snapshot, SnapshotId, Subscription, SubscriptionId};

/// Short-lived bearer token scoped to the management-plane audience.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Creates a validated access token.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "access token must not be empty".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the raw token for use in an `Authorization` header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Credential provider port. Yields one bearer token per cleanup run; the
/// run is assumed short enough that the token does not expire mid-run.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Obtains a bearer token for the management-plane audience.
    async fn management_token(&self) -> AppResult<AccessToken>;
}

/// Resource management API port.
///
/// Listing calls propagate failures; a listing failure aborts the whole
/// run. Deletion never fails loudly: any transport error or non-success
/// status surfaces as `false` so one bad snapshot cannot abort the sweep.
#[async_trait]
pub trait ResourceManagerApi: Send + Sync {
    /// Lists every subscription visible to the token's identity.
    async fn list_subscriptions(&self, token: &AccessToken) -> AppResult<Vec<Subscription>>;

    /// Lists the snapshots within one subscription.
    async fn list_snapshots(
        &self,
        token: &AccessToken,
        subscription_id: &SubscriptionId,
    ) -> AppResult<Vec<Snapshot>>;

    /// Deletes one snapshot. Returns `true` only on a success status.
    async fn delete_snapshot(&self, token: &AccessToken, snapshot_id: &SnapshotId) -> bool;
}

/// Email delivery port.
#[async_trait]
pub trait EmailService: Send + Sync {
    /// Sends a single email message.
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> AppResult<()>;
}
