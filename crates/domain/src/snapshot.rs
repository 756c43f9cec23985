//! Subscription and snapshot entities as seen through the resource
//! management API. Both are transient: fetched fresh each run, never
//! persisted.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snapsweep_core::{AppError, AppResult};

/// Identifier of a subscription, unique within the cloud tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(String);

impl SubscriptionId {
    /// Creates a validated subscription identifier.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "subscription id must not be empty".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for SubscriptionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Fully qualified resource path of a snapshot, globally addressable
/// within the management plane.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotId(String);

impl SnapshotId {
    /// Creates a validated snapshot identifier.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "snapshot id must not be empty".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying resource path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for SnapshotId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A subscription visible to the sweeping identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    /// Subscription identifier used to scope snapshot listings.
    pub id: SubscriptionId,
    /// Human-readable name, when the listing provides one. Logging only.
    pub display_name: Option<String>,
}

/// A managed-disk snapshot within one subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Resource path used to address the snapshot for deletion.
    pub id: SnapshotId,
    /// Resource tags. Empty when the snapshot carries none.
    pub tags: HashMap<String, String>,
    /// Creation instant. `None` when the listing omitted the value or it
    /// could not be parsed.
    pub time_created: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Returns the value of the named tag, if present.
    #[must_use]
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::{SnapshotId, SubscriptionId};

    #[test]
    fn subscription_id_rejects_whitespace() {
        assert!(SubscriptionId::new("   ").is_err());
    }

    #[test]
    fn snapshot_id_preserves_resource_path() {
        let result = SnapshotId::new("/subscriptions/abc/providers/Microsoft.Compute/snapshots/s1");
        match result {
            Ok(id) => assert!(id.as_str().starts_with("/subscriptions/")),
            Err(error) => panic!("expected valid snapshot id: {error}"),
        }
    }
}
