//! Retention policy deciding which snapshots may be deleted.

use chrono::{DateTime, Duration, Utc};
use snapsweep_core::{AppError, AppResult};

use crate::Snapshot;

/// Retention window applied when no override is configured.
pub const DEFAULT_RETENTION_DAYS: i64 = 30;

/// Tag name marking snapshots owned by an automated backup system.
pub const PROTECTED_TAG_NAME: &str = "CreatedBy";

/// Tag value marking snapshots owned by an automated backup system.
pub const PROTECTED_TAG_VALUE: &str = "AzureBackup";

/// Pure predicate deciding whether a snapshot is eligible for deletion.
///
/// A snapshot is eligible only when it does not carry the protected
/// `CreatedBy=AzureBackup` tag and its creation instant is strictly older
/// than the retention window. A missing creation instant means the snapshot
/// is kept.
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    retention: Duration,
}

impl RetentionPolicy {
    /// Creates a policy with the given retention window in days.
    pub fn new(retention_days: i64) -> AppResult<Self> {
        if retention_days <= 0 {
            return Err(AppError::Validation(
                "retention window must be at least one day".to_owned(),
            ));
        }

        Ok(Self {
            retention: Duration::days(retention_days),
        })
    }

    /// Returns the retention window.
    #[must_use]
    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Returns `true` when the snapshot may be deleted at instant `now`.
    #[must_use]
    pub fn is_eligible(&self, snapshot: &Snapshot, now: DateTime<Utc>) -> bool {
        if snapshot.tag(PROTECTED_TAG_NAME) == Some(PROTECTED_TAG_VALUE) {
            return false;
        }

        match snapshot.time_created {
            Some(created) => created < now - self.retention,
            None => false,
        }
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            retention: Duration::days(DEFAULT_RETENTION_DAYS),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::{DateTime, Duration, Utc};
    use proptest::prelude::*;
    use proptest::test_runner::TestCaseError;
    use snapsweep_core::AppResult;

    use super::{PROTECTED_TAG_NAME, PROTECTED_TAG_VALUE, RetentionPolicy};
    use crate::{Snapshot, SnapshotId};

    fn snapshot(age: Option<Duration>, tags: &[(&str, &str)]) -> AppResult<Snapshot> {
        Ok(Snapshot {
            id: SnapshotId::new("/subscriptions/s/providers/Microsoft.Compute/snapshots/snap")?,
            tags: tags
                .iter()
                .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
                .collect::<HashMap<_, _>>(),
            time_created: age.map(|age| Utc::now() - age),
        })
    }

    #[test]
    fn backup_tagged_snapshot_is_never_eligible() -> AppResult<()> {
        let policy = RetentionPolicy::default();
        let snapshot = snapshot(
            Some(Duration::days(400)),
            &[(PROTECTED_TAG_NAME, PROTECTED_TAG_VALUE)],
        )?;
        assert!(!policy.is_eligible(&snapshot, Utc::now()));
        Ok(())
    }

    #[test]
    fn other_tag_values_do_not_protect() -> AppResult<()> {
        let policy = RetentionPolicy::default();
        let snapshot = snapshot(Some(Duration::days(40)), &[(PROTECTED_TAG_NAME, "manual")])?;
        assert!(policy.is_eligible(&snapshot, Utc::now()));
        Ok(())
    }

    #[test]
    fn boundary_is_strict() -> AppResult<()> {
        let policy = RetentionPolicy::default();
        let now = Utc::now();

        let mut snapshot = snapshot(None, &[])?;
        snapshot.time_created = Some(now - Duration::days(30));
        assert!(!policy.is_eligible(&snapshot, now));

        snapshot.time_created = Some(now - Duration::days(30) - Duration::seconds(1));
        assert!(policy.is_eligible(&snapshot, now));
        Ok(())
    }

    #[test]
    fn missing_timestamp_is_not_eligible() -> AppResult<()> {
        let policy = RetentionPolicy::default();
        let snapshot = snapshot(None, &[])?;
        assert!(!policy.is_eligible(&snapshot, Utc::now()));
        Ok(())
    }

    #[test]
    fn retention_window_must_be_positive() {
        assert!(RetentionPolicy::new(0).is_err());
        assert!(RetentionPolicy::new(-3).is_err());
    }

    fn arbitrary_tags() -> impl Strategy<Value = Vec<(String, String)>> {
        proptest::collection::vec(("[A-Za-z]{1,8}", "[A-Za-z]{1,8}"), 0..4)
    }

    proptest! {
        #[test]
        fn protected_tag_wins_regardless_of_age(age_days in 0_i64..3650, extra in arbitrary_tags()) {
            let policy = RetentionPolicy::default();
            let mut tags: Vec<(&str, &str)> = extra
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str()))
                .collect();
            tags.push((PROTECTED_TAG_NAME, PROTECTED_TAG_VALUE));
            let snapshot = snapshot(Some(Duration::days(age_days)), &tags)
                .map_err(|error| TestCaseError::fail(error.to_string()))?;
            prop_assert!(!policy.is_eligible(&snapshot, Utc::now()));
        }

        #[test]
        fn eligibility_is_monotonic_in_age(age_seconds in 0_i64..i64::from(u32::MAX)) {
            let policy = RetentionPolicy::default();
            let now = Utc::now();
            let snapshot = snapshot(Some(Duration::seconds(age_seconds)), &[])
                .map_err(|error| TestCaseError::fail(error.to_string()))?;
            let eligible = policy.is_eligible(&snapshot, now);
            let threshold: DateTime<Utc> = now - Duration::days(30);
            prop_assert_eq!(eligible, snapshot.time_created.is_some_and(|created| created < threshold));
        }
    }
}
