//! Domain types for snapshot retention sweeps.

#![forbid(unsafe_code)]

mod email;
mod report;
mod retention;
mod snapshot;

pub use email::EmailAddress;
pub use report::CleanupReport;
pub use retention::{
    DEFAULT_RETENTION_DAYS, PROTECTED_TAG_NAME, PROTECTED_TAG_VALUE, RetentionPolicy,
};
pub use snapshot::{Snapshot, SnapshotId, Subscription, SubscriptionId};
