//! Orchestrates one cleanup run: scan, filter, delete, notify.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use snapsweep_core::AppResult;
use snapsweep_domain::{CleanupReport, EmailAddress, RetentionPolicy, SnapshotId};

use crate::cleanup_ports::{EmailService, ResourceManagerApi, TokenCredential};

/// Summary of one completed cleanup run.
#[derive(Debug)]
pub struct CleanupOutcome {
    /// Identifier correlating all log lines of this run.
    pub run_id: Uuid,
    /// Number of subscriptions scanned.
    pub scanned_subscriptions: usize,
    /// Number of snapshots inspected across all subscriptions.
    pub scanned_snapshots: usize,
    /// Snapshots deleted, in discovery order.
    pub deleted: Vec<SnapshotId>,
    /// Eligible snapshots whose delete call was rejected.
    pub failed_deletions: usize,
}

/// Application service driving the scan-filter-delete-notify pipeline.
///
/// One run is a single linear pass: acquire a token, walk every
/// subscription's snapshot listing, delete eligible snapshots, then send
/// exactly one report email. Listing failures abort the run before any
/// notification; individual delete failures only exclude that snapshot
/// from the report.
pub struct CleanupService {
    credential: Arc<dyn TokenCredential>,
    resource_api: Arc<dyn ResourceManagerApi>,
    email_service: Arc<dyn EmailService>,
    policy: RetentionPolicy,
    report_to: EmailAddress,
}

impl CleanupService {
    /// Creates a new cleanup service.
    #[must_use]
    pub fn new(
        credential: Arc<dyn TokenCredential>,
        resource_api: Arc<dyn ResourceManagerApi>,
        email_service: Arc<dyn EmailService>,
        policy: RetentionPolicy,
        report_to: EmailAddress,
    ) -> Self {
        Self {
            credential,
            resource_api,
            email_service,
            policy,
            report_to,
        }
    }

    /// Executes one cleanup run.
    pub async fn run(&self) -> AppResult<CleanupOutcome> {
        let run_id = Uuid::new_v4();
        info!(run_id = %run_id, "cleanup run started");

        let token = self.credential.management_token().await?;
        let subscriptions = self.resource_api.list_subscriptions(&token).await?;
        let now = Utc::now();

        let mut report = CleanupReport::new();
        let mut scanned_snapshots = 0_usize;
        let mut failed_deletions = 0_usize;

        for subscription in &subscriptions {
            let snapshots = self
                .resource_api
                .list_snapshots(&token, &subscription.id)
                .await?;

            info!(
                run_id = %run_id,
                subscription = %subscription.id,
                display_name = subscription.display_name.as_deref().unwrap_or(""),
                snapshot_count = snapshots.len(),
                "scanning subscription"
            );
            scanned_snapshots += snapshots.len();

            for snapshot in snapshots {
                if !self.policy.is_eligible(&snapshot, now) {
                    continue;
                }

                if self.resource_api.delete_snapshot(&token, &snapshot.id).await {
                    info!(run_id = %run_id, snapshot = %snapshot.id, "snapshot deleted");
                    report.record_deleted(snapshot.id);
                } else {
                    failed_deletions += 1;
                    warn!(
                        run_id = %run_id,
                        snapshot = %snapshot.id,
                        "snapshot delete failed, excluded from report"
                    );
                }
            }
        }

        match self
            .email_service
            .send_email(
                self.report_to.as_str(),
                report.subject().as_str(),
                report.text_body().as_str(),
                Some(report.html_body().as_str()),
            )
            .await
        {
            Ok(()) => info!(
                run_id = %run_id,
                to = self.report_to.as_str(),
                subject = report.subject().as_str(),
                "cleanup report sent"
            ),
            Err(error) => {
                warn!(run_id = %run_id, error = %error, "failed to send cleanup report");
                return Err(error);
            }
        }

        let outcome = CleanupOutcome {
            run_id,
            scanned_subscriptions: subscriptions.len(),
            scanned_snapshots,
            deleted: report.deleted().to_vec(),
            failed_deletions,
        };

        info!(
            run_id = %run_id,
            scanned_subscriptions = outcome.scanned_subscriptions,
            scanned_snapshots = outcome.scanned_snapshots,
            deleted = outcome.deleted.len(),
            failed_deletions = outcome.failed_deletions,
            "cleanup run finished"
        );

        Ok(outcome)
    }
}
