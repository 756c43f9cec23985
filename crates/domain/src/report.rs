//! Aggregated result of one cleanup run, rendered into a notification.

use crate::SnapshotId;

/// Ordered record of the snapshots deleted during one run.
///
/// Identifiers keep discovery order: across subscriptions in listing order,
/// then within each subscription's listing. The report is built once per run
/// and consumed once by the notifier.
#[derive(Debug, Clone, Default)]
pub struct CleanupReport {
    deleted: Vec<SnapshotId>,
}

impl CleanupReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a successfully deleted snapshot.
    pub fn record_deleted(&mut self, snapshot_id: SnapshotId) {
        self.deleted.push(snapshot_id);
    }

    /// Returns the deleted identifiers in discovery order.
    #[must_use]
    pub fn deleted(&self) -> &[SnapshotId] {
        &self.deleted
    }

    /// Returns the number of deleted snapshots.
    #[must_use]
    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }

    /// Subject line for the notification email.
    #[must_use]
    pub fn subject(&self) -> String {
        if self.deleted.is_empty() {
            "No snapshots deleted".to_owned()
        } else {
            format!("{} Snapshot(s) Deleted", self.deleted.len())
        }
    }

    /// Plain-text body: newline-joined identifiers, empty when nothing
    /// was deleted.
    #[must_use]
    pub fn text_body(&self) -> String {
        self.deleted
            .iter()
            .map(SnapshotId::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// HTML body wrapping the plain-text content.
    #[must_use]
    pub fn html_body(&self) -> String {
        format!(
            "<html><body><h1>{}</h1></body></html>",
            self.text_body().replace('\n', "<br>")
        )
    }
}

#[cfg(test)]
mod tests {
    use snapsweep_core::AppResult;

    use super::CleanupReport;
    use crate::SnapshotId;

    #[test]
    fn empty_report_has_none_subject_and_empty_body() {
        let report = CleanupReport::new();
        assert_eq!(report.subject(), "No snapshots deleted");
        assert_eq!(report.text_body(), "");
    }

    #[test]
    fn subject_counts_deletions() -> AppResult<()> {
        let mut report = CleanupReport::new();
        report.record_deleted(SnapshotId::new("/subscriptions/a/snapshots/one")?);
        report.record_deleted(SnapshotId::new("/subscriptions/b/snapshots/two")?);
        assert_eq!(report.subject(), "2 Snapshot(s) Deleted");
        Ok(())
    }

    #[test]
    fn body_joins_identifiers_in_discovery_order() -> AppResult<()> {
        let mut report = CleanupReport::new();
        report.record_deleted(SnapshotId::new("first")?);
        report.record_deleted(SnapshotId::new("second")?);
        assert_eq!(report.text_body(), "first\nsecond");
        Ok(())
    }

    #[test]
    fn html_body_wraps_identifiers() -> AppResult<()> {
        let mut report = CleanupReport::new();
        report.record_deleted(SnapshotId::new("only")?);
        assert_eq!(report.html_body(), "<html><body><h1>only</h1></body></html>");
        Ok(())
    }
}
