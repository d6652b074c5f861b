//! Supervisor for flush reports.
//!
//! Every submission ends with a [`FlushReport`]. The supervisor logs the
//! outcome and keeps running totals, so a lost submission is always visible
//! in the logs even though nothing retries it.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use tipline_album::{FlushError, FlushReport};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReportStats {
    /// Reached the review chat and the submitter was acknowledged.
    pub delivered: u64,
    /// Never reached the review chat.
    pub lost: u64,
    /// A split album of which only the first groups reached the review chat.
    pub partial: u64,
    /// Reached the review chat, but the acknowledgment failed.
    pub unacknowledged: u64,
}

impl ReportStats {
    fn record(&mut self, report: &FlushReport) {
        match &report.result {
            Ok(()) => {
                self.delivered += 1;
                info!(
                    submission = %report.submission,
                    chat = %report.chat_id,
                    items = report.items,
                    album = report.group_id.is_some(),
                    "Submission forwarded for review"
                );
            }
            Err(e) if e.is_lost() => {
                // The flusher already logged the error itself.
                self.lost += 1;
                warn!(
                    submission = %report.submission,
                    lost_total = self.lost,
                    "Submission lost"
                );
            }
            Err(FlushError::Partial { sent, total, .. }) => {
                self.partial += 1;
                warn!(
                    submission = %report.submission,
                    chat = %report.chat_id,
                    sent,
                    total,
                    "Submission partially forwarded"
                );
            }
            Err(_) => {
                self.unacknowledged += 1;
                warn!(
                    submission = %report.submission,
                    chat = %report.chat_id,
                    "Submission forwarded but not acknowledged"
                );
            }
        }
    }
}

/// Consume reports until every flusher handle is gone.
pub fn spawn_supervisor(
    mut reports: mpsc::UnboundedReceiver<FlushReport>,
) -> JoinHandle<ReportStats> {
    tokio::spawn(async move {
        let mut stats = ReportStats::default();
        while let Some(report) = reports.recv().await {
            stats.record(&report);
        }
        stats
    })
}
