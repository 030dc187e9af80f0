//! Cleanup Use Case
//!
//! Deletes finished background tasks and processed request logs. The two
//! deletions are independent: one failing does not skip the other.

use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

use crate::application::config::SchedulerConfig;
use crate::domain::entities::{CleanupCriteria, CleanupReport};
use crate::domain::repository::CleanupRepository;

/// Cutoff `retention` before `now`, saturating at the minimum timestamp
pub(crate) fn cutoff(now: DateTime<Utc>, retention: Duration) -> DateTime<Utc> {
    let delta = TimeDelta::from_std(retention).unwrap_or(TimeDelta::MAX);
    now.checked_sub_signed(delta)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub async fn run_cleanup<C>(
    repo: &C,
    config: &SchedulerConfig,
    now: DateTime<Utc>,
) -> CleanupReport
where
    C: CleanupRepository + Sync,
{
    let tasks = CleanupCriteria::BackgroundTasks {
        terminal_before: cutoff(now, config.task_retention),
        now,
    };
    let tasks_deleted = match repo.delete_matching(&tasks).await {
        Ok(deleted) => Some(deleted),
        Err(e) => {
            tracing::warn!(error = %e, "Background task cleanup failed");
            None
        }
    };

    let logs = CleanupCriteria::RequestLogs {
        processed_before: cutoff(now, config.request_log_retention),
    };
    let request_logs_deleted = match repo.delete_matching(&logs).await {
        Ok(deleted) => Some(deleted),
        Err(e) => {
            tracing::warn!(error = %e, "Request log cleanup failed");
            None
        }
    };

    tracing::info!(
        tasks = tasks_deleted,
        request_logs = request_logs_deleted,
        "Cleanup run completed"
    );

    CleanupReport {
        tasks_deleted,
        request_logs_deleted,
    }
}
