//! Background "update available" notice.
//!
//! The check is spawned when a command starts and collected when it ends.
//! Collection waits at most a fixed budget; a check that has not finished by
//! then is dropped without a message.

use std::time::Duration;

use tokio::task::JoinHandle;

use crate::updater::{SelfUpdater, UpdateStatus, is_dev_build};

/// Environment variable that disables the notice when non-empty.
pub const NO_UPDATE_CHECK_ENV_VAR: &str = "TRELLIS_NO_UPDATE_CHECK";

/// Longest time [`UpdateNotice::finish`] waits for the check.
pub const NOTICE_BUDGET: Duration = Duration::from_secs(3);

/// Returns `true` unless the environment toggle is set or `version` is a
/// development build.
#[must_use]
pub fn notice_enabled(version: &str) -> bool {
    let disabled = std::env::var_os(NO_UPDATE_CHECK_ENV_VAR).is_some_and(|v| !v.is_empty());
    !disabled && !is_dev_build(version)
}

/// A pending background update check.
#[derive(Debug)]
pub struct UpdateNotice {
    task: Option<JoinHandle<Option<String>>>,
}

impl UpdateNotice {
    /// Starts the check on the current tokio runtime.
    #[must_use]
    pub fn spawn(updater: SelfUpdater) -> Self {
        let task = tokio::spawn(async move {
            match updater.check().await {
                Ok(UpdateStatus::Available {
                    current, latest, ..
                }) => Some(format!(
                    "trellis {latest} is available (you have {current}). Run 'trellis update' to upgrade."
                )),
                Ok(UpdateStatus::UpToDate { .. }) => None,
                Err(e) => {
                    tracing::debug!(error = %e, "update check failed");
                    None
                }
            }
        });

        Self { task: Some(task) }
    }

    /// A notice that never produces a message.
    #[must_use]
    pub fn disabled() -> Self {
        Self { task: None }
    }

    /// Waits up to `budget` for the check and returns its message, if any.
    pub async fn finish(self, budget: Duration) -> Option<String> {
        let mut task = self.task?;

        if let Ok(joined) = tokio::time::timeout(budget, &mut task).await {
            joined.ok().flatten()
        } else {
            task.abort();
            tracing::debug!("update check exceeded its budget");
            None
        }
    }
}
