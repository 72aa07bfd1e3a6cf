//! Execution polling: rebuilds a fresh snapshot of the latest pipeline run
//! on every tick and loops at a fixed cadence until a terminal status.

use std::time::Duration;

use stackship_aws::AwsOps;
use stackship_core::execution::{
    ActionSnapshot, ExecutionSnapshot, ExecutionStatus, StageSnapshot,
};

use crate::error::Result;

/// Cadence of the continuous monitor. Fixed, no backoff.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

pub struct Poller<'a> {
    aws: &'a dyn AwsOps,
    pipeline: &'a str,
}

impl<'a> Poller<'a> {
    pub fn new(aws: &'a dyn AwsOps, pipeline: &'a str) -> Self {
        Self { aws, pipeline }
    }

    /// One observation of the most recent execution. `None` means no usable
    /// data this tick: no execution has started yet, the pipeline is gone,
    /// or the emulator returned something unparseable. Transient transport
    /// errors still surface as errors.
    pub async fn snapshot(&self) -> Result<Option<ExecutionSnapshot>> {
        let executions = match self.aws.list_pipeline_executions(self.pipeline).await {
            Ok(executions) => executions,
            Err(err) if err.is_not_found() => return Ok(None),
            Err(stackship_aws::AwsError::Json(err)) => {
                tracing::debug!("Unparseable execution listing: {}", err);
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        let Some(latest) = executions.first() else {
            return Ok(None);
        };

        let details = match self
            .aws
            .list_action_executions(self.pipeline, &latest.pipeline_execution_id)
            .await
        {
            Ok(details) => details,
            Err(err) if err.is_not_found() => Vec::new(),
            Err(stackship_aws::AwsError::Json(err)) => {
                tracing::debug!("Unparseable action listing: {}", err);
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        // Group actions by stage, preserving the order stages first appear.
        let mut stages: Vec<StageSnapshot> = Vec::new();
        for detail in details {
            let action = ActionSnapshot {
                name: detail.action_name,
                status: ExecutionStatus::parse(&detail.status),
            };
            match stages.iter_mut().find(|s| s.name == detail.stage_name) {
                Some(stage) => stage.actions.push(action),
                None => stages.push(StageSnapshot {
                    name: detail.stage_name,
                    actions: vec![action],
                }),
            }
        }

        Ok(Some(ExecutionSnapshot {
            id: latest.pipeline_execution_id.clone(),
            status: ExecutionStatus::parse(&latest.status),
            started_at: latest.start_time_display(),
            last_updated_at: latest.last_update_display(),
            stages,
        }))
    }

    /// Poll at `interval` until the latest execution reaches a terminal
    /// status, invoking `observe` with every tick's snapshot (including the
    /// empty ones) so the caller can render progress.
    pub async fn wait_until_terminal(
        &self,
        interval: Duration,
        mut observe: impl FnMut(Option<&ExecutionSnapshot>),
    ) -> Result<ExecutionStatus> {
        loop {
            let snapshot = self.snapshot().await?;
            observe(snapshot.as_ref());
            if let Some(snapshot) = &snapshot {
                if snapshot.status.is_terminal() {
                    return Ok(snapshot.status);
                }
            }
            tokio::time::sleep(interval).await;
        }
    }
}
