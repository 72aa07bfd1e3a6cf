//! Execution status snapshot
//!
//! A point-in-time view of one pipeline run, rebuilt fresh on every poll.
//! Stage progress is derived from action statuses for display only; the
//! emulator remains the authority on actual state.

use serde::{Deserialize, Serialize};

/// Status vocabulary reported by the emulator for pipeline executions and
/// the actions inside them. Unrecognized strings map to `Unknown` instead
/// of failing the poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    InProgress,
    Succeeded,
    Failed,
    Cancelled,
    Superseded,
    #[serde(other)]
    Unknown,
}

impl ExecutionStatus {
    pub fn parse(value: &str) -> Self {
        match value {
            "InProgress" => Self::InProgress,
            "Succeeded" => Self::Succeeded,
            "Failed" => Self::Failed,
            "Cancelled" => Self::Cancelled,
            "Superseded" => Self::Superseded,
            _ => Self::Unknown,
        }
    }

    /// The continuous monitor stops on these.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InProgress => "InProgress",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Cancelled => "Cancelled",
            Self::Superseded => "Superseded",
            Self::Unknown => "Unknown",
        };
        write!(f, "{}", s)
    }
}

/// Snapshot of one pipeline execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSnapshot {
    pub id: String,
    pub status: ExecutionStatus,
    pub started_at: Option<String>,
    pub last_updated_at: Option<String>,
    pub stages: Vec<StageSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSnapshot {
    pub name: String,
    pub actions: Vec<ActionSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionSnapshot {
    pub name: String,
    pub status: ExecutionStatus,
}

/// Derived, presentation-only stage status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageProgress {
    Completed,
    InProgress,
    Pending,
}

impl StageSnapshot {
    /// Completed when every action succeeded, in progress when any action
    /// is running, pending otherwise.
    pub fn progress(&self) -> StageProgress {
        if !self.actions.is_empty()
            && self
                .actions
                .iter()
                .all(|a| a.status == ExecutionStatus::Succeeded)
        {
            StageProgress::Completed
        } else if self
            .actions
            .iter()
            .any(|a| a.status == ExecutionStatus::InProgress)
        {
            StageProgress::InProgress
        } else {
            StageProgress::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(statuses: &[ExecutionStatus]) -> StageSnapshot {
        StageSnapshot {
            name: "test".to_string(),
            actions: statuses
                .iter()
                .enumerate()
                .map(|(i, s)| ActionSnapshot {
                    name: format!("action-{}", i),
                    status: *s,
                })
                .collect(),
        }
    }

    #[test]
    fn status_parsing_and_terminality() {
        assert_eq!(ExecutionStatus::parse("Succeeded"), ExecutionStatus::Succeeded);
        assert_eq!(ExecutionStatus::parse("Stopping"), ExecutionStatus::Unknown);

        assert!(ExecutionStatus::Succeeded.is_terminal());
        assert!(ExecutionStatus::Failed.is_terminal());
        assert!(ExecutionStatus::Cancelled.is_terminal());
        assert!(!ExecutionStatus::InProgress.is_terminal());
        assert!(!ExecutionStatus::Superseded.is_terminal());
        assert!(!ExecutionStatus::Unknown.is_terminal());
    }

    #[test]
    fn stage_progress_rules() {
        use ExecutionStatus::*;

        assert_eq!(stage(&[Succeeded, Succeeded]).progress(), StageProgress::Completed);
        assert_eq!(stage(&[Succeeded, InProgress]).progress(), StageProgress::InProgress);
        assert_eq!(stage(&[Failed, InProgress]).progress(), StageProgress::InProgress);
        assert_eq!(stage(&[Failed]).progress(), StageProgress::Pending);
        assert_eq!(stage(&[]).progress(), StageProgress::Pending);
    }
}
