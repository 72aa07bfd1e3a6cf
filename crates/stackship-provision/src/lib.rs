//! Workflow layer: dependency-ordered provisioning, execution polling, and
//! best-effort teardown for the workshop pipeline.

pub mod bundle;
pub mod error;
pub mod poll;
pub mod provision;
pub mod sweep;

pub use error::{ProvisionError, Result};
pub use poll::Poller;
pub use provision::{
    EnsureOutcome, ProvisionReport, Provisioner, StepFailure, StepRecord, WorkshopAssets,
};
pub use sweep::{SweepReport, Sweeper};
