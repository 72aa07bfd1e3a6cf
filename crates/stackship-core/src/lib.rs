//! Stackship core models
//!
//! Shared types for the workshop toolkit: the persisted workshop
//! configuration, the credentials read once at process start, the
//! CodePipeline definition document, and the execution status snapshot
//! the poller renders.

pub mod config;
pub mod error;
pub mod execution;
pub mod pipeline;

pub use config::{ConfigSource, Credentials, WorkshopConfig};
pub use error::{CoreError, Result};
pub use execution::{
    ActionSnapshot, ExecutionSnapshot, ExecutionStatus, StageProgress, StageSnapshot,
};
pub use pipeline::{
    ActionDeclaration, ActionTypeId, ArtifactRef, ArtifactStore, PipelineDefinition,
    StageDeclaration,
};
