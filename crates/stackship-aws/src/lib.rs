//! AWS CLI wrapper
//!
//! Drives the `aws` CLI as a subprocess against the LocalStack endpoint.
//! Exit code is authoritative; the JSON body is parsed only on success.
//! Failures are classified so that the emulator's not-found signal is
//! distinguishable from every other error; the provisioner depends on
//! this to tell "resource absent" apart from "emulator broken".

pub mod cli;
pub mod error;
pub mod ops;
pub mod types;

pub use cli::AwsCli;
pub use error::{AwsError, Result};
pub use ops::{AwsOps, BuildProjectSpec};
pub use types::*;
