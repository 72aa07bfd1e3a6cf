//! LocalStack container lifecycle
//!
//! Manages the single emulator container through the Docker API: create or
//! reuse, pull the image when missing, stop and remove. Container
//! operations are idempotent by matching the Docker daemon's status codes
//! (409 exists, 304 unchanged, 404 gone).

pub mod container;
pub mod error;

pub use container::{Emulator, EmulatorState};
pub use error::{EmulatorError, Result};
