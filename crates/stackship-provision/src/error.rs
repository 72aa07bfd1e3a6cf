use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProvisionError>;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Aws(#[from] stackship_aws::AwsError),

    #[error(transparent)]
    Core(#[from] stackship_core::CoreError),

    #[error("{var} is not set; {purpose}")]
    MissingCredential { var: &'static str, purpose: &'static str },

    #[error("required asset not found: {0}")]
    MissingAsset(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to build source bundle: {0}")]
    Bundle(#[from] zip::result::ZipError),
}
