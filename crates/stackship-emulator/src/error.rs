//! Emulator error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error(
        "cannot reach the Docker daemon: {0}. Make sure Docker is running \
         and `docker ps` works"
    )]
    DaemonUnavailable(String),

    #[error("Docker error: {0}")]
    Docker(#[from] bollard::errors::Error),

    #[error("image pull failed: {0}")]
    ImagePull(String),
}

pub type Result<T> = std::result::Result<T, EmulatorError>;
