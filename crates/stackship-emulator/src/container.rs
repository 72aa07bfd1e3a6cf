//! Emulator container operations

use crate::error::{EmulatorError, Result};
use bollard::Docker;
use futures_util::stream::StreamExt;
use std::collections::HashMap;

pub const DEFAULT_IMAGE: &str = "localstack/localstack";
pub const CONTAINER_NAME: &str = "localstack-workshop";
const EDGE_PORT: &str = "4566/tcp";

/// Outcome of [`Emulator::ensure_running`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmulatorState {
    Started,
    AlreadyRunning,
}

/// Handle on the emulator container.
pub struct Emulator {
    docker: Docker,
    port: u16,
}

impl Emulator {
    /// Connect to the local Docker daemon and verify it answers.
    pub async fn connect(port: u16) -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| EmulatorError::DaemonUnavailable(e.to_string()))?;
        docker
            .ping()
            .await
            .map_err(|e| EmulatorError::DaemonUnavailable(e.to_string()))?;
        Ok(Self { docker, port })
    }

    pub fn docker(&self) -> &Docker {
        &self.docker
    }

    pub fn container_name(&self) -> &str {
        CONTAINER_NAME
    }

    /// Whether the emulator container exists and reports a running state.
    pub async fn is_running(&self) -> Result<bool> {
        match self
            .docker
            .inspect_container(
                CONTAINER_NAME,
                None::<bollard::query_parameters::InspectContainerOptions>,
            )
            .await
        {
            Ok(details) => Ok(details
                .state
                .and_then(|s| s.running)
                .unwrap_or(false)),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Create and start the emulator container, reusing an existing one.
    /// The image is pulled when the daemon does not have it yet.
    pub async fn ensure_running(&self, auth_token: Option<&str>) -> Result<EmulatorState> {
        if self.is_running().await? {
            return Ok(EmulatorState::AlreadyRunning);
        }

        let (options, config) = self.container_config(auth_token);

        match self
            .docker
            .create_container(Some(options.clone()), config.clone())
            .await
        {
            Ok(response) => {
                tracing::debug!("Created emulator container {}", response.id);
                self.start(&response.id).await?;
                Ok(EmulatorState::Started)
            }
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 409, ..
            }) => {
                // A stopped container with the same name still exists.
                self.start(CONTAINER_NAME).await?;
                Ok(EmulatorState::Started)
            }
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => {
                self.pull_image().await?;
                let response = self
                    .docker
                    .create_container(Some(options), config)
                    .await?;
                self.start(&response.id).await?;
                Ok(EmulatorState::Started)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn start(&self, id: &str) -> Result<()> {
        match self
            .docker
            .start_container(id, None::<bollard::query_parameters::StartContainerOptions>)
            .await
        {
            Ok(_) => Ok(()),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 304, ..
            }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Stop the container. Returns false when it was not running.
    pub async fn stop(&self) -> Result<bool> {
        match self
            .docker
            .stop_container(
                CONTAINER_NAME,
                None::<bollard::query_parameters::StopContainerOptions>,
            )
            .await
        {
            Ok(_) => Ok(true),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 304, ..
            }) => Ok(false),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the container; already-gone is fine.
    pub async fn remove(&self) -> Result<()> {
        match self
            .docker
            .remove_container(
                CONTAINER_NAME,
                None::<bollard::query_parameters::RemoveContainerOptions>,
            )
            .await
        {
            Ok(_) => Ok(()),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    #[allow(deprecated)]
    fn container_config(
        &self,
        auth_token: Option<&str>,
    ) -> (
        bollard::container::CreateContainerOptions<String>,
        bollard::container::Config<String>,
    ) {
        use bollard::container::{Config, CreateContainerOptions};
        use bollard::models::{HostConfig, PortBinding};

        let mut env = vec!["DEBUG=1".to_string()];
        if let Some(token) = auth_token {
            env.push(format!("LOCALSTACK_AUTH_TOKEN={}", token));
        }

        let mut exposed_ports = HashMap::new();
        exposed_ports.insert(EDGE_PORT.to_string(), HashMap::new());

        let mut port_bindings = HashMap::new();
        port_bindings.insert(
            EDGE_PORT.to_string(),
            Some(vec![PortBinding {
                host_ip: Some("0.0.0.0".to_string()),
                host_port: Some(self.port.to_string()),
            }]),
        );

        let host_config = HostConfig {
            port_bindings: Some(port_bindings),
            auto_remove: Some(true),
            ..Default::default()
        };

        let config = Config {
            image: Some(DEFAULT_IMAGE.to_string()),
            env: Some(env),
            exposed_ports: Some(exposed_ports),
            host_config: Some(host_config),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: CONTAINER_NAME.to_string(),
            ..Default::default()
        };

        (options, config)
    }

    #[allow(deprecated)]
    async fn pull_image(&self) -> Result<()> {
        tracing::debug!("Pulling image {}", DEFAULT_IMAGE);

        let options = bollard::image::CreateImageOptions {
            from_image: DEFAULT_IMAGE,
            tag: "latest",
            ..Default::default()
        };

        let mut stream = self.docker.create_image(Some(options), None, None);
        while let Some(info) = stream.next().await {
            match info {
                Ok(progress) => {
                    if let Some(status) = progress.status {
                        tracing::debug!("pull: {}", status);
                    }
                }
                Err(e) => return Err(EmulatorError::ImagePull(e.to_string())),
            }
        }
        Ok(())
    }
}
