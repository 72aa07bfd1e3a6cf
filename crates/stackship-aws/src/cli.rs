//! AWS CLI subprocess runner

use crate::error::{classify_failure, AwsError, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:4566";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Placeholder credentials the emulator accepts.
const PLACEHOLDER_KEY: &str = "test";
const PLACEHOLDER_SECRET: &str = "test";
const REGION: &str = "us-east-1";

/// Wrapper around the `aws` CLI pointed at the emulator endpoint.
///
/// One subprocess per operation; arguments in, JSON out. The exit code is
/// authoritative and stderr is captured into the error.
pub struct AwsCli {
    endpoint: String,
    timeout: Duration,
}

impl AwsCli {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run an aws subcommand and return stdout. Every call blocks the
    /// caller until the CLI returns or the per-call timeout elapses.
    pub(crate) async fn run(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new("aws");
        cmd.arg("--endpoint-url").arg(&self.endpoint);
        cmd.arg("--output").arg("json");
        cmd.args(args);
        cmd.env("AWS_ACCESS_KEY_ID", PLACEHOLDER_KEY);
        cmd.env("AWS_SECRET_ACCESS_KEY", PLACEHOLDER_SECRET);
        cmd.env("AWS_DEFAULT_REGION", REGION);
        cmd.env("AWS_PAGER", "");
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: aws {}", args.join(" "));

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(result) => result.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    AwsError::CliNotFound
                } else {
                    AwsError::Io(e)
                }
            })?,
            Err(_) => return Err(AwsError::Timeout(self.timeout)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let command = args.first().copied().unwrap_or("aws");
            return Err(classify_failure(command, &stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Run and deserialize stdout into `T`.
    pub(crate) async fn run_json<T: serde::de::DeserializeOwned>(
        &self,
        args: &[&str],
    ) -> Result<T> {
        let output = self.run(args).await?;
        Ok(serde_json::from_str(&output)?)
    }

    /// Run a command whose output is discarded (creates, deletes, copies).
    pub(crate) async fn run_unit(&self, args: &[&str]) -> Result<()> {
        self.run(args).await?;
        Ok(())
    }

    pub(crate) fn file_url(path: &Path) -> String {
        format!("file://{}", path.display())
    }
}

impl Default for AwsCli {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}
