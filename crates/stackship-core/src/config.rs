//! Workshop configuration
//!
//! A flat mapping of resource names persisted as `workshop.json`. Missing
//! keys fall back to defaults, so a hand-edited partial file keeps working.
//! Derived names (buckets, build projects, role ARN) are computed from the
//! resource prefix and never stored.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Account ID the emulator reports for the placeholder credentials.
pub const EMULATOR_ACCOUNT_ID: &str = "000000000000";

/// Default config file name, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "workshop.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkshopConfig {
    pub role_name: String,
    pub domain_name: String,
    pub repo_name: String,
    pub connection_name: String,
    pub pipeline_name: String,
    pub github_repo: String,
    pub github_branch: String,
    /// Naming convention shared by every workshop resource. Teardown
    /// matches on this substring.
    pub resource_prefix: String,
}

impl Default for WorkshopConfig {
    fn default() -> Self {
        Self {
            role_name: "demo-role".to_string(),
            domain_name: "demo-domain".to_string(),
            repo_name: "demo-repo".to_string(),
            connection_name: "demo-connection".to_string(),
            pipeline_name: "demo-pipeline".to_string(),
            github_repo: "lodash/lodash".to_string(),
            github_branch: "4.17.21".to_string(),
            resource_prefix: "demo".to_string(),
        }
    }
}

/// Where a loaded configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    File,
    Defaults,
}

impl WorkshopConfig {
    /// Load the configuration from `path`, or fall back to defaults and
    /// persist them so the next run sees the same names.
    pub fn load_or_init(path: &Path) -> Result<(Self, ConfigSource)> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: WorkshopConfig = serde_json::from_str(&content)?;
            tracing::debug!("Loaded configuration from {}", path.display());
            Ok((config, ConfigSource::File))
        } else {
            let config = WorkshopConfig::default();
            config.save(path)?;
            tracing::debug!("Wrote default configuration to {}", path.display());
            Ok((config, ConfigSource::Defaults))
        }
    }

    /// Persist the configuration as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn source_bucket(&self) -> String {
        format!("{}-source-bucket", self.resource_prefix)
    }

    pub fn buildspec_bucket(&self) -> String {
        format!("{}-buildspecs", self.resource_prefix)
    }

    pub fn artifact_bucket(&self) -> String {
        format!("{}-artif-bucket", self.resource_prefix)
    }

    pub fn test_project(&self) -> String {
        format!("{}-test", self.resource_prefix)
    }

    pub fn publish_project(&self) -> String {
        format!("{}-publish", self.resource_prefix)
    }

    pub fn role_arn(&self) -> String {
        format!(
            "arn:aws:iam::{}:role/{}",
            EMULATOR_ACCOUNT_ID, self.role_name
        )
    }

    /// Whether a resource name belongs to this workshop.
    pub fn owns(&self, resource_name: &str) -> bool {
        resource_name
            .to_lowercase()
            .contains(&self.resource_prefix.to_lowercase())
    }
}

/// Credentials read from the environment exactly once, at process start,
/// and passed by parameter into the components that need them.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// LocalStack auth token, forwarded into the emulator container.
    pub auth_token: Option<String>,
    /// GitHub personal access token for the source-control connection.
    pub github_token: Option<String>,
}

impl Credentials {
    pub const AUTH_TOKEN_VAR: &'static str = "LOCALSTACK_AUTH_TOKEN";
    pub const GITHUB_TOKEN_VAR: &'static str = "CODEPIPELINE_GH_TOKEN";

    /// The single place the process environment is consulted.
    pub fn from_env() -> Self {
        Self {
            auth_token: std::env::var(Self::AUTH_TOKEN_VAR).ok().filter(|t| !t.is_empty()),
            github_token: std::env::var(Self::GITHUB_TOKEN_VAR).ok().filter(|t| !t.is_empty()),
        }
    }

    /// Mask a token for display: keep a short prefix and suffix. Counts
    /// characters, not bytes, so a token with multi-byte characters masks
    /// cleanly instead of panicking on a slice boundary.
    pub fn masked(token: &str) -> String {
        let chars: Vec<char> = token.chars().collect();
        if chars.len() > 12 {
            let prefix: String = chars[..8].iter().collect();
            let suffix: String = chars[chars.len() - 4..].iter().collect();
            format!("{}{}{}", prefix, "*".repeat(chars.len() - 12), suffix)
        } else {
            let prefix: String = chars.iter().take(4).collect();
            format!("{}****", prefix)
        }
    }
}
