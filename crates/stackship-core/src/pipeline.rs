//! Pipeline definition document
//!
//! Typed model of the CodePipeline structure the setup command submits to
//! the emulator: a pipeline holds ordered stages, each stage an ordered list
//! of actions naming their provider, declared artifacts, and provider
//! configuration. The document is generated once per run, written to disk,
//! and passed to the CLI by file reference.

use crate::config::WorkshopConfig;
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineDefinition {
    pub pipeline_type: String,
    pub name: String,
    pub role_arn: String,
    pub artifact_store: ArtifactStore,
    pub stages: Vec<StageDeclaration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactStore {
    #[serde(rename = "type")]
    pub store_type: String,
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageDeclaration {
    pub name: String,
    pub actions: Vec<ActionDeclaration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDeclaration {
    pub name: String,
    pub action_type_id: ActionTypeId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_artifacts: Vec<ArtifactRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_artifacts: Vec<ArtifactRef>,
    pub configuration: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionTypeId {
    pub category: String,
    pub owner: String,
    pub provider: String,
    pub version: String,
}

impl ActionTypeId {
    fn aws(category: &str, provider: &str) -> Self {
        Self {
            category: category.to_string(),
            owner: "AWS".to_string(),
            provider: provider.to_string(),
            version: "1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub name: String,
}

impl ArtifactRef {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

/// Name of the artifact the source stage produces and the later stages
/// consume. The wiring is checked by [`PipelineDefinition::validate`].
pub const SOURCE_ARTIFACT: &str = "source-code";

/// Key under which the source bundle is stored in the source bucket.
pub const SOURCE_BUNDLE_KEY: &str = "source-code.zip";

impl PipelineDefinition {
    /// Build the three-stage workshop pipeline: fetch the source bundle
    /// from S3, run the test project, then the publish project.
    pub fn for_workshop(config: &WorkshopConfig) -> Self {
        let source_action = ActionDeclaration {
            name: "get-source-code".to_string(),
            action_type_id: ActionTypeId::aws("Source", "S3"),
            input_artifacts: Vec::new(),
            output_artifacts: vec![ArtifactRef::named(SOURCE_ARTIFACT)],
            configuration: BTreeMap::from([
                ("S3Bucket".to_string(), config.source_bucket()),
                ("S3ObjectKey".to_string(), SOURCE_BUNDLE_KEY.to_string()),
                ("PollForSourceChanges".to_string(), "false".to_string()),
            ]),
        };

        let test_action = ActionDeclaration {
            name: "run-tests".to_string(),
            action_type_id: ActionTypeId::aws("Test", "CodeBuild"),
            input_artifacts: vec![ArtifactRef::named(SOURCE_ARTIFACT)],
            output_artifacts: Vec::new(),
            configuration: BTreeMap::from([(
                "ProjectName".to_string(),
                config.test_project(),
            )]),
        };

        let publish_action = ActionDeclaration {
            name: "publish-package".to_string(),
            action_type_id: ActionTypeId::aws("Build", "CodeBuild"),
            input_artifacts: vec![ArtifactRef::named(SOURCE_ARTIFACT)],
            output_artifacts: Vec::new(),
            configuration: BTreeMap::from([(
                "ProjectName".to_string(),
                config.publish_project(),
            )]),
        };

        Self {
            pipeline_type: "V1".to_string(),
            name: config.pipeline_name.clone(),
            role_arn: config.role_arn(),
            artifact_store: ArtifactStore {
                store_type: "S3".to_string(),
                location: config.artifact_bucket(),
            },
            stages: vec![
                StageDeclaration {
                    name: "source".to_string(),
                    actions: vec![source_action],
                },
                StageDeclaration {
                    name: "test".to_string(),
                    actions: vec![test_action],
                },
                StageDeclaration {
                    name: "publish".to_string(),
                    actions: vec![publish_action],
                },
            ],
        }
    }

    /// Check the artifact wiring: every input artifact an action consumes
    /// must have been produced as an output by an earlier stage.
    pub fn validate(&self) -> Result<()> {
        if self.stages.is_empty() {
            return Err(CoreError::InvalidPipeline("pipeline has no stages".into()));
        }

        let mut produced: Vec<&str> = Vec::new();
        for stage in &self.stages {
            if stage.actions.is_empty() {
                return Err(CoreError::InvalidPipeline(format!(
                    "stage '{}' has no actions",
                    stage.name
                )));
            }
            for action in &stage.actions {
                for input in &action.input_artifacts {
                    if !produced.contains(&input.name.as_str()) {
                        return Err(CoreError::InvalidPipeline(format!(
                            "stage '{}' action '{}' consumes artifact '{}' that no earlier stage produces",
                            stage.name, action.name, input.name
                        )));
                    }
                }
            }
            // Outputs become visible to later stages only, never to actions
            // within the same stage.
            for action in &stage.actions {
                for output in &action.output_artifacts {
                    produced.push(output.name.as_str());
                }
            }
        }
        Ok(())
    }

    /// Write the definition to `path` as pretty-printed JSON.
    pub fn write_to(&self, path: &std::path::Path) -> Result<()> {
        self.validate()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
