//! Idempotent, dependency-ordered provisioning of the workshop pipeline.
//!
//! Every step probes for the resource first and only creates it when the
//! probe reports a genuine absence. The chain is fail-fast: the first step
//! that errors stops the run, and the report still carries everything that
//! happened before the failure.

use std::path::{Path, PathBuf};

use stackship_aws::{AwsOps, BuildProjectSpec};
use stackship_core::config::{Credentials, WorkshopConfig};
use stackship_core::pipeline::{PipelineDefinition, SOURCE_BUNDLE_KEY};

use crate::bundle;
use crate::error::{ProvisionError, Result};

/// What an idempotent step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    Created,
    AlreadyExists,
}

/// One completed step of a provisioning run.
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub resource: String,
    pub outcome: EnsureOutcome,
}

/// The step that stopped the run, with the error rendered for display.
#[derive(Debug)]
pub struct StepFailure {
    pub resource: String,
    pub reason: ProvisionError,
}

/// Summary of a provisioning run. The report is returned whether or not the
/// chain completed, so callers always have something to render.
#[derive(Debug, Default)]
pub struct ProvisionReport {
    pub steps: Vec<StepRecord>,
    pub failure: Option<StepFailure>,
}

impl ProvisionReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn created_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.outcome == EnsureOutcome::Created)
            .count()
    }

    pub fn existing_count(&self) -> usize {
        self.steps.len() - self.created_count()
    }

    fn record(&mut self, resource: impl Into<String>, outcome: EnsureOutcome) {
        let resource = resource.into();
        match outcome {
            EnsureOutcome::Created => tracing::info!("Created {}", resource),
            EnsureOutcome::AlreadyExists => tracing::debug!("{} already exists", resource),
        }
        self.steps.push(StepRecord { resource, outcome });
    }
}

/// On-disk inputs to provisioning: policy documents, buildspecs, and the
/// sample application that seeds the source bucket.
#[derive(Debug, Clone)]
pub struct WorkshopAssets {
    pub templates_dir: PathBuf,
    pub sample_app_dir: PathBuf,
    /// Where generated files (source bundle, pipeline definition) land.
    pub scratch_dir: PathBuf,
}

impl WorkshopAssets {
    pub const TRUST_POLICY: &'static str = "role.json";
    pub const PERMISSIONS_POLICY: &'static str = "policy.json";
    pub const BUILDSPECS: [&'static str; 2] = ["demo-test.yaml", "demo-publish.yaml"];
    pub const PIPELINE_DEFINITION: &'static str = "pipeline-definition.json";

    pub fn from_root(root: &Path) -> Self {
        Self {
            templates_dir: root.join("templates"),
            sample_app_dir: root.join("sample-app"),
            scratch_dir: root.to_path_buf(),
        }
    }

    fn template(&self, name: &str) -> Result<PathBuf> {
        let path = self.templates_dir.join(name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(ProvisionError::MissingAsset(path))
        }
    }
}

pub struct Provisioner<'a> {
    aws: &'a dyn AwsOps,
    config: &'a WorkshopConfig,
    credentials: &'a Credentials,
    assets: &'a WorkshopAssets,
}

impl<'a> Provisioner<'a> {
    pub fn new(
        aws: &'a dyn AwsOps,
        config: &'a WorkshopConfig,
        credentials: &'a Credentials,
        assets: &'a WorkshopAssets,
    ) -> Self {
        Self {
            aws,
            config,
            credentials,
            assets,
        }
    }

    /// Run the full chain. Dependencies come strictly before their
    /// dependents: role, connection, domain, repository, buckets and their
    /// objects, build projects, and the pipeline last.
    pub async fn run(&self) -> ProvisionReport {
        let mut report = ProvisionReport::default();
        if let Err((resource, reason)) = self.run_chain(&mut report).await {
            tracing::error!("Provisioning stopped at {}: {}", resource, reason);
            report.failure = Some(StepFailure { resource, reason });
        }
        report
    }

    async fn run_chain(
        &self,
        report: &mut ProvisionReport,
    ) -> std::result::Result<(), (String, ProvisionError)> {
        let at = |resource: &str| {
            let resource = resource.to_string();
            move |reason: ProvisionError| (resource, reason)
        };

        self.ensure_role(report)
            .await
            .map_err(at(&format!("IAM role {}", self.config.role_name)))?;
        self.ensure_connection(report)
            .await
            .map_err(at(&format!("connection {}", self.config.connection_name)))?;
        self.ensure_domain(report)
            .await
            .map_err(at(&format!("package domain {}", self.config.domain_name)))?;
        self.ensure_repository(report)
            .await
            .map_err(at(&format!("package repository {}", self.config.repo_name)))?;
        self.ensure_bucket(report, &self.config.source_bucket())
            .await
            .map_err(at(&format!("bucket {}", self.config.source_bucket())))?;
        self.ensure_source_bundle(report)
            .await
            .map_err(at(&format!("object {}", SOURCE_BUNDLE_KEY)))?;
        self.ensure_buildspecs(report)
            .await
            .map_err(at(&format!("bucket {}", self.config.buildspec_bucket())))?;
        self.ensure_bucket(report, &self.config.artifact_bucket())
            .await
            .map_err(at(&format!("bucket {}", self.config.artifact_bucket())))?;
        self.ensure_build_projects(report)
            .await
            .map_err(at("build projects"))?;
        self.ensure_pipeline(report)
            .await
            .map_err(at(&format!("pipeline {}", self.config.pipeline_name)))?;
        Ok(())
    }

    async fn ensure_role(&self, report: &mut ProvisionReport) -> Result<()> {
        let name = &self.config.role_name;
        let label = format!("IAM role {}", name);
        match self.aws.get_role(name).await {
            Ok(_) => {
                report.record(label, EnsureOutcome::AlreadyExists);
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                let trust = self.assets.template(WorkshopAssets::TRUST_POLICY)?;
                let policy = self.assets.template(WorkshopAssets::PERMISSIONS_POLICY)?;
                self.aws.create_role(name, &trust).await?;
                self.aws
                    .put_role_policy(name, &format!("{}-policy", name), &policy)
                    .await?;
                report.record(label, EnsureOutcome::Created);
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn ensure_connection(&self, report: &mut ProvisionReport) -> Result<()> {
        let name = &self.config.connection_name;
        let label = format!("connection {}", name);
        let existing = self.aws.list_connections().await?;
        if existing.iter().any(|c| c.connection_name == *name) {
            report.record(label, EnsureOutcome::AlreadyExists);
            return Ok(());
        }
        // Creating the connection is the one step that needs the GitHub
        // token, so the absence check happens here rather than at startup.
        if self.credentials.github_token.is_none() {
            return Err(ProvisionError::MissingCredential {
                var: Credentials::GITHUB_TOKEN_VAR,
                purpose: "the source-control connection needs a GitHub personal access token",
            });
        }
        let arn = self.aws.create_connection(name).await?;
        tracing::debug!(%arn, "created connection");
        report.record(label, EnsureOutcome::Created);
        Ok(())
    }

    async fn ensure_domain(&self, report: &mut ProvisionReport) -> Result<()> {
        let name = &self.config.domain_name;
        let label = format!("package domain {}", name);
        match self.aws.describe_domain(name).await {
            Ok(_) => report.record(label, EnsureOutcome::AlreadyExists),
            Err(err) if err.is_not_found() => {
                self.aws.create_domain(name).await?;
                report.record(label, EnsureOutcome::Created);
            }
            Err(err) => return Err(err.into()),
        }
        Ok(())
    }

    async fn ensure_repository(&self, report: &mut ProvisionReport) -> Result<()> {
        let domain = &self.config.domain_name;
        let repo = &self.config.repo_name;
        let label = format!("package repository {}/{}", domain, repo);
        match self.aws.describe_repository(domain, repo).await {
            Ok(_) => report.record(label, EnsureOutcome::AlreadyExists),
            Err(err) if err.is_not_found() => {
                self.aws.create_repository(domain, repo).await?;
                report.record(label, EnsureOutcome::Created);
            }
            Err(err) => return Err(err.into()),
        }
        Ok(())
    }

    async fn ensure_bucket(&self, report: &mut ProvisionReport, bucket: &str) -> Result<()> {
        let label = format!("bucket {}", bucket);
        match self.aws.head_bucket(bucket).await {
            Ok(()) => report.record(label, EnsureOutcome::AlreadyExists),
            Err(err) if err.is_not_found() => {
                self.aws.create_bucket(bucket).await?;
                report.record(label, EnsureOutcome::Created);
            }
            Err(err) => return Err(err.into()),
        }
        Ok(())
    }

    async fn ensure_object(
        &self,
        report: &mut ProvisionReport,
        file: &Path,
        bucket: &str,
        key: &str,
    ) -> Result<()> {
        let label = format!("object {}/{}", bucket, key);
        match self.aws.head_object(bucket, key).await {
            Ok(()) => report.record(label, EnsureOutcome::AlreadyExists),
            Err(err) if err.is_not_found() => {
                self.aws.upload_object(file, bucket, key).await?;
                report.record(label, EnsureOutcome::Created);
            }
            Err(err) => return Err(err.into()),
        }
        Ok(())
    }

    async fn ensure_source_bundle(&self, report: &mut ProvisionReport) -> Result<()> {
        let bucket = self.config.source_bucket();
        if let Err(err) = self.aws.head_object(&bucket, SOURCE_BUNDLE_KEY).await {
            if !err.is_not_found() {
                return Err(err.into());
            }
            let archive = self.assets.scratch_dir.join(SOURCE_BUNDLE_KEY);
            bundle::write_bundle(&self.assets.sample_app_dir, &archive)?;
            // The archive is transient; drop it whether or not the upload
            // went through, reporting the upload error first.
            let upload = self
                .aws
                .upload_object(&archive, &bucket, SOURCE_BUNDLE_KEY)
                .await;
            let removed = std::fs::remove_file(&archive);
            upload?;
            removed?;
            report.record(
                format!("object {}/{}", bucket, SOURCE_BUNDLE_KEY),
                EnsureOutcome::Created,
            );
        } else {
            report.record(
                format!("object {}/{}", bucket, SOURCE_BUNDLE_KEY),
                EnsureOutcome::AlreadyExists,
            );
        }
        Ok(())
    }

    async fn ensure_buildspecs(&self, report: &mut ProvisionReport) -> Result<()> {
        let bucket = self.config.buildspec_bucket();
        self.ensure_bucket(report, &bucket).await?;
        for name in WorkshopAssets::BUILDSPECS {
            let file = self.assets.template(name)?;
            self.ensure_object(report, &file, &bucket, name).await?;
        }
        Ok(())
    }

    async fn ensure_build_projects(&self, report: &mut ProvisionReport) -> Result<()> {
        let buildspec_bucket = self.config.buildspec_bucket();
        let role_arn = self.config.role_arn();
        let projects = [
            (self.config.test_project(), "demo-test.yaml"),
            (self.config.publish_project(), "demo-publish.yaml"),
        ];
        for (name, buildspec) in projects {
            let label = format!("build project {}", name);
            match self.aws.get_build_project(&name).await {
                Ok(_) => report.record(label, EnsureOutcome::AlreadyExists),
                Err(err) if err.is_not_found() => {
                    let spec = BuildProjectSpec {
                        name: name.clone(),
                        buildspec_arn: format!(
                            "arn:aws:s3:::{}/{}",
                            buildspec_bucket, buildspec
                        ),
                        service_role_arn: role_arn.clone(),
                    };
                    self.aws.create_build_project(&spec).await?;
                    report.record(label, EnsureOutcome::Created);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    async fn ensure_pipeline(&self, report: &mut ProvisionReport) -> Result<()> {
        let name = &self.config.pipeline_name;
        let label = format!("pipeline {}", name);

        let definition = PipelineDefinition::for_workshop(self.config);
        definition.validate()?;
        let path = self.assets.scratch_dir.join(WorkshopAssets::PIPELINE_DEFINITION);
        definition.write_to(&path)?;

        match self.aws.pipeline_exists(name).await {
            Ok(()) => {
                // Keep an existing pipeline in sync with the definition.
                self.aws.update_pipeline(&path).await?;
                report.record(label, EnsureOutcome::AlreadyExists);
            }
            Err(err) if err.is_not_found() => {
                self.aws.create_pipeline(&path).await?;
                report.record(label, EnsureOutcome::Created);
            }
            Err(err) => return Err(err.into()),
        }
        Ok(())
    }
}
