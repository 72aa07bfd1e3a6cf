//! End-to-end workflow tests against an in-memory backend.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use stackship_aws::{
    ActionExecutionDetail, AwsError, AwsOps, BucketInfo, BuildProjectInfo, BuildProjectSpec,
    CallerIdentity, ConnectionInfo, DomainInfo, PackageSummary, PackageVersionSummary,
    PipelineExecutionSummary, PipelineSummary, RepositoryInfo, RoleInfo,
};
use stackship_core::config::{Credentials, WorkshopConfig};
use stackship_core::execution::ExecutionStatus;
use stackship_provision::{EnsureOutcome, Poller, Provisioner, Sweeper, WorkshopAssets};

#[derive(Default)]
struct FakeState {
    roles: Vec<String>,
    role_policies: HashMap<String, Vec<String>>,
    connections: Vec<(String, String)>,
    domains: Vec<String>,
    repos: HashMap<String, Vec<String>>,
    buckets: Vec<String>,
    objects: HashMap<String, Vec<String>>,
    projects: Vec<String>,
    pipelines: Vec<String>,
    /// Statuses handed out by successive execution listings.
    execution_statuses: Vec<&'static str>,
    /// Resource names whose deletion always fails.
    stuck: Vec<String>,
    /// Object keys whose upload always fails.
    failing_uploads: Vec<String>,
    /// Every creation, in the order it happened.
    creation_log: Vec<String>,
}

#[derive(Default)]
struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    fn log(state: &mut FakeState, entry: impl Into<String>) {
        state.creation_log.push(entry.into());
    }

    fn created(&self) -> Vec<String> {
        self.state.lock().unwrap().creation_log.clone()
    }

    fn not_found(what: &str) -> AwsError {
        AwsError::NotFound(what.to_string())
    }
}

#[async_trait]
impl AwsOps for FakeBackend {
    async fn caller_identity(&self) -> stackship_aws::Result<CallerIdentity> {
        Ok(CallerIdentity {
            account: "000000000000".to_string(),
            arn: None,
        })
    }

    async fn get_role(&self, name: &str) -> stackship_aws::Result<RoleInfo> {
        let state = self.state.lock().unwrap();
        if state.roles.iter().any(|r| r == name) {
            Ok(RoleInfo {
                role_name: name.to_string(),
                arn: None,
            })
        } else {
            Err(Self::not_found(name))
        }
    }

    async fn create_role(&self, name: &str, _assume_policy: &Path) -> stackship_aws::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.roles.push(name.to_string());
        Self::log(&mut state, format!("role:{}", name));
        Ok(())
    }

    async fn put_role_policy(
        &self,
        role: &str,
        policy_name: &str,
        _policy: &Path,
    ) -> stackship_aws::Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .role_policies
            .entry(role.to_string())
            .or_default()
            .push(policy_name.to_string());
        Ok(())
    }

    async fn list_roles(&self) -> stackship_aws::Result<Vec<RoleInfo>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .roles
            .iter()
            .map(|name| RoleInfo {
                role_name: name.clone(),
                arn: None,
            })
            .collect())
    }

    async fn list_role_policies(&self, role: &str) -> stackship_aws::Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        Ok(state.role_policies.get(role).cloned().unwrap_or_default())
    }

    async fn delete_role_policy(&self, role: &str, policy_name: &str) -> stackship_aws::Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(policies) = state.role_policies.get_mut(role) {
            policies.retain(|p| p != policy_name);
        }
        Ok(())
    }

    async fn delete_role(&self, name: &str) -> stackship_aws::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state
            .role_policies
            .get(name)
            .is_some_and(|p| !p.is_empty())
        {
            return Err(AwsError::CommandFailed {
                command: "iam delete-role".to_string(),
                stderr: "DeleteConflict: role has attached policies".to_string(),
            });
        }
        state.roles.retain(|r| r != name);
        Ok(())
    }

    async fn list_connections(&self) -> stackship_aws::Result<Vec<ConnectionInfo>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .connections
            .iter()
            .map(|(name, arn)| ConnectionInfo {
                connection_name: name.clone(),
                connection_arn: arn.clone(),
                connection_status: Some("AVAILABLE".to_string()),
            })
            .collect())
    }

    async fn create_connection(&self, name: &str) -> stackship_aws::Result<String> {
        let mut state = self.state.lock().unwrap();
        let arn = format!("arn:aws:codeconnections:::connection/{}", name);
        state.connections.push((name.to_string(), arn.clone()));
        Self::log(&mut state, format!("connection:{}", name));
        Ok(arn)
    }

    async fn delete_connection(&self, arn: &str) -> stackship_aws::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.connections.retain(|(_, a)| a != arn);
        Ok(())
    }

    async fn describe_domain(&self, domain: &str) -> stackship_aws::Result<DomainInfo> {
        let state = self.state.lock().unwrap();
        if state.domains.iter().any(|d| d == domain) {
            Ok(DomainInfo {
                name: domain.to_string(),
                status: Some("Active".to_string()),
            })
        } else {
            Err(Self::not_found(domain))
        }
    }

    async fn create_domain(&self, domain: &str) -> stackship_aws::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.domains.push(domain.to_string());
        Self::log(&mut state, format!("domain:{}", domain));
        Ok(())
    }

    async fn describe_repository(
        &self,
        domain: &str,
        repo: &str,
    ) -> stackship_aws::Result<RepositoryInfo> {
        let state = self.state.lock().unwrap();
        if state
            .repos
            .get(domain)
            .is_some_and(|repos| repos.iter().any(|r| r == repo))
        {
            Ok(RepositoryInfo {
                name: repo.to_string(),
                domain_name: Some(domain.to_string()),
                description: None,
            })
        } else {
            Err(Self::not_found(repo))
        }
    }

    async fn create_repository(&self, domain: &str, repo: &str) -> stackship_aws::Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.domains.iter().any(|d| d == domain) {
            return Err(Self::not_found(domain));
        }
        state
            .repos
            .entry(domain.to_string())
            .or_default()
            .push(repo.to_string());
        Self::log(&mut state, format!("repo:{}/{}", domain, repo));
        Ok(())
    }

    async fn list_domains(&self) -> stackship_aws::Result<Vec<DomainInfo>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .domains
            .iter()
            .map(|name| DomainInfo {
                name: name.clone(),
                status: None,
            })
            .collect())
    }

    async fn list_repositories_in_domain(
        &self,
        domain: &str,
    ) -> stackship_aws::Result<Vec<RepositoryInfo>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .repos
            .get(domain)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|name| RepositoryInfo {
                name,
                domain_name: Some(domain.to_string()),
                description: None,
            })
            .collect())
    }

    async fn delete_repository(&self, domain: &str, repo: &str) -> stackship_aws::Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(repos) = state.repos.get_mut(domain) {
            repos.retain(|r| r != repo);
        }
        Ok(())
    }

    async fn delete_domain(&self, domain: &str) -> stackship_aws::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.repos.get(domain).is_some_and(|r| !r.is_empty()) {
            return Err(AwsError::CommandFailed {
                command: "codeartifact delete-domain".to_string(),
                stderr: "ConflictException: domain is not empty".to_string(),
            });
        }
        state.domains.retain(|d| d != domain);
        Ok(())
    }

    async fn list_packages(
        &self,
        _domain: &str,
        _repo: &str,
    ) -> stackship_aws::Result<Vec<PackageSummary>> {
        Ok(Vec::new())
    }

    async fn list_package_versions(
        &self,
        _domain: &str,
        _repo: &str,
        _format: &str,
        _package: &str,
    ) -> stackship_aws::Result<Vec<PackageVersionSummary>> {
        Ok(Vec::new())
    }

    async fn repository_endpoint(
        &self,
        domain: &str,
        repo: &str,
        format: &str,
    ) -> stackship_aws::Result<String> {
        Ok(format!(
            "http://localhost:4566/{}/{}/{}/",
            format, domain, repo
        ))
    }

    async fn head_bucket(&self, bucket: &str) -> stackship_aws::Result<()> {
        let state = self.state.lock().unwrap();
        if state.buckets.iter().any(|b| b == bucket) {
            Ok(())
        } else {
            Err(Self::not_found(bucket))
        }
    }

    async fn head_object(&self, bucket: &str, key: &str) -> stackship_aws::Result<()> {
        let state = self.state.lock().unwrap();
        if state
            .objects
            .get(bucket)
            .is_some_and(|keys| keys.iter().any(|k| k == key))
        {
            Ok(())
        } else {
            Err(Self::not_found(key))
        }
    }

    async fn create_bucket(&self, bucket: &str) -> stackship_aws::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.buckets.push(bucket.to_string());
        Self::log(&mut state, format!("bucket:{}", bucket));
        Ok(())
    }

    async fn upload_object(
        &self,
        file: &Path,
        bucket: &str,
        key: &str,
    ) -> stackship_aws::Result<()> {
        assert!(file.is_file(), "upload source must exist: {}", file.display());
        let mut state = self.state.lock().unwrap();
        if state.failing_uploads.iter().any(|k| k == key) {
            return Err(AwsError::CommandFailed {
                command: "s3 cp".to_string(),
                stderr: "upload interrupted".to_string(),
            });
        }
        if !state.buckets.iter().any(|b| b == bucket) {
            return Err(Self::not_found(bucket));
        }
        state
            .objects
            .entry(bucket.to_string())
            .or_default()
            .push(key.to_string());
        Self::log(&mut state, format!("object:{}/{}", bucket, key));
        Ok(())
    }

    async fn list_buckets(&self) -> stackship_aws::Result<Vec<BucketInfo>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .buckets
            .iter()
            .map(|name| BucketInfo { name: name.clone() })
            .collect())
    }

    async fn empty_bucket(&self, bucket: &str) -> stackship_aws::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.objects.remove(bucket);
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> stackship_aws::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.objects.get(bucket).is_some_and(|o| !o.is_empty()) {
            return Err(AwsError::CommandFailed {
                command: "s3 rb".to_string(),
                stderr: "BucketNotEmpty".to_string(),
            });
        }
        state.buckets.retain(|b| b != bucket);
        Ok(())
    }

    async fn get_build_project(&self, name: &str) -> stackship_aws::Result<BuildProjectInfo> {
        let state = self.state.lock().unwrap();
        if state.projects.iter().any(|p| p == name) {
            Ok(BuildProjectInfo {
                name: name.to_string(),
                service_role: None,
            })
        } else {
            Err(Self::not_found(name))
        }
    }

    async fn create_build_project(&self, spec: &BuildProjectSpec) -> stackship_aws::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.projects.push(spec.name.clone());
        Self::log(&mut state, format!("project:{}", spec.name));
        Ok(())
    }

    async fn list_build_projects(&self) -> stackship_aws::Result<Vec<String>> {
        Ok(self.state.lock().unwrap().projects.clone())
    }

    async fn delete_build_project(&self, name: &str) -> stackship_aws::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.projects.retain(|p| p != name);
        Ok(())
    }

    async fn pipeline_exists(&self, name: &str) -> stackship_aws::Result<()> {
        let state = self.state.lock().unwrap();
        if state.pipelines.iter().any(|p| p == name) {
            Ok(())
        } else {
            Err(Self::not_found(name))
        }
    }

    async fn create_pipeline(&self, definition: &Path) -> stackship_aws::Result<()> {
        let content = std::fs::read_to_string(definition).map_err(AwsError::Io)?;
        let parsed: serde_json::Value = serde_json::from_str(&content).map_err(AwsError::Json)?;
        let name = parsed["name"].as_str().unwrap_or_default().to_string();
        let mut state = self.state.lock().unwrap();
        state.pipelines.push(name.clone());
        Self::log(&mut state, format!("pipeline:{}", name));
        Ok(())
    }

    async fn update_pipeline(&self, _definition: &Path) -> stackship_aws::Result<()> {
        Ok(())
    }

    async fn list_pipelines(&self) -> stackship_aws::Result<Vec<PipelineSummary>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .pipelines
            .iter()
            .map(|name| PipelineSummary { name: name.clone() })
            .collect())
    }

    async fn delete_pipeline(&self, name: &str) -> stackship_aws::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.stuck.iter().any(|s| s == name) {
            return Err(AwsError::CommandFailed {
                command: "codepipeline delete-pipeline".to_string(),
                stderr: "InternalError".to_string(),
            });
        }
        state.pipelines.retain(|p| p != name);
        Ok(())
    }

    async fn list_pipeline_executions(
        &self,
        _pipeline: &str,
    ) -> stackship_aws::Result<Vec<PipelineExecutionSummary>> {
        let mut state = self.state.lock().unwrap();
        if state.execution_statuses.is_empty() {
            return Ok(Vec::new());
        }
        let status = state.execution_statuses.remove(0);
        let summary: PipelineExecutionSummary = serde_json::from_value(serde_json::json!({
            "pipelineExecutionId": "exec-1",
            "status": status,
            "startTime": "2026-08-29T10:00:00Z",
        }))
        .map_err(AwsError::Json)?;
        Ok(vec![summary])
    }

    async fn list_action_executions(
        &self,
        _pipeline: &str,
        execution_id: &str,
    ) -> stackship_aws::Result<Vec<ActionExecutionDetail>> {
        assert_eq!(execution_id, "exec-1");
        let details: Vec<ActionExecutionDetail> = serde_json::from_value(serde_json::json!([
            {"stageName": "source", "actionName": "source-action", "status": "Succeeded"},
            {"stageName": "test", "actionName": "test-action", "status": "InProgress"},
        ]))
        .map_err(AwsError::Json)?;
        Ok(details)
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    assets: WorkshopAssets,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let templates = root.join("templates");
    let sample_app = root.join("sample-app");
    std::fs::create_dir(&templates).unwrap();
    std::fs::create_dir(&sample_app).unwrap();
    std::fs::write(templates.join("role.json"), "{\"Version\": \"2012-10-17\"}").unwrap();
    std::fs::write(templates.join("policy.json"), "{\"Version\": \"2012-10-17\"}").unwrap();
    std::fs::write(templates.join("demo-test.yaml"), "version: 0.2\n").unwrap();
    std::fs::write(templates.join("demo-publish.yaml"), "version: 0.2\n").unwrap();
    std::fs::write(sample_app.join("package.json"), "{}").unwrap();
    std::fs::write(sample_app.join("index.js"), "module.exports = {};\n").unwrap();
    let assets = WorkshopAssets::from_root(root);
    Fixture { _dir: dir, assets }
}

fn with_github_token() -> Credentials {
    Credentials {
        auth_token: None,
        github_token: Some("ghp_test".to_string()),
    }
}

#[tokio::test]
async fn fresh_run_creates_every_resource_in_dependency_order() {
    let fix = fixture();
    let config = WorkshopConfig::default();
    let credentials = with_github_token();
    let backend = FakeBackend::default();

    let report = Provisioner::new(&backend, &config, &credentials, &fix.assets)
        .run()
        .await;

    assert!(report.is_success(), "failure: {:?}", report.failure);
    assert_eq!(report.existing_count(), 0);
    // role, connection, domain, repo, 3 buckets, bundle + 2 buildspecs,
    // 2 build projects, pipeline
    assert_eq!(report.created_count(), 13);

    let log = backend.created();
    let position = |entry: &str| {
        log.iter()
            .position(|e| e == entry)
            .unwrap_or_else(|| panic!("{} missing from {:?}", entry, log))
    };

    // The role precedes everything that references its ARN.
    assert!(position("role:demo-role") < position("project:demo-test"));
    assert!(position("role:demo-role") < position("pipeline:demo-pipeline"));
    // The domain precedes its repository.
    assert!(position("domain:demo-domain") < position("repo:demo-domain/demo-repo"));
    // Buckets precede their objects.
    assert!(
        position("bucket:demo-source-bucket")
            < position("object:demo-source-bucket/source-code.zip")
    );
    assert!(
        position("bucket:demo-buildspecs") < position("object:demo-buildspecs/demo-test.yaml")
    );
    // Build projects precede the pipeline that references them.
    assert!(position("project:demo-test") < position("pipeline:demo-pipeline"));
    assert!(position("project:demo-publish") < position("pipeline:demo-pipeline"));
    // The pipeline is the last resource created.
    assert_eq!(log.last().map(String::as_str), Some("pipeline:demo-pipeline"));

    // The local bundle is removed after upload.
    assert!(!fix.assets.scratch_dir.join("source-code.zip").exists());
}

#[tokio::test]
async fn second_run_reports_everything_as_already_existing() {
    let fix = fixture();
    let config = WorkshopConfig::default();
    let credentials = with_github_token();
    let backend = FakeBackend::default();

    let provisioner = Provisioner::new(&backend, &config, &credentials, &fix.assets);
    let first = provisioner.run().await;
    assert!(first.is_success());
    let created_after_first = backend.created().len();

    let second = provisioner.run().await;
    assert!(second.is_success());
    assert_eq!(second.created_count(), 0);
    assert_eq!(second.existing_count(), first.steps.len());
    assert!(second
        .steps
        .iter()
        .all(|s| s.outcome == EnsureOutcome::AlreadyExists));
    // Nothing new hit the backend.
    assert_eq!(backend.created().len(), created_after_first);
}

#[tokio::test]
async fn missing_github_token_stops_at_the_connection_step() {
    let fix = fixture();
    let config = WorkshopConfig::default();
    let credentials = Credentials::default();
    let backend = FakeBackend::default();

    let report = Provisioner::new(&backend, &config, &credentials, &fix.assets)
        .run()
        .await;

    let failure = report.failure.expect("run should have failed");
    assert_eq!(failure.resource, "connection demo-connection");
    assert!(failure.reason.to_string().contains("CODEPIPELINE_GH_TOKEN"));

    // The role was already provisioned; nothing after the connection was.
    let log = backend.created();
    assert_eq!(log, vec!["role:demo-role".to_string()]);
}

#[tokio::test]
async fn failed_bundle_upload_still_removes_the_local_archive() {
    let fix = fixture();
    let config = WorkshopConfig::default();
    let credentials = with_github_token();
    let backend = FakeBackend::default();
    backend
        .state
        .lock()
        .unwrap()
        .failing_uploads
        .push("source-code.zip".to_string());

    let report = Provisioner::new(&backend, &config, &credentials, &fix.assets)
        .run()
        .await;

    let failure = report.failure.expect("the bundle upload should fail");
    assert_eq!(failure.resource, "object source-code.zip");
    assert!(failure.reason.to_string().contains("upload interrupted"));
    // No half-written archive lingers in the scratch directory.
    assert!(!fix.assets.scratch_dir.join("source-code.zip").exists());
}

#[tokio::test]
async fn sweep_removes_every_owned_resource_and_spares_the_rest() {
    let fix = fixture();
    let config = WorkshopConfig::default();
    let credentials = with_github_token();
    let backend = FakeBackend::default();

    let report = Provisioner::new(&backend, &config, &credentials, &fix.assets)
        .run()
        .await;
    assert!(report.is_success());

    // A foreign bucket that must survive the sweep.
    backend.create_bucket("unrelated-bucket").await.unwrap();

    let sweep = Sweeper::new(&backend, &config).sweep().await;
    assert!(sweep.is_clean(), "failures: {:?}", sweep.failed);

    let state = backend.state.lock().unwrap();
    assert!(state.pipelines.is_empty());
    assert!(state.projects.is_empty());
    assert!(state.connections.is_empty());
    assert!(state.domains.is_empty());
    assert!(state.roles.is_empty());
    assert_eq!(state.buckets, vec!["unrelated-bucket".to_string()]);
}

#[tokio::test]
async fn sweep_continues_past_individual_failures() {
    let config = WorkshopConfig::default();
    let backend = FakeBackend::default();
    {
        let mut state = backend.state.lock().unwrap();
        state.pipelines.push("demo-pipeline".to_string());
        state.stuck.push("demo-pipeline".to_string());
        state.domains.push("demo-domain".to_string());
        state
            .repos
            .insert("demo-domain".to_string(), vec!["demo-repo".to_string()]);
        state.roles.push("demo-role".to_string());
        state.buckets.push("demo-buildspecs".to_string());
    }

    let sweep = Sweeper::new(&backend, &config).sweep().await;

    // The stuck pipeline is reported, and every later category still ran.
    assert_eq!(sweep.failed.len(), 1);
    assert_eq!(sweep.failed[0].0, "pipeline demo-pipeline");
    assert!(sweep
        .deleted
        .iter()
        .any(|d| d == "package repository demo-domain/demo-repo"));
    assert!(sweep.deleted.iter().any(|d| d == "package domain demo-domain"));
    assert!(sweep.deleted.iter().any(|d| d == "bucket demo-buildspecs"));
    assert!(sweep.deleted.iter().any(|d| d == "IAM role demo-role"));

    let state = backend.state.lock().unwrap();
    assert!(state.domains.is_empty());
    assert!(state.roles.is_empty());
    assert_eq!(state.pipelines, vec!["demo-pipeline".to_string()]);
}

#[tokio::test]
async fn poller_groups_actions_by_stage_and_stops_on_terminal_status() {
    let backend = FakeBackend::default();
    {
        let mut state = backend.state.lock().unwrap();
        state.execution_statuses = vec!["InProgress", "InProgress", "Succeeded"];
    }

    let poller = Poller::new(&backend, "demo-pipeline");
    let mut ticks = 0;
    let status = poller
        .wait_until_terminal(Duration::ZERO, |snapshot| {
            ticks += 1;
            let snapshot = snapshot.expect("fake always has an execution");
            assert_eq!(snapshot.id, "exec-1");
            assert_eq!(snapshot.stages.len(), 2);
            assert_eq!(snapshot.stages[0].name, "source");
            assert_eq!(snapshot.stages[1].name, "test");
        })
        .await
        .unwrap();

    assert_eq!(status, ExecutionStatus::Succeeded);
    assert_eq!(ticks, 3);
}

#[tokio::test]
async fn poller_reports_no_data_when_nothing_has_run() {
    let backend = FakeBackend::default();
    let poller = Poller::new(&backend, "demo-pipeline");
    let snapshot = poller.snapshot().await.unwrap();
    assert!(snapshot.is_none());
}

#[tokio::test]
async fn missing_template_fails_before_touching_the_backend() {
    let dir = tempfile::tempdir().unwrap();
    let assets = WorkshopAssets {
        templates_dir: dir.path().join("absent"),
        sample_app_dir: dir.path().join("also-absent"),
        scratch_dir: dir.path().to_path_buf(),
    };
    let config = WorkshopConfig::default();
    let credentials = with_github_token();
    let backend = FakeBackend::default();

    let report = Provisioner::new(&backend, &config, &credentials, &assets)
        .run()
        .await;

    let failure = report.failure.expect("run should have failed");
    assert!(failure.reason.to_string().contains("asset"));
    assert!(backend.created().is_empty());
}
