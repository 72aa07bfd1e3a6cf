//! Emulator operations trait
//!
//! The seam between the workflows (provision / sweep / poll) and the real
//! CLI. [`AwsCli`] is the live implementation; tests drive the workflows
//! through an in-memory fake.

use crate::cli::AwsCli;
use crate::error::{AwsError, Result};
use crate::types::*;
use async_trait::async_trait;
use std::path::Path;

/// Parameters for a CodeBuild project creation.
#[derive(Debug, Clone)]
pub struct BuildProjectSpec {
    pub name: String,
    /// S3 ARN of the buildspec file, e.g. `arn:aws:s3:::demo-buildspecs/demo-test.yaml`.
    pub buildspec_arn: String,
    pub service_role_arn: String,
}

const BUILD_IMAGE: &str = "aws/codebuild/amazonlinux-x86_64-standard:5.0";
const BUILD_COMPUTE: &str = "BUILD_GENERAL1_SMALL";

/// Every emulator operation the toolkit performs. Existence checks return
/// [`AwsError::NotFound`] when the resource is genuinely absent; any other
/// failure keeps its own error so callers never conflate "absent" with
/// "emulator unreachable".
#[async_trait]
pub trait AwsOps: Send + Sync {
    // sts
    async fn caller_identity(&self) -> Result<CallerIdentity>;

    // iam
    async fn get_role(&self, name: &str) -> Result<RoleInfo>;
    async fn create_role(&self, name: &str, assume_policy: &Path) -> Result<()>;
    async fn put_role_policy(&self, role: &str, policy_name: &str, policy: &Path) -> Result<()>;
    async fn list_roles(&self) -> Result<Vec<RoleInfo>>;
    async fn list_role_policies(&self, role: &str) -> Result<Vec<String>>;
    async fn delete_role_policy(&self, role: &str, policy_name: &str) -> Result<()>;
    async fn delete_role(&self, name: &str) -> Result<()>;

    // codeconnections
    async fn list_connections(&self) -> Result<Vec<ConnectionInfo>>;
    async fn create_connection(&self, name: &str) -> Result<String>;
    async fn delete_connection(&self, arn: &str) -> Result<()>;

    // codeartifact
    async fn describe_domain(&self, domain: &str) -> Result<DomainInfo>;
    async fn create_domain(&self, domain: &str) -> Result<()>;
    async fn describe_repository(&self, domain: &str, repo: &str) -> Result<RepositoryInfo>;
    async fn create_repository(&self, domain: &str, repo: &str) -> Result<()>;
    async fn list_domains(&self) -> Result<Vec<DomainInfo>>;
    async fn list_repositories_in_domain(&self, domain: &str) -> Result<Vec<RepositoryInfo>>;
    async fn delete_repository(&self, domain: &str, repo: &str) -> Result<()>;
    async fn delete_domain(&self, domain: &str) -> Result<()>;
    async fn list_packages(&self, domain: &str, repo: &str) -> Result<Vec<PackageSummary>>;
    async fn list_package_versions(
        &self,
        domain: &str,
        repo: &str,
        format: &str,
        package: &str,
    ) -> Result<Vec<PackageVersionSummary>>;
    async fn repository_endpoint(&self, domain: &str, repo: &str, format: &str) -> Result<String>;

    // s3
    async fn head_bucket(&self, bucket: &str) -> Result<()>;
    async fn head_object(&self, bucket: &str, key: &str) -> Result<()>;
    async fn create_bucket(&self, bucket: &str) -> Result<()>;
    async fn upload_object(&self, file: &Path, bucket: &str, key: &str) -> Result<()>;
    async fn list_buckets(&self) -> Result<Vec<BucketInfo>>;
    async fn empty_bucket(&self, bucket: &str) -> Result<()>;
    async fn delete_bucket(&self, bucket: &str) -> Result<()>;

    // codebuild
    async fn get_build_project(&self, name: &str) -> Result<BuildProjectInfo>;
    async fn create_build_project(&self, spec: &BuildProjectSpec) -> Result<()>;
    async fn list_build_projects(&self) -> Result<Vec<String>>;
    async fn delete_build_project(&self, name: &str) -> Result<()>;

    // codepipeline
    async fn pipeline_exists(&self, name: &str) -> Result<()>;
    async fn create_pipeline(&self, definition: &Path) -> Result<()>;
    async fn update_pipeline(&self, definition: &Path) -> Result<()>;
    async fn list_pipelines(&self) -> Result<Vec<PipelineSummary>>;
    async fn delete_pipeline(&self, name: &str) -> Result<()>;
    async fn list_pipeline_executions(
        &self,
        pipeline: &str,
    ) -> Result<Vec<PipelineExecutionSummary>>;
    async fn list_action_executions(
        &self,
        pipeline: &str,
        execution_id: &str,
    ) -> Result<Vec<ActionExecutionDetail>>;
}

#[async_trait]
impl AwsOps for AwsCli {
    async fn caller_identity(&self) -> Result<CallerIdentity> {
        self.run_json(&["sts", "get-caller-identity"]).await
    }

    async fn get_role(&self, name: &str) -> Result<RoleInfo> {
        let response: GetRoleResponse = self
            .run_json(&["iam", "get-role", "--role-name", name])
            .await?;
        Ok(response.role)
    }

    async fn create_role(&self, name: &str, assume_policy: &Path) -> Result<()> {
        let doc = Self::file_url(assume_policy);
        self.run_unit(&[
            "iam",
            "create-role",
            "--role-name",
            name,
            "--assume-role-policy-document",
            &doc,
        ])
        .await
    }

    async fn put_role_policy(&self, role: &str, policy_name: &str, policy: &Path) -> Result<()> {
        let doc = Self::file_url(policy);
        self.run_unit(&[
            "iam",
            "put-role-policy",
            "--role-name",
            role,
            "--policy-name",
            policy_name,
            "--policy-document",
            &doc,
        ])
        .await
    }

    async fn list_roles(&self) -> Result<Vec<RoleInfo>> {
        let response: ListRolesResponse = self.run_json(&["iam", "list-roles"]).await?;
        Ok(response.roles)
    }

    async fn list_role_policies(&self, role: &str) -> Result<Vec<String>> {
        let response: ListRolePoliciesResponse = self
            .run_json(&["iam", "list-role-policies", "--role-name", role])
            .await?;
        Ok(response.policy_names)
    }

    async fn delete_role_policy(&self, role: &str, policy_name: &str) -> Result<()> {
        self.run_unit(&[
            "iam",
            "delete-role-policy",
            "--role-name",
            role,
            "--policy-name",
            policy_name,
        ])
        .await
    }

    async fn delete_role(&self, name: &str) -> Result<()> {
        self.run_unit(&["iam", "delete-role", "--role-name", name])
            .await
    }

    async fn list_connections(&self) -> Result<Vec<ConnectionInfo>> {
        let response: ListConnectionsResponse = self
            .run_json(&["codeconnections", "list-connections"])
            .await?;
        Ok(response.connections)
    }

    async fn create_connection(&self, name: &str) -> Result<String> {
        let response: CreateConnectionResponse = self
            .run_json(&[
                "codeconnections",
                "create-connection",
                "--provider-type",
                "GitHub",
                "--connection-name",
                name,
            ])
            .await?;
        Ok(response.connection_arn)
    }

    async fn delete_connection(&self, arn: &str) -> Result<()> {
        self.run_unit(&[
            "codeconnections",
            "delete-connection",
            "--connection-arn",
            arn,
        ])
        .await
    }

    async fn describe_domain(&self, domain: &str) -> Result<DomainInfo> {
        let response: DescribeDomainResponse = self
            .run_json(&["codeartifact", "describe-domain", "--domain", domain])
            .await?;
        Ok(response.domain)
    }

    async fn create_domain(&self, domain: &str) -> Result<()> {
        self.run_unit(&["codeartifact", "create-domain", "--domain", domain])
            .await
    }

    async fn describe_repository(&self, domain: &str, repo: &str) -> Result<RepositoryInfo> {
        let response: DescribeRepositoryResponse = self
            .run_json(&[
                "codeartifact",
                "describe-repository",
                "--domain",
                domain,
                "--repository",
                repo,
            ])
            .await?;
        Ok(response.repository)
    }

    async fn create_repository(&self, domain: &str, repo: &str) -> Result<()> {
        self.run_unit(&[
            "codeartifact",
            "create-repository",
            "--domain",
            domain,
            "--repository",
            repo,
        ])
        .await
    }

    async fn list_domains(&self) -> Result<Vec<DomainInfo>> {
        let response: ListDomainsResponse =
            self.run_json(&["codeartifact", "list-domains"]).await?;
        Ok(response.domains)
    }

    async fn list_repositories_in_domain(&self, domain: &str) -> Result<Vec<RepositoryInfo>> {
        let response: ListRepositoriesInDomainResponse = self
            .run_json(&[
                "codeartifact",
                "list-repositories-in-domain",
                "--domain",
                domain,
            ])
            .await?;
        Ok(response.repositories)
    }

    async fn delete_repository(&self, domain: &str, repo: &str) -> Result<()> {
        self.run_unit(&[
            "codeartifact",
            "delete-repository",
            "--domain",
            domain,
            "--repository",
            repo,
        ])
        .await
    }

    async fn delete_domain(&self, domain: &str) -> Result<()> {
        self.run_unit(&["codeartifact", "delete-domain", "--domain", domain])
            .await
    }

    async fn list_packages(&self, domain: &str, repo: &str) -> Result<Vec<PackageSummary>> {
        let response: ListPackagesResponse = self
            .run_json(&[
                "codeartifact",
                "list-packages",
                "--domain",
                domain,
                "--repository",
                repo,
            ])
            .await?;
        Ok(response.packages)
    }

    async fn list_package_versions(
        &self,
        domain: &str,
        repo: &str,
        format: &str,
        package: &str,
    ) -> Result<Vec<PackageVersionSummary>> {
        let response: ListPackageVersionsResponse = self
            .run_json(&[
                "codeartifact",
                "list-package-versions",
                "--domain",
                domain,
                "--repository",
                repo,
                "--format",
                format,
                "--package",
                package,
            ])
            .await?;
        Ok(response.versions)
    }

    async fn repository_endpoint(&self, domain: &str, repo: &str, format: &str) -> Result<String> {
        let response: GetRepositoryEndpointResponse = self
            .run_json(&[
                "codeartifact",
                "get-repository-endpoint",
                "--domain",
                domain,
                "--repository",
                repo,
                "--format",
                format,
            ])
            .await?;
        Ok(response.repository_endpoint)
    }

    async fn head_bucket(&self, bucket: &str) -> Result<()> {
        self.run_unit(&["s3api", "head-bucket", "--bucket", bucket])
            .await
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.run_unit(&["s3api", "head-object", "--bucket", bucket, "--key", key])
            .await
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        let url = format!("s3://{}", bucket);
        self.run_unit(&["s3", "mb", &url]).await
    }

    async fn upload_object(&self, file: &Path, bucket: &str, key: &str) -> Result<()> {
        let source = file.display().to_string();
        let dest = format!("s3://{}/{}", bucket, key);
        self.run_unit(&["s3", "cp", &source, &dest]).await
    }

    async fn list_buckets(&self) -> Result<Vec<BucketInfo>> {
        let response: ListBucketsResponse = self.run_json(&["s3api", "list-buckets"]).await?;
        Ok(response.buckets)
    }

    async fn empty_bucket(&self, bucket: &str) -> Result<()> {
        let url = format!("s3://{}", bucket);
        self.run_unit(&["s3", "rm", &url, "--recursive"]).await
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        let url = format!("s3://{}", bucket);
        self.run_unit(&["s3", "rb", &url]).await
    }

    async fn get_build_project(&self, name: &str) -> Result<BuildProjectInfo> {
        // batch-get-projects exits 0 even for missing projects and reports
        // them in projectsNotFound instead.
        let response: BatchGetProjectsResponse = self
            .run_json(&["codebuild", "batch-get-projects", "--names", name])
            .await?;
        response
            .projects
            .into_iter()
            .next()
            .ok_or_else(|| AwsError::NotFound(format!("build project {}", name)))
    }

    async fn create_build_project(&self, spec: &BuildProjectSpec) -> Result<()> {
        let source = format!("type=CODEPIPELINE,buildspec={}", spec.buildspec_arn);
        let environment = format!(
            "type=LINUX_CONTAINER,image={},computeType={}",
            BUILD_IMAGE, BUILD_COMPUTE
        );
        self.run_unit(&[
            "codebuild",
            "create-project",
            "--name",
            &spec.name,
            "--source",
            &source,
            "--artifacts",
            "type=CODEPIPELINE",
            "--environment",
            &environment,
            "--service-role",
            &spec.service_role_arn,
        ])
        .await
    }

    async fn list_build_projects(&self) -> Result<Vec<String>> {
        let response: ListProjectsResponse =
            self.run_json(&["codebuild", "list-projects"]).await?;
        Ok(response.projects)
    }

    async fn delete_build_project(&self, name: &str) -> Result<()> {
        self.run_unit(&["codebuild", "delete-project", "--name", name])
            .await
    }

    async fn pipeline_exists(&self, name: &str) -> Result<()> {
        self.run_unit(&["codepipeline", "get-pipeline", "--name", name])
            .await
    }

    async fn create_pipeline(&self, definition: &Path) -> Result<()> {
        let doc = Self::file_url(definition);
        self.run_unit(&["codepipeline", "create-pipeline", "--pipeline", &doc])
            .await
    }

    async fn update_pipeline(&self, definition: &Path) -> Result<()> {
        let doc = Self::file_url(definition);
        self.run_unit(&["codepipeline", "update-pipeline", "--pipeline", &doc])
            .await
    }

    async fn list_pipelines(&self) -> Result<Vec<PipelineSummary>> {
        let response: ListPipelinesResponse =
            self.run_json(&["codepipeline", "list-pipelines"]).await?;
        Ok(response.pipelines)
    }

    async fn delete_pipeline(&self, name: &str) -> Result<()> {
        self.run_unit(&["codepipeline", "delete-pipeline", "--name", name])
            .await
    }

    async fn list_pipeline_executions(
        &self,
        pipeline: &str,
    ) -> Result<Vec<PipelineExecutionSummary>> {
        let response: ListPipelineExecutionsResponse = self
            .run_json(&[
                "codepipeline",
                "list-pipeline-executions",
                "--pipeline-name",
                pipeline,
            ])
            .await?;
        Ok(response.pipeline_execution_summaries)
    }

    async fn list_action_executions(
        &self,
        pipeline: &str,
        execution_id: &str,
    ) -> Result<Vec<ActionExecutionDetail>> {
        let filter = format!("pipelineExecutionId={}", execution_id);
        let response: ListActionExecutionsResponse = self
            .run_json(&[
                "codepipeline",
                "list-action-executions",
                "--pipeline-name",
                pipeline,
                "--filter",
                &filter,
            ])
            .await?;
        Ok(response.action_execution_details)
    }
}
