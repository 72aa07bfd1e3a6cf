//! Typed records for AWS CLI JSON responses
//!
//! Each response the toolkit consumes is modeled as a structured record
//! with named fields. Fields the emulator sometimes omits are `Option` so
//! a sparse response is "no data", never a crash. IAM, STS, S3 and
//! CodeConnections answer in PascalCase; the code* services in camelCase.

use serde::Deserialize;

// ---------- sts ----------

#[derive(Debug, Clone, Deserialize)]
pub struct CallerIdentity {
    #[serde(rename = "Account")]
    pub account: String,
    #[serde(rename = "Arn")]
    pub arn: Option<String>,
}

// ---------- iam ----------

#[derive(Debug, Clone, Deserialize)]
pub struct RoleInfo {
    #[serde(rename = "RoleName")]
    pub role_name: String,
    #[serde(rename = "Arn")]
    pub arn: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GetRoleResponse {
    #[serde(rename = "Role")]
    pub role: RoleInfo,
}

#[derive(Debug, Deserialize)]
pub struct ListRolesResponse {
    #[serde(rename = "Roles", default)]
    pub roles: Vec<RoleInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ListRolePoliciesResponse {
    #[serde(rename = "PolicyNames", default)]
    pub policy_names: Vec<String>,
}

// ---------- codeconnections ----------

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionInfo {
    #[serde(rename = "ConnectionName", default)]
    pub connection_name: String,
    #[serde(rename = "ConnectionArn", default)]
    pub connection_arn: String,
    #[serde(rename = "ConnectionStatus")]
    pub connection_status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListConnectionsResponse {
    #[serde(rename = "Connections", default)]
    pub connections: Vec<ConnectionInfo>,
}

#[derive(Debug, Deserialize)]
pub struct CreateConnectionResponse {
    #[serde(rename = "ConnectionArn")]
    pub connection_arn: String,
}

// ---------- codeartifact ----------

#[derive(Debug, Clone, Deserialize)]
pub struct DomainInfo {
    #[serde(default)]
    pub name: String,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DescribeDomainResponse {
    pub domain: DomainInfo,
}

#[derive(Debug, Deserialize)]
pub struct ListDomainsResponse {
    #[serde(default)]
    pub domains: Vec<DomainInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryInfo {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "domainName")]
    pub domain_name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DescribeRepositoryResponse {
    pub repository: RepositoryInfo,
}

#[derive(Debug, Deserialize)]
pub struct ListRepositoriesInDomainResponse {
    #[serde(default)]
    pub repositories: Vec<RepositoryInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageSummary {
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub package: String,
}

#[derive(Debug, Deserialize)]
pub struct ListPackagesResponse {
    #[serde(default)]
    pub packages: Vec<PackageSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageVersionSummary {
    #[serde(default)]
    pub version: String,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListPackageVersionsResponse {
    #[serde(default)]
    pub versions: Vec<PackageVersionSummary>,
}

#[derive(Debug, Deserialize)]
pub struct GetRepositoryEndpointResponse {
    #[serde(rename = "repositoryEndpoint")]
    pub repository_endpoint: String,
}

// ---------- s3 ----------

#[derive(Debug, Clone, Deserialize)]
pub struct BucketInfo {
    #[serde(rename = "Name", default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ListBucketsResponse {
    #[serde(rename = "Buckets", default)]
    pub buckets: Vec<BucketInfo>,
}

// ---------- codebuild ----------

#[derive(Debug, Clone, Deserialize)]
pub struct BuildProjectInfo {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "serviceRole")]
    pub service_role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BatchGetProjectsResponse {
    #[serde(default)]
    pub projects: Vec<BuildProjectInfo>,
    #[serde(rename = "projectsNotFound", default)]
    pub projects_not_found: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListProjectsResponse {
    #[serde(default)]
    pub projects: Vec<String>,
}

// ---------- codepipeline ----------

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSummary {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ListPipelinesResponse {
    #[serde(default)]
    pub pipelines: Vec<PipelineSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineExecutionSummary {
    #[serde(rename = "pipelineExecutionId", default)]
    pub pipeline_execution_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "startTime")]
    pub start_time: Option<serde_json::Value>,
    #[serde(rename = "lastUpdateTime")]
    pub last_update_time: Option<serde_json::Value>,
}

impl PipelineExecutionSummary {
    /// Timestamps arrive as ISO strings or epoch numbers depending on the
    /// CLI version; render whatever was sent. Display only.
    pub fn start_time_display(&self) -> Option<String> {
        self.start_time.as_ref().map(scalar_to_string)
    }

    pub fn last_update_display(&self) -> Option<String> {
        self.last_update_time.as_ref().map(scalar_to_string)
    }
}

fn scalar_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Deserialize)]
pub struct ListPipelineExecutionsResponse {
    #[serde(rename = "pipelineExecutionSummaries", default)]
    pub pipeline_execution_summaries: Vec<PipelineExecutionSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionExecutionDetail {
    #[serde(rename = "stageName", default)]
    pub stage_name: String,
    #[serde(rename = "actionName", default)]
    pub action_name: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ListActionExecutionsResponse {
    #[serde(rename = "actionExecutionDetails", default)]
    pub action_execution_details: Vec<ActionExecutionDetail>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_execution_summaries() {
        let body = r#"{
            "pipelineExecutionSummaries": [
                {
                    "pipelineExecutionId": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
                    "status": "InProgress",
                    "startTime": "2025-07-01T12:00:00.000000+00:00"
                }
            ]
        }"#;
        let parsed: ListPipelineExecutionsResponse = serde_json::from_str(body).unwrap();
        let latest = &parsed.pipeline_execution_summaries[0];
        assert_eq!(latest.status, "InProgress");
        assert_eq!(
            latest.start_time_display().unwrap(),
            "2025-07-01T12:00:00.000000+00:00"
        );
        assert!(latest.last_update_display().is_none());
    }

    #[test]
    fn parses_epoch_timestamps_too() {
        let body = r#"{"pipelineExecutionSummaries": [{"pipelineExecutionId": "x", "status": "Succeeded", "startTime": 1751371200.5}]}"#;
        let parsed: ListPipelineExecutionsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.pipeline_execution_summaries[0]
                .start_time_display()
                .unwrap(),
            "1751371200.5"
        );
    }

    #[test]
    fn parses_action_execution_details() {
        let body = r#"{
            "actionExecutionDetails": [
                {"stageName": "source", "actionName": "get-source-code", "status": "Succeeded"},
                {"stageName": "test", "actionName": "run-tests", "status": "InProgress"}
            ]
        }"#;
        let parsed: ListActionExecutionsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.action_execution_details.len(), 2);
        assert_eq!(parsed.action_execution_details[1].stage_name, "test");
    }

    #[test]
    fn parses_pascal_case_services() {
        let identity: CallerIdentity = serde_json::from_str(
            r#"{"UserId": "AKIA...", "Account": "000000000000", "Arn": "arn:aws:iam::000000000000:root"}"#,
        )
        .unwrap();
        assert_eq!(identity.account, "000000000000");

        let connections: ListConnectionsResponse = serde_json::from_str(
            r#"{"Connections": [{"ConnectionName": "demo-connection", "ConnectionArn": "arn:aws:codeconnections:::connection/x"}]}"#,
        )
        .unwrap();
        assert_eq!(connections.connections[0].connection_name, "demo-connection");
    }

    #[test]
    fn sparse_responses_default_to_empty() {
        let parsed: ListPackagesResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.packages.is_empty());

        let parsed: BatchGetProjectsResponse =
            serde_json::from_str(r#"{"projectsNotFound": ["demo-test"]}"#).unwrap();
        assert!(parsed.projects.is_empty());
        assert_eq!(parsed.projects_not_found, ["demo-test"]);
    }
}
