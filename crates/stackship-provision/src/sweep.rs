//! Best-effort teardown of every workshop-owned resource.
//!
//! Deletion runs in reverse dependency order and never stops early: each
//! failure is recorded and the sweep moves on, so one stuck resource cannot
//! shield the rest from cleanup.

use stackship_aws::AwsOps;
use stackship_core::config::WorkshopConfig;

/// What a sweep deleted and what it could not.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub deleted: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    fn ok(&mut self, resource: String) {
        tracing::info!("Deleted {}", resource);
        self.deleted.push(resource);
    }

    fn err(&mut self, resource: String, reason: impl std::fmt::Display) {
        let reason = reason.to_string();
        tracing::warn!("Could not delete {}: {}", resource, reason);
        self.failed.push((resource, reason));
    }
}

pub struct Sweeper<'a> {
    aws: &'a dyn AwsOps,
    config: &'a WorkshopConfig,
}

impl<'a> Sweeper<'a> {
    pub fn new(aws: &'a dyn AwsOps, config: &'a WorkshopConfig) -> Self {
        Self { aws, config }
    }

    /// Sweep every category. Only resources whose names carry the workshop
    /// prefix are touched; anything else in the emulator is left alone.
    pub async fn sweep(&self) -> SweepReport {
        let mut report = SweepReport::default();
        self.sweep_pipelines(&mut report).await;
        self.sweep_build_projects(&mut report).await;
        self.sweep_connections(&mut report).await;
        self.sweep_package_stores(&mut report).await;
        self.sweep_buckets(&mut report).await;
        self.sweep_roles(&mut report).await;
        report
    }

    async fn sweep_pipelines(&self, report: &mut SweepReport) {
        let pipelines = match self.aws.list_pipelines().await {
            Ok(pipelines) => pipelines,
            Err(err) => return report.err("pipelines (list)".to_string(), err),
        };
        for pipeline in pipelines {
            if !self.config.owns(&pipeline.name) {
                continue;
            }
            let label = format!("pipeline {}", pipeline.name);
            match self.aws.delete_pipeline(&pipeline.name).await {
                Ok(()) => report.ok(label),
                Err(err) => report.err(label, err),
            }
        }
    }

    async fn sweep_build_projects(&self, report: &mut SweepReport) {
        let projects = match self.aws.list_build_projects().await {
            Ok(projects) => projects,
            Err(err) => return report.err("build projects (list)".to_string(), err),
        };
        for name in projects {
            if !self.config.owns(&name) {
                continue;
            }
            let label = format!("build project {}", name);
            match self.aws.delete_build_project(&name).await {
                Ok(()) => report.ok(label),
                Err(err) => report.err(label, err),
            }
        }
    }

    async fn sweep_connections(&self, report: &mut SweepReport) {
        let connections = match self.aws.list_connections().await {
            Ok(connections) => connections,
            Err(err) => return report.err("connections (list)".to_string(), err),
        };
        for connection in connections {
            if !self.config.owns(&connection.connection_name) {
                continue;
            }
            let label = format!("connection {}", connection.connection_name);
            match self.aws.delete_connection(&connection.connection_arn).await {
                Ok(()) => report.ok(label),
                Err(err) => report.err(label, err),
            }
        }
    }

    /// Repositories first, then the domains that held them.
    async fn sweep_package_stores(&self, report: &mut SweepReport) {
        let domains = match self.aws.list_domains().await {
            Ok(domains) => domains,
            Err(err) => return report.err("package domains (list)".to_string(), err),
        };
        for domain in domains {
            if !self.config.owns(&domain.name) {
                continue;
            }
            match self.aws.list_repositories_in_domain(&domain.name).await {
                Ok(repositories) => {
                    for repo in repositories {
                        let label = format!("package repository {}/{}", domain.name, repo.name);
                        match self.aws.delete_repository(&domain.name, &repo.name).await {
                            Ok(()) => report.ok(label),
                            Err(err) => report.err(label, err),
                        }
                    }
                }
                Err(err) => {
                    report.err(format!("package repositories in {} (list)", domain.name), err)
                }
            }
            let label = format!("package domain {}", domain.name);
            match self.aws.delete_domain(&domain.name).await {
                Ok(()) => report.ok(label),
                Err(err) => report.err(label, err),
            }
        }
    }

    /// Buckets must be emptied before removal.
    async fn sweep_buckets(&self, report: &mut SweepReport) {
        let buckets = match self.aws.list_buckets().await {
            Ok(buckets) => buckets,
            Err(err) => return report.err("buckets (list)".to_string(), err),
        };
        for bucket in buckets {
            if !self.config.owns(&bucket.name) {
                continue;
            }
            let label = format!("bucket {}", bucket.name);
            let emptied = self.aws.empty_bucket(&bucket.name).await;
            let result = match emptied {
                Ok(()) => self.aws.delete_bucket(&bucket.name).await,
                Err(err) => Err(err),
            };
            match result {
                Ok(()) => report.ok(label),
                Err(err) => report.err(label, err),
            }
        }
    }

    /// Inline policies first, then the role itself.
    async fn sweep_roles(&self, report: &mut SweepReport) {
        let roles = match self.aws.list_roles().await {
            Ok(roles) => roles,
            Err(err) => return report.err("IAM roles (list)".to_string(), err),
        };
        for role in roles {
            if !self.config.owns(&role.role_name) {
                continue;
            }
            match self.aws.list_role_policies(&role.role_name).await {
                Ok(policies) => {
                    for policy in policies {
                        if let Err(err) =
                            self.aws.delete_role_policy(&role.role_name, &policy).await
                        {
                            report.err(
                                format!("role policy {}/{}", role.role_name, policy),
                                err,
                            );
                        }
                    }
                }
                Err(err) => {
                    report.err(format!("role policies of {} (list)", role.role_name), err)
                }
            }
            let label = format!("IAM role {}", role.role_name);
            match self.aws.delete_role(&role.role_name).await {
                Ok(()) => report.ok(label),
                Err(err) => report.err(label, err),
            }
        }
    }
}
