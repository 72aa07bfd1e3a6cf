use colored::Colorize;

use stackship_aws::{AwsCli, AwsOps};
use stackship_core::config::WorkshopConfig;

pub async fn handle(config: &WorkshopConfig, endpoint: &str, format: &str) -> anyhow::Result<()> {
    let aws = AwsCli::new(endpoint);
    let domain = &config.domain_name;
    let repo = &config.repo_name;

    println!(
        "{}",
        format!("Packages in {}/{}:", domain, repo).bold()
    );
    println!();

    let packages = aws.list_packages(domain, repo).await?;
    if packages.is_empty() {
        println!("{}", "ℹ No packages published yet".dimmed());
        println!(
            "{}",
            "  The publish stage uploads a package once the pipeline has run.".dimmed()
        );
        return Ok(());
    }

    for package in &packages {
        println!(
            "  📦 {} {}",
            package.package.cyan().bold(),
            format!("({})", package.format).dimmed()
        );
        let versions = aws
            .list_package_versions(domain, repo, &package.format, &package.package)
            .await?;
        for version in versions {
            match version.status.as_deref() {
                Some(status) => println!(
                    "      {} {}",
                    version.version,
                    status.to_lowercase().dimmed()
                ),
                None => println!("      {}", version.version),
            }
        }
    }

    println!();
    match aws.repository_endpoint(domain, repo, format).await {
        Ok(endpoint_url) => {
            println!("{}", "Install from this repository:".bold());
            println!(
                "  npm install --registry {} <package>",
                endpoint_url.cyan()
            );
        }
        Err(err) => {
            tracing::debug!("No repository endpoint: {}", err);
        }
    }
    Ok(())
}
