use std::time::Duration;

use colored::Colorize;

use stackship_aws::{AwsCli, AwsOps};
use stackship_core::config::{Credentials, WorkshopConfig, EMULATOR_ACCOUNT_ID};
use stackship_emulator::{Emulator, EmulatorState};
use stackship_provision::{EnsureOutcome, Provisioner, WorkshopAssets};

/// How long to wait for the emulator to start answering API calls.
const READINESS_ATTEMPTS: u32 = 30;
const READINESS_INTERVAL: Duration = Duration::from_secs(1);

pub async fn handle(
    config: &WorkshopConfig,
    credentials: &Credentials,
    endpoint: &str,
    no_emulator: bool,
) -> anyhow::Result<()> {
    println!("{}", "Setting up the workshop pipeline...".bold());
    println!();

    let aws = AwsCli::new(endpoint);

    if no_emulator {
        println!("{}", "ℹ Emulator startup skipped (--no-emulator)".dimmed());
    } else {
        start_emulator(credentials).await?;
    }

    wait_until_ready(&aws).await?;
    println!();

    // Provision everything in dependency order. The report renders even
    // when a step failed partway.
    let assets = WorkshopAssets::from_root(std::path::Path::new("."));
    let report = Provisioner::new(&aws, config, credentials, &assets)
        .run()
        .await;

    println!("{}", "Resources:".bold());
    for step in &report.steps {
        match step.outcome {
            EnsureOutcome::Created => {
                println!("  {} {}", "✓".green(), step.resource);
            }
            EnsureOutcome::AlreadyExists => {
                println!(
                    "  {} {} {}",
                    "ℹ".blue(),
                    step.resource,
                    "(already exists)".dimmed()
                );
            }
        }
    }

    println!();
    match report.failure {
        None => {
            println!(
                "{}",
                format!(
                    "✓ Pipeline ready! ({} created, {} already existed)",
                    report.created_count(),
                    report.existing_count()
                )
                .green()
                .bold()
            );
            println!();
            println!("{}", "Next steps:".bold());
            println!("  {} monitor      # watch the pipeline run", "ship".cyan());
            println!("  {} packages     # inspect published versions", "ship".cyan());
            Ok(())
        }
        Some(failure) => {
            println!(
                "{}",
                format!("✗ Setup stopped at {}", failure.resource).red().bold()
            );
            println!("  {}", failure.reason);
            println!();
            println!(
                "{}",
                "Fix the problem and rerun `ship setup`; completed resources are kept.".dimmed()
            );
            anyhow::bail!("setup failed at {}", failure.resource)
        }
    }
}

async fn start_emulator(credentials: &Credentials) -> anyhow::Result<()> {
    println!("{}", "Starting the emulator container...".blue());
    let emulator = Emulator::connect(4566).await?;
    match emulator
        .ensure_running(credentials.auth_token.as_deref())
        .await?
    {
        EmulatorState::Started => println!("  {} container started", "✓".green()),
        EmulatorState::AlreadyRunning => {
            println!("  {} container already running", "ℹ".blue())
        }
    }
    Ok(())
}

/// Poll the identity endpoint until the emulator answers.
async fn wait_until_ready(aws: &AwsCli) -> anyhow::Result<()> {
    println!("{}", "Waiting for the emulator to come up...".blue());
    for attempt in 1..=READINESS_ATTEMPTS {
        match aws.caller_identity().await {
            Ok(identity) => {
                if identity.account != EMULATOR_ACCOUNT_ID {
                    tracing::warn!(
                        "Unexpected account {} (expected {})",
                        identity.account,
                        EMULATOR_ACCOUNT_ID
                    );
                }
                println!("  {} emulator ready (account {})", "✓".green(), identity.account);
                return Ok(());
            }
            Err(err) => {
                tracing::debug!("Readiness attempt {}/{}: {}", attempt, READINESS_ATTEMPTS, err);
                tokio::time::sleep(READINESS_INTERVAL).await;
            }
        }
    }
    anyhow::bail!(
        "the emulator did not become ready within {} seconds",
        READINESS_ATTEMPTS
    )
}
