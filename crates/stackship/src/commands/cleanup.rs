use std::path::Path;

use colored::Colorize;

use stackship_aws::AwsCli;
use stackship_core::config::WorkshopConfig;
use stackship_core::pipeline::SOURCE_BUNDLE_KEY;
use stackship_emulator::Emulator;
use stackship_provision::{Sweeper, WorkshopAssets};

use crate::utils;

pub async fn handle(
    config: &WorkshopConfig,
    config_path: &Path,
    endpoint: &str,
    force: bool,
    keep_emulator: bool,
) -> anyhow::Result<()> {
    println!("{}", "Cleaning up the workshop...".bold());
    println!(
        "  every resource matching the prefix {} will be deleted",
        config.resource_prefix.cyan()
    );
    println!();

    if !force && !utils::confirm("Delete all workshop resources?")? {
        println!("{}", "Cleanup cancelled.".yellow());
        anyhow::bail!("cleanup cancelled");
    }

    let aws = AwsCli::new(endpoint);
    let report = Sweeper::new(&aws, config).sweep().await;

    for resource in &report.deleted {
        println!("  {} {}", "✓".green(), resource);
    }
    for (resource, reason) in &report.failed {
        println!("  {} {}: {}", "⚠".yellow(), resource, reason.dimmed());
    }
    if report.deleted.is_empty() && report.failed.is_empty() {
        println!("{}", "ℹ Nothing to delete".dimmed());
    }
    println!();

    remove_local_files(config_path);

    if keep_emulator {
        println!("{}", "ℹ Emulator left running (--keep-emulator)".dimmed());
    } else {
        stop_emulator().await;
    }

    println!();
    if report.is_clean() {
        println!("{}", "✓ Cleanup complete!".green().bold());
        Ok(())
    } else {
        println!(
            "{}",
            format!(
                "⚠ Cleanup finished with {} failure(s); rerun to retry",
                report.failed.len()
            )
            .yellow()
            .bold()
        );
        anyhow::bail!("cleanup finished with {} failure(s)", report.failed.len())
    }
}

/// Remove the files the toolkit wrote into the working directory.
fn remove_local_files(config_path: &Path) {
    let generated = [
        config_path.to_path_buf(),
        Path::new(WorkshopAssets::PIPELINE_DEFINITION).to_path_buf(),
        Path::new(SOURCE_BUNDLE_KEY).to_path_buf(),
    ];
    for path in generated {
        match std::fs::remove_file(&path) {
            Ok(()) => println!("  {} removed {}", "✓".green(), path.display()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => println!(
                "  {} could not remove {}: {}",
                "⚠".yellow(),
                path.display(),
                err
            ),
        }
    }
}

/// Best effort: a missing Docker daemon must not fail the cleanup.
async fn stop_emulator() {
    match Emulator::connect(4566).await {
        Ok(emulator) => match emulator.stop().await {
            Ok(true) => println!("  {} emulator stopped", "✓".green()),
            Ok(false) => println!("  {} emulator was not running", "ℹ".blue()),
            Err(err) => println!("  {} could not stop the emulator: {}", "⚠".yellow(), err),
        },
        Err(err) => {
            tracing::debug!("Docker unavailable during cleanup: {}", err);
            println!("  {} Docker not reachable; emulator left as-is", "ℹ".blue());
        }
    }
}
