use colored::Colorize;

use stackship_aws::{AwsCli, AwsOps};
use stackship_core::config::{Credentials, WorkshopConfig, EMULATOR_ACCOUNT_ID};
use stackship_emulator::Emulator;
use stackship_provision::WorkshopAssets;

/// Environment checks, most fundamental first. Returns whether everything
/// needed for `ship setup` is in place.
pub async fn handle(
    config: &WorkshopConfig,
    credentials: &Credentials,
    endpoint: &str,
) -> anyhow::Result<bool> {
    println!("{}", "Checking the workshop environment...".bold());
    println!();
    let mut ready = true;

    // Docker daemon and the emulator container.
    match Emulator::connect(4566).await {
        Ok(emulator) => {
            pass("Docker daemon reachable");
            match emulator.is_running().await {
                Ok(true) => pass(&format!("container {} running", emulator.container_name())),
                Ok(false) => {
                    info("emulator container not running (ship setup starts it)");
                }
                Err(err) => {
                    ready = false;
                    fail(&format!("container state unknown: {}", err));
                }
            }
        }
        Err(err) => {
            ready = false;
            fail(&format!("{}", err));
        }
    }

    // The aws CLI itself, then the emulator API behind it.
    match tool_version("aws").await {
        Some(version) => {
            pass(&version);
            let aws = AwsCli::new(endpoint);
            match aws.caller_identity().await {
                Ok(identity) => {
                    if identity.account == EMULATOR_ACCOUNT_ID {
                        pass(&format!("emulator answering at {}", endpoint));
                    } else {
                        info(&format!(
                            "endpoint answers but reports account {} (a real AWS account?)",
                            identity.account
                        ));
                    }
                }
                Err(err) => info(&format!("emulator not answering yet: {}", err)),
            }
        }
        None => {
            ready = false;
            fail("aws CLI not found on PATH");
        }
    }

    // Credentials.
    match &credentials.github_token {
        Some(token) => {
            pass(&format!(
                "{} set ({})",
                Credentials::GITHUB_TOKEN_VAR,
                Credentials::masked(token)
            ));
            if !token.starts_with("ghp_") && !token.starts_with("github_pat_") {
                warn("token does not look like a GitHub personal access token");
            }
        }
        None => {
            ready = false;
            fail(&format!(
                "{} not set; the connection step will fail",
                Credentials::GITHUB_TOKEN_VAR
            ));
        }
    }
    match &credentials.auth_token {
        Some(token) => pass(&format!(
            "{} set ({})",
            Credentials::AUTH_TOKEN_VAR,
            Credentials::masked(token)
        )),
        None => info(&format!(
            "{} not set (community image features only)",
            Credentials::AUTH_TOKEN_VAR
        )),
    }

    // Workshop assets on disk.
    let assets = WorkshopAssets::from_root(std::path::Path::new("."));
    for name in [WorkshopAssets::TRUST_POLICY, WorkshopAssets::PERMISSIONS_POLICY] {
        let path = assets.templates_dir.join(name);
        if path.is_file() {
            pass(&format!("template {}", path.display()));
        } else {
            ready = false;
            fail(&format!("template missing: {}", path.display()));
        }
    }
    for name in WorkshopAssets::BUILDSPECS {
        let path = assets.templates_dir.join(name);
        if path.is_file() {
            pass(&format!("buildspec {}", path.display()));
        } else {
            ready = false;
            fail(&format!("buildspec missing: {}", path.display()));
        }
    }
    if assets.sample_app_dir.is_dir() {
        pass(&format!("sample app at {}", assets.sample_app_dir.display()));
    } else {
        ready = false;
        fail(&format!(
            "sample app missing: {}",
            assets.sample_app_dir.display()
        ));
    }

    // Handy but not required.
    for tool in ["jq", "curl", "git"] {
        match tool_version(tool).await {
            Some(version) => pass(&version),
            None => info(&format!("{} not found (optional)", tool)),
        }
    }

    println!();
    if ready {
        println!(
            "{}",
            format!("✓ Ready to provision pipeline {}", config.pipeline_name)
                .green()
                .bold()
        );
    } else {
        println!("{}", "✗ Environment not ready; fix the items above".red().bold());
    }
    Ok(ready)
}

/// First line of `<tool> --version`, or None when the tool is absent.
/// The aws CLI v1 prints its version to stderr, so both streams are read.
async fn tool_version(tool: &str) -> Option<String> {
    let output = tokio::process::Command::new(tool)
        .arg("--version")
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let text = if stdout.trim().is_empty() {
        String::from_utf8_lossy(&output.stderr).into_owned()
    } else {
        stdout.into_owned()
    };
    text.lines().next().map(|line| line.trim().to_string())
}

fn pass(message: &str) {
    println!("  {} {}", "✓".green(), message);
}

fn warn(message: &str) {
    println!("  {} {}", "⚠".yellow(), message);
}

fn info(message: &str) {
    println!("  {} {}", "ℹ".blue(), message);
}

fn fail(message: &str) {
    println!("  {} {}", "✗".red(), message);
}
