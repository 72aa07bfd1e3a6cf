use std::time::Duration;

use colored::Colorize;

use stackship_aws::AwsCli;
use stackship_core::config::WorkshopConfig;
use stackship_core::execution::{ExecutionSnapshot, ExecutionStatus, StageProgress};
use stackship_provision::Poller;

pub async fn handle(
    config: &WorkshopConfig,
    endpoint: &str,
    once: bool,
    interval: u64,
) -> anyhow::Result<()> {
    let aws = AwsCli::new(endpoint);
    let poller = Poller::new(&aws, &config.pipeline_name);

    println!(
        "{}",
        format!("Watching pipeline {}...", config.pipeline_name).bold()
    );
    println!();

    if once {
        let snapshot = poller.snapshot().await?;
        render(snapshot.as_ref());
        return Ok(());
    }

    let status = poller
        .wait_until_terminal(Duration::from_secs(interval), |snapshot| {
            render(snapshot);
            println!();
        })
        .await?;

    match status {
        ExecutionStatus::Succeeded => {
            println!("{}", "✓ Pipeline execution succeeded!".green().bold());
            println!(
                "  {} packages   # see what was published",
                "ship".cyan()
            );
        }
        other => {
            println!(
                "{}",
                format!("✗ Pipeline execution finished: {}", other).red().bold()
            );
            println!("  {} logs       # inspect the emulator logs", "ship".cyan());
        }
    }
    Ok(())
}

fn render(snapshot: Option<&ExecutionSnapshot>) {
    let Some(snapshot) = snapshot else {
        println!("{}", "ℹ No execution data yet".dimmed());
        return;
    };

    let status = match snapshot.status {
        ExecutionStatus::Succeeded => snapshot.status.to_string().green(),
        ExecutionStatus::Failed | ExecutionStatus::Cancelled => {
            snapshot.status.to_string().red()
        }
        ExecutionStatus::InProgress => snapshot.status.to_string().yellow(),
        _ => snapshot.status.to_string().normal(),
    };
    println!("Execution {} {}", snapshot.id.cyan(), status.bold());
    if let Some(started) = &snapshot.started_at {
        println!("  started:      {}", started.dimmed());
    }
    if let Some(updated) = &snapshot.last_updated_at {
        println!("  last update:  {}", updated.dimmed());
    }

    for stage in &snapshot.stages {
        let glyph = match stage.progress() {
            StageProgress::Completed => "✓".green(),
            StageProgress::InProgress => "▸".yellow(),
            StageProgress::Pending => "·".normal(),
        };
        println!("  {} {}", glyph, stage.name.bold());
        for action in &stage.actions {
            println!("      {} {}", action.name, action.status.to_string().dimmed());
        }
    }
}
