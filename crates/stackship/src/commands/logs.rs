use colored::Colorize;
use futures_util::stream::StreamExt;

use stackship_emulator::Emulator;

pub async fn handle(follow: bool, tail: usize) -> anyhow::Result<()> {
    let emulator = Emulator::connect(4566).await?;

    if !emulator.is_running().await? {
        println!("{}", "ℹ The emulator container is not running".dimmed());
        println!("  start it with {}", "ship setup".cyan());
        return Ok(());
    }

    #[allow(deprecated)]
    let options = bollard::container::LogsOptions::<String> {
        follow,
        stdout: true,
        stderr: true,
        tail: tail.to_string(),
        timestamps: true,
        ..Default::default()
    };

    use bollard::container::LogOutput;
    let mut stream = emulator
        .docker()
        .logs(emulator.container_name(), Some(options));

    while let Some(log) = stream.next().await {
        match log {
            Ok(LogOutput::StdOut { message }) | Ok(LogOutput::Console { message }) => {
                let msg = String::from_utf8_lossy(&message);
                for line in msg.lines() {
                    if !line.is_empty() {
                        println!("{}", line);
                    }
                }
            }
            Ok(LogOutput::StdErr { message }) => {
                let msg = String::from_utf8_lossy(&message);
                for line in msg.lines() {
                    if !line.is_empty() {
                        println!("{} {}", "stderr:".red(), line);
                    }
                }
            }
            Ok(LogOutput::StdIn { .. }) => {}
            Err(e) => {
                eprintln!("  ⚠ log stream error: {}", e);
                break;
            }
        }
    }

    if follow {
        println!();
        println!("{}", "Log stream ended".dimmed());
    }
    Ok(())
}
