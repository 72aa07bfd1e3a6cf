use std::io::{BufRead, Write};
use std::path::Path;

use colored::Colorize;

use stackship_core::config::ConfigSource;

/// Announce where the configuration came from.
pub fn print_config_source(path: &Path, source: ConfigSource) {
    match source {
        ConfigSource::File => {
            println!(
                "📄 Configuration: {}",
                path.display().to_string().cyan()
            );
        }
        ConfigSource::Defaults => {
            println!(
                "📄 Configuration: {} {}",
                path.display().to_string().cyan(),
                "(created with defaults)".dimmed()
            );
        }
    }
}

/// Yes/no prompt. Returns true on "y"/"yes" (any case) and on EOF, so a
/// piped run proceeds instead of hanging.
pub fn confirm(question: &str) -> anyhow::Result<bool> {
    print!("{} [y/N] ", question.bold());
    std::io::stdout().flush()?;

    let mut answer = String::new();
    let bytes = std::io::stdin().lock().read_line(&mut answer)?;
    if bytes == 0 {
        // Non-interactive stdin.
        println!();
        return Ok(true);
    }
    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}
