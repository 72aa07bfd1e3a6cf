use std::path::Path;

use axum::Router;
use colored::Colorize;
use tower_http::services::ServeDir;

/// Directory holding the demo page that exercises the published package.
const DEMO_DIR: &str = "sample-app";
const DEMO_PAGE: &str = "demo.html";

pub async fn handle(port: u16, no_open: bool) -> anyhow::Result<()> {
    let dir = Path::new(DEMO_DIR);
    anyhow::ensure!(
        dir.join(DEMO_PAGE).is_file(),
        "{}/{} not found; run from the workshop directory",
        DEMO_DIR,
        DEMO_PAGE
    );

    let app = Router::new().fallback_service(ServeDir::new(dir));
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    let url = format!("http://127.0.0.1:{}/{}", port, DEMO_PAGE);

    println!("{}", "Serving the demo page".bold());
    println!("  {}", url.cyan());
    println!("{}", "  Ctrl+C to stop".dimmed());

    if !no_open {
        if let Err(err) = open::that(&url) {
            tracing::debug!("Could not open the browser: {}", err);
        }
    }

    axum::serve(listener, app).await?;
    Ok(())
}
