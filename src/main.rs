//! TrailFood
//!
//! An MCP server for planning the food of multi-day trips.

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use trailfood::build_info;
use trailfood::config::Settings;
use trailfood::mcp::TrailFoodService;
use trailfood::session::Session;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (output to stderr to not interfere with MCP stdio)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("trailfood=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::from_env();
    build_info::print_startup_banner(&settings);
    eprintln!("Starting MCP server on stdio...");

    // Ensure data directories exist
    settings.ensure_dirs()?;

    // Reopen the last database, if any
    let session = Session::restore(settings);

    let service = TrailFoodService::new(session);

    // Create stdio transport
    let transport = (stdin(), stdout());

    // Start the MCP server
    let server = service.serve(transport).await?;

    // Wait for the server to complete
    server.waiting().await?;

    Ok(())
}
