mod startup;

use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting convoy calendar sync");

    // Load configuration
    let config = startup::load_config()?;

    // Run the pipeline once
    startup::run_sync(&config).await
}
