use tracing::info;
use wordcamp_importer::startup;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting WordCamp importer");

    // Load configuration
    let config = startup::load_config().await?;

    // Run until shut down
    startup::start_importer(config).await
}
