use crate::components::event_store::EventStoreActor;
use crate::components::schedule_importer::ScheduleImporterComponent;
use crate::components::ComponentManager;
use crate::config::Config;
use crate::error::Error;
use crate::shutdown;
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,redis=warn")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub async fn load_config() -> miette::Result<Arc<RwLock<Config>>> {
    match Config::load() {
        Ok(config) => Ok(Arc::new(RwLock::new(config))),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Wire up the event store and components, then run until a shutdown signal
pub async fn start_importer(config: Arc<RwLock<Config>>) -> miette::Result<()> {
    // Initialize the event store actor
    let (mut store_actor, store_handle) = {
        let config_read = config.read().await;
        EventStoreActor::new(&config_read)?
    };

    // Spawn event store actor task
    tokio::spawn(async move {
        store_actor.run().await;
    });

    // Initialize component manager
    let mut component_manager = ComponentManager::new(Arc::clone(&config));
    component_manager.register(ScheduleImporterComponent::new());

    component_manager.init_all(store_handle.clone()).await?;
    info!("WordCamp importer running");

    // Wait for a shutdown signal, then stop everything
    let component_manager = Arc::new(component_manager);
    let (shutdown_send, shutdown_recv) = oneshot::channel();
    tokio::spawn(shutdown::handle_signals(
        shutdown_send,
        Arc::clone(&component_manager),
        store_handle,
    ));

    let _ = shutdown_recv.await;
    info!("WordCamp importer stopped");

    Ok(())
}
