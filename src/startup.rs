use convoy_calendar::components::google_calendar::{
    CredentialProvider, FileTokenProvider, GoogleCalendarClient,
};
use convoy_calendar::components::reconcile::{ReconcileOptions, ReconciliationEngine};
use convoy_calendar::components::HttpEventSource;
use convoy_calendar::config::Config;
use convoy_calendar::error::Error;
use convoy_calendar::pipeline::run_once;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the application config
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Wire the pipeline from config and run it once
pub async fn run_sync(config: &Config) -> miette::Result<()> {
    let source = HttpEventSource::new(config.url.clone());

    let credentials: Arc<dyn CredentialProvider> = Arc::new(FileTokenProvider::new(
        config.token_path.clone(),
        config.client_secrets_path.clone(),
        config.token_uri.clone(),
        config.scopes.clone(),
    ));
    let calendar = GoogleCalendarClient::new(
        config.calendar_api_base.clone(),
        config.calendar_id.clone(),
        credentials,
    );
    let engine = ReconciliationEngine::new(calendar, ReconcileOptions::try_from(config)?);

    match run_once(&source, &config.games, &engine).await {
        Ok(report) => {
            info!(
                "Processed {} events into calendar {}",
                report.considered, config.calendar_id
            );
            Ok(())
        }
        Err(e) => {
            error!("Sync aborted: {}", e);
            Err(e.into())
        }
    }
}
