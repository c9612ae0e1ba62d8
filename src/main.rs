mod application;
mod domain;
mod infrastructure;
mod presentation;

#[cfg(test)]
mod test_support;

use tracing_subscriber::EnvFilter;

use crate::infrastructure::{AppConfig, AppContainer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info,hyper=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = AppConfig::from_env()?;
    tracing::info!("Starting {} on port {}", env!("CARGO_PKG_NAME"), config.port);

    let container = AppContainer::new(config).await?;
    container.http_server().run().await
}
