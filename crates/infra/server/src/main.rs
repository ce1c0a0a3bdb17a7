//! Polystat server binary.

use polystat_server::{AnalyticsServer, AppConfig, init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(&config.server.log_level);

    let server = AnalyticsServer::new(config);
    server.prepare().await?;
    server.run().await?;

    Ok(())
}
