//! # Polystat Server
//!
//! Standalone analytics server. Holds every analytics type in one in-memory
//! store, seeds demo data, imports configured files at startup, and serves
//! the HTTP API.

mod config;
mod seed;

pub use config::{
    AppConfig, CONFIG_PATH_ENV, ConfigError, DemoConfig, HOST_ENV, ImportSource, PORT_ENV,
    ServerConfig, load_config, parse_config,
};
pub use seed::{SeedReport, food_order_rows, sales_rows, seed_all, subscription_rows};

use axum::Router;
use chrono::Utc;
use polystat_adapter_memory::MemoryAdapter;
use polystat_axum::analytics_routes;
use polystat_core::error::AnalyticsError;
use polystat_core::registry::AnalyticsType;
use polystat_import::{ImportError, Importer};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Startup or runtime failure.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),
    #[error("Import of {path} failed: {source}")]
    Import {
        path: String,
        #[source]
        source: ImportError,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over `level`.
pub fn init_tracing(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A second call (tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();
}

/// The analytics server.
pub struct AnalyticsServer {
    /// Loaded configuration.
    pub config: AppConfig,
    adapter: Arc<MemoryAdapter>,
}

impl AnalyticsServer {
    /// Creates a server over an empty store.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            adapter: Arc::new(MemoryAdapter::new()),
        }
    }

    /// The backing store.
    pub fn adapter(&self) -> &Arc<MemoryAdapter> {
        &self.adapter
    }

    /// Builds the HTTP application.
    pub fn router(&self) -> Router {
        analytics_routes(self.adapter.clone()).layer(TraceLayer::new_for_http())
    }

    /// Seeds demo data and runs the configured startup imports.
    pub async fn prepare(&self) -> Result<(), ServerError> {
        if self.config.demo.enabled {
            seed_all(
                self.adapter.as_ref(),
                &self.config.demo,
                Utc::now().naive_utc(),
            )
            .await?;
        } else {
            info!("demo data disabled");
        }

        let importer = Importer::new(self.adapter.clone());
        for source in &self.config.imports {
            let analytics_type: AnalyticsType = source.analytics_type.parse()?;
            let report = importer
                .import_file(analytics_type, &source.path)
                .await
                .map_err(|source_err| ServerError::Import {
                    path: source.path.display().to_string(),
                    source: source_err,
                })?;
            if report.skipped_duplicates > 0 {
                warn!(
                    path = %source.path.display(),
                    skipped = report.skipped_duplicates,
                    "startup import skipped duplicates"
                );
            }
            info!(path = %source.path.display(), "{}", report.message());
        }
        Ok(())
    }

    /// Binds the listener and serves until the process exits.
    pub async fn run(&self) -> Result<(), ServerError> {
        let addr = self.config.server.bind_addr();
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!(%addr, "Polystat server listening");
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

impl Default for AnalyticsServer {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}
