//! Sizing API Server
//!
//! Serves the REST router until ctrl-c or an explicit shutdown.

use crate::error::{Error, Result};
use crate::metrics::SizingMetrics;
use crate::sizing::SizingEngine;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::rest::RestRouter;

// =============================================================================
// Server Configuration
// =============================================================================

/// Default REST bind address
pub const DEFAULT_API_ADDR: &str = "0.0.0.0:8090";

/// Configuration for the API server
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// REST API bind address
    pub rest_addr: SocketAddr,
    /// Allow cross-origin requests
    pub cors_enabled: bool,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            rest_addr: SocketAddr::from(([0, 0, 0, 0], 8090)),
            cors_enabled: false,
        }
    }
}

// =============================================================================
// API Server
// =============================================================================

/// REST server for sizing requests
pub struct ApiServer {
    config: ApiServerConfig,
    engine: Arc<SizingEngine>,
    metrics: SizingMetrics,
    shutdown_tx: broadcast::Sender<()>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(config: ApiServerConfig, engine: Arc<SizingEngine>, metrics: SizingMetrics) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            engine,
            metrics,
            shutdown_tx,
        }
    }

    /// Run until ctrl-c or `shutdown`
    pub async fn run(&self) -> Result<()> {
        let mut router = RestRouter::new(self.engine.clone(), self.metrics.clone())
            .build()
            .layer(TraceLayer::new_for_http());
        if self.config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }

        let listener = tokio::net::TcpListener::bind(self.config.rest_addr)
            .await
            .map_err(|e| {
                Error::Internal(format!(
                    "Failed to bind REST server to {}: {}",
                    self.config.rest_addr, e
                ))
            })?;

        info!("REST API listening on {}", self.config.rest_addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown_rx.recv() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
                info!("REST server shutting down");
            })
            .await
            .map_err(|e| Error::Internal(format!("REST server error: {}", e)))?;

        Ok(())
    }

    /// Trigger graceful shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiServerConfig::default();
        assert_eq!(config.rest_addr, DEFAULT_API_ADDR.parse().unwrap());
        assert!(!config.cors_enabled);
    }

    #[tokio::test]
    async fn test_shutdown_before_serving() {
        let config = ApiServerConfig {
            rest_addr: "127.0.0.1:0".parse().unwrap(),
            ..Default::default()
        };
        let server = Arc::new(ApiServer::new(
            config,
            Arc::new(SizingEngine::default()),
            SizingMetrics::new().unwrap(),
        ));

        let handle = {
            let server = server.clone();
            tokio::spawn(async move { server.run().await })
        };
        // Keep signalling until the server has subscribed and exits
        loop {
            server.shutdown();
            if handle.is_finished() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(handle.await.unwrap().is_ok());
    }
}
