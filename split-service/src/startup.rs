//! Application startup and lifecycle management.

use std::net::SocketAddr;

use tokio::net::TcpListener;

use service_core::error::AppError;
use service_core::middleware::rate_limit::create_ip_rate_limiter;

use crate::config::SplitConfig;
use crate::services::{metrics::init_metrics, SessionStore};
use crate::{build_router, AppState};

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: axum::Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: SplitConfig) -> Result<Self, AppError> {
        init_metrics();

        let store = SessionStore::new(config.session.max_sessions, config.session.ttl_minutes);
        let ip_rate_limiter = create_ip_rate_limiter(
            config.rate_limit.global_ip_limit,
            config.rate_limit.global_ip_window_seconds,
        );

        let state = AppState {
            config: config.clone(),
            store,
            ip_rate_limiter,
        };
        let router = build_router(state).await?;

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port = port, "Split service listener bound");

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        tracing::info!(
            service = "split-service",
            version = env!("CARGO_PKG_VERSION"),
            port = self.port,
            "Service ready to accept connections"
        );

        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }
}
