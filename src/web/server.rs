//! Web server for tempmail.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::{Config, ServerConfig};
use crate::mail::MailboxService;
use crate::{Result, TempMailError};

use super::handlers::AppState;
use super::middleware::RateLimitState;
use super::router::create_app;

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Rate limit state.
    rate_limit: Arc<RateLimitState>,
    /// Server configuration.
    server_config: ServerConfig,
    /// Expiry sweep interval, if enabled.
    sweep_interval: Option<Duration>,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &Config, service: Arc<MailboxService>) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| {
                TempMailError::Config(format!(
                    "invalid listen address {}:{}: {e}",
                    config.server.host, config.server.port
                ))
            })?;

        let rate_limit = RateLimitState::new(
            config.server.register_rate_limit,
            config.server.api_rate_limit,
        );

        let sweep_interval = match config.mail.sweep_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Ok(Self {
            addr,
            app_state: Arc::new(AppState::new(service, config.mail.clone())),
            rate_limit: Arc::new(rate_limit),
            server_config: config.server.clone(),
            sweep_interval,
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Build the application router.
    pub fn router(&self) -> Router {
        create_app(
            self.app_state.clone(),
            self.rate_limit.clone(),
            &self.server_config.cors_origins,
        )
    }

    /// Start the expiry sweep background task.
    ///
    /// Expiry is also enforced on every read; the sweep only reclaims
    /// mailboxes nobody looks at anymore.
    fn start_sweep_task(service: Arc<MailboxService>, period: Duration) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);

            // Skip the first immediate tick
            interval.tick().await;

            loop {
                interval.tick().await;

                match service.sweep_expired().await {
                    Ok(0) => tracing::debug!("No expired mailboxes to sweep"),
                    Ok(count) => tracing::debug!(retired = count, "Expiry sweep finished"),
                    Err(e) => tracing::warn!(error = %e, "Expiry sweep failed"),
                }
            }
        });
    }

    /// Bind the listener and start the background tasks.
    async fn prepare(self) -> std::io::Result<(TcpListener, Router)> {
        let router = self.router();
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        if let Some(period) = self.sweep_interval {
            Self::start_sweep_task(self.app_state.service.clone(), period);
            tracing::info!("Expiry sweep task started (every {}s)", period.as_secs());
        }
        self.rate_limit.clone().start_cleanup_task();

        tracing::info!("Web server listening on http://{}", local_addr);
        Ok((listener, router))
    }

    /// Run the web server until Ctrl-C.
    pub async fn run(self) -> std::io::Result<()> {
        let (listener, router) = self.prepare().await?;

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::io::Result<SocketAddr> {
        let (listener, router) = self.prepare().await?;
        let local_addr = listener.local_addr()?;

        tokio::spawn(async move {
            if let Err(e) = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
    }
}
