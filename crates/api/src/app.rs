// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Process lifecycle module
//!
//! This module binds the listeners, mounts the [`Server`] under `axum`, runs
//! the optional debug listener and coordinates graceful shutdown using a
//! `CancellationToken`. Once shutdown starts, in-flight requests get the
//! configured grace period before the API listener task is aborted.

use std::{net::SocketAddr, sync::Arc};

use accounts::AccountService;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    config::ServerConfig,
    error::{ServerError, ServerResult},
    metrics::{metrics_handler, request_metrics},
    middleware::{TracingSink, access_log},
    routes::AccountApi,
    server::Server,
};

/// Accounts API process
#[derive(Debug)]
pub struct App {
    /// Server configuration
    config: ServerConfig,
    /// Composed request pipeline
    server: Server,
    /// Cancellation token for coordinated shutdown
    cancellation_token: CancellationToken,
}

impl App {
    /// Create the process for `service` with the default middleware chain
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if the configuration is invalid, or
    /// `ServerError::Route` if the route table cannot be built.
    pub fn new<S>(config: ServerConfig, service: S) -> ServerResult<Self>
    where
        S: AccountService + 'static,
    {
        let server = Server::builder()
            .with_middleware(access_log(Arc::new(TracingSink)))
            .with_middleware(request_metrics())
            .with_endpoints(&AccountApi::new(service))
            .build()?;

        Self::with_server(config, server)
    }

    /// Create the process around an already composed server
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if the configuration is invalid.
    pub fn with_server(config: ServerConfig, server: Server) -> ServerResult<Self> {
        config.validate().map_err(|e| ServerError::Config {
            message: e.to_string(),
        })?;

        Ok(Self {
            config,
            server,
            cancellation_token: CancellationToken::new(),
        })
    }

    fn api_router(server: Server) -> axum::Router {
        axum::Router::new().fallback_service(server)
    }

    fn debug_router() -> axum::Router {
        axum::Router::new().route("/metrics", get(metrics_handler))
    }

    async fn bind(addr: SocketAddr) -> ServerResult<(TcpListener, SocketAddr)> {
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                address: addr,
                source,
            })?;

        let actual_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Startup { source })?;

        Ok((listener, actual_addr))
    }

    /// Run until a shutdown signal or programmatic shutdown
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if unable to bind to the configured address,
    /// `ServerError::Startup` if the server fails to start, or
    /// `ServerError::Shutdown` if serving fails.
    pub async fn run(self) -> ServerResult<()> {
        let (listener, actual_addr) = Self::bind(self.config.api_host).await?;

        info!(
            address = %actual_addr,
            environment = %self.config.environment,
            "API listener starting",
        );

        if self.config.enable_debug {
            self.spawn_debug_listener().await?;
        }

        let shutdown_token = self.cancellation_token.clone();
        tokio::spawn(async move {
            info!("spawning the graceful shutdown task");
            Self::shutdown_signal_handler(shutdown_token).await;
        });

        let router = Self::api_router(self.server);
        let serve_token = self.cancellation_token.clone();
        let mut serve_task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { serve_token.cancelled().await })
                .await
        });

        tokio::select! {
            result = &mut serve_task => return Self::serve_outcome(result),
            () = self.cancellation_token.cancelled() => {
                info!("start shutdown");
            }
        }

        let grace_period = self.config.shutdown_timeout();
        if let Ok(result) = tokio::time::timeout(grace_period, &mut serve_task).await {
            Self::serve_outcome(result)?;
            info!("API listener shut down gracefully");
        } else {
            warn!(
                grace_period = ?grace_period,
                "graceful shutdown did not complete, aborting in-flight requests"
            );
            serve_task.abort();
        }

        Ok(())
    }

    fn serve_outcome(
        result: Result<std::io::Result<()>, tokio::task::JoinError>,
    ) -> ServerResult<()> {
        match result? {
            Ok(()) => Ok(()),
            Err(e) => {
                error!(error = ?e, "server error");
                Err(ServerError::Shutdown { source: e })
            }
        }
    }

    async fn spawn_debug_listener(&self) -> ServerResult<()> {
        let (listener, actual_addr) = Self::bind(self.config.debug_host).await?;
        info!(address = %actual_addr, "debug listener starting");

        let token = self.cancellation_token.child_token();
        tokio::spawn(async move {
            let result = axum::serve(listener, Self::debug_router())
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await;
            info!(result = ?result, "debug listener closed");
        });

        Ok(())
    }

    /// Handle shutdown signals and trigger coordinated cancellation
    ///
    /// This function listens for SIGINT (Ctrl+C) and SIGTERM signals,
    /// and cancels the provided cancellation token when received.
    async fn shutdown_signal_handler(cancellation_token: CancellationToken) {
        let signal_received = async {
            #[cfg(unix)]
            #[allow(clippy::expect_used)]
            {
                use tokio::signal::unix::{SignalKind, signal};

                let mut sigterm =
                    signal(SignalKind::terminate()).expect("Failed to register SIGTERM handler");
                let mut sigint =
                    signal(SignalKind::interrupt()).expect("Failed to register SIGINT handler");

                tokio::select! {
                    _ = sigterm.recv() => "SIGTERM",
                    _ = sigint.recv() => "SIGINT",
                }
            }

            #[cfg(not(unix))]
            #[allow(clippy::expect_used)]
            {
                tokio::signal::ctrl_c()
                    .await
                    .expect("Failed to install CTRL+C signal handler");
                "CTRL+C"
            }
        };

        tokio::select! {
            signal_name = signal_received => {
                warn!(signal = signal_name, "shutdown signal received, cancelling all operations");
                cancellation_token.cancel();
            },
            () = cancellation_token.cancelled() => {}
        }
    }

    /// Returns a clone of the cancellation token for coordinated shutdown
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Initiates graceful shutdown by cancelling the process's cancellation token
    pub fn shutdown(&self) {
        info!("programmatic shutdown requested");
        self.cancellation_token.cancel();
    }

    /// Run the API listener for testing, returns the bound address
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if unable to bind to the configured address.
    pub async fn run_for_testing(self) -> ServerResult<(SocketAddr, CancellationToken)> {
        let (listener, actual_addr) = Self::bind(self.config.api_host).await?;

        let router = Self::api_router(self.server);
        let token = self.cancellation_token.child_token();
        let task = token.child_token();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router)
                .with_graceful_shutdown(async move { task.cancelled().await })
                .await;
        });

        Ok((actual_addr, token))
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the composed request pipeline
    pub fn server(&self) -> &Server {
        &self.server
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use accounts::StubAccountService;

    use super::*;
    use crate::config::Environment;

    #[tokio::test]
    async fn app_creation() -> ServerResult<()> {
        let app = App::new(ServerConfig::for_testing(), StubAccountService::new())?;
        assert_eq!(app.config().environment, Environment::Testing);
        assert!(!app.cancellation_token().is_cancelled());
        Ok(())
    }

    #[tokio::test]
    async fn programmatic_shutdown() -> ServerResult<()> {
        let app = App::new(ServerConfig::for_testing(), StubAccountService::new())?;

        assert!(!app.cancellation_token().is_cancelled());
        app.shutdown();
        assert!(app.cancellation_token().is_cancelled());
        Ok(())
    }

    #[tokio::test]
    async fn rejects_invalid_config() {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 9000);
        let config = ServerConfig {
            api_host: addr,
            debug_host: addr,
            enable_debug: true,
            ..ServerConfig::for_testing()
        };

        let result = App::new(config, StubAccountService::new());
        assert!(matches!(result, Err(ServerError::Config { .. })));
    }

    #[tokio::test]
    async fn run_returns_after_shutdown() -> ServerResult<()> {
        let app = App::new(ServerConfig::for_testing(), StubAccountService::new())?;
        let token = app.cancellation_token();

        let handle = tokio::spawn(app.run());
        token.cancel();

        handle.await??;
        Ok(())
    }
}
