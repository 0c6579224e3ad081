//! `TandemServer` builder and server loop.
//!
//! Ties the layers together: transport → protocol → relay actor, with the
//! janitor running beside the relay.

use std::future::Future;
use std::sync::Arc;

use tandem_protocol::{Codec, JsonCodec};
use tandem_room::{RelayConfig, RelayHandle, spawn_janitor, spawn_relay};
use tandem_transport::{Transport, WebSocketTransport};
use tokio::task::JoinHandle;

use crate::TandemError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) relay: RelayHandle,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Tandem relay.
///
/// # Example
///
/// ```rust,ignore
/// use tandem::prelude::*;
///
/// let server = TandemServer::builder()
///     .bind("0.0.0.0:10000")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct TandemServerBuilder {
    bind_addr: String,
    relay_config: RelayConfig,
}

impl TandemServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "0.0.0.0:10000".to_string(),
            relay_config: RelayConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the relay's retention window, sweep period and start delay.
    pub fn relay_config(mut self, config: RelayConfig) -> Self {
        self.relay_config = config;
        self
    }

    /// Binds the listener and starts the relay actor and janitor.
    pub async fn build(self) -> Result<TandemServer, TandemError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let config = self.relay_config.validated();
        let relay = spawn_relay(config.clone());
        let janitor = spawn_janitor(relay.clone(), config.sweep_interval);

        let state = Arc::new(ServerState {
            relay,
            codec: JsonCodec,
        });

        Ok(TandemServer {
            transport,
            state,
            janitor,
        })
    }
}

impl Default for TandemServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Tandem relay.
///
/// Call [`run()`](Self::run) or [`run_until()`](Self::run_until) to start
/// accepting connections.
pub struct TandemServer {
    transport: WebSocketTransport,
    state: Arc<ServerState<JsonCodec>>,
    janitor: JoinHandle<()>,
}

impl TandemServer {
    /// Creates a new builder.
    pub fn builder() -> TandemServerBuilder {
        TandemServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Handle to the relay actor, e.g. for `room_count()`.
    pub fn relay(&self) -> RelayHandle {
        self.state.relay.clone()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), TandemError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` completes, then closes every
    /// connection and stops the relay and janitor.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), TandemError> {
        tracing::info!("Tandem relay running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        tracing::info!("shutdown requested, draining relay");
        let rooms = self.state.relay.shutdown().await?;
        self.janitor.abort();
        tracing::info!(rooms, "Tandem relay stopped");
        Ok(())
    }
}
