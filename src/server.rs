//! Server startup and lifecycle.
//!
//! The listener is bound before anything is spawned, so an unusable address
//! fails immediately. The accept loop then runs in the background and startup
//! waits a short grace period for it to fail before handing back control.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tracing::{error, info, warn};

use crate::auth::AuthGate;
use crate::config::ServerConfig;
use crate::error::{error_chain, LookupError};
use crate::grpc::SearchServiceImpl;
use crate::mtls::TlsMaterial;
use crate::observability::LookupMetrics;
use crate::proto::search::v1::search_service_server::SearchServiceServer;
use crate::resolver::Resolve;

type ServeResult = Result<(), tonic::transport::Error>;

/// Everything needed to start serving.
#[derive(Clone)]
pub struct ServerOptions {
    /// `host:port` to bind; port 0 picks an ephemeral port
    pub bind_addr: String,
    /// Expected bearer token
    pub auth_token: String,
    /// Server identity and client trust root
    pub tls: TlsMaterial,
    /// How long startup waits for the accept loop to fail
    pub startup_grace: Duration,
}

impl ServerOptions {
    /// Builds options from configuration, loading the TLS files.
    pub fn from_config(config: &ServerConfig) -> Result<Self, LookupError> {
        Ok(Self {
            bind_addr: format!("{}:{}", config.host, config.port),
            auth_token: config.auth_token.clone(),
            tls: TlsMaterial::load(&config.tls)?,
            startup_grace: config.startup_grace,
        })
    }
}

/// Starts the mTLS gRPC server in the background.
///
/// # Errors
///
/// Returns [`LookupError::TransportSetup`] if the address cannot be bound,
/// the TLS configuration is rejected, or the accept loop stops within
/// `startup_grace`.
pub async fn start_server<R: Resolve>(
    resolver: Arc<R>,
    options: ServerOptions,
    metrics: Option<LookupMetrics>,
) -> Result<ServerHandle, LookupError> {
    let listener = TcpListener::bind(&options.bind_addr).await.map_err(|e| {
        LookupError::transport_setup(format!("failed to listen on {}: {e}", options.bind_addr))
    })?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| LookupError::transport_setup(format!("failed to read bound address: {e}")))?;

    let mut gate = AuthGate::new(options.auth_token);
    let mut service = SearchServiceImpl::from_arc(resolver);
    if let Some(metrics) = metrics {
        gate = gate.with_metrics(metrics.clone());
        service = service.with_metrics(metrics);
    }

    let router = Server::builder()
        .tls_config(options.tls.server_tls_config())
        .map_err(|e| LookupError::transport_setup(format!("invalid TLS configuration: {}", error_chain(&e))))?
        .add_service(SearchServiceServer::with_interceptor(service, gate));

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let incoming = TcpListenerStream::new(listener);
    let mut task = tokio::spawn(async move {
        router
            .serve_with_incoming_shutdown(incoming, async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    match tokio::time::timeout(options.startup_grace, &mut task).await {
        Err(_) => {
            info!(%local_addr, "gRPC server listening");
            Ok(ServerHandle {
                local_addr,
                shutdown_tx: Some(shutdown_tx),
                task,
            })
        }
        Ok(joined) => {
            let err = match flatten(joined) {
                Ok(()) => LookupError::transport_setup("accept loop exited during startup"),
                Err(err) => err,
            };
            error!(%local_addr, error = %err, "gRPC server failed to start");
            Err(err)
        }
    }
}

/// Running server.
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<ServeResult>,
}

impl ServerHandle {
    /// The bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serves until `signal` completes or the accept loop stops, then shuts
    /// down gracefully within `timeout`.
    pub async fn serve_until<F>(mut self, signal: F, timeout: Duration) -> Result<(), LookupError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            joined = &mut self.task => {
                error!("gRPC server stopped unexpectedly");
                return flatten(joined);
            }
            _ = signal => {
                info!("Shutdown signal received");
            }
        }
        self.shutdown(timeout).await
    }

    /// Stops accepting connections and waits up to `timeout` for open calls
    /// to finish. Calls still open after that are aborted.
    pub async fn shutdown(mut self, timeout: Duration) -> Result<(), LookupError> {
        info!("Initiating graceful shutdown");
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        match tokio::time::timeout(timeout, &mut self.task).await {
            Ok(joined) => {
                info!("Shutdown complete");
                flatten(joined)
            }
            Err(_) => {
                warn!("Shutdown timeout reached, aborting open calls");
                self.task.abort();
                Ok(())
            }
        }
    }
}

fn flatten(joined: Result<ServeResult, tokio::task::JoinError>) -> Result<(), LookupError> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(LookupError::transport_setup(format!(
            "accept loop failed: {}",
            error_chain(&e)
        ))),
        Err(e) => Err(LookupError::transport_setup(format!("accept loop panicked: {e}"))),
    }
}
