use std::future::IntoFuture;
use std::net::SocketAddr;

use axum::Router;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::info;

/// Errors that can occur while serving HTTP.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Server already started.
    #[error("server already started")]
    AlreadyStarted,

    /// Failed to bind the listen address.
    #[error("failed to bind listen address: {0}")]
    Bind(std::io::Error),
}

/// Plain HTTP server for the ingestion router.
pub struct HttpServer {
    listen_addr: SocketAddr,
    shutdown_token: CancellationToken,
    task_tracker: TaskTracker,
}

impl HttpServer {
    /// Creates a new instance of `HttpServer`.
    #[must_use]
    pub fn new(listen_addr: SocketAddr) -> Self {
        Self {
            listen_addr,
            shutdown_token: CancellationToken::new(),
            task_tracker: TaskTracker::new(),
        }
    }

    /// Binds the listen address and serves the router until shutdown.
    pub async fn start(&self, router: Router) -> Result<JoinHandle<()>, ServeError> {
        if self.task_tracker.is_closed() {
            return Err(ServeError::AlreadyStarted);
        }

        let listener = tokio::net::TcpListener::bind(self.listen_addr)
            .await
            .map_err(ServeError::Bind)?;

        info!(addr = %self.listen_addr, "http server listening");

        let shutdown_token = self.shutdown_token.clone();
        let handle = self.task_tracker.spawn(async move {
            tokio::select! {
                e = axum::serve(
                    listener,
                    router.into_make_service_with_connect_info::<SocketAddr>(),
                )
                .into_future() => {
                    info!("http server exited {e:?}");
                }
                () = shutdown_token.cancelled() => {}
            }
        });

        self.task_tracker.close();

        Ok(handle)
    }

    /// Stops the server and waits for the serve task to exit.
    pub async fn shutdown(&self) {
        info!("http server shutting down...");

        self.shutdown_token.cancel();
        self.task_tracker.wait().await;

        info!("http server shutdown");
    }
}
