use crate::config::ServerConfig;
use crate::router::Router;
use crate::service::router_service::RouterService;
use hyper::service::Service;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use hyper_util::server::graceful::GracefulShutdown;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

/// Accepts connections and serves them with a [`Router`] until a shutdown signal arrives.
///
/// On shutdown the server stops accepting, closes every connection once its current response
/// is written and finally runs the cleanup of every middleware.
///
/// # Examples
///
/// ```no_run
/// use http_body_util::Full;
/// use hyper::{body::Bytes, Response};
/// use routekit::config::ServerConfig;
/// use routekit::{shutdown_signal, Router, Server};
/// use std::convert::Infallible;
///
/// #[tokio::main]
/// async fn main() -> routekit::Result<()> {
///     let router: Router<Infallible> = Router::builder()
///         .get("/", |_| async move { Ok(Response::new(Full::new(Bytes::from("Home page")))) })
///         .build()?;
///
///     let listener = Server::<Infallible>::bind(&ServerConfig::default()).await?;
///     Server::new(router)?.serve(listener, shutdown_signal()).await
/// }
/// ```
#[derive(Debug)]
pub struct Server<E> {
    service: Arc<RouterService<E>>,
}

impl<E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static> Server<E> {
    pub fn new(router: Router<E>) -> crate::Result<Server<E>> {
        Ok(Server {
            service: Arc::new(RouterService::new(router)?),
        })
    }

    /// Binds a listener to the configured hostname and port.
    pub async fn bind(config: &ServerConfig) -> crate::Result<TcpListener> {
        let addr = config.socket_addr()?;
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(addr = %addr, "Listening");
        Ok(listener)
    }

    pub fn service(&self) -> &Arc<RouterService<E>> {
        &self.service
    }

    /// Serves connections from `listener` until `shutdown` resolves.
    ///
    /// Once `shutdown` resolves, every open connection is asked to close: idle keep-alive
    /// connections close at once, busy ones after their current response. Middleware cleanup
    /// only runs after the last connection is gone.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> crate::Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let graceful = GracefulShutdown::new();
        let builder = Builder::new(TokioExecutor::new());

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => self.spawn_connection(&builder, &graceful, stream, remote_addr).await,
                    Err(err) => tracing::warn!(error = %err, "Failed to accept connection"),
                },
            }
        }
        drop(listener);

        tracing::info!(
            connections = graceful.count(),
            in_flight = self.service.active_requests(),
            "Shutting down, closing connections"
        );
        graceful.shutdown().await;
        self.service.shutdown().await;
        tracing::info!("Server stopped");
        Ok(())
    }

    async fn spawn_connection(
        &self,
        builder: &Builder<TokioExecutor>,
        graceful: &GracefulShutdown,
        stream: TcpStream,
        remote_addr: SocketAddr,
    ) {
        let request_service = match self.service.call(&stream).await {
            Ok(request_service) => request_service,
            Err(never) => match never {},
        };

        let conn = builder
            .serve_connection(TokioIo::new(stream), request_service)
            .into_owned();
        let conn = graceful.watch(conn);

        tokio::spawn(async move {
            if let Err(err) = conn.await {
                tracing::debug!(remote_addr = %remote_addr, error = %err, "Error serving connection");
            }
        });
    }
}

/// Resolves when the process receives Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for the shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
