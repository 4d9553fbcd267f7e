//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the gateway handler
//! - Wire up middleware (request ID, tracing, request timeout)
//! - Serve on a plain TCP listener or over TLS
//! - Stop accepting on shutdown and drain in-flight requests
//!
//! Client disconnects drop the handler future, which drops the in-flight
//! upstream call with it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{GatewayConfig, TlsConfig};
use crate::http::gateway::{Gateway, GatewayBuildError};
use crate::http::request::{request_id, MakeRequestUuidV4, X_REQUEST_ID};
use crate::lifecycle::shutdown::wait_for;
use crate::net::tls::load_tls_config;
use crate::upstream::{HttpUpstream, Upstream};

/// Grace period for in-flight TLS connections after shutdown.
const TLS_DRAIN_GRACE: Duration = Duration::from_secs(10);

/// HTTP server for the edge proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a server forwarding to the configured upstream over HTTP(S).
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayBuildError> {
        let gateway = Gateway::<HttpUpstream>::from_config(config)?;
        Ok(Self {
            router: Self::build_router(config, Arc::new(gateway)),
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router<U: Upstream>(config: &GatewayConfig, gateway: Arc<Gateway<U>>) -> Router {
        Router::new()
            .route("/{*path}", any(gateway_handler::<U>))
            .route("/", any(gateway_handler::<U>))
            .with_state(gateway)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            request_id = %request_id(request),
                            method = %request.method(),
                            path = %request.uri().path(),
                        )
                    }))
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// The router, for in-process use (tests, embedding).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until shutdown.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(wait_for(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server over TLS on `addr` until shutdown.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: &TlsConfig,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let rustls = load_tls_config(tls).await?;
        let handle = axum_server::Handle::new();

        let watcher = handle.clone();
        tokio::spawn(async move {
            wait_for(shutdown).await;
            watcher.graceful_shutdown(Some(TLS_DRAIN_GRACE));
        });

        tracing::info!(address = %addr, "HTTPS server starting");
        axum_server::bind_rustls(addr, rustls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Catch-all handler: every request goes through the gateway.
async fn gateway_handler<U: Upstream>(
    State(gateway): State<Arc<Gateway<U>>>,
    request: Request<Body>,
) -> Response {
    gateway.handle(request).await
}
