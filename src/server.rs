//! The application pipeline and the HTTP server that hosts it.
//!
//! Every request goes through the same steps: the routing adapter rewrites
//! it (or hands it to the static responder), then the dispatcher picks the
//! action handler for the resolved controller and action.
//!
//! # Graceful shutdown
//!
//! On SIGTERM or Ctrl-C the server stops accepting connections, lets every
//! in-flight connection finish, then returns from [`Server::serve`].

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{debug, error, info};

use crate::context::RouteMatch;
use crate::dispatcher::Dispatcher;
use crate::error::Error;
use crate::middleware::routing::{Routing, RoutingAdapter};
use crate::request::Request;
use crate::response::Response;

// ── App ───────────────────────────────────────────────────────────────────────

/// Routing adapter plus dispatcher: everything needed to answer a request.
pub struct App {
    adapter: RoutingAdapter,
    dispatcher: Dispatcher,
}

impl App {
    pub fn new(adapter: RoutingAdapter, dispatcher: Dispatcher) -> Self {
        Self { adapter, dispatcher }
    }

    pub fn adapter(&self) -> &RoutingAdapter {
        &self.adapter
    }

    /// Answers one request.
    ///
    /// Unrouted URLs get `404`. A route that cannot name a controller and
    /// action is a broken deployment: it is logged and answered with `500`.
    pub async fn handle(&self, mut req: http::Request<Bytes>) -> Response {
        match self.adapter.route(&mut req).await {
            Ok(Routing::StaticFile(file)) => serve_file(&file, req).await,
            Ok(Routing::NoMatch) => Response::status(StatusCode::NOT_FOUND),
            Ok(Routing::Dispatch(dispatch_path)) => self.dispatch(req, &dispatch_path).await,
            Err(e) => {
                error!(uri = %req.uri(), "routing failed: {e}");
                Response::status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    async fn dispatch(&self, req: http::Request<Bytes>, dispatch_path: &str) -> Response {
        let (mut parts, body) = req.into_parts();
        let Some(route_match) = parts.extensions.remove::<RouteMatch>() else {
            return Response::status(StatusCode::NOT_FOUND);
        };
        let Some(handler) = self.dispatcher.lookup(&route_match) else {
            debug!(dispatch_path, "no action registered");
            return Response::status(StatusCode::NOT_FOUND);
        };

        let request = Request::new(
            route_match.context().method(),
            parts.uri.path().to_owned(),
            parts.uri.query().map(str::to_owned),
            parts.headers,
            body,
            route_match,
        );
        handler.call(request).await
    }
}

/// Answers from a file under the static root. `ServeFile` handles the
/// content type, `HEAD`, conditional and range requests.
async fn serve_file(file: &Path, req: http::Request<Bytes>) -> Response {
    let response = match ServeFile::new(file).oneshot(req).await {
        Ok(response) => response,
        Err(never) => match never {},
    };
    let (parts, body) = response.into_parts();
    match body.collect().await {
        Ok(collected) => Response::from_parts(parts.status, &parts.headers, collected.to_bytes().to_vec()),
        Err(e) => {
            error!(file = %file.display(), "cannot read static file: {e}");
            Response::status(StatusCode::NOT_FOUND)
        }
    }
}

// ── Server ────────────────────────────────────────────────────────────────────

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr }
    }

    /// Accepts connections and answers them with `app` until shutdown.
    pub async fn serve(self, app: App) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let app = Arc::new(app);

        info!(
            addr = %self.addr,
            routes = app.adapter().engine().table().len(),
            "switchyard listening"
        );

        let mut tasks = tokio::task::JoinSet::new();
        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Shutdown first, so a signal stops accepting even when
                // connections are queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let app = Arc::clone(&app);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        let svc = service_fn(move |req| {
                            let app = Arc::clone(&app);
                            async move { dispatch(app, req).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connections.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("switchyard stopped");
        Ok(())
    }
}

/// Buffers the body, then hands the request to the app. Never fails towards
/// hyper.
async fn dispatch(
    app: Arc<App>,
    req: hyper::Request<Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let response = match body.collect().await {
        Ok(collected) => app.handle(http::Request::from_parts(parts, collected.to_bytes())).await,
        Err(e) => {
            debug!("failed to read request body: {e}");
            Response::status(StatusCode::BAD_REQUEST)
        }
    };
    Ok(response.into_inner())
}

/// Resolves on SIGTERM or Ctrl-C; only Ctrl-C off Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
