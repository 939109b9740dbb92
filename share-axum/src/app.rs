use std::sync::Arc;

use axum::extract::Request;
use axum::handler::Handler;
use axum::routing::{get, Route};
use axum::Router;
use serde::de::DeserializeOwned;
use serde::Serialize;
use share_core::{ShareApp, ShareService};
use tokio::net::{TcpListener, ToSocketAddrs};
use tower::{Layer, Service};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::params::FromRestParams;
use crate::rest;

pub struct AxumApp<R, P = ()>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    pub app: Arc<ShareApp<R, P>>,
    routes: Router<()>,
    cors: Option<CorsLayer>,
}

impl<R, P> Clone for AxumApp<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            app: Arc::clone(&self.app),
            routes: self.routes.clone(),
            cors: self.cors.clone(),
        }
    }
}

impl<R, P> AxumApp<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    pub fn new(app: ShareApp<R, P>) -> Self {
        Self {
            app: Arc::new(app),
            routes: Router::new(),
            cors: None,
        }
    }

    /// Mount a plain router. `/` merges instead of nesting.
    pub fn use_router(mut self, path: &str, router: Router<()>) -> Self {
        self.routes = if path.is_empty() || path == "/" {
            self.routes.merge(router)
        } else {
            self.routes.nest(path, router)
        };
        self
    }

    /// Mount a GET handler at `path`.
    pub fn service<H, T>(mut self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()> + Clone + Send + Sync + 'static,
        T: 'static,
    {
        self.routes = self.routes.route(path, get(handler));
        self
    }

    /// Register `service` under the path's name and mount its REST routes.
    pub fn use_service(self, path: &'static str, service: Arc<dyn ShareService<R, P>>) -> Self
    where
        R: Serialize + DeserializeOwned,
        P: FromRestParams,
    {
        let router = self.register_and_route(path, service);
        self.use_router(path, router)
    }

    /// Like [`AxumApp::use_service`], with `layer` wrapped around the service
    /// routes only (e.g. multipart conversion, body limits).
    pub fn use_service_with<L>(self, path: &'static str, service: Arc<dyn ShareService<R, P>>, layer: L) -> Self
    where
        R: Serialize + DeserializeOwned,
        P: FromRestParams,
        L: Layer<Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request>>::Response: axum::response::IntoResponse + 'static,
        <L::Service as Service<Request>>::Error: Into<std::convert::Infallible> + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        let router = self.register_and_route(path, service).layer(layer);
        self.use_router(path, router)
    }

    fn register_and_route(&self, path: &'static str, service: Arc<dyn ShareService<R, P>>) -> Router<()>
    where
        R: Serialize + DeserializeOwned,
        P: FromRestParams,
    {
        let name = path.trim_start_matches('/');
        let capabilities = service.capabilities();
        self.app.register_service(name, service);

        tracing::debug!(service = name, methods = ?capabilities.allowed_methods, "mounting service");
        rest::service_router(Arc::new(name.to_string()), Arc::clone(&self.app), &capabilities)
    }

    pub fn with_cors(mut self, cors: CorsLayer) -> Self {
        self.cors = Some(cors);
        self
    }

    /// The full router with request ids, tracing and CORS applied.
    pub fn router(&self) -> Router<()> {
        let mut router = self.routes.clone();
        if let Some(cors) = &self.cors {
            router = router.layer(cors.clone());
        }

        router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
                let request_id = req
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "listening");
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

pub fn axum<R, P>(app: ShareApp<R, P>) -> AxumApp<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    AxumApp::new(app)
}
