//! An HTTP host for functions written against `echo-proto`.
//!
//! Each registered function is served under `/{name}` (and every path below
//! it) for all methods. The host converts HTTP requests into
//! [`FunctionRequest`](echo_proto::FunctionRequest)s, caps how many
//! invocations of each function run at once, and turns handler failures into
//! `500` responses.

pub mod config;
pub mod convert;

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use echo_proto::{FunctionHost, GlobalOptions, Handler};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

pub use config::{ConfigError, HostConfig};

#[derive(Clone, Default)]
pub struct HttpHost {
    options: GlobalOptions,
    functions: BTreeMap<String, Handler>,
}

#[derive(Clone)]
struct FunctionSlot {
    name: Arc<str>,
    mount: Arc<str>,
    handler: Handler,
    instances: Arc<Semaphore>,
}

impl FunctionHost for HttpHost {
    fn set_global_options(&mut self, options: GlobalOptions) {
        self.options = options;
    }

    fn on_request(&mut self, name: &str, handler: Handler) {
        if self.functions.insert(name.to_string(), handler).is_some() {
            warn!(function = name, "replacing previously registered function");
        }
    }
}

impl HttpHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(&self) -> GlobalOptions {
        self.options
    }

    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn into_router(self) -> Router {
        let max_instances = self.options.max_instances.clamp(1, Semaphore::MAX_PERMITS);

        let mut router = Router::new();
        for (name, handler) in self.functions {
            let mount = format!("/{name}");
            let slot = FunctionSlot {
                name: Arc::from(name.as_str()),
                mount: Arc::from(mount.as_str()),
                handler,
                instances: Arc::new(Semaphore::new(max_instances)),
            };
            let route = any(invoke).with_state(slot);
            router = router
                .route(&mount, route.clone())
                .route(&format!("{mount}/*rest"), route);
        }
        router
    }

    /// Serves all registered functions on `listener` until `shutdown`
    /// resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        let max_instances = self.options.max_instances;
        for name in self.function_names() {
            info!(function = name, max_instances, "function registered");
        }
        info!(%addr, "function host listening");

        axum::serve(listener, self.into_router())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("function host stopped");
        Ok(())
    }
}

async fn invoke(State(slot): State<FunctionSlot>, request: Request) -> Response {
    let request = match convert::into_function_request(request, &slot.mount).await {
        Ok(request) => request,
        Err(err) => {
            warn!(function = %slot.name, error = %err, "rejecting malformed request");
            let status = err.status();
            let reason = status.canonical_reason().unwrap_or("Bad Request");
            return (status, Json(json!({ "error": reason }))).into_response();
        }
    };

    // Held until the invocation finishes.
    let Ok(_permit) = slot.instances.acquire().await else {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };

    match (slot.handler)(request).await {
        Ok(response) => convert::into_http_response(response),
        Err(err) => {
            error!(function = %slot.name, error = %err, "function failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}
