use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::{FunctionRequest, FunctionResponse};

pub type HandlerFuture =
    Pin<Box<dyn Future<Output = anyhow::Result<FunctionResponse>> + Send + 'static>>;

/// A request handler. Middleware wraps one handler and returns another.
pub type Handler = Arc<dyn Fn(FunctionRequest) -> HandlerFuture + Send + Sync>;

/// Lifts an async function into a [`Handler`].
pub fn handler_fn<F, Fut>(f: F) -> Handler
where
    F: Fn(FunctionRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<FunctionResponse>> + Send + 'static,
{
    Arc::new(move |request| Box::pin(f(request)))
}

/// Options the host applies to every function it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalOptions {
    /// Upper bound on concurrently running invocations of one function.
    pub max_instances: usize,
}

impl Default for GlobalOptions {
    fn default() -> Self {
        Self { max_instances: 10 }
    }
}

/// The runtime a function registers itself with.
pub trait FunctionHost {
    fn set_global_options(&mut self, options: GlobalOptions);

    /// Exposes `handler` as an HTTP-triggered function called `name`.
    fn on_request(&mut self, name: &str, handler: Handler);
}
