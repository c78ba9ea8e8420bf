use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone};
use echo_proto::{FunctionRequest, Handler, HandlerFuture};
use tracing::info;

use crate::presence::is_present;

/// What gets logged for each invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    pub method: String,
    pub path: String,
    pub timestamp: String,
    pub body: String,
}

impl RequestRecord {
    pub fn capture<Tz>(request: &FunctionRequest, now: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let method = request
            .method
            .as_deref()
            .filter(|method| !method.is_empty())
            .unwrap_or("UNKNOWN")
            .to_uppercase();
        let path = [request.path.as_deref(), request.url.as_deref()]
            .into_iter()
            .flatten()
            .find(|path| !path.is_empty())
            .unwrap_or("-")
            .to_string();
        let body = match request.body.as_ref().filter(|body| is_present(body)) {
            Some(body) => body.to_string(),
            None => "-".to_string(),
        };

        Self {
            method,
            path,
            timestamp: now.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
            body,
        }
    }
}

impl fmt::Display for RequestRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} | {}",
            self.method, self.path, self.timestamp, self.body
        )
    }
}

/// Logs one [`RequestRecord`] per invocation, then runs `next` to completion.
///
/// Errors from `next` are returned as they are.
pub fn with_logging(next: Handler) -> Handler {
    Arc::new(move |request: FunctionRequest| -> HandlerFuture {
        let next = Arc::clone(&next);
        Box::pin(async move {
            let record = RequestRecord::capture(&request, &Local::now());
            info!("{record}");
            next(request).await
        })
    })
}
