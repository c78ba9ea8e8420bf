//! Contract shared between a function host and the functions it runs.
//!
//! A host turns each inbound HTTP request into a [`FunctionRequest`], hands it
//! to a registered [`Handler`], and writes the resulting [`FunctionResponse`]
//! back to the client. Functions register against the [`FunctionHost`] trait
//! and never see the transport.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

mod handler;
mod wire;

pub use handler::{handler_fn, FunctionHost, GlobalOptions, Handler, HandlerFuture};
pub use wire::{decode_request, decode_response, encode_request, encode_response};

#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    #[error("failed to encode message: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("failed to decode message: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    #[error("invalid json body: {0}")]
    Json(#[from] serde_json::Error),
}

/// One invocation's inbound request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionRequest {
    pub method: Option<String>,
    /// Path relative to the function's mount point.
    pub path: Option<String>,
    /// Path plus query string, as received.
    pub url: Option<String>,
    pub query: HashMap<String, String>,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl FunctionRequest {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: Some(method.into()),
            ..Self::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

/// A response that has not been written yet.
///
/// Writing the body consumes the sink, so a response can be completed once.
#[derive(Debug)]
pub struct ResponseSink {
    status_code: u16,
    headers: Vec<(String, String)>,
}

impl Default for ResponseSink {
    fn default() -> Self {
        Self {
            status_code: 200,
            headers: Vec::new(),
        }
    }
}

impl ResponseSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Completes the response with a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<FunctionResponse, ProtoError> {
        let body = serde_json::to_vec(value)?;
        self.headers
            .push(("Content-Type".to_string(), "application/json".to_string()));
        Ok(FunctionResponse {
            status_code: self.status_code,
            headers: self.headers,
            body,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub status_code: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl FunctionResponse {
    /// Case-insensitive header lookup; the first match wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json_body(&self) -> Result<serde_json::Value, ProtoError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}
