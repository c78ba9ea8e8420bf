//! Conversions between axum's HTTP types and the function contract.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Query, Request};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use echo_proto::{FunctionRequest, FunctionResponse};
use http_body_util::{Full, LengthLimitError};
use serde_json::Value;
use tracing::error;

/// Largest request body the host will buffer.
pub const BODY_LIMIT: usize = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("malformed query string: {0}")]
    Query(String),
    #[error("request body exceeds {} bytes", BODY_LIMIT)]
    TooLarge,
    #[error("failed to read request body: {0}")]
    Body(axum::Error),
    #[error("malformed json body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed form body: {0}")]
    Form(#[from] serde_urlencoded::de::Error),
}

impl ConvertError {
    pub fn status(&self) -> StatusCode {
        match self {
            ConvertError::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<axum::Error> for ConvertError {
    fn from(err: axum::Error) -> Self {
        let mut source: Option<&(dyn std::error::Error + 'static)> = Some(&err);
        while let Some(cause) = source {
            if cause.is::<LengthLimitError>() {
                return ConvertError::TooLarge;
            }
            source = cause.source();
        }
        ConvertError::Body(err)
    }
}

/// Builds the function's view of `request`. `mount` is the prefix the
/// function is served under and is stripped from the path.
pub async fn into_function_request(
    request: Request,
    mount: &str,
) -> Result<FunctionRequest, ConvertError> {
    let (parts, body) = request.into_parts();

    let path = strip_mount(parts.uri.path(), mount).to_string();
    let url = match parts.uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.clone(),
    };
    let query = parse_query(&parts.uri)?;
    let headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            let value = value.to_str().ok()?;
            Some((name.as_str().to_string(), value.to_string()))
        })
        .collect();

    let bytes = axum::body::to_bytes(body, BODY_LIMIT).await?;
    let body = parse_body(&parts.headers, &bytes)?;

    Ok(FunctionRequest {
        method: Some(parts.method.as_str().to_string()),
        path: Some(path),
        url: Some(url),
        query,
        headers,
        body,
    })
}

pub fn into_http_response(response: FunctionResponse) -> Response {
    let mut builder = axum::http::Response::builder().status(response.status_code);
    for (name, value) in &response.headers {
        builder = builder.header(name, value);
    }

    match builder.body(Full::new(Bytes::from(response.body))) {
        Ok(response) => response.into_response(),
        Err(err) => {
            error!(error = %err, "function produced an invalid response");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

fn strip_mount<'a>(path: &'a str, mount: &str) -> &'a str {
    match path.strip_prefix(mount) {
        Some("") => "/",
        Some(rest) if rest.starts_with('/') => rest,
        _ => path,
    }
}

fn parse_query(uri: &Uri) -> Result<HashMap<String, String>, ConvertError> {
    if uri.query().is_none() {
        return Ok(HashMap::new());
    }
    Query::<HashMap<String, String>>::try_from_uri(uri)
        .map(|Query(query)| query)
        .map_err(|rejection| ConvertError::Query(rejection.body_text()))
}

/// Decodes the body according to its content type: JSON is parsed, forms
/// become an object of strings, text is kept as a string, anything else is
/// dropped.
fn parse_body(headers: &HeaderMap, bytes: &[u8]) -> Result<Option<Value>, ConvertError> {
    if bytes.is_empty() {
        return Ok(None);
    }

    let mime = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|value| value.trim().to_ascii_lowercase())
        .unwrap_or_default();

    if mime == "application/json" || mime.ends_with("+json") {
        return Ok(Some(serde_json::from_slice(bytes)?));
    }
    if mime == "application/x-www-form-urlencoded" {
        let fields: Vec<(String, String)> = serde_urlencoded::from_bytes(bytes)?;
        let object = fields
            .into_iter()
            .map(|(name, value)| (name, Value::String(value)))
            .collect::<serde_json::Map<_, _>>();
        return Ok(Some(Value::Object(object)));
    }
    if mime.starts_with("text/") {
        return Ok(Some(Value::String(String::from_utf8_lossy(bytes).into_owned())));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::HeaderValue;
    use http_body_util::BodyExt;
    use serde_json::json;

    fn content_type(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn mount_prefix_is_stripped() {
        assert_eq!(strip_mount("/echo", "/echo"), "/");
        assert_eq!(strip_mount("/echo/a/b", "/echo"), "/a/b");
        assert_eq!(strip_mount("/echoes", "/echo"), "/echoes");
    }

    #[test]
    fn json_bodies_are_parsed() {
        let headers = content_type("application/json; charset=utf-8");
        let body = parse_body(&headers, br#"{"message":"Y"}"#).unwrap();
        assert_eq!(body, Some(json!({ "message": "Y" })));

        let headers = content_type("application/merge-patch+json");
        assert_eq!(parse_body(&headers, b"[1]").unwrap(), Some(json!([1])));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let headers = content_type("application/json");
        let err = parse_body(&headers, b"{not json").unwrap_err();
        assert!(matches!(err, ConvertError::Json(_)));
    }

    #[test]
    fn form_bodies_become_objects() {
        let headers = content_type("application/x-www-form-urlencoded");
        let body = parse_body(&headers, b"message=hi+there&n=1&n=2").unwrap();
        assert_eq!(body, Some(json!({ "message": "hi there", "n": "2" })));
    }

    #[tokio::test]
    async fn oversized_body_is_too_large() {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/echo")
            .body(Body::from(vec![b'a'; BODY_LIMIT + 1]))
            .unwrap();

        let err = into_function_request(request, "/echo").await.unwrap_err();
        assert!(matches!(err, ConvertError::TooLarge), "{err:?}");
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn text_is_kept_and_other_types_dropped() {
        let body = parse_body(&content_type("text/plain"), b"hello").unwrap();
        assert_eq!(body, Some(json!("hello")));

        let body = parse_body(&content_type("application/octet-stream"), b"\x00\x01").unwrap();
        assert_eq!(body, None);
        assert_eq!(parse_body(&HeaderMap::new(), b"").unwrap(), None);
    }

    #[tokio::test]
    async fn request_parts_are_carried_over() {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/echo/inner?message=hi&x=1")
            .header("content-type", "application/json")
            .header("x-trace", "abc")
            .body(Body::from(r#"{"message":"body"}"#))
            .unwrap();

        let converted = into_function_request(request, "/echo").await.unwrap();
        assert_eq!(converted.method.as_deref(), Some("POST"));
        assert_eq!(converted.path.as_deref(), Some("/inner"));
        assert_eq!(converted.url.as_deref(), Some("/inner?message=hi&x=1"));
        assert_eq!(converted.query_param("message"), Some("hi"));
        assert_eq!(converted.query_param("x"), Some("1"));
        assert!(converted
            .headers
            .contains(&("x-trace".to_string(), "abc".to_string())));
        assert_eq!(converted.body, Some(json!({ "message": "body" })));
    }

    #[tokio::test]
    async fn function_response_becomes_http_response() {
        let response = into_http_response(FunctionResponse {
            status_code: 405,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: br#"{"error":"Method Not Allowed"}"#.to_vec(),
        });

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()["content-type"], "application/json");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"{"error":"Method Not Allowed"}"#);
    }

    #[test]
    fn invalid_status_becomes_500() {
        let response = into_http_response(FunctionResponse {
            status_code: 42,
            headers: Vec::new(),
            body: Vec::new(),
        });
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
