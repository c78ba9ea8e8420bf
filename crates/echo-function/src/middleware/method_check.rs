use std::collections::BTreeSet;
use std::sync::Arc;

use echo_proto::{FunctionRequest, FunctionResponse, Handler, HandlerFuture, ResponseSink};
use serde_json::json;
use tracing::debug;

use crate::FunctionError;

/// HTTP methods a function accepts. Matching is case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodAllowList {
    methods: BTreeSet<String>,
}

impl MethodAllowList {
    pub fn new<I, S>(methods: I) -> Result<Self, FunctionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = BTreeSet::new();
        for method in methods {
            let method = method.into();
            if method.is_empty() || !method.bytes().all(|b| b.is_ascii_graphic()) {
                return Err(FunctionError::InvalidMethod(method));
            }
            set.insert(method);
        }
        if set.is_empty() {
            return Err(FunctionError::EmptyAllowList);
        }
        Ok(Self { methods: set })
    }

    pub fn contains(&self, method: &str) -> bool {
        self.methods.contains(method)
    }

    /// Value for an `Allow` header.
    fn allow_header(&self) -> String {
        self.methods.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
    }
}

/// Rejects requests whose method is not in `allowed` with a 405; passes the
/// rest to `next` untouched.
pub fn with_method_check(allowed: MethodAllowList, next: Handler) -> Handler {
    let allowed = Arc::new(allowed);
    Arc::new(move |request: FunctionRequest| -> HandlerFuture {
        let method = request.method.as_deref().unwrap_or("");
        if !allowed.contains(method) {
            debug!(method, "rejecting request");
            let response = method_not_allowed(&allowed);
            return Box::pin(async move { response });
        }
        next(request)
    })
}

fn method_not_allowed(allowed: &MethodAllowList) -> anyhow::Result<FunctionResponse> {
    Ok(ResponseSink::new()
        .status(405)
        .header("Allow", allowed.allow_header())
        .json(&json!({ "error": "Method Not Allowed" }))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_handler(calls: Arc<AtomicUsize>) -> Handler {
        echo_proto::handler_fn(move |_request| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                anyhow::Ok(ResponseSink::new().json(&json!({ "reached": true }))?)
            }
        })
    }

    #[test]
    fn allow_list_must_not_be_empty() {
        let err = MethodAllowList::new(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, FunctionError::EmptyAllowList));
    }

    #[test]
    fn allow_list_rejects_blank_tokens() {
        let err = MethodAllowList::new(["POST", " "]).unwrap_err();
        assert!(matches!(err, FunctionError::InvalidMethod(m) if m == " "));
        assert!(MethodAllowList::new([""]).is_err());
    }

    #[test]
    fn membership_is_case_sensitive() {
        let allowed = MethodAllowList::new(["POST"]).unwrap();
        assert!(allowed.contains("POST"));
        assert!(!allowed.contains("post"));
        assert!(!allowed.contains(""));
    }

    #[tokio::test]
    async fn allowed_method_reaches_next() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = with_method_check(
            MethodAllowList::new(["POST"]).unwrap(),
            counting_handler(Arc::clone(&calls)),
        );

        let response = handler(FunctionRequest::new("POST")).await.unwrap();
        assert_eq!(response.status_code, 200);
        assert_eq!(response.json_body().unwrap(), json!({ "reached": true }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn other_methods_get_405_without_calling_next() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = with_method_check(
            MethodAllowList::new(["POST"]).unwrap(),
            counting_handler(Arc::clone(&calls)),
        );

        for method in ["GET", "DELETE", "post"] {
            let response = handler(FunctionRequest::new(method)).await.unwrap();
            assert_eq!(response.status_code, 405);
            assert_eq!(response.header("allow"), Some("POST"));
            assert_eq!(
                response.json_body().unwrap(),
                json!({ "error": "Method Not Allowed" })
            );
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_method_is_rejected() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = with_method_check(
            MethodAllowList::new(["GET", "POST"]).unwrap(),
            counting_handler(Arc::clone(&calls)),
        );

        let response = handler(FunctionRequest::default()).await.unwrap();
        assert_eq!(response.status_code, 405);
        assert_eq!(response.header("allow"), Some("GET, POST"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
