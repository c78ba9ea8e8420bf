use echo_proto::{handler_fn, FunctionRequest, FunctionResponse, Handler, ResponseSink};
use serde_json::{json, Value};

use crate::presence::is_present;

pub const DEFAULT_MESSAGE: &str = "Hello World!";

/// Picks the message to echo: the `message` query parameter, then the
/// body's `message` field, then [`DEFAULT_MESSAGE`]. Empty and falsy values
/// fall through to the next source.
pub fn resolve_message(request: &FunctionRequest) -> Value {
    if let Some(message) = request.query_param("message").filter(|m| !m.is_empty()) {
        return Value::String(message.to_string());
    }

    request
        .body
        .as_ref()
        .and_then(|body| body.get("message"))
        .filter(|message| is_present(message))
        .cloned()
        .unwrap_or_else(|| Value::String(DEFAULT_MESSAGE.to_string()))
}

/// Terminal handler answering `{"message": ...}`.
pub fn echo() -> Handler {
    handler_fn(respond)
}

async fn respond(request: FunctionRequest) -> anyhow::Result<FunctionResponse> {
    let message = resolve_message(&request);
    Ok(ResponseSink::new().json(&json!({ "message": message }))?)
}
