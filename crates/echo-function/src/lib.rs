//! The `echo` function.
//!
//! A POST-only HTTP function that answers with `{"message": ...}`, built as
//! a chain of handler wrappers:
//!
//! ```text
//! host -> with_logging -> with_method_check(["POST"]) -> echo
//! ```

pub mod echo;
pub mod middleware;
mod presence;

use echo_proto::{FunctionHost, GlobalOptions, Handler};

pub use echo::{echo, resolve_message, DEFAULT_MESSAGE};
pub use middleware::{with_logging, with_method_check, MethodAllowList, RequestRecord};
pub use presence::is_present;

pub const FUNCTION_NAME: &str = "echo";

#[derive(Debug, thiserror::Error)]
pub enum FunctionError {
    #[error("method allow-list is empty")]
    EmptyAllowList,
    #[error("invalid method token {0:?}")]
    InvalidMethod(String),
}

/// Options declared to the host for every function in this crate.
pub fn global_options() -> GlobalOptions {
    GlobalOptions { max_instances: 10 }
}

/// The fully composed `echo` handler.
pub fn echo_function() -> Result<Handler, FunctionError> {
    let allowed = MethodAllowList::new(["POST"])?;
    Ok(with_logging(with_method_check(allowed, echo())))
}

/// Declares the global options and exposes `echo` on `host`.
pub fn register<H: FunctionHost + ?Sized>(host: &mut H) -> Result<(), FunctionError> {
    host.set_global_options(global_options());
    host.on_request(FUNCTION_NAME, echo_function()?);
    Ok(())
}
