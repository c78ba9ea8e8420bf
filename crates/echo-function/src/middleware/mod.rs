//! Handler wrappers.
//!
//! Each wrapper takes the next [`Handler`](echo_proto::Handler) and returns a
//! new one, so a chain is built by nesting calls:
//!
//! ```text
//! with_logging(with_method_check(allowed, echo()))
//! ```
//!
//! The outermost wrapper runs first.

mod logging;
mod method_check;

pub use logging::{with_logging, RequestRecord};
pub use method_check::{with_method_check, MethodAllowList};
