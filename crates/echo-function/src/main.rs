//! Runs one `echo` invocation as a process: a MessagePack `FunctionRequest`
//! on stdin, a MessagePack `FunctionResponse` on stdout.

use std::io::Write;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // stdout carries the response, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Read the request from stdin
    let request = echo_proto::decode_request(std::io::stdin().lock())
        .context("failed to read request from stdin")?;

    let handler = echo_function::echo_function()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let response = runtime.block_on(handler(request))?;

    // Write the response to stdout
    let response = echo_proto::encode_response(&response)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&response)?;
    stdout.flush()?;

    Ok(())
}
