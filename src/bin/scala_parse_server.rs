//! `scala-parse-server`: answers parse requests on stdin/stdout.
//!
//! Logs go to stderr and are filtered with `RUST_LOG`.

use std::io;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    let stdin = io::stdin();
    let stdout = io::stdout();
    match scala_gazelle::parser::server::serve(stdin.lock(), stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "parse server failed");
            eprintln!("scala-parse-server: {err}");
            ExitCode::FAILURE
        }
    }
}
