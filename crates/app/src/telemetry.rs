//! Tracing subscriber setup.
//!
//! - `LOG_LEVEL` holds the filter directives (default `warn,services=info,storage=info`).
//! - `LOG_FORMAT=json` switches to structured JSON lines.
//!
//! Logs go to stderr so they never interleave with the terminal screens.

use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new("warn,services=info,storage=info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
}
