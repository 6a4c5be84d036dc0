use chrono::{DateTime, Local};
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` filter (default `info`); `LOG_FORMAT=json` for JSON lines.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.trim().eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        eprintln!("tracing already initialised: {e}");
    }
}

pub fn heartbeat_line(seq: u64) -> String {
    let now: DateTime<Local> = Local::now();
    format!("{} heartbeat seq={seq}", now.to_rfc3339())
}
