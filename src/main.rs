mod attendance;
mod bulk;
mod dates;
mod db;
mod ipc;
mod report;
mod roster;
mod selection;
mod sink;

use attendance::{Clock, FixedClock, SystemClock};
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_env("ROLLCALLD_LOG")
        .unwrap_or_else(|_| EnvFilter::new("rollcalld=info"));
    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn clock_from_env() -> Box<dyn Clock> {
    match std::env::var("ROLLCALLD_TODAY") {
        Ok(raw) => match dates::parse_date(&raw) {
            Ok(d) => {
                tracing::info!(today = %raw, "clock pinned");
                Box::new(FixedClock(d))
            }
            Err(e) => {
                tracing::warn!(error = %e, "ignoring ROLLCALLD_TODAY");
                Box::new(SystemClock)
            }
        },
        Err(_) => Box::new(SystemClock),
    }
}

fn main() {
    init_logging();
    let mut state = ipc::AppState::new(clock_from_env());

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, "stdin closed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}
