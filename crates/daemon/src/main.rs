// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! samd: System Application Manager daemon.

use sam_daemon::{env, run_daemon, Settings};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let _log_guard = init_tracing();

    let settings_path = env::settings_path();
    let settings = match Settings::load(&settings_path) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("samd: cannot load settings from {}: {e}", settings_path.display());
            std::process::exit(1);
        }
    };

    if let Err(e) = run_daemon(settings).await {
        tracing::error!(error = %e, "daemon failed");
        std::process::exit(1);
    }
}

/// Install the tracing subscriber: stderr by default, a daily-rolling file
/// when `SAM_LOG_DIR` is set. The returned guard keeps the file writer
/// flushing until exit.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::new(env::log_filter());

    match env::log_dir() {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "samd.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}
