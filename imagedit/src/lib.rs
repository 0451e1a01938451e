//! ImageEdit AI
//!
//! An HTTP service that edits uploaded images. Edits are either requested
//! directly (brightness, contrast and saturation factors) or inferred from a
//! natural-language prompt by a remote zero-shot classifier.
//!
//! # Architecture
//! - `config`: TOML configuration with environment overrides
//! - `logic`: action mapping, image codec and file storage
//! - `routes`: axum handlers for the public endpoints
//! - `state`: shared, immutable per-process state

#[macro_use]
extern crate derivative;

pub mod config;
pub mod error;
pub mod logic;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::{AppState, State};

/// Initializes the logger.
///
/// Each line carries a local timestamp, the log level, the source file name
/// and line number. The default level is `info`, overridable via `RUST_LOG`.
pub fn init_logger() {
    use std::io::Write;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .filter_module("hyper", log::LevelFilter::Warn)
        .filter_module("reqwest", log::LevelFilter::Warn)
        .format(|buf, record| {
            let style = buf.default_level_style(record.level());
            let ts = chrono::Local::now().format("%H:%M:%S");

            writeln!(
                buf,
                "[{} {style}{}{style:#} {} {}] {}",
                ts,
                record.level(),
                record
                    .file()
                    .unwrap_or("None")
                    .split('/')
                    .next_back()
                    .unwrap_or("None"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .init();
}
