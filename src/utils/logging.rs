#![allow(dead_code)]
use log::{LevelFilter, SetLoggerError, Level};
use env_logger::{Builder, Target};
use std::env;
use std::io::Write;

pub fn init_logging() -> Result<(), SetLoggerError> {
    let env = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let log_level = match env.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };

    let mut builder = Builder::from_default_env();

    // Customize format for better readability
    builder.format(|buf, record| {
        let timestamp = buf.timestamp();
        let target = record.target();
        let file = record.file().unwrap_or("unknown");
        let line = record.line().unwrap_or(0);

        match record.level() {
            Level::Error => {
                writeln!(buf,
                    "{} [ERROR] [{}:{}] {}: {}",
                    timestamp, file, line, target, record.args()
                )
            }
            Level::Warn => {
                writeln!(buf,
                    "{} [WARN] [{}:{}] {}: {}",
                    timestamp, file, line, target, record.args()
                )
            }
            Level::Info => {
                writeln!(buf,
                    "{} [INFO] [{}]: {}",
                    timestamp, target, record.args()
                )
            }
            Level::Debug => {
                writeln!(buf,
                    "{} [DEBUG] [{}:{}] {}: {}",
                    timestamp, file, line, target, record.args()
                )
            }
            Level::Trace => {
                writeln!(buf,
                    "{} [TRACE] [{}:{}] {}: {}",
                    timestamp, file, line, target, record.args()
                )
            }
        }
    });

    // Filter out noisy modules in production
    if env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string()) == "production" {
        builder.filter_module("tokio", LevelFilter::Info);
        builder.filter_module("sqlx", LevelFilter::Warn);
        builder.filter_module("rodio", LevelFilter::Warn);
    }

    builder.filter_level(log_level)
           .target(Target::Stdout)
           .init();
    Ok(())
}

pub fn log_error_with_context(error: &anyhow::Error, context: &str) {
    log::error!("[{}] {}", context, error);

    // Log chain of causes for better debugging
    let mut source = error.source();
    while let Some(err) = source {
        log::error!("  Caused by: {}", err);
        source = err.source();
    }
}

pub fn log_playback_event(event: &str, prayer: &str) {
    log::info!("[Athan] {} for {}", event, prayer);
}

pub fn log_scheduler_event(event: &str, count: usize) {
    log::info!("[Scheduler] {}: {} alarm(s)", event, count);
}

pub fn log_database_operation(operation: &str, table: &str, duration_ms: u64) {
    log::debug!("[Database] {} on table {} took {}ms", operation, table, duration_ms);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_level(value: &str) -> LevelFilter {
        match value.to_lowercase().as_str() {
            "error" => LevelFilter::Error,
            "warn" => LevelFilter::Warn,
            "info" => LevelFilter::Info,
            "debug" => LevelFilter::Debug,
            "trace" => LevelFilter::Trace,
            _ => LevelFilter::Info,
        }
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LevelFilter::Error, parse_level("ERROR"));
        assert_eq!(LevelFilter::Debug, parse_level("debug"));
        assert_eq!(LevelFilter::Info, parse_level("bogus"));
    }
}
