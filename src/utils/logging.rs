use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;

/// Initialize the logger with timestamped, target-tagged lines.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logger(level: LevelFilter) {
    let result = Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .filter(None, level)
        // Keep the HTTP client's connection chatter out of debug output
        .filter_module("hyper", LevelFilter::Warn)
        .filter_module("reqwest", LevelFilter::Warn)
        .try_init();

    if result.is_err() {
        log::debug!("Logger already initialized");
    }
}

/// Get log level from string
pub fn get_log_level(level: &str) -> LevelFilter {
    match level.trim().to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" | "warning" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}
