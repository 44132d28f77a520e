use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the REST API binds to
    pub bind_address: String,

    /// Port for the REST API server
    pub port: u16,

    /// Directory holding decoded capture JSON files
    pub data_dir: PathBuf,

    /// Base URL of the remote report/export service
    pub report_service_url: String,

    /// Timeout for a single export request
    pub request_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error, off)
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 3000,
            data_dir: PathBuf::from("json_files"),
            report_service_url: "http://127.0.0.1:5000".to_string(),
            request_timeout_secs: 30,
            log_level: "info".to_string(),
        }
    }
}
