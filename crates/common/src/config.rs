/// Process-level configuration loaded from environment variables at startup.
/// Everything here has a default; rule parameters live in the TOML scan file.
#[derive(Debug, Clone)]
pub struct Config {
    // Scan config file path
    pub scan_config_path: String,

    // Directory of `<INSTRUMENT>.csv` price files
    pub data_dir: String,

    // Where to write the JSON report (stdout when unset)
    pub report_path: Option<String>,

    // Logging
    pub log_format: LogFormat,
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    /// Load configuration from environment variables.
    /// Loads `.env` if present. Panics on a malformed `LOG_FORMAT`.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let log_format = match optional_env("LOG_FORMAT")
            .unwrap_or_else(|| "pretty".to_string())
            .to_lowercase()
            .as_str()
        {
            "pretty" | "text" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            other => panic!("ERROR: LOG_FORMAT must be 'pretty' or 'json', got: '{other}'"),
        };

        Config {
            scan_config_path: optional_env("SCAN_CONFIG_PATH")
                .unwrap_or_else(|| "config/scan.toml".to_string()),
            data_dir: optional_env("DATA_DIR").unwrap_or_else(|| "data".to_string()),
            report_path: optional_env("REPORT_PATH").filter(|p| !p.trim().is_empty()),
            log_format,
        }
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
