use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use common::{Config, LogFormat, Result};
use engine::{BatchResult, BatchRunner, BatchStatus, CsvDirectoryProvider, StatusSnapshot};
use strategy::{Rule, ScanFileConfig};

/// JSON document written at the end of a scan.
#[derive(Serialize)]
struct ScanReport {
    rule: Rule,
    status: StatusSnapshot,
    result: BatchResult,
}

#[tokio::main]
async fn main() {
    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    init_logging(cfg.log_format);
    info!(config = %cfg.scan_config_path, data_dir = %cfg.data_dir, "Scanner starting");

    let scan_file = ScanFileConfig::load(&cfg.scan_config_path)
        .unwrap_or_else(|e| panic!("Failed to load scan config: {e}"));
    let rule = Rule::from_config(&scan_file.rule)
        .unwrap_or_else(|e| panic!("Invalid rule in '{}': {e}", cfg.scan_config_path));
    let runner = BatchRunner::new(rule, scan_file.scan.concurrency)
        .unwrap_or_else(|e| panic!("Invalid scan settings: {e}"));

    // ── Universe ──────────────────────────────────────────────────────────────
    let provider = CsvDirectoryProvider::new(&cfg.data_dir);
    let instruments = match scan_file.scan.instruments {
        Some(list) => list,
        None => provider.instruments().await.unwrap_or_else(|e| {
            panic!("Failed to list price files in '{}': {e}", cfg.data_dir)
        }),
    };
    if instruments.is_empty() {
        warn!(data_dir = %cfg.data_dir, "No instruments to scan");
    }

    // ── Cancellation ──────────────────────────────────────────────────────────
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Shutdown signal received. Finishing in-flight instruments.");
            cancel_tx.send_replace(true);
        }
    });

    // ── Run ───────────────────────────────────────────────────────────────────
    let status = BatchStatus::new();
    let result = runner
        .run(&instruments, Arc::new(provider), &status, cancel_rx)
        .await;

    let report = ScanReport {
        rule,
        status: status.snapshot().await,
        result,
    };
    if let Err(e) = write_report(&report, cfg.report_path.as_deref()) {
        panic!("Failed to write report: {e}");
    }
}

/// Pretty JSON to `path`, or to stdout when no path is set.
fn write_report<T: Serialize>(report: &T, path: Option<&str>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    match path {
        Some(path) => {
            std::fs::write(path, json)?;
            info!(path = %path, "Report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Logs go to stderr so stdout stays free for the report.
fn init_logging(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use common::Error;

    #[test]
    fn report_is_written_as_pretty_json() {
        let path = std::env::temp_dir().join(format!("scan-report-{}.json", std::process::id()));
        let path_str = path.to_string_lossy().into_owned();
        let mut report = BTreeMap::new();
        report.insert("emitted", 2);

        write_report(&report, Some(path_str.as_str())).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(written, "{\n  \"emitted\": 2\n}");
    }

    #[test]
    fn unserializable_report_is_a_json_error() {
        // JSON object keys must be strings
        let mut report = BTreeMap::new();
        report.insert((1, 2), "pair");
        let err = write_report(&report, None).unwrap_err();
        assert!(matches!(err, Error::Json(_)), "{err}");
    }

    #[test]
    fn unwritable_path_is_an_io_error() {
        let dir = std::env::temp_dir().join(format!("scan-missing-{}", std::process::id()));
        let path = dir.join("nested").join("report.json");
        let path_str = path.to_string_lossy().into_owned();
        let err = write_report(&1, Some(path_str.as_str())).unwrap_err();
        assert!(matches!(err, Error::Io(_)), "{err}");
    }
}
