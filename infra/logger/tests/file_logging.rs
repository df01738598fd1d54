use cmesh_logger::{LevelFilter, Logger, LoggerError};
use serial_test::serial;
use std::fs;
use std::time::Duration;

#[test]
#[serial]
fn file_logging_setup() -> Result<(), LoggerError> {
    let tmp_dir = tempfile::tempdir().map_err(|e| LoggerError::Internal {
        message: e.to_string().into(),
        context: Some("Failed to create temp dir".into()),
    })?;
    let log_dir = tmp_dir.path().join("logs");

    let logger =
        Logger::builder().name("test-app").path(&log_dir).level(LevelFilter::INFO).init()?;

    tracing::info!("hello world");
    // Give the background worker a moment, then flush explicitly.
    std::thread::sleep(Duration::from_millis(20));
    logger.flush();

    assert!(log_dir.exists(), "log directory should be created by logger init");

    let entries = fs::read_dir(&log_dir).map_err(|e| LoggerError::Internal {
        message: e.to_string().into(),
        context: Some(format!("Failed to read log directory {}", log_dir.display()).into()),
    })?;

    let has_log = entries
        .flatten()
        .any(|entry| entry.path().extension().and_then(|e| e.to_str()) == Some("log"));

    assert!(has_log, "at least one log file should be created");
    Ok(())
}
