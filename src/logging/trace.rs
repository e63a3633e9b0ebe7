//! Diagnostic trace log file for the binary's tracing subscriber

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::constants::TRACE_LOG_FILE;

/// Build a unique trace log path under `<dir>/logs`, based on PID and timestamp
pub fn trace_log_path(dir: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let timestamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    let pid = std::process::id();

    let logs_dir = dir.join("logs");
    std::fs::create_dir_all(&logs_dir)?;

    let stem = TRACE_LOG_FILE.trim_end_matches(".log");
    Ok(logs_dir.join(format!("{stem}_{pid}_{timestamp}.log")))
}

/// Create the trace log file in the current directory
pub fn create_trace_log_file() -> Result<std::fs::File, Box<dyn std::error::Error>> {
    let log_path = trace_log_path(&std::env::current_dir()?)?;

    let log_file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&log_path)?;

    Ok(log_file)
}
