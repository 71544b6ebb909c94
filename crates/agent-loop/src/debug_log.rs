//! Structured per-session debug records and operation timing.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One line of the debug log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugInfo {
    pub session_id: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub details: serde_json::Value,
}

impl DebugInfo {
    pub fn new(session_id: impl Into<String>, event_type: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            details: serde_json::json!({}),
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Mirrors loop events to `log::debug!` and, when a file is set, appends them as JSON lines.
#[derive(Debug, Clone)]
pub struct DebugLogger {
    enabled: bool,
    log_file: Option<PathBuf>,
}

impl DebugLogger {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            log_file: None,
        }
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    pub fn log_file(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    pub fn log(&self, info: &DebugInfo) {
        if !self.enabled {
            return;
        }

        log::debug!("[{}] {}: {}", info.session_id, info.event_type, info.details);

        if let Some(ref path) = self.log_file {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            match OpenOptions::new().create(true).append(true).open(path) {
                Ok(mut file) => {
                    let _ = writeln!(file, "{}", info.to_json());
                }
                Err(error) => {
                    log::warn!("Failed to open debug log {}: {}", path.display(), error);
                }
            }
        }
    }

    pub fn log_event(&self, session_id: &str, event_type: &str, details: serde_json::Value) {
        let info = DebugInfo::new(session_id, event_type).with_details(details);
        self.log(&info);
    }
}

/// Measures an operation; warns on drop if it took longer than a second.
pub struct Timer {
    name: String,
    start: std::time::Instant,
}

impl Timer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: std::time::Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.start.elapsed().as_millis()
    }

    pub fn debug(&self, session_id: &str) {
        log::debug!(
            "[{}] {} completed in {}ms",
            session_id,
            self.name,
            self.elapsed_ms()
        );
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let elapsed = self.elapsed_ms();
        if elapsed > 1000 {
            log::warn!("{} took {}ms (slow!)", self.name, elapsed);
        }
    }
}
