use crate::error::Result;
use chrono::Utc;
use log::Level;
use serde_json::{json, Value};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

pub const DATA_VALIDATION_LOGGER_NAME: &str = "data_validation";

/// Logging capability handed to the validation engine. Implementations
/// receive one call per non-empty discrepancy set, with the full set of
/// findings as the details payload.
pub trait DiscrepancyRecorder {
    fn record(&self, level: Level, message: &str, details: Value);
}

/// Routes discrepancy entries to the `log` facade under the
/// data-validation target.
#[derive(Debug, Default)]
pub struct LogRecorder;

impl DiscrepancyRecorder for LogRecorder {
    fn record(&self, level: Level, message: &str, details: Value) {
        log::log!(target: DATA_VALIDATION_LOGGER_NAME, level, "{} details={}", message, details);
    }
}

/// Writes one JSON object per entry to a sink:
/// `{"timestamp", "name", "level", "message", "details"}`. The sink is
/// acquired once and held for the recorder's lifetime.
pub struct JsonFileRecorder {
    name: String,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl JsonFileRecorder {
    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        Self {
            name: DATA_VALIDATION_LOGGER_NAME.to_string(),
            sink: Mutex::new(sink),
        }
    }

    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    fn write_entry(&self, entry: &Value) -> std::io::Result<()> {
        let mut sink = self
            .sink
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        writeln!(sink, "{}", entry)?;
        sink.flush()
    }
}

impl DiscrepancyRecorder for JsonFileRecorder {
    fn record(&self, level: Level, message: &str, details: Value) {
        let entry = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "name": self.name,
            "level": level.to_string(),
            "message": message,
            "details": details,
        });

        if let Err(e) = self.write_entry(&entry) {
            log::error!("Failed to write validation log entry: {}", e);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEntry {
    pub level: Level,
    pub message: String,
    pub details: Value,
}

/// In-memory recorder for tests and programmatic inspection.
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    entries: Mutex<Vec<RecordedEntry>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<RecordedEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_empty()
    }
}

impl DiscrepancyRecorder for MemoryRecorder {
    fn record(&self, level: Level, message: &str, details: Value) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(RecordedEntry {
                level,
                message: message.to_string(),
                details,
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::LevelFilter;
    use std::sync::Arc;

    struct CapturingLogger {
        entries: Mutex<Vec<(Level, String, String)>>,
    }

    impl log::Log for CapturingLogger {
        fn enabled(&self, _metadata: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            self.entries.lock().unwrap().push((
                record.level(),
                record.target().to_string(),
                record.args().to_string(),
            ));
        }

        fn flush(&self) {}
    }

    static CAPTURE: CapturingLogger = CapturingLogger {
        entries: Mutex::new(Vec::new()),
    };

    #[test]
    fn test_log_recorder_forwards_to_facade() {
        // The process-wide logger can only be installed once; this is the
        // only test that installs one.
        log::set_logger(&CAPTURE).expect("no other logger installed");
        log::set_max_level(LevelFilter::Trace);

        LogRecorder.record(
            Level::Error,
            "Balance reconciliation discrepancies detected",
            json!([{"account_name": "A001"}]),
        );

        let entries = CAPTURE.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);

        let (level, target, message) = &entries[0];
        assert_eq!(*level, Level::Error);
        assert_eq!(target, DATA_VALIDATION_LOGGER_NAME);
        assert!(message.starts_with("Balance reconciliation discrepancies detected"));
        assert!(message.contains("details="));
        assert!(message.contains("A001"));
    }

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_json_recorder_entry_shape() {
        let buffer = SharedBuffer::default();
        let recorder = JsonFileRecorder::new(Box::new(buffer.clone()));

        recorder.record(
            Level::Error,
            "Balance reconciliation discrepancies detected",
            json!([{"account_name": "A001"}]),
        );

        let bytes = buffer.0.lock().unwrap().clone();
        let line = String::from_utf8(bytes).unwrap();
        let entry: Value = serde_json::from_str(line.trim()).unwrap();

        assert_eq!(entry["name"], DATA_VALIDATION_LOGGER_NAME);
        assert_eq!(entry["level"], "ERROR");
        assert_eq!(
            entry["message"],
            "Balance reconciliation discrepancies detected"
        );
        assert_eq!(entry["details"][0]["account_name"], "A001");
        assert!(entry["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_json_recorder_one_line_per_entry() {
        let buffer = SharedBuffer::default();
        let recorder = JsonFileRecorder::new(Box::new(buffer.clone()));

        recorder.record(Level::Error, "first", json!([]));
        recorder.record(Level::Warn, "second", json!([]));

        let bytes = buffer.0.lock().unwrap().clone();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.trim().lines().count(), 2);
    }

    #[test]
    fn test_memory_recorder_collects_entries() {
        let recorder = MemoryRecorder::new();
        assert!(recorder.is_empty());

        recorder.record(Level::Warn, "Missing months detected", json!([]));

        let entries = recorder.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, Level::Warn);
        assert_eq!(entries[0].message, "Missing months detected");
    }
}
