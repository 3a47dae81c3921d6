//! Log capture for tests.
//!
//! Capture is scoped to a closure through a thread-local default subscriber,
//! so parallel tests never see each other's events.

use std::sync::{Arc, Mutex};

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// A captured log entry.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: Level,
    pub target: String,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

impl LogEntry {
    #[must_use]
    pub fn new(level: Level, target: &str, message: &str) -> Self {
        Self {
            level,
            target: target.to_string(),
            message: message.to_string(),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, key: &str, value: &str) -> Self {
        self.fields.push((key.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let fields: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        serde_json::json!({
            "level": self.level.to_string(),
            "target": self.target,
            "message": self.message,
            "fields": fields,
        })
    }
}

/// Entries captured while running a closure.
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs {
    entries: Vec<LogEntry>,
}

impl CapturedLogs {
    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    #[must_use]
    pub fn contains_message(&self, message: &str) -> bool {
        self.entries.iter().any(|e| e.message.contains(message))
    }

    #[must_use]
    pub fn contains(&self, level: Level, message: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.level == level && e.message.contains(message))
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.entries.iter().any(|e| e.level == Level::WARN)
    }

    #[must_use]
    pub fn filter_by_level(&self, level: Level) -> Vec<&LogEntry> {
        self.entries.iter().filter(|e| e.level == level).collect()
    }

    /// Human-readable dump for assertion failures.
    #[must_use]
    pub fn format_for_display(&self) -> String {
        if self.entries.is_empty() {
            return String::from("No logs captured");
        }
        let mut output = format!("Captured {} log entries:\n", self.entries.len());
        for entry in &self.entries {
            output.push_str(&format!(
                "[{}] {}: {}\n",
                entry.level, entry.target, entry.message
            ));
            for (key, value) in &entry.fields {
                output.push_str(&format!("    {key} = {value}\n"));
            }
        }
        output
    }
}

/// Layer that records every event it sees into shared storage.
pub struct TestLogLayer {
    storage: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogLayer {
    pub const fn new(storage: Arc<Mutex<Vec<LogEntry>>>) -> Self {
        Self { storage }
    }
}

impl<S> tracing_subscriber::Layer<S> for TestLogLayer
where
    S: tracing::Subscriber,
{
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        struct MessageVisitor<'a> {
            message: &'a mut String,
            fields: &'a mut Vec<(String, String)>,
        }

        impl tracing::field::Visit for MessageVisitor<'_> {
            fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
                if field.name() == "message" {
                    *self.message = value.to_string();
                } else {
                    self.fields
                        .push((field.name().to_string(), value.to_string()));
                }
            }

            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                let value_str = format!("{value:?}");
                if field.name() == "message" {
                    *self.message = value_str;
                } else {
                    self.fields.push((field.name().to_string(), value_str));
                }
            }
        }

        let metadata = event.metadata();
        let mut message = String::new();
        let mut fields = Vec::new();
        event.record(&mut MessageVisitor {
            message: &mut message,
            fields: &mut fields,
        });

        let mut entry = LogEntry::new(*metadata.level(), metadata.target(), &message);
        entry.fields = fields;
        if let Ok(mut storage) = self.storage.lock() {
            storage.push(entry);
        }
    }
}

/// Run `body` with log capture at `level` (an `EnvFilter` directive).
pub fn capture_logs<T>(level: &str, body: impl FnOnce() -> T) -> (T, CapturedLogs) {
    let storage = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::new(level))
        .with(TestLogLayer::new(Arc::clone(&storage)));
    let value = tracing::subscriber::with_default(subscriber, body);
    let entries = storage.lock().map(|e| e.clone()).unwrap_or_default();
    (value, CapturedLogs { entries })
}

/// Assert that a capture holds an entry with the given level and message.
#[macro_export]
macro_rules! assert_log_contains {
    ($logs:expr, $level:expr, $message:expr) => {{
        let logs = &$logs;
        assert!(
            logs.contains($level, $message),
            "Expected log with level {} containing '{}'\n{}",
            $level,
            $message,
            logs.format_for_display()
        );
    }};
}
