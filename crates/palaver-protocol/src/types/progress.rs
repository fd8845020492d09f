//! Progress and log notification types.
//!
//! These are fire-and-forget signals: no response is expected and failure to
//! deliver one must never abort the tool invocation that emitted it.

use serde::{Deserialize, Serialize};

use crate::error::{PalaverError, PalaverResult};

/// Log level for client-directed log notifications.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Debug level
    Debug,
    /// Info level
    Info,
    /// Warning level
    Warning,
    /// Error level
    Error,
}

/// A log message emitted during tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogNotification {
    /// Severity.
    pub level: LogLevel,
    /// Log message.
    pub message: String,
}

impl LogNotification {
    /// Create a log notification.
    #[must_use]
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// A point-in-time progress signal for one invocation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ProgressNotification {
    /// Work completed so far.
    pub current: f64,
    /// Total amount of work.
    pub total: f64,
}

impl ProgressNotification {
    /// Create a progress notification, validating `0 <= current <= total`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the values are out of range or not finite.
    pub fn new(current: f64, total: f64) -> PalaverResult<Self> {
        if !current.is_finite() || !total.is_finite() {
            return Err(PalaverError::invalid_input(
                "progress values must be finite",
            ));
        }
        if current < 0.0 || current > total {
            return Err(PalaverError::invalid_input(format!(
                "progress requires 0 <= current <= total, got {current}/{total}"
            )));
        }
        Ok(Self { current, total })
    }

    /// Completion ratio in `0.0..=1.0`. A zero total counts as complete.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.total == 0.0 {
            1.0
        } else {
            self.current / self.total
        }
    }
}

/// Any fire-and-forget notification a tool can emit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Notification {
    /// Log message.
    Log(LogNotification),
    /// Progress update.
    Progress(ProgressNotification),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_progress() {
        assert!(ProgressNotification::new(-1.0, 100.0).is_err());
        assert!(ProgressNotification::new(101.0, 100.0).is_err());
        assert!(ProgressNotification::new(f64::NAN, 100.0).is_err());
    }

    #[test]
    fn accepts_boundary_values() {
        assert!(ProgressNotification::new(0.0, 100.0).is_ok());
        assert!(ProgressNotification::new(100.0, 100.0).is_ok());
        assert!(ProgressNotification::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn ratio_handles_zero_total() {
        let done = ProgressNotification::new(0.0, 0.0).unwrap();
        assert!((done.ratio() - 1.0).abs() < f64::EPSILON);

        let half = ProgressNotification::new(50.0, 100.0).unwrap();
        assert!((half.ratio() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn notification_wire_form_is_tagged() {
        let note = Notification::Log(LogNotification::new(LogLevel::Info, "hi"));
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["kind"], "log");
        assert_eq!(json["level"], "info");
    }
}
